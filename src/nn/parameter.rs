/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : 可训练参数及其存储。参数的值与梯度由外部（训练循环/自动微分引擎）提供，
 *                 优化器只在`step`中原地修改参数的值
 */

use std::fmt;

use crate::nn::OptimizerError;
use crate::tensor::Tensor;

/// 参数的唯一标识，在参数的整个生命周期内保持不变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub(crate) usize);

impl ParamId {
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 单个可训练参数
#[derive(Debug, Clone)]
pub struct Parameter {
    name: Option<String>,
    value: Tensor,
    /// 外部提供的梯度，形状与`value`一致
    grad: Option<Tensor>,
}

impl Parameter {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub const fn value(&self) -> &Tensor {
        &self.value
    }

    pub const fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }
}

/// 参数存储（类似计算图中所有参数节点的集合）
///
/// # 使用示例
/// ```ignore
/// let mut store = ParameterStore::new();
/// let w = store.new_parameter(Tensor::new(&[1.0, 2.0], &[2]), Some("w"));
/// store.set_grad(w, Tensor::new(&[0.1, 0.2], &[2]))?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    params: Vec<Parameter>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增一个参数，返回其标识
    pub fn new_parameter(&mut self, value: Tensor, name: Option<&str>) -> ParamId {
        let id = ParamId(self.params.len());
        self.params.push(Parameter {
            name: name.map(str::to_string),
            value,
            grad: None,
        });
        id
    }

    /// 所有参数的标识（按创建顺序）
    pub fn param_ids(&self) -> Vec<ParamId> {
        (0..self.params.len()).map(ParamId).collect()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn contains(&self, id: ParamId) -> bool {
        id.0 < self.params.len()
    }

    pub fn get(&self, id: ParamId) -> Result<&Parameter, OptimizerError> {
        self.params
            .get(id.0)
            .ok_or(OptimizerError::ParamNotFound(id))
    }

    fn get_mut(&mut self, id: ParamId) -> Result<&mut Parameter, OptimizerError> {
        self.params
            .get_mut(id.0)
            .ok_or(OptimizerError::ParamNotFound(id))
    }

    pub fn name(&self, id: ParamId) -> Result<Option<&str>, OptimizerError> {
        Ok(self.get(id)?.name())
    }

    pub fn value(&self, id: ParamId) -> Result<&Tensor, OptimizerError> {
        Ok(&self.get(id)?.value)
    }

    /// 整体替换参数值，新值形状须与原值一致
    pub fn set_value(&mut self, id: ParamId, value: Tensor) -> Result<(), OptimizerError> {
        let param = self.get_mut(id)?;
        check_shape(&param.value, &value, "新的参数值须与原参数值形状一致")?;
        param.value = value;
        Ok(())
    }

    /// 原地修改参数值（供优化器使用）
    pub(crate) fn value_mut(&mut self, id: ParamId) -> Result<&mut Tensor, OptimizerError> {
        Ok(&mut self.get_mut(id)?.value)
    }

    pub fn grad(&self, id: ParamId) -> Result<Option<&Tensor>, OptimizerError> {
        Ok(self.get(id)?.grad.as_ref())
    }

    /// 设置梯度，梯度形状须与参数值一致
    pub fn set_grad(&mut self, id: ParamId, grad: Tensor) -> Result<(), OptimizerError> {
        let param = self.get_mut(id)?;
        check_shape(&param.value, &grad, "梯度须与参数值形状一致")?;
        param.grad = Some(grad);
        Ok(())
    }

    pub fn clear_grad(&mut self, id: ParamId) -> Result<(), OptimizerError> {
        self.get_mut(id)?.grad = None;
        Ok(())
    }

    /// 清除多个参数的梯度
    pub fn zero_grad(&mut self, ids: &[ParamId]) -> Result<(), OptimizerError> {
        for &id in ids {
            self.clear_grad(id)?;
        }
        Ok(())
    }

    /// 按给定顺序克隆出多个参数的值
    pub fn values_of(&self, ids: &[ParamId]) -> Result<Vec<Tensor>, OptimizerError> {
        ids.iter().map(|&id| self.value(id).cloned()).collect()
    }
}

fn check_shape(expected: &Tensor, got: &Tensor, message: &str) -> Result<(), OptimizerError> {
    if expected.is_same_shape(got) {
        Ok(())
    } else {
        Err(OptimizerError::ShapeMismatch {
            expected: expected.shape().to_vec(),
            got: got.shape().to_vec(),
            message: message.to_string(),
        })
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : 二次损失 L(x) = ½·xᵀAx − bᵀx，x为若干参数按顺序展平后的拼接。
 *                 其梯度为 Ax − b，Hessian恒为A，因此Hessian-向量积可以精确给出
 */

use ndarray::{Array1, Array2};

use super::{HessianOracle, check_directions};
use crate::nn::{OptimizerError, ParamId, ParameterStore};
use crate::tensor::Tensor;

/// 对称性检查的相对容差
const SYMMETRY_TOLERANCE: f32 = 1e-6;

/// 二次损失，同时充当精确的微分预言机
#[derive(Debug, Clone)]
pub struct QuadraticLoss {
    params: Vec<ParamId>,
    /// 各参数的形状（按`params`顺序）
    shapes: Vec<Vec<usize>>,
    /// 各参数在展平向量中的起始位置
    offsets: Vec<usize>,
    a: Array2<f32>,
    b: Array1<f32>,
}

impl QuadraticLoss {
    /// 创建二次损失
    ///
    /// # 参数
    /// - `store`: 参数存储（只用于读取各参数形状）
    /// - `params`: 参与损失的参数，展平顺序即此顺序
    /// - `a`: n×n 对称矩阵，n 为所有参数的元素总数
    /// - `b`: 长度为 n 的向量
    pub fn new(
        store: &ParameterStore,
        params: &[ParamId],
        a: Array2<f32>,
        b: Array1<f32>,
    ) -> Result<Self, OptimizerError> {
        if params.is_empty() {
            return Err(OptimizerError::EmptyParamGroup);
        }

        let mut shapes = Vec::with_capacity(params.len());
        let mut offsets = Vec::with_capacity(params.len());
        let mut n = 0;
        for &id in params {
            let value = store.value(id)?;
            offsets.push(n);
            shapes.push(value.shape().to_vec());
            n += value.size();
        }

        if a.shape() != [n, n] {
            return Err(OptimizerError::ShapeMismatch {
                expected: vec![n, n],
                got: a.shape().to_vec(),
                message: "矩阵A须为n×n方阵（n为参数元素总数）".to_string(),
            });
        }
        if b.len() != n {
            return Err(OptimizerError::DimensionMismatch {
                expected: n,
                got: b.len(),
            });
        }
        let scale = a.iter().fold(1.0_f32, |acc, x| acc.max(x.abs()));
        for i in 0..n {
            for j in (i + 1)..n {
                if (a[[i, j]] - a[[j, i]]).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(OptimizerError::InvalidOperation(format!(
                        "矩阵A须对称：A[{i},{j}]={}，A[{j},{i}]={}",
                        a[[i, j]],
                        a[[j, i]]
                    )));
                }
            }
        }

        Ok(Self {
            params: params.to_vec(),
            shapes,
            offsets,
            a,
            b,
        })
    }

    pub fn params(&self) -> &[ParamId] {
        &self.params
    }

    /// 损失值 ½·xᵀAx − bᵀx
    pub fn loss(&self, store: &ParameterStore) -> Result<f32, OptimizerError> {
        let x = self.flatten_values(store)?;
        Ok(0.5 * x.dot(&self.a.dot(&x)) - self.b.dot(&x))
    }

    /// 梯度 Ax − b，按`params`顺序拆回各参数的形状
    pub fn gradients(&self, store: &ParameterStore) -> Result<Vec<Tensor>, OptimizerError> {
        let x = self.flatten_values(store)?;
        let grad = self.a.dot(&x) - &self.b;
        Ok(self.split(&grad))
    }

    /// 计算梯度并写入参数存储，返回损失值。
    /// 适合在`step`的闭包中调用
    pub fn populate_gradients(&self, store: &mut ParameterStore) -> Result<f32, OptimizerError> {
        let grads = self.gradients(store)?;
        for (&id, grad) in self.params.iter().zip(grads) {
            store.set_grad(id, grad)?;
        }
        self.loss(store)
    }

    /// 真实的Hessian对角（即A的对角），按`params`顺序拆回各参数的形状
    pub fn hessian_diagonal(&self) -> Vec<Tensor> {
        self.split(&self.a.diag().to_owned())
    }

    fn flatten_values(&self, store: &ParameterStore) -> Result<Array1<f32>, OptimizerError> {
        let mut x = Vec::with_capacity(self.b.len());
        for &id in &self.params {
            x.extend(store.value(id)?.to_vec());
        }
        Ok(Array1::from(x))
    }

    fn split(&self, flat: &Array1<f32>) -> Vec<Tensor> {
        self.shapes
            .iter()
            .zip(&self.offsets)
            .map(|(shape, &offset)| {
                let len = shape.iter().product::<usize>();
                let data = flat.slice(ndarray::s![offset..offset + len]).to_vec();
                Tensor::new(&data, shape)
            })
            .collect()
    }

    fn position_of(&self, id: ParamId) -> Result<usize, OptimizerError> {
        self.params
            .iter()
            .position(|&p| p == id)
            .ok_or_else(|| OptimizerError::InvalidOperation(format!("参数{id}不属于该二次损失")))
    }
}

impl HessianOracle for QuadraticLoss {
    fn hessian_vector_product(
        &self,
        store: &ParameterStore,
        params: &[ParamId],
        directions: &[Tensor],
        _retain_graph: bool,
    ) -> Result<Vec<Tensor>, OptimizerError> {
        check_directions(store, params, directions)?;

        let mut z = Array1::<f32>::zeros(self.b.len());
        let mut positions = Vec::with_capacity(params.len());
        for (&id, direction) in params.iter().zip(directions) {
            let position = self.position_of(id)?;
            let offset = self.offsets[position];
            for (k, v) in direction.to_vec().into_iter().enumerate() {
                z[offset + k] = v;
            }
            positions.push(position);
        }

        let hz = self.split(&self.a.dot(&z));
        Ok(positions.into_iter().map(|p| hz[p].clone()).collect())
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : 基于中心差分的Hessian-向量积：Hz ≈ (∇f(x + εz) − ∇f(x − εz)) / 2ε
 *                 只需用户提供梯度函数，适用于没有二阶自动微分的场景
 */

use std::fmt;

use super::{HessianOracle, check_directions};
use crate::errors::ComparisonOperator;
use crate::nn::{OptimizerError, ParamId, ParameterStore};
use crate::tensor::Tensor;

/// f32精度下中心差分的默认步长
pub const DEFAULT_EPSILON: f32 = 1e-3;

/// 中心差分微分预言机
///
/// # 使用示例
/// ```ignore
/// // f(x) = Σ x_i⁴ / 4 的梯度为 x³
/// let oracle = FiniteDifferenceOracle::new(&[w], |xs: &[Tensor]| {
///     xs.iter().map(|x| x * x * x).collect()
/// });
/// ```
pub struct FiniteDifferenceOracle<G> {
    params: Vec<ParamId>,
    gradient_fn: G,
    epsilon: f32,
}

impl<G> FiniteDifferenceOracle<G>
where
    G: Fn(&[Tensor]) -> Vec<Tensor>,
{
    /// `gradient_fn`接收与`params`一一对应的参数值，返回一一对应的梯度
    pub fn new(params: &[ParamId], gradient_fn: G) -> Self {
        Self {
            params: params.to_vec(),
            gradient_fn,
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// 设置差分步长，须为正
    pub fn with_epsilon(mut self, epsilon: f32) -> Result<Self, OptimizerError> {
        if !(epsilon > 0.0) {
            return Err(OptimizerError::ValueMustSatisfyComparison {
                value_name: "差分步长epsilon".to_string(),
                operator: ComparisonOperator::GreaterThan,
                threshold: 0.0,
            });
        }
        self.epsilon = epsilon;
        Ok(self)
    }

    pub const fn epsilon(&self) -> f32 {
        self.epsilon
    }

    fn evaluate(&self, values: &[Tensor]) -> Result<Vec<Tensor>, OptimizerError> {
        let grads = (self.gradient_fn)(values);
        if grads.len() != values.len() {
            return Err(OptimizerError::DimensionMismatch {
                expected: values.len(),
                got: grads.len(),
            });
        }
        for (value, grad) in values.iter().zip(&grads) {
            if !value.is_same_shape(grad) {
                return Err(OptimizerError::ShapeMismatch {
                    expected: value.shape().to_vec(),
                    got: grad.shape().to_vec(),
                    message: "梯度函数返回的梯度须与参数值形状一致".to_string(),
                });
            }
        }
        Ok(grads)
    }
}

impl<G> fmt::Debug for FiniteDifferenceOracle<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiniteDifferenceOracle")
            .field("params", &self.params)
            .field("epsilon", &self.epsilon)
            .finish_non_exhaustive()
    }
}

impl<G> HessianOracle for FiniteDifferenceOracle<G>
where
    G: Fn(&[Tensor]) -> Vec<Tensor>,
{
    fn hessian_vector_product(
        &self,
        store: &ParameterStore,
        params: &[ParamId],
        directions: &[Tensor],
        _retain_graph: bool,
    ) -> Result<Vec<Tensor>, OptimizerError> {
        check_directions(store, params, directions)?;

        let base = store.values_of(&self.params)?;
        let mut plus = base.clone();
        let mut minus = base;
        let mut positions = Vec::with_capacity(params.len());
        for (&id, direction) in params.iter().zip(directions) {
            let position = self.params.iter().position(|&p| p == id).ok_or_else(|| {
                OptimizerError::InvalidOperation(format!("参数{id}不属于该差分预言机"))
            })?;
            plus[position].scaled_add_mut(self.epsilon, direction);
            minus[position].scaled_add_mut(-self.epsilon, direction);
            positions.push(position);
        }

        let grad_plus = self.evaluate(&plus)?;
        let grad_minus = self.evaluate(&minus)?;
        let two_eps = 2.0 * self.epsilon;
        Ok(positions
            .into_iter()
            .map(|p| (&grad_plus[p] - &grad_minus[p]) / two_eps)
            .collect())
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : 控制变量：决定Hessian估计器对哪个量求导。
 *                 启用时求导对象为 vals = g − β1·ĥ⊙p，其中ĥ是估计开始前冻结的Hessian动量快照，
 *                 对参数而言是常数，因此 vals 沿 z 的方向导数为 Hz − β1·ĥ⊙z
 */

use super::state::StateStore;
use crate::nn::oracle::HessianOracle;
use crate::nn::{OptimizerError, ParamId, ParameterStore};
use crate::tensor::Tensor;

/// 被求导的量
#[derive(Debug, Clone, PartialEq)]
pub enum DifferentiatedValues {
    /// vals = g
    Gradient,
    /// vals = g − baseline⊙p，`baselines[i]` = β1·ĥ_i（冻结快照）
    ControlVariate { baselines: Vec<Tensor> },
}

impl DifferentiatedValues {
    /// 根据开关构造求导对象。启用控制变量时，对每个参数的Hessian动量取快照
    pub(crate) fn adjust(
        control_variate: bool,
        states: &StateStore,
        params: &[ParamId],
        beta1: f32,
    ) -> Result<Self, OptimizerError> {
        if !control_variate {
            return Ok(Self::Gradient);
        }
        let baselines = params
            .iter()
            .map(|&id| Ok(beta1 * states.get(id)?.hessian_momentum()))
            .collect::<Result<Vec<_>, OptimizerError>>()?;
        Ok(Self::ControlVariate { baselines })
    }

    /// 被求导的量本身：g 或 g − baseline⊙p
    #[cfg(test)]
    pub(crate) fn values(
        &self,
        store: &ParameterStore,
        params: &[ParamId],
    ) -> Result<Vec<Tensor>, OptimizerError> {
        params
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let grad = store.grad(id)?.ok_or(OptimizerError::MissingGradient(id))?;
                match self {
                    Self::Gradient => Ok(grad.clone()),
                    Self::ControlVariate { baselines } => {
                        Ok(grad - &baselines[i] * store.value(id)?)
                    }
                }
            })
            .collect()
    }

    /// 被求导的量沿`directions`的方向导数
    pub(crate) fn directional_derivative<O: HessianOracle + ?Sized>(
        &self,
        oracle: &O,
        store: &ParameterStore,
        params: &[ParamId],
        directions: &[Tensor],
        retain_graph: bool,
    ) -> Result<Vec<Tensor>, OptimizerError> {
        let mut hz = oracle.hessian_vector_product(store, params, directions, retain_graph)?;
        if hz.len() != params.len() {
            return Err(OptimizerError::DimensionMismatch {
                expected: params.len(),
                got: hz.len(),
            });
        }
        for (h, z) in hz.iter().zip(directions) {
            if !h.is_same_shape(z) {
                return Err(OptimizerError::ShapeMismatch {
                    expected: z.shape().to_vec(),
                    got: h.shape().to_vec(),
                    message: "预言机返回的Hessian-向量积须与参数值形状一致".to_string(),
                });
            }
        }
        if let Self::ControlVariate { baselines } = self {
            for ((h, baseline), z) in hz.iter_mut().zip(baselines).zip(directions) {
                *h -= baseline * z;
            }
        }
        Ok(hz)
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : 一阶矩（梯度EMA）与Hessian对角EMA的更新，以及偏差修正系数
 */

use super::state::ParameterState;
use crate::tensor::Tensor;

/// 第 t 步的偏差修正系数：bc0 = 1 − β0^t，bc1 = 1 − β1^t。
/// 同一步内所有参数共用同一组系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasCorrection {
    pub first: f32,
    pub second: f32,
}

impl BiasCorrection {
    /// `step`从1开始计数；β∈[0, 1)时两个系数都落在(0, 1]内
    pub fn at_step(step: usize, betas: (f32, f32)) -> Self {
        let t = i32::try_from(step).unwrap_or(i32::MAX);
        Self {
            first: 1.0 - betas.0.powi(t),
            second: 1.0 - betas.1.powi(t),
        }
    }
}

/// 原地更新单个参数的两个EMA：
/// - momentum ← β0·momentum + (1 − β0)·grad
/// - hessian_momentum ← β1·hessian_momentum + (1 − β1)·hessian
///
/// 不读写参数值
pub(crate) fn update_moments(state: &mut ParameterState, grad: &Tensor, betas: (f32, f32)) {
    let (beta0, beta1) = betas;

    state.momentum *= beta0;
    state.momentum.scaled_add_mut(1.0 - beta0, grad);

    state.hessian_momentum *= beta1;
    state
        .hessian_momentum
        .scaled_add_mut(1.0 - beta1, &state.hessian);
}

/// 牛顿式更新的分母：sqrt(|hessian_momentum| / bc1) + eps
pub(crate) fn denominator(hessian_momentum: &Tensor, bias_correction_1: f32, eps: f32) -> Tensor {
    (hessian_momentum / bias_correction_1).abs().sqrt() + eps
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : Hutchinson 随机估计 Hessian 对角：diag(H) ≈ (1/S)·Σ_s z_s ⊙ (H z_s)
 *                 当 E[zzᵀ] = I 且 H 对称时该估计无偏
 */

use rand::rngs::StdRng;

use super::config::check;
use super::control_variate::DifferentiatedValues;
use super::probe::{ProbeDistribution, ProbeSampler};
use crate::errors::ComparisonOperator;
use crate::nn::oracle::HessianOracle;
use crate::nn::{OptimizerError, ParamId, ParameterStore};
use crate::tensor::Tensor;

/// Hutchinson 估计器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HutchinsonEstimator {
    mc_iters: usize,
    probe: ProbeDistribution,
}

impl HutchinsonEstimator {
    /// `mc_iters`须 ≥ 1：为0时估计恒为零，会让二阶矩悄然退化
    pub fn new(mc_iters: usize, probe: ProbeDistribution) -> Result<Self, OptimizerError> {
        check(
            "mc_iters",
            mc_iters as f32,
            ComparisonOperator::GreaterOrEqual,
            1.0,
        )?;
        Ok(Self { mc_iters, probe })
    }

    pub const fn mc_iters(&self) -> usize {
        self.mc_iters
    }

    pub const fn probe(&self) -> ProbeDistribution {
        self.probe
    }

    /// 估计每个参数的 Hessian 对角（按`params`顺序返回，形状与参数一致）
    ///
    /// 除最后一次采样外，调用预言机时都会要求保留中间结果（`retain_graph = true`），
    /// 因为同一个`vals`要被反复求导
    pub fn estimate<O: HessianOracle + ?Sized>(
        &self,
        oracle: &O,
        store: &ParameterStore,
        params: &[ParamId],
        vals: &DifferentiatedValues,
        rng: &mut StdRng,
    ) -> Result<Vec<Tensor>, OptimizerError> {
        let shapes = params
            .iter()
            .map(|&id| Ok(store.value(id)?.shape().to_vec()))
            .collect::<Result<Vec<_>, OptimizerError>>()?;
        let mut estimates = shapes
            .iter()
            .map(|shape| Tensor::zeros(shape))
            .collect::<Vec<_>>();
        let weight = 1.0 / self.mc_iters as f32;

        for iter in 0..self.mc_iters {
            let retain_graph = iter != self.mc_iters - 1;
            let z_values = shapes
                .iter()
                .map(|shape| self.probe.sample(shape, rng))
                .collect::<Vec<_>>();
            let hz_values =
                vals.directional_derivative(oracle, store, params, &z_values, retain_graph)?;

            for ((estimate, z), hz) in estimates.iter_mut().zip(&z_values).zip(&hz_values) {
                estimate.scaled_add_mut(weight, &(hz * z));
            }
            log::trace!(
                "Hutchinson 采样 {}/{}（retain_graph={retain_graph}）",
                iter + 1,
                self.mc_iters
            );
        }

        Ok(estimates)
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : Hutchinson估计使用的探测向量分布。
 *                 两种分布的元素均独立、零均值、单位方差，因此都满足 E[zzᵀ] = I
 */

use enum_dispatch::enum_dispatch;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::tensor::Tensor;

#[enum_dispatch]
pub trait ProbeSampler {
    /// 按给定形状采样一个探测张量
    fn sample(&self, shape: &[usize], rng: &mut StdRng) -> Tensor;
}

/// 标准正态分布 N(0, 1)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gaussian;

impl ProbeSampler for Gaussian {
    fn sample(&self, shape: &[usize], rng: &mut StdRng) -> Tensor {
        Tensor::normal_with_rng(0.0, 1.0, shape, rng)
    }
}

/// Rademacher分布：等概率取 ±1。
/// 对角元素贡献的方差为零，所以通常比高斯分布方差更小
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rademacher;

impl ProbeSampler for Rademacher {
    fn sample(&self, shape: &[usize], rng: &mut StdRng) -> Tensor {
        Tensor::rademacher_with_rng(shape, rng)
    }
}

#[enum_dispatch(ProbeSampler)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeDistribution {
    Gaussian(Gaussian),
    Rademacher(Rademacher),
}

impl Default for ProbeDistribution {
    fn default() -> Self {
        Gaussian.into()
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : AdaHessian 超参数配置
 */

use serde::{Deserialize, Serialize};

use super::probe::{Gaussian, ProbeDistribution};
use crate::errors::ComparisonOperator;
use crate::nn::OptimizerError;

/// AdaHessian 超参数
///
/// 构造后不可变（学习率除外：学习率按参数组存放，可通过`set_learning_rate`修改）。
///
/// # 使用示例
/// ```ignore
/// let config = AdaHessianConfig::default()
///     .with_lr(0.01)
///     .with_mc_iters(4)
///     .with_seed(42);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaHessianConfig {
    /// 学习率（默认参数组的学习率），须 > 0
    pub lr: f32,
    /// 解耦权重衰减系数，须 ≥ 0
    pub weight_decay: f32,
    /// (β0, β1)：梯度EMA与Hessian对角EMA的衰减系数，均须在[0, 1)内
    pub betas: (f32, f32),
    /// Hutchinson估计的蒙特卡洛采样次数，须 ≥ 1
    pub mc_iters: usize,
    /// 分母中的数值稳定项，须 > 0
    pub eps: f32,
    /// 是否启用控制变量
    pub control_variate: bool,
    /// 探测向量的分布
    pub probe: ProbeDistribution,
    /// 随机种子；为`None`时从系统熵源初始化
    pub seed: Option<u64>,
}

impl Default for AdaHessianConfig {
    fn default() -> Self {
        Self {
            lr: 1e-3,
            weight_decay: 0.0,
            betas: (0.9, 0.999),
            mc_iters: 1,
            eps: 1e-8,
            control_variate: true,
            probe: Gaussian.into(),
            seed: None,
        }
    }
}

impl AdaHessianConfig {
    pub const fn with_lr(mut self, lr: f32) -> Self {
        self.lr = lr;
        self
    }

    pub const fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub const fn with_betas(mut self, beta0: f32, beta1: f32) -> Self {
        self.betas = (beta0, beta1);
        self
    }

    pub const fn with_mc_iters(mut self, mc_iters: usize) -> Self {
        self.mc_iters = mc_iters;
        self
    }

    pub const fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    pub const fn with_control_variate(mut self, control_variate: bool) -> Self {
        self.control_variate = control_variate;
        self
    }

    pub fn with_probe(mut self, probe: impl Into<ProbeDistribution>) -> Self {
        self.probe = probe.into();
        self
    }

    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 从JSON解析配置，缺省字段取默认值；解析后立即校验
    pub fn from_json(json: &str) -> Result<Self, OptimizerError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验所有超参数的取值范围
    pub fn validate(&self) -> Result<(), OptimizerError> {
        let (beta0, beta1) = self.betas;
        check("lr", self.lr, ComparisonOperator::GreaterThan, 0.0)?;
        check(
            "weight_decay",
            self.weight_decay,
            ComparisonOperator::GreaterOrEqual,
            0.0,
        )?;
        check("beta0", beta0, ComparisonOperator::GreaterOrEqual, 0.0)?;
        check("beta0", beta0, ComparisonOperator::LessThan, 1.0)?;
        check("beta1", beta1, ComparisonOperator::GreaterOrEqual, 0.0)?;
        check("beta1", beta1, ComparisonOperator::LessThan, 1.0)?;
        check(
            "mc_iters",
            self.mc_iters as f32,
            ComparisonOperator::GreaterOrEqual,
            1.0,
        )?;
        check("eps", self.eps, ComparisonOperator::GreaterThan, 0.0)?;
        Ok(())
    }
}

/// NaN 不满足任何比较，因此也会被拒绝
pub(crate) fn check(
    value_name: &str,
    value: f32,
    operator: ComparisonOperator,
    threshold: f32,
) -> Result<(), OptimizerError> {
    if operator.holds(value, threshold) {
        Ok(())
    } else {
        Err(OptimizerError::ValueMustSatisfyComparison {
            value_name: value_name.to_string(),
            operator,
            threshold,
        })
    }
}

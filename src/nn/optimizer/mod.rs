/*
 * @Author       : 老董
 * @Date         : 2025-07-24 16:00:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-19
 * @Description  : 优化器模块，实现 PyTorch 风格的 AdaHessian 二阶优化算法
 */

mod ada_hessian;
mod base;
mod config;
mod control_variate;
mod hessian;
mod moments;
mod probe;
mod state;

pub use ada_hessian::AdaHessian;
pub use base::{LossClosure, Optimizer, ParamGroup};
pub use config::AdaHessianConfig;
pub use control_variate::DifferentiatedValues;
pub use hessian::HutchinsonEstimator;
pub use moments::BiasCorrection;
pub use probe::{Gaussian, ProbeDistribution, ProbeSampler, Rademacher};
pub use state::ParameterState;

/*
 * @Author       : 老董
 * @Date         : 2024-01-31 20:23:53
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-19
 * @Description  : 负责参数、微分预言机与优化器
 */

mod error;
pub mod optimizer;
pub mod oracle;
mod parameter;

pub use error::{NumericQuantity, OptimizerError};
pub use optimizer::{AdaHessian, AdaHessianConfig, Optimizer};
pub use oracle::{FiniteDifferenceOracle, HessianOracle, QuadraticLoss};
pub use parameter::{ParamId, Parameter, ParameterStore};

#[cfg(test)]
mod tests;

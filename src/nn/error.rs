/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : 优化器相关的错误类型
 */

use std::fmt::{self, Display};

use thiserror::Error;

use crate::errors::ComparisonOperator;
use crate::nn::ParamId;

/// 数值检查所针对的量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericQuantity {
    Gradient,
    HessianDiagonal,
}
impl Display for NumericQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumericQuantity::Gradient => "梯度",
            NumericQuantity::HessianDiagonal => "Hessian对角估计",
        };
        write!(f, "{}", name)
    }
}

/// 优化器操作错误类型
///
/// - 配置错误：构造时立即失败；
/// - 使用错误：`step`时立即失败；
/// - 数值不稳定：本步直接失败，不重试、不截断。
#[derive(Error, Debug, PartialEq)]
pub enum OptimizerError {
    // 配置
    #[error("{value_name}须{operator}{threshold}")]
    ValueMustSatisfyComparison {
        value_name: String,
        operator: ComparisonOperator,
        threshold: f32,
    },
    #[error("参数组为空")]
    EmptyParamGroup,
    #[error("参数{0}重复出现在优化器中")]
    DuplicateParam(ParamId),
    #[error("配置解析失败：{0}")]
    ConfigParse(String),

    // 使用
    #[error("参数{0}不存在")]
    ParamNotFound(ParamId),
    #[error("参数{0}没有梯度，且未提供可计算梯度的闭包")]
    MissingGradient(ParamId),
    #[error("形状不一致：期望{expected:?}，实际为{got:?}，{message}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
    #[error("数量不一致：期望{expected}，实际为{got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("{0}")]
    InvalidOperation(String),

    // 数值
    #[error("参数{param}的{quantity}中存在非有限值（NaN或±∞）")]
    NonFiniteValue {
        param: ParamId,
        quantity: NumericQuantity,
    },
}

impl From<serde_json::Error> for OptimizerError {
    fn from(err: serde_json::Error) -> Self {
        OptimizerError::ConfigParse(err.to_string())
    }
}

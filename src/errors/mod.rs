use thiserror::Error;
mod ops;
pub use self::ops::*;

#[derive(Error, Debug, PartialEq)]
pub enum TensorError {
    // 张量二元运算
    #[error(
        "形状不一致，故无法{operator}：第一个张量的形状为{tensor1_shape:?}，第二个张量的形状为{tensor2_shape:?}"
    )]
    OperatorError {
        operator: Operator,
        tensor1_shape: Vec<usize>,
        tensor2_shape: Vec<usize>,
    },
    #[error("数据长度{data_len}与形状{shape:?}不符")]
    DataShapeMismatch { data_len: usize, shape: Vec<usize> },

    #[error("除数为零")]
    DivByZero,
    #[error("作为除数的张量中存在为零元素")]
    DivByZeroElement,
}

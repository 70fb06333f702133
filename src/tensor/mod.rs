/*
 * @Author       : 老董
 * @Date         : 2023-08-17 17:24:24
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-19
 * @Description  : 张量：优化器内部所有缓冲区（参数值、梯度、动量、Hessian对角）的统一载体
 */

use ndarray::{Array, IxDyn};

use crate::errors::{Operator, TensorError};

mod ops {
    pub mod add;
    pub mod add_assign;
    pub mod div;
    pub mod mul;
    pub mod mul_assign;
    pub mod others;
    pub mod sub;
    pub mod sub_assign;
}

mod property;
mod random;


/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：只要通Tensor初始化的都是张量（即使标量也是张量）；
/// 而通常意义上的数字（类型为usize、i32、f64等）就只是纯数（number），在这里不被认为是张量。
#[derive(Debug, Clone)]
pub struct Tensor {
    data: Array<f32, IxDyn>,
}

impl Tensor {
    /// 创建一个张量，若为标量，`shape`可以是[]、[1]、[1,1]、[1,1,1]...
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]；
    /// 注：`data`的长度必须和`shape`中所有元素的乘积相等，否则会panic。
    pub fn new(data: &[f32], shape: &[usize]) -> Tensor {
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec()).unwrap_or_else(|_| {
            panic!(
                "{}",
                TensorError::DataShapeMismatch {
                    data_len: data.len(),
                    shape: shape.to_vec(),
                }
            )
        });
        Tensor { data }
    }

    /// 创建一个全零张量
    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    /// 创建一个与`self`形状相同的全零张量
    pub fn zeros_like(&self) -> Tensor {
        Tensor::zeros(self.shape())
    }
}

// 私有方法
impl Tensor {
    fn has_zero_value(&self) -> bool {
        self.data.iter().any(|&x| x == 0.)
    }

    /// 两个张量须形状严格一致，否则panic
    fn assert_same_shape(&self, other: &Tensor, operator: Operator) {
        assert!(
            self.is_same_shape(other),
            "{}",
            TensorError::OperatorError {
                operator,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: other.shape().to_vec(),
            }
        );
    }
}

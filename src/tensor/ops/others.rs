use crate::tensor::Tensor;
use std::cmp::PartialEq;

impl From<f32> for Tensor {
    /// 实现 From<f32> trait 用于将`f32`类型转换为形状为`[1]`的张量
    fn from(scalar: f32) -> Self {
        Tensor::new(&[scalar], &[1])
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Tensor {
    /// 逐元素取绝对值
    pub fn abs(&self) -> Tensor {
        Tensor {
            data: self.data.mapv(f32::abs),
        }
    }

    /// 逐元素开平方根（负数元素的结果为NaN）
    pub fn sqrt(&self) -> Tensor {
        Tensor {
            data: self.data.mapv(f32::sqrt),
        }
    }

    /// 对张量中的所有元素求和
    pub fn sum(&self) -> f32 {
        self.data.sum()
    }

    /// 将所有元素原地置零（不改变形状）
    pub fn fill_zero_mut(&mut self) {
        self.data.fill(0.);
    }
}

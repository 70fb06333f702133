use crate::errors::Operator;
use crate::tensor::Tensor;
use std::ops::AddAssign;

// 原地运算，不产生新张量
impl AddAssign<f32> for Tensor {
    fn add_assign(&mut self, scalar: f32) {
        self.data += scalar;
    }
}

impl<'a> AddAssign<&'a Tensor> for Tensor {
    fn add_assign(&mut self, other: &'a Tensor) {
        self.assert_same_shape(other, Operator::AddAssign);
        self.data += &other.data;
    }
}

impl AddAssign for Tensor {
    fn add_assign(&mut self, other: Tensor) {
        *self += &other;
    }
}

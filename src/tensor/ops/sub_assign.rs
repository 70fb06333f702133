use crate::errors::Operator;
use crate::tensor::Tensor;
use std::ops::SubAssign;

// 原地运算，不产生新张量
impl SubAssign<f32> for Tensor {
    fn sub_assign(&mut self, scalar: f32) {
        self.data -= scalar;
    }
}

impl<'a> SubAssign<&'a Tensor> for Tensor {
    fn sub_assign(&mut self, other: &'a Tensor) {
        self.assert_same_shape(other, Operator::SubAssign);
        self.data -= &other.data;
    }
}

impl SubAssign for Tensor {
    fn sub_assign(&mut self, other: Tensor) {
        *self -= &other;
    }
}

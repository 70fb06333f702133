use crate::errors::Operator;
use crate::tensor::Tensor;
use std::ops::MulAssign;

// 原地运算，不产生新张量
impl MulAssign<f32> for Tensor {
    fn mul_assign(&mut self, scalar: f32) {
        self.data *= scalar;
    }
}

impl<'a> MulAssign<&'a Tensor> for Tensor {
    fn mul_assign(&mut self, other: &'a Tensor) {
        self.assert_same_shape(other, Operator::MulAssign);
        self.data *= &other.data;
    }
}

impl MulAssign for Tensor {
    fn mul_assign(&mut self, other: Tensor) {
        *self *= &other;
    }
}

impl Tensor {
    /// 原地执行`self += alpha * other`（类似PyTorch的`add_(other, alpha=alpha)`）
    pub fn scaled_add_mut(&mut self, alpha: f32, other: &Tensor) {
        self.assert_same_shape(other, Operator::AddAssign);
        self.data.scaled_add(alpha, &other.data);
    }
}

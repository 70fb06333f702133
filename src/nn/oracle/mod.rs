/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : 微分预言机（differentiation oracle）：为Hessian对角估计提供Hessian-向量积。
 *                 真正的自动微分引擎不在本库范围内，这里只定义接口并提供两个参考实现：
 *                 - `QuadraticLoss`：二次损失，Hessian为常数矩阵，结果精确；
 *                 - `FiniteDifferenceOracle`：对任意梯度函数做中心差分。
 */

mod finite_difference;
mod quadratic;

pub use finite_difference::FiniteDifferenceOracle;
pub use quadratic::QuadraticLoss;

use crate::nn::{OptimizerError, ParamId, ParameterStore};
use crate::tensor::Tensor;

/// 微分预言机
///
/// 对当前的梯度（损失对参数的一阶导）再求一次方向导数，
/// 即对每个参数返回`H·z`，其中`z`为该参数对应的探测方向。
///
/// 需要在多次调用间保留中间计算结果的实现（如带计算图的自动微分引擎），
/// 应通过内部可变性（`RefCell`等）管理自身状态。
pub trait HessianOracle {
    /// 计算Hessian-向量积
    ///
    /// # 参数
    /// - `store`: 参数存储，用于读取当前参数值
    /// - `params`: 需要求导的参数
    /// - `directions`: 与`params`一一对应、形状相同的探测方向
    /// - `retain_graph`: 调用方之后是否还会对同一批量再次求导；
    ///   为`false`时实现可以释放中间结果
    ///
    /// # 返回
    /// 与`params`一一对应的`H·z`；未出现在`params`中的参数视为方向分量为零
    fn hessian_vector_product(
        &self,
        store: &ParameterStore,
        params: &[ParamId],
        directions: &[Tensor],
        retain_graph: bool,
    ) -> Result<Vec<Tensor>, OptimizerError>;
}

/// 校验`params`与`directions`数量一致、且每个方向与对应参数形状一致
pub(crate) fn check_directions(
    store: &ParameterStore,
    params: &[ParamId],
    directions: &[Tensor],
) -> Result<(), OptimizerError> {
    if params.len() != directions.len() {
        return Err(OptimizerError::DimensionMismatch {
            expected: params.len(),
            got: directions.len(),
        });
    }
    for (&id, direction) in params.iter().zip(directions) {
        let value = store.value(id)?;
        if !value.is_same_shape(direction) {
            return Err(OptimizerError::ShapeMismatch {
                expected: value.shape().to_vec(),
                got: direction.shape().to_vec(),
                message: format!("参数{id}的探测方向须与参数值形状一致"),
            });
        }
    }
    Ok(())
}

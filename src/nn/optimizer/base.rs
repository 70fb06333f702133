/*
 * @Author       : 老董
 * @Date         : 2025-07-24 16:00:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-19
 * @Description  : 优化器基础trait和参数组
 */

use crate::nn::oracle::HessianOracle;
use crate::nn::{OptimizerError, ParamId, ParameterStore};

/// 损失闭包：重新计算损失并（作为副作用）写入所有参数的梯度，返回损失值
pub type LossClosure<'a> = &'a mut dyn FnMut(&mut ParameterStore) -> Result<f32, OptimizerError>;

/// 优化器核心 trait
pub trait Optimizer {
    /// 参数更新
    ///
    /// `PyTorch` 风格训练循环：
    /// ```ignore
    /// optimizer.zero_grad(&mut store)?;
    /// // 外部计算梯度并写入 store……
    /// optimizer.step(&mut store, &oracle, None)?;
    ///
    /// // 或者交给闭包计算梯度，step 返回闭包给出的损失值
    /// let loss = optimizer.step(&mut store, &oracle, Some(&mut |s| loss_fn.populate_gradients(s)))?;
    /// ```
    ///
    /// 未提供闭包时直接使用参数已有的梯度，并返回`None`
    fn step(
        &mut self,
        store: &mut ParameterStore,
        oracle: &dyn HessianOracle,
        closure: Option<LossClosure<'_>>,
    ) -> Result<Option<f32>, OptimizerError>;

    /// 清除优化器绑定的所有参数的梯度
    fn zero_grad(&self, store: &mut ParameterStore) -> Result<(), OptimizerError>;

    /// 获取学习率（第一个参数组）
    fn learning_rate(&self) -> f32;

    /// 设置所有参数组的学习率（不影响权重衰减所用的学习率）
    fn set_learning_rate(&mut self, lr: f32);

    /// 重置累积状态（动量、步数等）
    fn reset(&mut self);
}

/// 参数组：同组参数共用一个学习率
///
/// 用于需要分别设置学习率的场景，如：
/// - 迁移学习（底层小学习率）
/// - 分层学习率
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGroup {
    pub(crate) params: Vec<ParamId>,
    pub(crate) lr: f32,
}

impl ParamGroup {
    pub fn params(&self) -> &[ParamId] {
        &self.params
    }

    pub const fn lr(&self) -> f32 {
        self.lr
    }
}

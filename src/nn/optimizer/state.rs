/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : 每个参数独占的优化器状态（动量、Hessian动量、Hessian对角累加器）
 */

use std::collections::HashMap;

use crate::nn::{OptimizerError, ParamId};
use crate::tensor::Tensor;

/// 单个参数的优化器状态，所有缓冲区与参数同形状，构造时全零
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterState {
    /// 梯度的EMA
    pub(crate) momentum: Tensor,
    /// Hessian对角估计的EMA
    pub(crate) hessian_momentum: Tensor,
    /// 本步的Hessian对角估计（每步开始时清零后重新累加）
    pub(crate) hessian: Tensor,
}

impl ParameterState {
    pub(crate) fn zeros(shape: &[usize]) -> Self {
        Self {
            momentum: Tensor::zeros(shape),
            hessian_momentum: Tensor::zeros(shape),
            hessian: Tensor::zeros(shape),
        }
    }

    pub const fn momentum(&self) -> &Tensor {
        &self.momentum
    }

    pub const fn hessian_momentum(&self) -> &Tensor {
        &self.hessian_momentum
    }

    pub const fn hessian(&self) -> &Tensor {
        &self.hessian
    }

    fn reset(&mut self) {
        self.momentum.fill_zero_mut();
        self.hessian_momentum.fill_zero_mut();
        self.hessian.fill_zero_mut();
    }
}

/// 参数标识到其状态的独占映射，不同参数的状态之间互不共享缓冲区
#[derive(Debug, Clone, Default)]
pub(crate) struct StateStore {
    states: HashMap<ParamId, ParameterState>,
}

impl StateStore {
    pub(crate) fn contains(&self, id: ParamId) -> bool {
        self.states.contains_key(&id)
    }

    pub(crate) fn insert_zeros(&mut self, id: ParamId, shape: &[usize]) {
        self.states.insert(id, ParameterState::zeros(shape));
    }

    pub(crate) fn get(&self, id: ParamId) -> Result<&ParameterState, OptimizerError> {
        self.states.get(&id).ok_or(OptimizerError::ParamNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: ParamId) -> Result<&mut ParameterState, OptimizerError> {
        self.states
            .get_mut(&id)
            .ok_or(OptimizerError::ParamNotFound(id))
    }

    /// 将所有Hessian对角累加器清零
    pub(crate) fn zero_hessian(&mut self) {
        for state in self.states.values_mut() {
            state.hessian.fill_zero_mut();
        }
    }

    /// 将所有缓冲区清零
    pub(crate) fn reset(&mut self) {
        for state in self.states.values_mut() {
            state.reset();
        }
    }
}

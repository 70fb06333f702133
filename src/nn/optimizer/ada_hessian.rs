/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : AdaHessian优化器：用Hutchinson方法随机估计Hessian对角，
 *                 对梯度和Hessian对角分别做带偏差修正的EMA，再按牛顿式规则更新参数
 */

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::base::{LossClosure, Optimizer, ParamGroup};
use super::config::{AdaHessianConfig, check};
use super::control_variate::DifferentiatedValues;
use super::hessian::HutchinsonEstimator;
use super::moments::{BiasCorrection, denominator, update_moments};
use super::state::{ParameterState, StateStore};
use crate::errors::ComparisonOperator;
use crate::nn::oracle::HessianOracle;
use crate::nn::{NumericQuantity, OptimizerError, ParamId, ParameterStore};
use crate::tensor::Tensor;

/// AdaHessian 优化器
///
/// 每步：
/// - h ≈ diag(H)（Hutchinson，`mc_iters`次采样）
/// - m = β0·m + (1 − β0)·g
/// - v = β1·v + (1 − β1)·h
/// - θ = θ·(1 − wd·lr)（解耦权重衰减，lr取配置中的学习率，wd为0时跳过）
/// - θ = θ − lr·bc0·m / (sqrt(|v| / bc1) + ε)
///
/// # 使用示例
/// ```ignore
/// let config = AdaHessianConfig::default().with_lr(0.1).with_seed(42);
/// let mut optimizer = AdaHessian::new(&store, &[w], config)?;
/// let loss = optimizer.step(&mut store, &problem, Some(&mut |s| problem.populate_gradients(s)))?;
/// ```
#[derive(Debug, Clone)]
pub struct AdaHessian {
    config: AdaHessianConfig,
    groups: Vec<ParamGroup>,
    states: StateStore,
    estimator: HutchinsonEstimator,
    rng: StdRng,
    /// 已完成的步数，所有参数共用
    n_steps: usize,
}

impl AdaHessian {
    /// 创建优化器，`params`组成第一个参数组，学习率取`config.lr`。
    /// 各参数的状态在此时按参数形状全零初始化
    pub fn new(
        store: &ParameterStore,
        params: &[ParamId],
        config: AdaHessianConfig,
    ) -> Result<Self, OptimizerError> {
        config.validate()?;
        let estimator = HutchinsonEstimator::new(config.mc_iters, config.probe)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut optimizer = Self {
            config,
            groups: Vec::new(),
            states: StateStore::default(),
            estimator,
            rng,
            n_steps: 0,
        };
        optimizer.add_param_group(store, params, None)?;
        log::info!(
            "创建AdaHessian优化器：{}个参数，lr={}，betas={:?}，mc_iters={}，control_variate={}",
            params.len(),
            optimizer.config.lr,
            optimizer.config.betas,
            optimizer.config.mc_iters,
            optimizer.config.control_variate
        );
        Ok(optimizer)
    }

    /// 新增一个参数组；`lr`为`None`时使用配置中的学习率
    pub fn add_param_group(
        &mut self,
        store: &ParameterStore,
        params: &[ParamId],
        lr: Option<f32>,
    ) -> Result<(), OptimizerError> {
        if params.is_empty() {
            return Err(OptimizerError::EmptyParamGroup);
        }
        let lr = lr.unwrap_or(self.config.lr);
        check("lr", lr, ComparisonOperator::GreaterThan, 0.0)?;

        let mut shapes = Vec::with_capacity(params.len());
        for (i, &id) in params.iter().enumerate() {
            if self.states.contains(id) || params[..i].contains(&id) {
                return Err(OptimizerError::DuplicateParam(id));
            }
            shapes.push(store.value(id)?.shape().to_vec());
        }
        for (&id, shape) in params.iter().zip(&shapes) {
            self.states.insert_zeros(id, shape);
        }
        self.groups.push(ParamGroup {
            params: params.to_vec(),
            lr,
        });
        log::info!("新增参数组#{}：{}个参数，lr={lr}", self.groups.len() - 1, params.len());
        Ok(())
    }

    /// 所有参数组中的参数（按组、组内顺序）
    pub fn params(&self) -> Vec<ParamId> {
        self.groups
            .iter()
            .flat_map(|group| group.params.iter().copied())
            .collect()
    }

    pub fn param_groups(&self) -> &[ParamGroup] {
        &self.groups
    }

    pub const fn config(&self) -> &AdaHessianConfig {
        &self.config
    }

    /// 已完成的步数
    pub const fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// 获取指定参数的优化器状态
    ///
    /// 用于调试和可视化优化过程
    pub fn state(&self, id: ParamId) -> Result<&ParameterState, OptimizerError> {
        self.states.get(id)
    }

    /// 获取指定参数本步的Hessian对角估计
    pub fn hessian(&self, id: ParamId) -> Result<&Tensor, OptimizerError> {
        Ok(self.states.get(id)?.hessian())
    }

    /// 将所有参数的Hessian对角累加器清零
    pub fn zero_hessian(&mut self) {
        self.states.zero_hessian();
    }

    /// 运行（可选的）控制变量与Hutchinson估计，把估计结果累加进各参数的Hessian对角累加器。
    /// 所有参数都须已有梯度
    pub fn set_hessian<O: HessianOracle + ?Sized>(
        &mut self,
        store: &ParameterStore,
        oracle: &O,
    ) -> Result<(), OptimizerError> {
        let params = self.params();
        let vals = DifferentiatedValues::adjust(
            self.config.control_variate,
            &self.states,
            &params,
            self.config.betas.1,
        )?;
        let estimates = self
            .estimator
            .estimate(oracle, store, &params, &vals, &mut self.rng)?;
        for (&id, estimate) in params.iter().zip(&estimates) {
            self.states.get_mut(id)?.hessian += estimate;
        }
        Ok(())
    }

    /// 所有参数都须有梯度，且梯度中不能有非有限值
    fn check_gradients(&self, store: &ParameterStore) -> Result<(), OptimizerError> {
        for id in self.params() {
            let grad = store.grad(id)?.ok_or(OptimizerError::MissingGradient(id))?;
            if !grad.all_finite() {
                return Err(OptimizerError::NonFiniteValue {
                    param: id,
                    quantity: NumericQuantity::Gradient,
                });
            }
        }
        Ok(())
    }

    fn check_hessian(&self) -> Result<(), OptimizerError> {
        for id in self.params() {
            if !self.states.get(id)?.hessian().all_finite() {
                return Err(OptimizerError::NonFiniteValue {
                    param: id,
                    quantity: NumericQuantity::HessianDiagonal,
                });
            }
        }
        Ok(())
    }
}

impl Optimizer for AdaHessian {
    fn step(
        &mut self,
        store: &mut ParameterStore,
        oracle: &dyn HessianOracle,
        closure: Option<LossClosure<'_>>,
    ) -> Result<Option<f32>, OptimizerError> {
        let loss = match closure {
            Some(closure) => Some(closure(store)?),
            None => None,
        };
        self.check_gradients(store)?;

        self.zero_hessian();
        self.set_hessian(store, oracle)?;
        self.check_hessian()?;

        // 步数只在Hessian估计通过数值检查后推进
        self.n_steps += 1;
        let betas = self.config.betas;
        let bias_correction = BiasCorrection::at_step(self.n_steps, betas);
        log::debug!(
            "AdaHessian第{}步：bc0={}，bc1={}",
            self.n_steps,
            bias_correction.first,
            bias_correction.second
        );

        // 权重衰减始终使用配置中的学习率，不随参数组或`set_learning_rate`变化
        let decay = 1.0 - self.config.weight_decay * self.config.lr;
        let weight_decay = self.config.weight_decay;
        let eps = self.config.eps;
        for group in &self.groups {
            let step_size = group.lr * bias_correction.first;
            for &id in &group.params {
                if weight_decay != 0.0 {
                    *store.value_mut(id)? *= decay;
                }

                let state = self.states.get_mut(id)?;
                let grad = store.grad(id)?.ok_or(OptimizerError::MissingGradient(id))?;
                update_moments(state, grad, betas);

                let denom = denominator(&state.hessian_momentum, bias_correction.second, eps);
                let update = &state.momentum / &denom;
                store.value_mut(id)?.scaled_add_mut(-step_size, &update);
            }
        }

        Ok(loss)
    }

    fn zero_grad(&self, store: &mut ParameterStore) -> Result<(), OptimizerError> {
        store.zero_grad(&self.params())
    }

    fn learning_rate(&self) -> f32 {
        self.groups.first().map_or(self.config.lr, |group| group.lr)
    }

    fn set_learning_rate(&mut self, lr: f32) {
        for group in &mut self.groups {
            group.lr = lr;
        }
    }

    fn reset(&mut self) {
        self.states.reset();
        self.n_steps = 0;
    }
}

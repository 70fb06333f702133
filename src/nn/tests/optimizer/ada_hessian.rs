/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : AdaHessian 优化器测试
 */

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2, array};

use crate::assert_err;
use crate::nn::optimizer::{AdaHessian, AdaHessianConfig, Gaussian, Optimizer, Rademacher};
use crate::nn::{
    FiniteDifferenceOracle, NumericQuantity, OptimizerError, ParamId, ParameterStore,
    QuadraticLoss,
};
use crate::tensor::Tensor;

/// 标量参数p=1，损失½p²（Hessian恒为1），梯度由外部设为2
fn scalar_setup() -> (ParameterStore, ParamId, QuadraticLoss) {
    let mut store = ParameterStore::new();
    let p = store.new_parameter(Tensor::new(&[1.0], &[1]), Some("p"));
    store.set_grad(p, Tensor::new(&[2.0], &[1])).unwrap();
    let problem = QuadraticLoss::new(&store, &[p], array![[1.0]], array![0.0]).unwrap();
    (store, p, problem)
}

fn rademacher_config() -> AdaHessianConfig {
    AdaHessianConfig::default()
        .with_control_variate(false)
        .with_probe(Rademacher)
        .with_seed(0)
}

fn scalar(store: &ParameterStore, id: ParamId) -> f32 {
    store.value(id).unwrap().number().unwrap()
}

#[test]
fn test_two_steps_by_hand() {
    let (mut store, p, problem) = scalar_setup();
    let mut optimizer = AdaHessian::new(&store, &[p], rademacher_config()).unwrap();

    // 第1步：bc0=0.1，bc1=0.001，m=0.2，v=0.001，分母≈1，更新量=1e-3·0.1·0.2
    let loss = optimizer.step(&mut store, &problem, None).unwrap();
    assert_eq!(loss, None);
    assert_eq!(optimizer.n_steps(), 1);
    let state = optimizer.state(p).unwrap();
    assert_abs_diff_eq!(state.hessian().number().unwrap(), 1.0);
    assert_abs_diff_eq!(state.momentum().number().unwrap(), 0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(state.hessian_momentum().number().unwrap(), 0.001, epsilon = 1e-7);
    assert_abs_diff_eq!(scalar(&store, p), 0.99998, epsilon = 1e-6);

    // 第2步：bc0=0.19，bc1=0.001999，m=0.38，v=0.001999，更新量=1e-3·0.19·0.38
    optimizer.step(&mut store, &problem, None).unwrap();
    assert_eq!(optimizer.n_steps(), 2);
    let state = optimizer.state(p).unwrap();
    assert_abs_diff_eq!(state.momentum().number().unwrap(), 0.38, epsilon = 1e-6);
    assert_abs_diff_eq!(state.hessian_momentum().number().unwrap(), 0.001999, epsilon = 1e-7);
    assert_abs_diff_eq!(scalar(&store, p), 0.9999078, epsilon = 1e-6);
}

#[test]
fn test_control_variate_uses_hessian_momentum_snapshot() {
    let (mut store, p, problem) = scalar_setup();
    let config = rademacher_config().with_control_variate(true);
    let mut optimizer = AdaHessian::new(&store, &[p], config).unwrap();

    // 第1步Hessian动量为零，控制变量不起作用
    optimizer.step(&mut store, &problem, None).unwrap();
    assert_abs_diff_eq!(optimizer.hessian(p).unwrap().number().unwrap(), 1.0);

    // 第2步基线为β1·v = 0.999·0.001，估计值为 1 − 0.000999
    optimizer.step(&mut store, &problem, None).unwrap();
    assert_abs_diff_eq!(
        optimizer.hessian(p).unwrap().number().unwrap(),
        0.999001,
        epsilon = 1e-6
    );
}

#[test]
fn test_weight_decay() {
    let (mut store, p, problem) = scalar_setup();
    let config = rademacher_config().with_weight_decay(0.1);
    let mut optimizer = AdaHessian::new(&store, &[p], config).unwrap();

    // p·(1 − 0.1·1e-3) − 2e-5
    optimizer.step(&mut store, &problem, None).unwrap();
    assert_abs_diff_eq!(scalar(&store, p), 0.99988, epsilon = 1e-6);
}

#[test]
fn test_weight_decay_uses_config_learning_rate() {
    let mut store = ParameterStore::new();
    let w = store.new_parameter(Tensor::new(&[1.0], &[1]), Some("w"));
    let b = store.new_parameter(Tensor::new(&[1.0], &[1]), Some("b"));
    // 梯度为零，参数只受权重衰减影响
    store.set_grad(w, Tensor::zeros(&[1])).unwrap();
    store.set_grad(b, Tensor::zeros(&[1])).unwrap();
    let a: Array2<f32> = Array2::eye(2);
    let problem = QuadraticLoss::new(&store, &[w, b], a, Array1::zeros(2)).unwrap();

    let config = rademacher_config().with_weight_decay(0.1);
    let mut optimizer = AdaHessian::new(&store, &[w], config).unwrap();
    optimizer.add_param_group(&store, &[b], Some(0.5)).unwrap();

    // 两组都按 1 − 0.1·1e-3 衰减，与各组学习率无关
    optimizer.step(&mut store, &problem, None).unwrap();
    assert_abs_diff_eq!(scalar(&store, w), 0.9999, epsilon = 1e-6);
    assert_abs_diff_eq!(scalar(&store, b), 0.9999, epsilon = 1e-6);

    // 修改学习率同样不影响衰减系数
    optimizer.set_learning_rate(0.2);
    optimizer.step(&mut store, &problem, None).unwrap();
    assert_abs_diff_eq!(scalar(&store, b), 0.9999 * 0.9999, epsilon = 1e-6);
}

#[test]
fn test_zero_weight_decay_leaves_parameters_untouched_by_decay() {
    let (mut store1, p1, problem1) = scalar_setup();
    let (mut store2, p2, problem2) = scalar_setup();
    let mut optimizer1 = AdaHessian::new(&store1, &[p1], rademacher_config()).unwrap();
    let mut optimizer2 =
        AdaHessian::new(&store2, &[p2], rademacher_config().with_weight_decay(0.0)).unwrap();

    for _ in 0..3 {
        optimizer1.step(&mut store1, &problem1, None).unwrap();
        optimizer2.step(&mut store2, &problem2, None).unwrap();
    }
    assert_eq!(scalar(&store1, p1).to_bits(), scalar(&store2, p2).to_bits());
}

#[test]
fn test_step_with_closure_returns_loss() {
    let mut store = ParameterStore::new();
    let p = store.new_parameter(Tensor::new(&[1.0], &[1]), None);
    let problem = QuadraticLoss::new(&store, &[p], array![[1.0]], array![0.0]).unwrap();
    let mut optimizer = AdaHessian::new(&store, &[p], rademacher_config()).unwrap();

    // 闭包在更新前计算损失 ½·1² 并写入梯度
    let closure = &mut |s: &mut ParameterStore| problem.populate_gradients(s);
    let loss = optimizer.step(&mut store, &problem, Some(closure)).unwrap();
    assert_eq!(loss, Some(0.5));
    assert_eq!(store.grad(p).unwrap(), Some(&Tensor::new(&[1.0], &[1])));
    assert!(scalar(&store, p) < 1.0);
}

#[test]
fn test_closure_error_propagates() {
    let (mut store, p, problem) = scalar_setup();
    let mut optimizer = AdaHessian::new(&store, &[p], rademacher_config()).unwrap();

    let closure = &mut |_: &mut ParameterStore| -> Result<f32, OptimizerError> {
        Err(OptimizerError::InvalidOperation("损失计算失败".to_string()))
    };
    assert_err!(
        optimizer.step(&mut store, &problem, Some(closure)),
        OptimizerError::InvalidOperation("损失计算失败")
    );
    assert_eq!(optimizer.n_steps(), 0);
}

#[test]
fn test_missing_gradient() {
    let mut store = ParameterStore::new();
    let p = store.new_parameter(Tensor::new(&[1.0], &[1]), None);
    let problem = QuadraticLoss::new(&store, &[p], array![[1.0]], array![0.0]).unwrap();
    let mut optimizer = AdaHessian::new(&store, &[p], rademacher_config()).unwrap();

    assert_err!(
        optimizer.step(&mut store, &problem, None),
        OptimizerError::MissingGradient(p)
    );
    assert_eq!(optimizer.n_steps(), 0);
    assert_eq!(scalar(&store, p), 1.0);
}

#[test]
fn test_non_finite_gradient_leaves_everything_untouched() {
    let (mut store, p, problem) = scalar_setup();
    let mut optimizer = AdaHessian::new(&store, &[p], rademacher_config()).unwrap();
    store.set_grad(p, Tensor::new(&[f32::NAN], &[1])).unwrap();

    assert_err!(
        optimizer.step(&mut store, &problem, None),
        OptimizerError::NonFiniteValue {
            param,
            quantity: NumericQuantity::Gradient,
        } if *param == p
    );
    assert_eq!(optimizer.n_steps(), 0);
    assert_eq!(scalar(&store, p), 1.0);
    assert_eq!(optimizer.state(p).unwrap().momentum(), &Tensor::zeros(&[1]));
}

#[test]
fn test_non_finite_hessian_does_not_advance_step() {
    let (mut store, p, _) = scalar_setup();
    let oracle = FiniteDifferenceOracle::new(&[p], |xs: &[Tensor]| {
        xs.iter().map(|x| Tensor::new(&[f32::INFINITY], x.shape())).collect()
    });
    let mut optimizer = AdaHessian::new(&store, &[p], rademacher_config()).unwrap();

    assert_err!(
        optimizer.step(&mut store, &oracle, None),
        OptimizerError::NonFiniteValue {
            quantity: NumericQuantity::HessianDiagonal,
            ..
        }
    );
    assert_eq!(optimizer.n_steps(), 0);
    assert_eq!(scalar(&store, p), 1.0);
    assert_eq!(optimizer.state(p).unwrap().hessian_momentum(), &Tensor::zeros(&[1]));
}

#[test]
fn test_same_seed_is_deterministic() {
    let run = || {
        let mut store = ParameterStore::new();
        let w = store.new_parameter(Tensor::new(&[1.0, -1.0, 0.5], &[3]), None);
        let a = array![[2.0, 0.5, 0.0], [0.5, 3.0, 0.5], [0.0, 0.5, 4.0]];
        let problem = QuadraticLoss::new(&store, &[w], a, array![1.0, 0.0, -1.0]).unwrap();
        let config = AdaHessianConfig::default()
            .with_lr(0.1)
            .with_mc_iters(2)
            .with_probe(Gaussian)
            .with_seed(42);
        let mut optimizer = AdaHessian::new(&store, &[w], config).unwrap();
        for _ in 0..5 {
            let closure = &mut |s: &mut ParameterStore| problem.populate_gradients(s);
            optimizer.step(&mut store, &problem, Some(closure)).unwrap();
        }
        (
            store.value(w).unwrap().clone(),
            optimizer.state(w).unwrap().clone(),
        )
    };
    let (value1, state1) = run();
    let (value2, state2) = run();
    assert_eq!(value1, value2);
    assert_eq!(state1.momentum(), state2.momentum());
    assert_eq!(state1.hessian_momentum(), state2.hessian_momentum());
    assert_eq!(state1.hessian(), state2.hessian());
}

#[test]
fn test_param_groups() {
    let mut store = ParameterStore::new();
    let w = store.new_parameter(Tensor::new(&[1.0], &[1]), Some("w"));
    let b = store.new_parameter(Tensor::new(&[1.0], &[1]), Some("b"));
    store.set_grad(w, Tensor::new(&[2.0], &[1])).unwrap();
    store.set_grad(b, Tensor::new(&[2.0], &[1])).unwrap();
    let a: Array2<f32> = Array2::eye(2);
    let problem = QuadraticLoss::new(&store, &[w, b], a, Array1::zeros(2)).unwrap();

    let mut optimizer = AdaHessian::new(&store, &[w], rademacher_config()).unwrap();
    optimizer.add_param_group(&store, &[b], Some(2e-3)).unwrap();
    assert_eq!(optimizer.params(), vec![w, b]);
    assert_eq!(optimizer.param_groups().len(), 2);
    assert_eq!(optimizer.param_groups()[0].params(), &[w]);
    assert_eq!(optimizer.param_groups()[1].lr(), 2e-3);
    assert_eq!(optimizer.learning_rate(), 1e-3);

    // 两组的更新量与各自学习率成正比
    optimizer.step(&mut store, &problem, None).unwrap();
    assert_abs_diff_eq!(scalar(&store, w), 0.99998, epsilon = 1e-6);
    assert_abs_diff_eq!(scalar(&store, b), 0.99996, epsilon = 1e-6);

    optimizer.set_learning_rate(0.5);
    assert!(optimizer.param_groups().iter().all(|group| group.lr() == 0.5));
    assert_eq!(optimizer.learning_rate(), 0.5);
    // 配置中的学习率保持不变
    assert_eq!(optimizer.config().lr, 1e-3);
}

#[test]
fn test_invalid_param_groups() {
    let mut store = ParameterStore::new();
    let w = store.new_parameter(Tensor::zeros(&[2]), None);
    let b = store.new_parameter(Tensor::zeros(&[1]), None);

    assert_err!(
        AdaHessian::new(&store, &[], AdaHessianConfig::default()),
        OptimizerError::EmptyParamGroup
    );
    assert_err!(
        AdaHessian::new(&store, &[w, w], AdaHessianConfig::default()),
        OptimizerError::DuplicateParam(w)
    );
    assert_err!(
        AdaHessian::new(&store, &[ParamId(9)], AdaHessianConfig::default()),
        OptimizerError::ParamNotFound(ParamId(9))
    );
    assert_err!(
        AdaHessian::new(&store, &[w], AdaHessianConfig::default().with_betas(0.9, 1.5)),
        OptimizerError::ValueMustSatisfyComparison { value_name, .. } if value_name == "beta1"
    );

    let mut optimizer = AdaHessian::new(&store, &[w], AdaHessianConfig::default()).unwrap();
    assert_err!(
        optimizer.add_param_group(&store, &[b, w], None),
        OptimizerError::DuplicateParam(w)
    );
    assert_err!(
        optimizer.add_param_group(&store, &[b], Some(0.0)),
        OptimizerError::ValueMustSatisfyComparison { value_name, .. } if value_name == "lr"
    );
    // 失败的新增不会留下任何状态
    assert_eq!(optimizer.params(), vec![w]);
    assert_err!(optimizer.state(b), OptimizerError::ParamNotFound(b));
}

#[test]
fn test_set_hessian_accumulates_until_zeroed() {
    let (store, p, problem) = scalar_setup();
    let mut optimizer = AdaHessian::new(&store, &[p], rademacher_config()).unwrap();

    optimizer.set_hessian(&store, &problem).unwrap();
    optimizer.set_hessian(&store, &problem).unwrap();
    assert_eq!(optimizer.hessian(p).unwrap(), &Tensor::new(&[2.0], &[1]));

    optimizer.zero_hessian();
    assert_eq!(optimizer.hessian(p).unwrap(), &Tensor::zeros(&[1]));
    // 单独估计Hessian不推进步数
    assert_eq!(optimizer.n_steps(), 0);
}

#[test]
fn test_reset() {
    let (mut store, p, problem) = scalar_setup();
    let mut optimizer = AdaHessian::new(&store, &[p], rademacher_config()).unwrap();
    optimizer.step(&mut store, &problem, None).unwrap();
    optimizer.step(&mut store, &problem, None).unwrap();

    optimizer.reset();
    assert_eq!(optimizer.n_steps(), 0);
    let state = optimizer.state(p).unwrap();
    assert_eq!(state.momentum(), &Tensor::zeros(&[1]));
    assert_eq!(state.hessian_momentum(), &Tensor::zeros(&[1]));

    // 重置后的第一步与全新优化器的第一步相同
    let before = scalar(&store, p);
    optimizer.step(&mut store, &problem, None).unwrap();
    assert_abs_diff_eq!(before - scalar(&store, p), 2e-5, epsilon = 2e-7);
}

#[test]
fn test_zero_grad() {
    let (mut store, p, _) = scalar_setup();
    let optimizer = AdaHessian::new(&store, &[p], rademacher_config()).unwrap();
    optimizer.zero_grad(&mut store).unwrap();
    assert!(store.grad(p).unwrap().is_none());
}

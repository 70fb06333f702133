use approx::assert_abs_diff_eq;

use crate::nn::optimizer::BiasCorrection;

#[test]
fn test_bias_correction_first_steps() {
    let bc = BiasCorrection::at_step(1, (0.9, 0.999));
    assert_abs_diff_eq!(bc.first, 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(bc.second, 0.001, epsilon = 1e-6);

    let bc = BiasCorrection::at_step(2, (0.9, 0.999));
    assert_abs_diff_eq!(bc.first, 0.19, epsilon = 1e-6);
    assert_abs_diff_eq!(bc.second, 0.001999, epsilon = 1e-6);
}

#[test]
fn test_bias_correction_approaches_one() {
    let bc = BiasCorrection::at_step(100_000, (0.9, 0.999));
    assert_abs_diff_eq!(bc.first, 1.0);
    assert_abs_diff_eq!(bc.second, 1.0, epsilon = 1e-6);

    // 系数单调递增且不超过1
    let mut previous = BiasCorrection::at_step(1, (0.9, 0.999));
    for step in 2..50 {
        let bc = BiasCorrection::at_step(step, (0.9, 0.999));
        assert!(bc.first > previous.first && bc.first <= 1.0);
        assert!(bc.second > previous.second && bc.second <= 1.0);
        previous = bc;
    }
}

#[test]
fn test_bias_correction_with_huge_step() {
    // 超出i32范围的步数按i32::MAX计，系数不会变号
    let bc = BiasCorrection::at_step(usize::MAX, (0.9, 0.999));
    assert_eq!(bc, BiasCorrection { first: 1.0, second: 1.0 });
    let bc = BiasCorrection::at_step(i32::MAX as usize + 1, (0.9, 0.999));
    assert!(bc.first > 0.0 && bc.second > 0.0);
}

#[test]
fn test_bias_correction_with_zero_betas() {
    // β为0时不需要修正
    let bc = BiasCorrection::at_step(1, (0.0, 0.0));
    assert_eq!(bc, BiasCorrection { first: 1.0, second: 1.0 });
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-19
 * @Description  : 随机张量。所有方法都显式接收随机数生成器，便于用固定种子复现结果
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Tensor;

impl Tensor {
    /// 创建一个服从正态分布的随机张量（Box-Muller变换）。
    /// 若为标量，shape可以是[]、[1,1]、[1,1,1]...；
    /// 若为向量，shape可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，shape可以是[n,m]。
    pub fn normal_with_rng(mean: f32, std_dev: f32, shape: &[usize], rng: &mut StdRng) -> Tensor {
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);

        while data.len() < data_len {
            // `gen`取值于[0, 1)，取1-u避免ln(0)
            let u1: f32 = 1.0 - rng.r#gen::<f32>();
            let u2: f32 = rng.r#gen();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            let z0 = mean + std_dev * r * theta.cos();
            let z1 = mean + std_dev * r * theta.sin();

            if z0.is_finite() {
                data.push(z0);
            }
            if data.len() < data_len && z1.is_finite() {
                data.push(z1);
            }
        }

        Tensor::new(&data, shape)
    }

    /// 同`normal_with_rng`，但使用给定种子
    pub fn normal_seeded(mean: f32, std_dev: f32, shape: &[usize], seed: u64) -> Tensor {
        let mut rng = StdRng::seed_from_u64(seed);
        Tensor::normal_with_rng(mean, std_dev, shape, &mut rng)
    }

    /// 创建一个Rademacher随机张量：每个元素以相同概率取+1或-1
    pub fn rademacher_with_rng(shape: &[usize], rng: &mut StdRng) -> Tensor {
        let data_len = shape.iter().product::<usize>();
        let data = (0..data_len)
            .map(|_| if rng.r#gen::<bool>() { 1.0 } else { -1.0 })
            .collect::<Vec<_>>();
        Tensor::new(&data, shape)
    }
}

//! # Only Hessian
//!
//! `only_hessian`以[only_torch](https://github.com/dbsxdbsx/only_torch)的张量与优化器为基础，
//! 用纯rust实现[AdaHessian](https://arxiv.org/abs/2006.00719)二阶优化器：
//! 通过Hutchinson方法随机估计Hessian对角，再结合带偏差修正的EMA做牛顿式参数更新。
//!

pub mod errors;
pub mod nn;
pub mod tensor;
pub mod utils;

mod optimizer; // 优化器测试模块（包含 config, hessian, control_variate, moments, ada_hessian 子模块）

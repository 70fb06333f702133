mod ada_hessian;
mod moments;

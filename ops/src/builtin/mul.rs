use core_types::{Backend, TensorDesc};

use crate::op::RegistrationRecord;
use crate::register_kernel;
use crate::types::{FusionType, OpError, ParamType};


/// "Mul" on CPU: elementwise x * y
pub fn mul_cpu() -> Result<RegistrationRecord, OpError> {
    let f32d = TensorDesc::of::<f32>();
    let i32d = TensorDesc::of::<i32>();
    RegistrationRecord::builder("Mul", Backend::Cpu)
        .fusion_type(FusionType::ElemWise)
        .input("x", ParamType::Required)
        .input("y", ParamType::Required)
        .output("output", ParamType::Required)
        .dtype_format([f32d, f32d, f32d])
        .dtype_format([i32d, i32d, i32d])
        .build()
}

register_kernel!("Mul", Backend::Cpu, mul_cpu);

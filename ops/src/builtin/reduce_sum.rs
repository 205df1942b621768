use core_types::{Backend, DataType, TensorDesc};

use crate::attrs::{AttrKind, AttrSpec};
use crate::op::RegistrationRecord;
use crate::register_kernel;
use crate::types::{FusionType, OpError, ParamType};


/// "ReduceSum" on CPU: x reduced over the constant `axis` input
pub fn reduce_sum_cpu() -> Result<RegistrationRecord, OpError> {
    let i64d = TensorDesc::of::<i64>();
    [DataType::F32, DataType::F64, DataType::I32, DataType::I64]
        .into_iter()
        .fold(
            RegistrationRecord::builder("ReduceSum", Backend::Cpu)
                .fusion_type(FusionType::CommReduce)
                .attr(AttrSpec::optional("keep_dims", AttrKind::Bool, false))
                .input("x", ParamType::Required)
                .input("axis", ParamType::Optional)
                .output("y", ParamType::Required),
            |b, dt| b.dtype_format([dt.default_layout(), i64d, dt.default_layout()]),
        )
        .build()
}

register_kernel!("ReduceSum", Backend::Cpu, reduce_sum_cpu);

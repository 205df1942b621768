use core_types::{Backend, DataType};

use crate::attrs::{AttrKind, AttrSpec};
use crate::op::RegistrationRecord;
use crate::register_kernel;
use crate::types::{OpError, ParamType};


/// "Squeeze" on CPU. `axis` is one dimension or a list of them; the empty
/// list squeezes every unit dimension.
pub fn squeeze_cpu() -> Result<RegistrationRecord, OpError> {
    [DataType::F16, DataType::F32, DataType::I32, DataType::Bool]
        .into_iter()
        .fold(
            RegistrationRecord::builder("Squeeze", Backend::Cpu)
                .attr(AttrSpec::optional("axis", AttrKind::Int, Vec::<i64>::new()).or_kind(AttrKind::IntList))
                .input("x", ParamType::Required)
                .output("y", ParamType::Required),
            |b, dt| b.dtype_format([dt, dt]),
        )
        .build()
}

register_kernel!("Squeeze", Backend::Cpu, squeeze_cpu);

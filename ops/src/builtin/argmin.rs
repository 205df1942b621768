use core_types::{Backend, DataType};

use crate::attrs::{AttrKind, AttrSpec};
use crate::op::RegistrationRecord;
use crate::register_kernel;
use crate::types::{OpError, ParamType};


/// "Argmin" on CPU. Indices come back as int32 or int64, chosen by
/// `output_type`.
pub fn argmin_cpu() -> Result<RegistrationRecord, OpError> {
    let index_types = [DataType::I32, DataType::I64];
    let mut builder = RegistrationRecord::builder("Argmin", Backend::Cpu)
        .attr(AttrSpec::optional("axis", AttrKind::Int, -1i64))
        .attr(
            AttrSpec::optional("output_type", AttrKind::TypeRef, DataType::I32)
                .allowed_types(index_types),
        )
        .input("x", ParamType::Required)
        .output("output", ParamType::Required);
    for x in [DataType::F16, DataType::F32, DataType::F64] {
        for idx in index_types {
            builder = builder.dtype_format([x, idx]);
        }
    }
    builder.build()
}

register_kernel!("Argmin", Backend::Cpu, argmin_cpu);

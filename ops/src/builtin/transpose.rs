use core_types::{Backend, DataType};

use crate::op::RegistrationRecord;
use crate::register_kernel;
use crate::types::{OpError, ParamType};


/// Element types the CPU transpose kernel moves without conversion
const TRANSPOSE_TYPES: [DataType; 10] = [
    DataType::I8,
    DataType::I16,
    DataType::I32,
    DataType::I64,
    DataType::U8,
    DataType::U16,
    DataType::U32,
    DataType::U64,
    DataType::F32,
    DataType::Bool,
];

/// "Transpose" on CPU. The permutation arrives as a constant input, not an
/// attribute.
pub fn transpose_cpu() -> Result<RegistrationRecord, OpError> {
    TRANSPOSE_TYPES
        .into_iter()
        .fold(
            RegistrationRecord::builder("Transpose", Backend::Cpu)
                .input("x", ParamType::Required)
                .output("y", ParamType::Required),
            |b, dt| b.dtype_format([dt, dt]),
        )
        .build()
}

register_kernel!("Transpose", Backend::Cpu, transpose_cpu);

use core_types::{Backend, DataType, Layout};

use crate::attrs::{AttrKind, AttrSpec};
use crate::op::RegistrationRecord;
use crate::register_kernel;
use crate::types::{FusionType, OpError, ParamType};


/// "BatchToSpace" on Ascend, shipped as a prebuilt binary
pub fn batch_to_space_ascend() -> Result<RegistrationRecord, OpError> {
    let f16_5hd = DataType::F16.with(Layout::Nc1hwc0);
    RegistrationRecord::builder("BatchToSpace", Backend::Ascend)
        .fusion_type(FusionType::Opaque)
        .async_flag(false)
        .binfile_name("batch_to_space_d.so")
        .compute_cost(10)
        .kernel_name("batch_to_space_d")
        .partial_flag(true)
        .attr(AttrSpec::required("block_size", AttrKind::Int))
        .attr(AttrSpec::required("crops", AttrKind::IntListList))
        .input("x", ParamType::Required)
        .output("y", ParamType::Required)
        .dtype_format([f16_5hd, f16_5hd])
        .build()
}

register_kernel!("BatchToSpace", Backend::Ascend, batch_to_space_ascend);

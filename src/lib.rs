//! Operator kernel registry and dispatch resolver.
//!
//! Kernel modules describe what they can run with
//! [`RegistrationRecord`]s, the [`RegistryBuilder`] collects them and
//! [`finalize`](RegistryBuilder::finalize)s into a read-only [`Registry`].
//! Operator front ends check constructor arguments with [`validate`];
//! the execution layer picks a kernel for a live call with [`Resolver`].

pub use core_types::{Backend, DataType, Element, Layout, SignatureDescriptor, TensorDesc};
pub use opdispatch_exec::{
    DispatchCache, DispatchConfig, Promotion, PromotionTable, Resolved, Resolver,
};
pub use opdispatch_ops::{
    global, register_kernel, validate, AttrKind, AttrMap, AttrSpec, AttrValue, Attributes,
    AttributeSchema, FusionType, KernelHandle, KernelProps, OpError, ParamType, PortSpec,
    RecordBuilder, RegistrationRecord, Registry, RegistryBuilder, Requirement,
};

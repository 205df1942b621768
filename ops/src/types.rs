use std::fmt;
use std::sync::Arc;

use core_types::{Backend, Layout, SignatureDescriptor};
use thiserror::Error;

use crate::attrs::{AttrKind, AttrValue};

/// Opaque reference to externally supplied kernel code.
///
/// The registry never looks inside; the execution layer binds it to a
/// compiled function or a binary entry point.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KernelHandle(Arc<str>);

impl KernelHandle {
    pub fn new(symbol: impl Into<Arc<str>>) -> Self {
        Self(symbol.into())
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KernelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the graph compiler may fuse a kernel with its neighbours
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FusionType {
    #[default]
    Opaque,
    ElemWise,
    CommReduce,
    Segment,
    Convolution,
    Dynamic,
}

/// Static properties of a registered kernel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelProps {
    pub fusion_type:  FusionType,
    /// Relative cost, lower wins when several kernels match
    pub compute_cost: u32,
    pub async_flag:   bool,
    pub partial_flag: bool,
    pub binfile_name: Option<Arc<str>>,
    pub kernel_name:  Option<Arc<str>>,
}

impl Default for KernelProps {
    fn default() -> Self {
        Self {
            fusion_type:  FusionType::Opaque,
            compute_cost: 10,
            async_flag:   false,
            partial_flag: false,
            binfile_name: None,
            kernel_name:  None,
        }
    }
}

/// Whether a tensor port must be bound
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    Required,
    Optional,
    Dynamic,
}

/// A named input or output of an operator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortSpec {
    pub name:  Arc<str>,
    pub param: ParamType,
}

fn join_signatures(sigs: &[SignatureDescriptor]) -> String {
    if sigs.is_empty() {
        return "none".to_string();
    }
    sigs.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
}

/// Errors raised while registering, validating or dispatching operators
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    #[error("{backend} kernel for `{op}` declares signature {signature} more than once")]
    DuplicateSignature {
        op: String,
        backend: Backend,
        signature: SignatureDescriptor,
    },

    #[error("attribute schema of `{op}` on {backend} conflicts with the schema already registered")]
    SchemaMismatch { op: String, backend: Backend },

    #[error("{backend} kernel for `{op}` declares no signatures")]
    EmptySignatureSet { op: String, backend: Backend },

    #[error("`{op}` expects {expected} tensor slots, found {found}")]
    ArityMismatch { op: String, expected: usize, found: usize },

    #[error("{backend} cannot hold `{op}` tensors in layout {layout}")]
    UnsupportedLayout { op: String, backend: Backend, layout: Layout },

    #[error("invalid attribute schema for `{op}`: {reason}")]
    InvalidSchema { op: String, reason: String },

    #[error("`{op}` requires attribute `{attribute}`")]
    MissingRequiredAttribute { op: String, attribute: String },

    #[error("attribute `{attribute}` of `{op}` must be {expected}, got {actual}")]
    AttributeTypeError {
        op: String,
        attribute: String,
        expected: AttrKind,
        actual: AttrValue,
    },

    #[error("kernel submitted as `{declared}` on {declared_backend} builds `{op}` on {backend}")]
    FactoryMismatch {
        declared: String,
        declared_backend: Backend,
        op: String,
        backend: Backend,
    },

    #[error("`{op}` is not registered for {backend}")]
    UnregisteredOperator { op: String, backend: Backend },

    #[error("no {backend} kernel for `{op}` accepts {requested}; supported: {}", join_signatures(.supported))]
    NoMatchingKernel {
        op: String,
        backend: Backend,
        requested: SignatureDescriptor,
        supported: Vec<SignatureDescriptor>,
    },
}

use std::sync::Arc;

use core_types::{Backend, SignatureDescriptor, TensorDesc};

use crate::attrs::{AttrSpec, AttributeSchema};
use crate::types::{FusionType, KernelHandle, KernelProps, OpError, ParamType, PortSpec};


/// One kernel declared for an operator on one backend.
///
/// Immutable once built; the registry shares it behind an `Arc`.
#[derive(Debug)]
pub struct RegistrationRecord {
    name:       Arc<str>,
    backend:    Backend,
    handle:     KernelHandle,
    props:      KernelProps,
    inputs:     Vec<PortSpec>,
    outputs:    Vec<PortSpec>,
    signatures: Vec<SignatureDescriptor>,
    schema:     Arc<AttributeSchema>,
}

impl RegistrationRecord {
    pub fn builder(name: &str, backend: Backend) -> RecordBuilder {
        RecordBuilder::new(name, backend)
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn backend(&self) -> Backend { self.backend }

    pub fn handle(&self) -> &KernelHandle { &self.handle }

    pub fn props(&self) -> &KernelProps { &self.props }

    pub fn compute_cost(&self) -> u32 { self.props.compute_cost }

    pub fn inputs(&self) -> &[PortSpec] { &self.inputs }

    pub fn outputs(&self) -> &[PortSpec] { &self.outputs }

    /// Number of tensor slots every signature of this record has
    pub fn arity(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    pub fn signatures(&self) -> &[SignatureDescriptor] { &self.signatures }

    pub fn schema(&self) -> &AttributeSchema { &self.schema }

    pub fn supports(&self, sig: &SignatureDescriptor) -> bool {
        self.signatures.contains(sig)
    }
}


/// Chained construction of a [`RegistrationRecord`]
#[derive(Debug)]
pub struct RecordBuilder {
    name:    Arc<str>,
    backend: Backend,
    handle:  Option<KernelHandle>,
    props:   KernelProps,
    inputs:  Vec<PortSpec>,
    outputs: Vec<PortSpec>,
    formats: Vec<Vec<TensorDesc>>,
    attrs:   Vec<AttrSpec>,
}

impl RecordBuilder {
    pub fn new(name: &str, backend: Backend) -> Self {
        Self {
            name: name.into(),
            backend,
            handle: None,
            props: KernelProps::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            formats: Vec::new(),
            attrs: Vec::new(),
        }
    }

    /// Explicit handle; otherwise derived from the kernel name or the op name
    pub fn handle(mut self, handle: KernelHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn fusion_type(mut self, fusion: FusionType) -> Self {
        self.props.fusion_type = fusion;
        self
    }

    pub fn compute_cost(mut self, cost: u32) -> Self {
        self.props.compute_cost = cost;
        self
    }

    pub fn async_flag(mut self, flag: bool) -> Self {
        self.props.async_flag = flag;
        self
    }

    pub fn partial_flag(mut self, flag: bool) -> Self {
        self.props.partial_flag = flag;
        self
    }

    pub fn binfile_name(mut self, file: &str) -> Self {
        self.props.binfile_name = Some(file.into());
        self
    }

    pub fn kernel_name(mut self, kernel: &str) -> Self {
        self.props.kernel_name = Some(kernel.into());
        self
    }

    pub fn input(mut self, name: &str, param: ParamType) -> Self {
        self.inputs.push(PortSpec { name: name.into(), param });
        self
    }

    pub fn output(mut self, name: &str, param: ParamType) -> Self {
        self.outputs.push(PortSpec { name: name.into(), param });
        self
    }

    /// One admissible combination: input slots followed by output slots
    pub fn dtype_format<I>(mut self, slots: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TensorDesc>,
    {
        self.formats.push(slots.into_iter().map(Into::into).collect());
        self
    }

    pub fn attr(mut self, spec: AttrSpec) -> Self {
        self.attrs.push(spec);
        self
    }

    pub fn build(self) -> Result<RegistrationRecord, OpError> {
        let op = self.name.to_string();
        let backend = self.backend;

        if self.formats.is_empty() {
            return Err(OpError::EmptySignatureSet { op, backend });
        }

        let num_inputs = self.inputs.len();
        let arity = num_inputs + self.outputs.len();
        let mut signatures: Vec<SignatureDescriptor> = Vec::with_capacity(self.formats.len());
        for slots in self.formats {
            if slots.len() != arity {
                return Err(OpError::ArityMismatch { op, expected: arity, found: slots.len() });
            }
            if let Some(bad) = slots.iter().find(|d| !backend.supports_layout(d.layout)) {
                return Err(OpError::UnsupportedLayout { op, backend, layout: bad.layout });
            }
            let (ins, outs) = slots.split_at(num_inputs);
            let sig = SignatureDescriptor::new(ins.iter().copied(), outs.iter().copied());
            if signatures.contains(&sig) {
                return Err(OpError::DuplicateSignature { op, backend, signature: sig });
            }
            signatures.push(sig);
        }

        let schema = AttributeSchema::new(self.attrs);
        schema
            .check_consistency()
            .map_err(|reason| OpError::InvalidSchema { op: op.clone(), reason })?;

        let handle = match (self.handle, &self.props.kernel_name) {
            (Some(h), _) => h,
            (None, Some(kernel)) => KernelHandle::new(kernel.clone()),
            (None, None) => KernelHandle::new(format!(
                "{}_{}",
                self.name.to_lowercase(),
                backend.name().to_lowercase()
            )),
        };

        Ok(RegistrationRecord {
            name: self.name,
            backend,
            handle,
            props: self.props,
            inputs: self.inputs,
            outputs: self.outputs,
            signatures,
            schema: Arc::new(schema),
        })
    }
}


/// Wrapper for kernel descriptor functions
pub struct KernelFactory {
    pub name:    &'static str,
    pub backend: Backend,
    pub build:   fn() -> Result<RegistrationRecord, OpError>,
}

impl KernelFactory {
    /// Run the descriptor and check it builds what it was submitted as
    pub fn instantiate(&self) -> Result<RegistrationRecord, OpError> {
        let record = (self.build)()?;
        if record.name() != self.name || record.backend() != self.backend {
            return Err(OpError::FactoryMismatch {
                declared: self.name.to_string(),
                declared_backend: self.backend,
                op: record.name().to_string(),
                backend: record.backend(),
            });
        }
        Ok(record)
    }
}

// Collect all registered kernels
inventory::collect!(KernelFactory);

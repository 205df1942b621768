use std::fmt;
use std::sync::Arc;

include!(concat!(env!("OUT_DIR"), "/generated_data_types.rs"));

impl DataType {
    /// Pair this element type with a memory layout
    pub const fn with(self, layout: Layout) -> TensorDesc {
        TensorDesc { dtype: self, layout }
    }

    /// Row-major slot of this element type
    pub const fn default_layout(self) -> TensorDesc {
        self.with(Layout::Default)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical memory arrangement of a tensor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Row-major, whatever the logical rank
    Default,
    Nchw,
    Nhwc,
    /// 5HD: channels split into C1 blocks of C0 lanes
    Nc1hwc0,
    FracZ,
    FracNz,
    C1hwncoc0,
}

impl Layout {
    pub const ALL: [Layout; 7] = [
        Layout::Default,
        Layout::Nchw,
        Layout::Nhwc,
        Layout::Nc1hwc0,
        Layout::FracZ,
        Layout::FracNz,
        Layout::C1hwncoc0,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Layout::Default => "default",
            Layout::Nchw => "NCHW",
            Layout::Nhwc => "NHWC",
            Layout::Nc1hwc0 => "NC1HWC0",
            Layout::FracZ => "FRACTAL_Z",
            Layout::FracNz => "FRACTAL_NZ",
            Layout::C1hwncoc0 => "C1HWNCoC0",
        }
    }

    /// Blocked layouts only exist on accelerators that tile their memory
    pub fn is_blocked(self) -> bool {
        matches!(
            self,
            Layout::Nc1hwc0 | Layout::FracZ | Layout::FracNz | Layout::C1hwncoc0
        )
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Execution target a kernel is compiled for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    Cpu,
    Gpu,
    /// Tensor-engine ASIC
    Ascend,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Cpu, Backend::Gpu, Backend::Ascend];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Cpu => "CPU",
            Backend::Gpu => "GPU",
            Backend::Ascend => "Ascend",
        }
    }

    /// Whether tensors on this backend can be held in `layout`
    pub fn supports_layout(self, layout: Layout) -> bool {
        match self {
            Backend::Cpu | Backend::Gpu => !layout.is_blocked(),
            Backend::Ascend => true,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One tensor slot of a signature: element type + layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TensorDesc {
    pub dtype: DataType,
    pub layout: Layout,
}

impl TensorDesc {
    pub const fn new(dtype: DataType, layout: Layout) -> Self {
        Self { dtype, layout }
    }

    /// Default-layout slot for a Rust scalar type
    pub fn of<T: Element>() -> Self {
        T::DTYPE.default_layout()
    }
}

impl From<DataType> for TensorDesc {
    fn from(dtype: DataType) -> Self {
        dtype.default_layout()
    }
}

impl fmt::Display for TensorDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.layout {
            Layout::Default => write!(f, "{}", self.dtype),
            layout => write!(f, "{}@{}", self.dtype, layout),
        }
    }
}

/// Ordered (dtype, layout) slots: inputs first, then outputs.
///
/// Two descriptors are equal when every slot matches and the input/output
/// split is the same. Cloning is cheap.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignatureDescriptor {
    slots: Arc<[TensorDesc]>,
    num_inputs: usize,
}

impl SignatureDescriptor {
    pub fn new<I, O>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TensorDesc>,
        O: IntoIterator,
        O::Item: Into<TensorDesc>,
    {
        let mut slots: Vec<TensorDesc> = inputs.into_iter().map(Into::into).collect();
        let num_inputs = slots.len();
        slots.extend(outputs.into_iter().map(Into::into));
        Self { slots: slots.into(), num_inputs }
    }

    pub fn inputs(&self) -> &[TensorDesc] {
        &self.slots[..self.num_inputs]
    }

    pub fn outputs(&self) -> &[TensorDesc] {
        &self.slots[self.num_inputs..]
    }

    pub fn slots(&self) -> &[TensorDesc] {
        &self.slots
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.slots.len() - self.num_inputs
    }

    /// Total number of slots
    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    /// Same slot count and input/output split
    pub fn same_shape_as(&self, other: &SignatureDescriptor) -> bool {
        self.num_inputs == other.num_inputs && self.slots.len() == other.slots.len()
    }
}

impl fmt::Display for SignatureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, d) in self.inputs().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d}")?;
        }
        f.write_str(" -> ")?;
        for (i, d) in self.outputs().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d}")?;
        }
        f.write_str(")")
    }
}

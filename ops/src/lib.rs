pub mod attrs;
pub mod builtin;
pub mod op;
pub mod types;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use core_types::Backend;
use parking_lot::Mutex;
use tracing::{debug, info};

pub use attrs::{validate, AttrKind, AttrMap, AttrSpec, AttrValue, Attributes, AttributeSchema, Requirement};
pub use inventory;
pub use op::{KernelFactory, RecordBuilder, RegistrationRecord};
pub use types::{FusionType, KernelHandle, KernelProps, OpError, ParamType, PortSpec};


/// Register a kernel descriptor with the inventory system
#[macro_export]
macro_rules! register_kernel {
    ($name:literal, $backend:expr, $build:path) => {
        $crate::inventory::submit! {
            $crate::op::KernelFactory {
                name: $name,
                backend: $backend,
                build: $build,
            }
        }
    };
}


type KernelTable<V> = HashMap<Backend, HashMap<Arc<str>, V>>;

#[derive(Default)]
struct RegistryState {
    kernels: KernelTable<Vec<Arc<RegistrationRecord>>>,
    schemas: HashMap<Arc<str>, Arc<AttributeSchema>>,
    count:   usize,
}

/// Registry open for registration.
///
/// Writes go through a mutex so modules initializing on different threads
/// cannot interleave. [`RegistryBuilder::finalize`] closes it for reads.
#[derive(Default)]
pub struct RegistryBuilder {
    state: Mutex<RegistryState>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` under its (name, backend) pair.
    ///
    /// Nothing is inserted when an error is returned.
    pub fn register(&self, record: RegistrationRecord) -> Result<(), OpError> {
        let mut state = self.state.lock();
        let backend = record.backend();

        if let Some(existing) = state.schemas.get(record.name()) {
            if **existing != *record.schema() {
                return Err(OpError::SchemaMismatch {
                    op: record.name().to_string(),
                    backend,
                });
            }
        }

        if let Some(records) = state.kernels.get(&backend).and_then(|m| m.get(record.name())) {
            for sig in record.signatures() {
                if records.iter().any(|r| r.supports(sig)) {
                    return Err(OpError::DuplicateSignature {
                        op: record.name().to_string(),
                        backend,
                        signature: sig.clone(),
                    });
                }
            }
        }

        let name: Arc<str> = record.name().into();
        debug!(
            op = %name,
            %backend,
            kernel = %record.handle(),
            signatures = record.signatures().len(),
            "registering kernel"
        );
        if !state.schemas.contains_key(&name) {
            state.schemas.insert(name.clone(), Arc::new(record.schema().clone()));
        }
        state
            .kernels
            .entry(backend)
            .or_default()
            .entry(name)
            .or_default()
            .push(Arc::new(record));
        state.count += 1;
        Ok(())
    }

    /// Register every record, stopping at the first failure
    pub fn register_all(
        &self,
        records: impl IntoIterator<Item = RegistrationRecord>,
    ) -> Result<(), OpError> {
        records.into_iter().try_for_each(|r| self.register(r))
    }

    /// Register every kernel submitted through [`register_kernel!`].
    ///
    /// Descriptors are sorted by (name, backend, kernel) first so insertion
    /// order does not depend on link order.
    pub fn collect_inventory(&self) -> Result<usize, OpError> {
        let mut records = inventory::iter::<KernelFactory>
            .into_iter()
            .map(KernelFactory::instantiate)
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by(|a, b| {
            (a.name(), a.backend().name(), a.handle().symbol())
                .cmp(&(b.name(), b.backend().name(), b.handle().symbol()))
        });
        let n = records.len();
        self.register_all(records)?;
        info!(kernels = n, "collected kernel inventory");
        Ok(n)
    }

    /// Close registration. The returned registry is immutable.
    pub fn finalize(self) -> Registry {
        let state = self.state.into_inner();
        info!(records = state.count, schemas = state.schemas.len(), "registry finalized");
        Registry {
            kernels: state
                .kernels
                .into_iter()
                .map(|(backend, ops)| {
                    let ops = ops.into_iter().map(|(n, v)| (n, v.into_boxed_slice())).collect();
                    (backend, ops)
                })
                .collect(),
            schemas: state.schemas,
            count: state.count,
        }
    }
}


/// Finalized, read-only registry.
///
/// Safe to share between threads; lookups take no locks.
#[derive(Debug, Default)]
pub struct Registry {
    kernels: KernelTable<Box<[Arc<RegistrationRecord>]>>,
    schemas: HashMap<Arc<str>, Arc<AttributeSchema>>,
    count:   usize,
}

impl Registry {
    /// Records for (name, backend) in registration order; empty when none
    pub fn lookup(&self, name: &str, backend: Backend) -> &[Arc<RegistrationRecord>] {
        self.kernels
            .get(&backend)
            .and_then(|ops| ops.get(name))
            .map(|records| &records[..])
            .unwrap_or(&[])
    }

    pub fn schema(&self, name: &str) -> Option<&AttributeSchema> {
        self.schemas.get(name).map(|s| s.as_ref())
    }

    /// Operator names registered for `backend`, sorted
    pub fn operators(&self, backend: Backend) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .kernels
            .get(&backend)
            .map(|ops| ops.keys().map(|n| &**n).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Backends `name` is registered for
    pub fn backends_for(&self, name: &str) -> Vec<Backend> {
        Backend::ALL
            .into_iter()
            .filter(|b| !self.lookup(name, *b).is_empty())
            .collect()
    }

    /// Number of registration records
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}


static GLOBAL: OnceLock<Result<Registry, OpError>> = OnceLock::new();

/// Process-wide registry built from the kernel inventory on first use.
///
/// A registration failure aborts the build and is returned on every call.
pub fn global() -> Result<&'static Registry, OpError> {
    GLOBAL
        .get_or_init(|| {
            let builder = RegistryBuilder::new();
            builder.collect_inventory()?;
            Ok(builder.finalize())
        })
        .as_ref()
        .map_err(Clone::clone)
}

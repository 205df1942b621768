pub mod config;
mod kernel_cache;
pub mod promotion;
#[cfg(test)]
mod scenarios;

use std::sync::Arc;

use core_types::{Backend, SignatureDescriptor};
use opdispatch_ops::{KernelHandle, OpError, RegistrationRecord, Registry};
use tracing::debug;

pub use config::{DispatchConfig, Promotion};
pub use kernel_cache::DispatchCache;
pub use promotion::PromotionTable;


/// Outcome of a successful dispatch
#[derive(Debug, Clone)]
pub struct Resolved {
    record:    Arc<RegistrationRecord>,
    signature: SignatureDescriptor,
    promoted:  bool,
}

impl Resolved {
    /// Kernel to bind and invoke
    pub fn handle(&self) -> &KernelHandle {
        self.record.handle()
    }

    pub fn record(&self) -> &Arc<RegistrationRecord> {
        &self.record
    }

    /// The registered signature that matched; differs from the request when
    /// `promoted` is set
    pub fn signature(&self) -> &SignatureDescriptor {
        &self.signature
    }

    pub fn promoted(&self) -> bool {
        self.promoted
    }
}


/// Maps a live call to exactly one registration record.
///
/// Holds no state besides the registry it reads and its promotion
/// whitelist; identical calls always give identical answers.
#[derive(Debug, Clone)]
pub struct Resolver<'r> {
    registry:   &'r Registry,
    promotions: PromotionTable,
}

impl<'r> Resolver<'r> {
    /// Resolver with the default widening promotions
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_promotions(registry, PromotionTable::default())
    }

    pub fn with_promotions(registry: &'r Registry, promotions: PromotionTable) -> Self {
        Self { registry, promotions }
    }

    pub fn from_config(registry: &'r Registry, config: &DispatchConfig) -> Self {
        Self::with_promotions(registry, config.promotion_table())
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn promotions(&self) -> &PromotionTable {
        &self.promotions
    }

    /// Select the kernel for `name` on `backend` given the actual slots.
    ///
    /// Exact matches are tried first, then promoted ones. Among several
    /// matching records the lowest compute cost wins, then the earliest
    /// registered.
    pub fn resolve(
        &self,
        name: &str,
        backend: Backend,
        requested: &SignatureDescriptor,
    ) -> Result<Resolved, OpError> {
        let candidates = self.registry.lookup(name, backend);
        if candidates.is_empty() {
            return Err(OpError::UnregisteredOperator { op: name.to_string(), backend });
        }

        if let Some((record, signature)) = best_match(candidates, |sig| sig == requested) {
            debug!(op = name, %backend, %requested, kernel = %record.handle(), "resolved exact kernel");
            return Ok(Resolved { record: record.clone(), signature: signature.clone(), promoted: false });
        }

        let promoted = best_match(candidates, |sig| {
            sig.same_shape_as(requested)
                && requested
                    .slots()
                    .iter()
                    .zip(sig.slots())
                    .all(|(req, reg)| self.promotions.slot_accepts(*req, *reg))
        });
        if let Some((record, signature)) = promoted {
            debug!(
                op = name,
                %backend,
                %requested,
                %signature,
                kernel = %record.handle(),
                "resolved promoted kernel"
            );
            return Ok(Resolved { record: record.clone(), signature: signature.clone(), promoted: true });
        }

        Err(OpError::NoMatchingKernel {
            op: name.to_string(),
            backend,
            requested: requested.clone(),
            supported: candidates
                .iter()
                .flat_map(|r| r.signatures().iter().cloned())
                .collect(),
        })
    }
}

/// Cheapest record with a signature accepted by `accepts`, earliest on ties
fn best_match<'a>(
    candidates: &'a [Arc<RegistrationRecord>],
    accepts: impl Fn(&SignatureDescriptor) -> bool,
) -> Option<(&'a Arc<RegistrationRecord>, &'a SignatureDescriptor)> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            record
                .signatures()
                .iter()
                .find(|sig| accepts(sig))
                .map(|sig| (record.compute_cost(), idx, record, sig))
        })
        .min_by_key(|(cost, idx, _, _)| (*cost, *idx))
        .map(|(_, _, record, sig)| (record, sig))
}


/* ------------------------------------------------------------------------- */
/*                                  Tests                                    */
/* ------------------------------------------------------------------------- */

use std::{
    collections::HashMap,
    sync::Arc,
};
use parking_lot::Mutex;
use tracing::trace;

use core_types::{Backend, SignatureDescriptor};
use opdispatch_ops::OpError;

use crate::{Resolved, Resolver};

/// A resolved call: operator + backend + requested signature
#[derive(Clone, PartialEq, Eq, Hash)]
struct DispatchKey {
    name:      Arc<str>,
    backend:   Backend,
    signature: SignatureDescriptor,
}

/// Memoizes resolutions made through one resolver.
///
/// Only successful resolutions are kept; a failing call is resolved (and
/// fails) again every time.
pub struct DispatchCache<'r> {
    resolver: Resolver<'r>,
    cache:    Mutex<HashMap<DispatchKey, Resolved>>,
}

impl<'r> DispatchCache<'r> {
    pub fn new(resolver: Resolver<'r>) -> Self {
        Self { resolver, cache: Mutex::new(HashMap::new()) }
    }

    pub fn resolver(&self) -> &Resolver<'r> {
        &self.resolver
    }

    pub fn get(
        &self,
        name: &str,
        backend: Backend,
        signature: &SignatureDescriptor,
    ) -> Result<Resolved, OpError> {
        let key = DispatchKey {
            name:      Arc::from(name),
            backend,
            signature: signature.clone(),
        };

        // cache lookup
        if let Some(hit) = self.cache.lock().get(&key) {
            trace!(op = name, %backend, kernel = %hit.handle(), "dispatch cache hit");
            return Ok(hit.clone());
        }

        let resolved = self.resolver.resolve(name, backend, signature)?;
        self.cache.lock().insert(key, resolved.clone());

        Ok(resolved)
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

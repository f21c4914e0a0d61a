//! Shared test doubles: a resolver that counts lookups and handler error types.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sluice_core::{Container, HandlerContract, HandlerResolver, ResolveError, ResolvedHandler};

/// Wraps a container and counts every lookup made through it.
pub struct CountingResolver {
    pub inner: Arc<Container>,
    pub calls: AtomicUsize,
}

impl CountingResolver {
    pub fn new(inner: Arc<Container>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HandlerResolver for CountingResolver {
    fn try_resolve_handler(
        &self,
        contract: &HandlerContract,
    ) -> Result<Option<ResolvedHandler>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.try_resolve_handler(contract)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("user {0} is locked")]
pub struct UserLocked(pub u32);

pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn count(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

//! Handler contracts implemented by application code.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::request::{Command, Query};

/// Error raised by a handler. Dispatch surfaces it unchanged, so callers can downcast to the original type.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Synchronous handler for command `C`.
pub trait CommandHandler<C: Command>: Send + Sync {
    fn handle(&self, command: C) -> Result<(), HandlerError>;
}

/// Asynchronous handler for command `C`. The token is the caller's, forwarded unchanged.
#[async_trait]
pub trait AsyncCommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: C, cancel: CancellationToken) -> Result<(), HandlerError>;
}

/// Synchronous handler for query `Q` producing `R`.
pub trait QueryHandler<Q: Query, R>: Send + Sync {
    fn handle(&self, query: Q) -> Result<R, HandlerError>;
}

/// Asynchronous handler for query `Q` producing `R`.
#[async_trait]
pub trait AsyncQueryHandler<Q: Query, R>: Send + Sync {
    async fn handle(&self, query: Q, cancel: CancellationToken) -> Result<R, HandlerError>;
}

//! Sluice core: route commands and queries to sync or async handlers by runtime type.

mod blocking;
pub mod command_dispatcher;
pub mod config;
pub mod container;
pub mod contract;
mod failure;
pub mod handler;
pub mod query_dispatcher;
pub mod query_for;
pub mod request;
pub mod resolver;

pub use command_dispatcher::CommandDispatcher;
pub use config::{BlockingMode, DispatcherConfig};
pub use container::{Container, ContainerError};
pub use contract::{HandlerContract, HandlerKind};
pub use handler::{AsyncCommandHandler, AsyncQueryHandler, CommandHandler, HandlerError, QueryHandler};
pub use query_dispatcher::QueryDispatcher;
pub use query_for::QueryFor;
pub use request::{Command, IntoCommand, IntoQuery, Query, QueryOf, Request, RequestType, ResultType};
pub use resolver::{HandlerResolver, ResolveError, ResolvedHandler};
pub use tokio_util::sync::CancellationToken;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    /// The request was absent. Raised before any handler lookup.
    #[error("{0} must not be absent")]
    InvalidArgument(&'static str),
    #[error("{}", not_found_message(.request, .result))]
    HandlerNotFound {
        request: RequestType,
        result: Option<ResultType>,
    },
    /// The handler's own failure, unchanged.
    #[error(transparent)]
    Handler(HandlerError),
    #[error(transparent)]
    Resolver(#[from] ResolveError),
    #[error("dispatch of {request} was cancelled")]
    Cancelled { request: RequestType },
    #[error("could not start a runtime for the blocking wait: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("handler invoker expected {expected}, got {found}")]
    Misrouted {
        expected: &'static str,
        found: &'static str,
    },
}

impl DispatchError {
    pub(crate) fn not_found(request: RequestType, result: Option<ResultType>) -> Self {
        DispatchError::HandlerNotFound { request, result }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DispatchError::HandlerNotFound { .. })
    }

    /// The request type that had no handler, if this is [`DispatchError::HandlerNotFound`].
    pub fn missing_request(&self) -> Option<RequestType> {
        match self {
            DispatchError::HandlerNotFound { request, .. } => Some(*request),
            _ => None,
        }
    }

    /// Downcast the handler's failure to its concrete type.
    pub fn handler_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            DispatchError::Handler(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Take back the handler's failure as raised.
    pub fn into_handler_error(self) -> Result<HandlerError, Self> {
        match self {
            DispatchError::Handler(err) => Ok(err),
            other => Err(other),
        }
    }
}

fn not_found_message(request: &RequestType, result: &Option<ResultType>) -> String {
    match result {
        Some(result) => format!("handler for {} returning {} is not found", request, result),
        None => format!("handler for {} is not found", request),
    }
}

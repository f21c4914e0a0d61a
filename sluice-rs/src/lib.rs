//! Sluice Rust facade: Application, Module trait and derives on sluice-core.

pub mod app;
pub mod handler_fn;
pub mod module;
pub mod scaffold;

pub use app::{AppError, Application};
pub use async_trait::async_trait;
pub use handler_fn::{AsyncCommandFn, AsyncQueryFn, CommandFn, QueryFn};
pub use module::{HandlerModule, Module};
pub use scaffold::{HandlerTemplate, ScaffoldError};
pub use sluice_core::{
    AsyncCommandHandler, AsyncQueryHandler, BlockingMode, CancellationToken, Command, CommandDispatcher,
    CommandHandler, Container, ContainerError, DispatchError, DispatcherConfig, HandlerContract, HandlerError,
    HandlerKind, HandlerResolver, IntoCommand, IntoQuery, Query, QueryDispatcher, QueryFor, QueryHandler, QueryOf,
    RequestType, ResolveError, ResolvedHandler, ResultType,
};
pub use sluice_rs_macros::{Command, Query};

//! Module: a named group of handlers registered into an [`Application`] in one step.

use std::future::Future;
use std::sync::Arc;

use sluice_core::{
    AsyncCommandHandler, AsyncQueryHandler, CancellationToken, Command, CommandHandler, HandlerError, Query,
    QueryHandler, ResolvedHandler,
};
use tracing::debug;

use crate::app::{AppError, Application};
use crate::handler_fn::{AsyncCommandFn, AsyncQueryFn, CommandFn, QueryFn};

pub trait Module {
    fn name(&self) -> &str;

    fn register_into(&mut self, app: &mut Application) -> Result<(), AppError>;
}

/// Collects handlers, then registers them all with `app.register(&mut module)`.
///
/// ```ignore
/// let mut users = HandlerModule::new("users")
///     .command_fn(|cmd: DeleteUser| repo.delete(cmd.id))
///     .async_query(UserQueries::new(pool));
/// app.register(&mut users)?;
/// ```
///
/// A contract that is already registered in the application (by this or another module) is an error.
pub struct HandlerModule {
    name: String,
    handlers: Vec<ResolvedHandler>,
}

impl HandlerModule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            handlers: Vec::new(),
        }
    }

    pub fn handlers(&self) -> &[ResolvedHandler] {
        &self.handlers
    }

    pub fn command<C, H>(mut self, handler: H) -> Self
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        self.handlers.push(ResolvedHandler::sync_command::<C, H>(Arc::new(handler)));
        self
    }

    pub fn async_command<C, H>(mut self, handler: H) -> Self
    where
        C: Command,
        H: AsyncCommandHandler<C> + 'static,
    {
        self.handlers.push(ResolvedHandler::async_command::<C, H>(Arc::new(handler)));
        self
    }

    pub fn query<Q, R, H>(mut self, handler: H) -> Self
    where
        Q: Query,
        R: Send + 'static,
        H: QueryHandler<Q, R> + 'static,
    {
        self.handlers.push(ResolvedHandler::sync_query::<Q, R, H>(Arc::new(handler)));
        self
    }

    pub fn async_query<Q, R, H>(mut self, handler: H) -> Self
    where
        Q: Query,
        R: Send + 'static,
        H: AsyncQueryHandler<Q, R> + 'static,
    {
        self.handlers.push(ResolvedHandler::async_query::<Q, R, H>(Arc::new(handler)));
        self
    }

    pub fn command_fn<C, F>(self, f: F) -> Self
    where
        C: Command,
        F: Fn(C) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.command::<C, _>(CommandFn::new(f))
    }

    pub fn async_command_fn<C, F, Fut>(self, f: F) -> Self
    where
        C: Command,
        F: Fn(C, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.async_command::<C, _>(AsyncCommandFn::new(f))
    }

    pub fn query_fn<Q, R, F>(self, f: F) -> Self
    where
        Q: Query,
        R: Send + 'static,
        F: Fn(Q) -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        self.query::<Q, R, _>(QueryFn::new(f))
    }

    pub fn async_query_fn<Q, R, F, Fut>(self, f: F) -> Self
    where
        Q: Query,
        R: Send + 'static,
        F: Fn(Q, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        self.async_query::<Q, R, _>(AsyncQueryFn::new(f))
    }
}

impl Module for HandlerModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_into(&mut self, app: &mut Application) -> Result<(), AppError> {
        let container = app.container();
        if let Some(taken) = self.handlers.iter().find(|h| container.contains(h.contract())) {
            return Err(AppError::DuplicateHandler {
                module: self.name.clone(),
                contract: *taken.contract(),
            });
        }
        for handler in &self.handlers {
            debug!(module = %self.name, contract = %handler.contract(), "registering handler");
            container.register_resolved(handler.clone());
        }
        Ok(())
    }
}

//! Closures as handlers. Wrap a function so it satisfies the matching handler trait.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use sluice_core::{
    AsyncCommandHandler, AsyncQueryHandler, CancellationToken, Command, CommandHandler, HandlerError, Query,
    QueryHandler,
};

/// `Fn(C) -> Result<(), HandlerError>` as a [`CommandHandler<C>`].
pub struct CommandFn<C, F> {
    f: F,
    _command: PhantomData<fn(C)>,
}

impl<C, F> CommandFn<C, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _command: PhantomData,
        }
    }
}

impl<C, F> CommandHandler<C> for CommandFn<C, F>
where
    C: Command,
    F: Fn(C) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, command: C) -> Result<(), HandlerError> {
        (self.f)(command)
    }
}

/// `Fn(C, CancellationToken) -> impl Future` as an [`AsyncCommandHandler<C>`].
pub struct AsyncCommandFn<C, F> {
    f: F,
    _command: PhantomData<fn(C)>,
}

impl<C, F> AsyncCommandFn<C, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _command: PhantomData,
        }
    }
}

#[async_trait]
impl<C, F, Fut> AsyncCommandHandler<C> for AsyncCommandFn<C, F>
where
    C: Command,
    F: Fn(C, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, command: C, cancel: CancellationToken) -> Result<(), HandlerError> {
        (self.f)(command, cancel).await
    }
}

pub struct QueryFn<Q, R, F> {
    f: F,
    _query: PhantomData<fn(Q) -> R>,
}

impl<Q, R, F> QueryFn<Q, R, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _query: PhantomData,
        }
    }
}

impl<Q, R, F> QueryHandler<Q, R> for QueryFn<Q, R, F>
where
    Q: Query,
    F: Fn(Q) -> Result<R, HandlerError> + Send + Sync,
{
    fn handle(&self, query: Q) -> Result<R, HandlerError> {
        (self.f)(query)
    }
}

pub struct AsyncQueryFn<Q, R, F> {
    f: F,
    _query: PhantomData<fn(Q) -> R>,
}

impl<Q, R, F> AsyncQueryFn<Q, R, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _query: PhantomData,
        }
    }
}

#[async_trait]
impl<Q, R, F, Fut> AsyncQueryHandler<Q, R> for AsyncQueryFn<Q, R, F>
where
    Q: Query,
    R: Send,
    F: Fn(Q, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
{
    async fn handle(&self, query: Q, cancel: CancellationToken) -> Result<R, HandlerError> {
        (self.f)(query, cancel).await
    }
}

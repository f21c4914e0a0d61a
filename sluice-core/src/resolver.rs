//! Resolver boundary and the erased invokers a resolver hands back.
//!
//! A [`ResolvedHandler`] is built while the concrete request and result types are
//! still known (at registration), so the dispatcher can invoke it from an erased
//! request without any runtime method lookup.

use std::any::{type_name, Any};
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::contract::{HandlerContract, HandlerKind};
use crate::failure::Fault;
use crate::handler::{AsyncCommandHandler, AsyncQueryHandler, CommandHandler, HandlerError, QueryHandler};
use crate::request::{Command, Query, RequestType, ResultType};
use crate::DispatchError;

#[derive(Error, Debug)]
pub enum ResolveError {
    /// The underlying provider failed while building the handler.
    #[error("provider failed to build {contract}: {source}")]
    Provider {
        contract: HandlerContract,
        #[source]
        source: HandlerError,
    },
    /// The provider returned a handler registered under a different contract.
    #[error("provider returned {found} for {requested}")]
    ContractMismatch {
        requested: HandlerContract,
        found: HandlerContract,
    },
}

/// Looks up the handler registered for a contract. `Ok(None)` is the ordinary "not registered" outcome.
pub trait HandlerResolver: Send + Sync {
    fn try_resolve_handler(
        &self,
        contract: &HandlerContract,
    ) -> Result<Option<ResolvedHandler>, ResolveError>;
}

impl<T: HandlerResolver + ?Sized> HandlerResolver for Arc<T> {
    fn try_resolve_handler(
        &self,
        contract: &HandlerContract,
    ) -> Result<Option<ResolvedHandler>, ResolveError> {
        (**self).try_resolve_handler(contract)
    }
}

pub(crate) type Output = Box<dyn Any + Send>;

pub(crate) trait InvokeSync: Send + Sync {
    fn invoke(&self, request: Box<dyn Any + Send>) -> Result<Output, Fault>;
}

pub(crate) trait InvokeAsync: Send + Sync {
    fn invoke(
        self: Arc<Self>,
        request: Box<dyn Any + Send>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<Output, Fault>>;
}

#[derive(Clone)]
pub(crate) enum Invoker {
    Sync(Arc<dyn InvokeSync>),
    Async(Arc<dyn InvokeAsync>),
}

/// A handler instance bound to its contract, ready to be invoked with an erased request.
#[derive(Clone)]
pub struct ResolvedHandler {
    contract: HandlerContract,
    pub(crate) invoker: Invoker,
}

impl ResolvedHandler {
    pub fn sync_command<C, H>(handler: Arc<H>) -> Self
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        Self {
            contract: HandlerContract::sync_command(RequestType::of::<C>()),
            invoker: Invoker::Sync(Arc::new(SyncCommand::<C, H> {
                handler,
                _request: PhantomData,
            })),
        }
    }

    pub fn async_command<C, H>(handler: Arc<H>) -> Self
    where
        C: Command,
        H: AsyncCommandHandler<C> + 'static,
    {
        Self {
            contract: HandlerContract::async_command(RequestType::of::<C>()),
            invoker: Invoker::Async(Arc::new(AsyncCommand::<C, H> {
                handler,
                _request: PhantomData,
            })),
        }
    }

    pub fn sync_query<Q, R, H>(handler: Arc<H>) -> Self
    where
        Q: Query,
        R: Send + 'static,
        H: QueryHandler<Q, R> + 'static,
    {
        Self {
            contract: HandlerContract::sync_query(RequestType::of::<Q>(), ResultType::of::<R>()),
            invoker: Invoker::Sync(Arc::new(SyncQuery::<Q, R, H> {
                handler,
                _request: PhantomData,
            })),
        }
    }

    pub fn async_query<Q, R, H>(handler: Arc<H>) -> Self
    where
        Q: Query,
        R: Send + 'static,
        H: AsyncQueryHandler<Q, R> + 'static,
    {
        Self {
            contract: HandlerContract::async_query(RequestType::of::<Q>(), ResultType::of::<R>()),
            invoker: Invoker::Async(Arc::new(AsyncQuery::<Q, R, H> {
                handler,
                _request: PhantomData,
            })),
        }
    }

    pub fn contract(&self) -> &HandlerContract {
        &self.contract
    }

    pub fn kind(&self) -> HandlerKind {
        self.contract.kind()
    }
}

impl std::fmt::Debug for ResolvedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedHandler")
            .field("contract", &self.contract)
            .finish()
    }
}

/// Ask the resolver and check the handler it returns really serves `contract`.
pub(crate) fn resolve(
    resolver: &dyn HandlerResolver,
    contract: &HandlerContract,
) -> Result<Option<Invoker>, DispatchError> {
    debug!(%contract, "resolving handler");
    match resolver.try_resolve_handler(contract)? {
        Some(resolved) if resolved.contract() == contract => Ok(Some(resolved.invoker)),
        Some(resolved) => Err(DispatchError::Resolver(ResolveError::ContractMismatch {
            requested: *contract,
            found: *resolved.contract(),
        })),
        None => Ok(None),
    }
}

pub(crate) fn mismatch(contract: HandlerContract) -> DispatchError {
    Fault::Misrouted {
        expected: if contract.kind().is_async() { "async invoker" } else { "sync invoker" },
        found: "invoker of the other mode",
    }
    .surface(contract.request())
}

fn downcast<T: Any>(request: Box<dyn Any + Send>) -> Result<T, Fault> {
    request
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| Fault::Misrouted {
            expected: type_name::<T>(),
            found: "another request type",
        })
}

// fn(C) keeps the adapters Send + Sync regardless of C.
struct SyncCommand<C, H> {
    handler: Arc<H>,
    _request: PhantomData<fn(C)>,
}

impl<C, H> InvokeSync for SyncCommand<C, H>
where
    C: Command,
    H: CommandHandler<C> + 'static,
{
    fn invoke(&self, request: Box<dyn Any + Send>) -> Result<Output, Fault> {
        let command = downcast::<C>(request)?;
        CommandHandler::handle(&*self.handler, command)?;
        Ok(Box::new(()))
    }
}

struct AsyncCommand<C, H> {
    handler: Arc<H>,
    _request: PhantomData<fn(C)>,
}

impl<C, H> InvokeAsync for AsyncCommand<C, H>
where
    C: Command,
    H: AsyncCommandHandler<C> + 'static,
{
    fn invoke(
        self: Arc<Self>,
        request: Box<dyn Any + Send>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<Output, Fault>> {
        let command = match downcast::<C>(request) {
            Ok(command) => command,
            Err(fault) => return futures_util::future::ready(Err(fault)).boxed(),
        };
        let handler = Arc::clone(&self.handler);
        async move {
            AsyncCommandHandler::handle(&*handler, command, cancel).await?;
            Ok::<Output, Fault>(Box::new(()))
        }
        .boxed()
    }
}

struct SyncQuery<Q, R, H> {
    handler: Arc<H>,
    _request: PhantomData<fn(Q) -> R>,
}

impl<Q, R, H> InvokeSync for SyncQuery<Q, R, H>
where
    Q: Query,
    R: Send + 'static,
    H: QueryHandler<Q, R> + 'static,
{
    fn invoke(&self, request: Box<dyn Any + Send>) -> Result<Output, Fault> {
        let query = downcast::<Q>(request)?;
        let result = QueryHandler::handle(&*self.handler, query)?;
        Ok(Box::new(result))
    }
}

struct AsyncQuery<Q, R, H> {
    handler: Arc<H>,
    _request: PhantomData<fn(Q) -> R>,
}

impl<Q, R, H> InvokeAsync for AsyncQuery<Q, R, H>
where
    Q: Query,
    R: Send + 'static,
    H: AsyncQueryHandler<Q, R> + 'static,
{
    fn invoke(
        self: Arc<Self>,
        request: Box<dyn Any + Send>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<Output, Fault>> {
        let query = match downcast::<Q>(request) {
            Ok(query) => query,
            Err(fault) => return futures_util::future::ready(Err(fault)).boxed(),
        };
        let handler = Arc::clone(&self.handler);
        async move {
            let result = AsyncQueryHandler::handle(&*handler, query, cancel).await?;
            Ok::<Output, Fault>(Box::new(result))
        }
        .boxed()
    }
}

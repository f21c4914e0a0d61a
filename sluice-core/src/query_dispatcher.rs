//! Query dispatcher: same precedence as commands, plus a typed result chosen by the caller.

use std::any::type_name;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::blocking;
use crate::config::DispatcherConfig;
use crate::contract::HandlerContract;
use crate::failure::Fault;
use crate::query_for::QueryFor;
use crate::request::{ErasedRequest, IntoQuery, RequestType, ResultType};
use crate::resolver::{mismatch, resolve, HandlerResolver, InvokeAsync, InvokeSync, Invoker, Output};
use crate::DispatchError;

/// Routes a query to the handler registered for `(runtime query type, R)`.
///
/// ```ignore
/// let user: UserModel = queries.dispatch(GetUser { id: 1 })?;
/// let user = queries.dispatch_async::<UserModel>(GetUser { id: 1 }).await?;
/// ```
#[derive(Clone)]
pub struct QueryDispatcher {
    resolver: Arc<dyn HandlerResolver>,
    config: DispatcherConfig,
}

impl QueryDispatcher {
    pub fn new(resolver: Arc<dyn HandlerResolver>) -> Self {
        Self::with_config(resolver, DispatcherConfig::default())
    }

    pub fn with_config(resolver: Arc<dyn HandlerResolver>, config: DispatcherConfig) -> Self {
        Self { resolver, config }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Fix the result type once: `queries.for_result::<UserModel>().dispatch(GetUser { id: 1 })`.
    pub fn for_result<R: Send + 'static>(&self) -> QueryFor<'_, R> {
        QueryFor::new(self)
    }

    pub fn dispatch<R: Send + 'static>(&self, query: impl IntoQuery) -> Result<R, DispatchError> {
        self.dispatch_cancellable(query, CancellationToken::new())
    }

    /// Blocking dispatch; `cancel` reaches an async handler and cuts the blocking wait short.
    pub fn dispatch_cancellable<R: Send + 'static>(
        &self,
        query: impl IntoQuery,
        cancel: CancellationToken,
    ) -> Result<R, DispatchError> {
        let request = erase(query)?;
        let ty = request.request_type;

        if let Some(handler) = self.resolve_sync::<R>(&request)? {
            debug!(query = %ty, result = type_name::<R>(), "invoking sync query handler");
            return handler
                .invoke(request.value)
                .and_then(take::<R>)
                .map_err(|fault| fault.surface(ty));
        }

        if let Some(handler) = self.resolve_async::<R>(&request)? {
            debug!(query = %ty, result = type_name::<R>(), "no sync handler, blocking on async query handler");
            let pending = handler.invoke(request.value, cancel.clone());
            return blocking::wait(pending, &cancel, &self.config)
                .and_then(take::<R>)
                .map_err(|fault| fault.surface(ty));
        }

        Err(not_found::<R>(ty))
    }

    pub fn dispatch_async<R: Send + 'static>(
        &self,
        query: impl IntoQuery,
    ) -> BoxFuture<'static, Result<R, DispatchError>> {
        self.dispatch_async_cancellable(query, CancellationToken::new())
    }

    /// Non-blocking dispatch. A sync-only query runs now and yields a completed future.
    pub fn dispatch_async_cancellable<R: Send + 'static>(
        &self,
        query: impl IntoQuery,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<R, DispatchError>> {
        match self.start_async::<R>(query, cancel) {
            Ok(pending) => pending,
            Err(err) => future::ready(Err(err)).boxed(),
        }
    }

    fn start_async<R: Send + 'static>(
        &self,
        query: impl IntoQuery,
        cancel: CancellationToken,
    ) -> Result<BoxFuture<'static, Result<R, DispatchError>>, DispatchError> {
        let request = erase(query)?;
        let ty = request.request_type;

        if let Some(handler) = self.resolve_async::<R>(&request)? {
            debug!(query = %ty, result = type_name::<R>(), "invoking async query handler");
            let pending = handler.invoke(request.value, cancel);
            return Ok(pending
                .map(move |outcome| outcome.and_then(take::<R>).map_err(|fault| fault.surface(ty)))
                .boxed());
        }

        if let Some(handler) = self.resolve_sync::<R>(&request)? {
            debug!(query = %ty, result = type_name::<R>(), "no async handler, running sync query handler inline");
            let outcome = handler
                .invoke(request.value)
                .and_then(take::<R>)
                .map_err(|fault| fault.surface(ty));
            return Ok(future::ready(outcome).boxed());
        }

        Err(not_found::<R>(ty))
    }

    fn resolve_sync<R: Send + 'static>(
        &self,
        request: &ErasedRequest,
    ) -> Result<Option<Arc<dyn InvokeSync>>, DispatchError> {
        let contract = HandlerContract::sync_query(request.request_type, ResultType::of::<R>());
        match resolve(self.resolver.as_ref(), &contract)? {
            Some(Invoker::Sync(invoker)) => Ok(Some(invoker)),
            Some(Invoker::Async(_)) => Err(mismatch(contract)),
            None => Ok(None),
        }
    }

    fn resolve_async<R: Send + 'static>(
        &self,
        request: &ErasedRequest,
    ) -> Result<Option<Arc<dyn InvokeAsync>>, DispatchError> {
        let contract = HandlerContract::async_query(request.request_type, ResultType::of::<R>());
        match resolve(self.resolver.as_ref(), &contract)? {
            Some(Invoker::Async(invoker)) => Ok(Some(invoker)),
            Some(Invoker::Sync(_)) => Err(mismatch(contract)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for QueryDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryDispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn erase(query: impl IntoQuery) -> Result<ErasedRequest, DispatchError> {
    query
        .into_query()
        .map(ErasedRequest::from_query)
        .ok_or(DispatchError::InvalidArgument("query"))
}

fn take<R: Send + 'static>(output: Output) -> Result<R, Fault> {
    output
        .downcast::<R>()
        .map(|boxed| *boxed)
        .map_err(|_| Fault::Misrouted {
            expected: type_name::<R>(),
            found: "another result type",
        })
}

fn not_found<R: Send + 'static>(ty: RequestType) -> DispatchError {
    debug!(query = %ty, result = type_name::<R>(), "no query handler registered");
    DispatchError::not_found(ty, Some(ResultType::of::<R>()))
}

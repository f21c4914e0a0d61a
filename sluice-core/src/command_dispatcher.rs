//! Command dispatcher: sync-first `dispatch`, async-first `dispatch_async`.

use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::blocking;
use crate::config::DispatcherConfig;
use crate::contract::HandlerContract;
use crate::request::{ErasedRequest, IntoCommand};
use crate::resolver::{mismatch, resolve, HandlerResolver, InvokeAsync, InvokeSync, Invoker};
use crate::DispatchError;

/// Routes a command to the handler registered for its runtime type. Cheap to clone and share.
#[derive(Clone)]
pub struct CommandDispatcher {
    resolver: Arc<dyn HandlerResolver>,
    config: DispatcherConfig,
}

impl CommandDispatcher {
    pub fn new(resolver: Arc<dyn HandlerResolver>) -> Self {
        Self::with_config(resolver, DispatcherConfig::default())
    }

    pub fn with_config(resolver: Arc<dyn HandlerResolver>, config: DispatcherConfig) -> Self {
        Self { resolver, config }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Dispatch and block until the handler has run.
    pub fn dispatch(&self, command: impl IntoCommand) -> Result<(), DispatchError> {
        self.dispatch_cancellable(command, CancellationToken::new())
    }

    /// Like [`dispatch`](Self::dispatch); `cancel` is forwarded to an async handler and
    /// also ends the blocking wait early with [`DispatchError::Cancelled`].
    pub fn dispatch_cancellable(
        &self,
        command: impl IntoCommand,
        cancel: CancellationToken,
    ) -> Result<(), DispatchError> {
        let request = erase(command)?;
        let ty = request.request_type;

        if let Some(handler) = self.resolve_sync(&request)? {
            debug!(command = %ty, "invoking sync command handler");
            return handler
                .invoke(request.value)
                .map(drop)
                .map_err(|fault| fault.surface(ty));
        }

        if let Some(handler) = self.resolve_async(&request)? {
            debug!(command = %ty, "no sync handler, blocking on async command handler");
            let pending = handler.invoke(request.value, cancel.clone());
            return blocking::wait(pending, &cancel, &self.config)
                .map(drop)
                .map_err(|fault| fault.surface(ty));
        }

        debug!(command = %ty, "no command handler registered");
        Err(DispatchError::not_found(ty, None))
    }

    /// Dispatch without blocking. A sync-only command runs now and yields a completed future.
    pub fn dispatch_async(&self, command: impl IntoCommand) -> BoxFuture<'static, Result<(), DispatchError>> {
        self.dispatch_async_cancellable(command, CancellationToken::new())
    }

    /// Like [`dispatch_async`](Self::dispatch_async); `cancel` is handed to the async handler as is.
    pub fn dispatch_async_cancellable(
        &self,
        command: impl IntoCommand,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<(), DispatchError>> {
        match self.start_async(command, cancel) {
            Ok(pending) => pending,
            Err(err) => future::ready(Err(err)).boxed(),
        }
    }

    fn start_async(
        &self,
        command: impl IntoCommand,
        cancel: CancellationToken,
    ) -> Result<BoxFuture<'static, Result<(), DispatchError>>, DispatchError> {
        let request = erase(command)?;
        let ty = request.request_type;

        if let Some(handler) = self.resolve_async(&request)? {
            debug!(command = %ty, "invoking async command handler");
            let pending = handler.invoke(request.value, cancel);
            return Ok(pending
                .map(move |outcome| outcome.map(drop).map_err(|fault| fault.surface(ty)))
                .boxed());
        }

        if let Some(handler) = self.resolve_sync(&request)? {
            debug!(command = %ty, "no async handler, running sync command handler inline");
            let outcome = handler
                .invoke(request.value)
                .map(drop)
                .map_err(|fault| fault.surface(ty));
            return Ok(future::ready(outcome).boxed());
        }

        debug!(command = %ty, "no command handler registered");
        Err(DispatchError::not_found(ty, None))
    }

    fn resolve_sync(&self, request: &ErasedRequest) -> Result<Option<Arc<dyn InvokeSync>>, DispatchError> {
        let contract = HandlerContract::sync_command(request.request_type);
        match resolve(self.resolver.as_ref(), &contract)? {
            Some(Invoker::Sync(invoker)) => Ok(Some(invoker)),
            Some(Invoker::Async(_)) => Err(mismatch(contract)),
            None => Ok(None),
        }
    }

    fn resolve_async(&self, request: &ErasedRequest) -> Result<Option<Arc<dyn InvokeAsync>>, DispatchError> {
        let contract = HandlerContract::async_command(request.request_type);
        match resolve(self.resolver.as_ref(), &contract)? {
            Some(Invoker::Async(invoker)) => Ok(Some(invoker)),
            Some(Invoker::Sync(_)) => Err(mismatch(contract)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn erase(command: impl IntoCommand) -> Result<ErasedRequest, DispatchError> {
    command
        .into_command()
        .map(ErasedRequest::from_command)
        .ok_or(DispatchError::InvalidArgument("command"))
}

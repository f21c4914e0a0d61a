//! Result-typed view over a [`QueryDispatcher`].

use std::marker::PhantomData;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::query_dispatcher::QueryDispatcher;
use crate::request::QueryOf;
use crate::DispatchError;

/// Dispatches queries that declare `R` as their result (`Q: QueryOf<R>`), so call sites need no annotation.
pub struct QueryFor<'a, R> {
    dispatcher: &'a QueryDispatcher,
    _result: PhantomData<fn() -> R>,
}

impl<'a, R: Send + 'static> QueryFor<'a, R> {
    pub(crate) fn new(dispatcher: &'a QueryDispatcher) -> Self {
        Self {
            dispatcher,
            _result: PhantomData,
        }
    }

    pub fn dispatch<Q: QueryOf<R>>(&self, query: Q) -> Result<R, DispatchError> {
        self.dispatcher.dispatch(query)
    }

    pub fn dispatch_cancellable<Q: QueryOf<R>>(
        &self,
        query: Q,
        cancel: CancellationToken,
    ) -> Result<R, DispatchError> {
        self.dispatcher.dispatch_cancellable(query, cancel)
    }

    pub fn dispatch_async<Q: QueryOf<R>>(&self, query: Q) -> BoxFuture<'static, Result<R, DispatchError>> {
        self.dispatcher.dispatch_async(query)
    }

    pub fn dispatch_async_cancellable<Q: QueryOf<R>>(
        &self,
        query: Q,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<R, DispatchError>> {
        self.dispatcher.dispatch_async_cancellable(query, cancel)
    }
}

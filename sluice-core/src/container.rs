//! Minimal DI container: services by type, handlers by contract. The default [`HandlerResolver`].

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

use crate::contract::HandlerContract;
use crate::handler::{AsyncCommandHandler, AsyncQueryHandler, CommandHandler, HandlerError, QueryHandler};
use crate::request::{Command, Query, RequestType, ResultType};
use crate::resolver::{HandlerResolver, ResolveError, ResolvedHandler};

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("no registration for type {0}")]
    NotFound(&'static str),
}

type ServiceFactory = Arc<dyn Fn(&Container) -> Arc<dyn Any + Send + Sync> + Send + Sync>;
type HandlerFactory = Arc<dyn Fn(&Container) -> Result<ResolvedHandler, HandlerError> + Send + Sync>;

#[derive(Clone)]
enum Registration {
    Instance(ResolvedHandler),
    Factory(HandlerFactory),
}

/// Services are singletons: an instance, or a factory run on first resolve.
/// Handlers are either one shared instance or a factory run on every resolve.
/// All methods take `&self`, so registrations may change while dispatchers share the container.
pub struct Container {
    services: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    service_factories: RwLock<HashMap<TypeId, ServiceFactory>>,
    handlers: RwLock<HashMap<HandlerContract, Registration>>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            service_factories: RwLock::new(HashMap::new()),
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn register_instance<T: Send + Sync + 'static>(&self, value: T) {
        self.services
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Register a lazily built singleton. The factory may resolve other services.
    pub fn register_factory<T, F>(&self, f: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        let factory: ServiceFactory = Arc::new(move |c: &Container| Arc::new(f(c)) as Arc<dyn Any + Send + Sync>);
        self.service_factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), factory);
    }

    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        let type_id = TypeId::of::<T>();
        let cached = self
            .services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned();
        let service = match cached {
            Some(service) => service,
            None => {
                let factory = self
                    .service_factories
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(&type_id)
                    .cloned()
                    .ok_or(ContainerError::NotFound(type_name::<T>()))?;
                // Built outside the lock; a concurrent first resolve keeps whichever value landed first.
                let built = factory(self);
                Arc::clone(
                    self.services
                        .write()
                        .unwrap_or_else(PoisonError::into_inner)
                        .entry(type_id)
                        .or_insert(built),
                )
            }
        };
        service
            .downcast::<T>()
            .map_err(|_| ContainerError::NotFound(type_name::<T>()))
    }

    pub fn register_command_handler<C, H>(&self, handler: H)
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        self.insert(ResolvedHandler::sync_command::<C, H>(Arc::new(handler)));
    }

    pub fn register_async_command_handler<C, H>(&self, handler: H)
    where
        C: Command,
        H: AsyncCommandHandler<C> + 'static,
    {
        self.insert(ResolvedHandler::async_command::<C, H>(Arc::new(handler)));
    }

    pub fn register_query_handler<Q, R, H>(&self, handler: H)
    where
        Q: Query,
        R: Send + 'static,
        H: QueryHandler<Q, R> + 'static,
    {
        self.insert(ResolvedHandler::sync_query::<Q, R, H>(Arc::new(handler)));
    }

    pub fn register_async_query_handler<Q, R, H>(&self, handler: H)
    where
        Q: Query,
        R: Send + 'static,
        H: AsyncQueryHandler<Q, R> + 'static,
    {
        self.insert(ResolvedHandler::async_query::<Q, R, H>(Arc::new(handler)));
    }

    /// Build a fresh handler on every resolve. A factory error surfaces as [`ResolveError::Provider`].
    pub fn register_command_handler_factory<C, H, F>(&self, f: F)
    where
        C: Command,
        H: CommandHandler<C> + 'static,
        F: Fn(&Container) -> Result<H, HandlerError> + Send + Sync + 'static,
    {
        let contract = HandlerContract::sync_command(RequestType::of::<C>());
        self.insert_factory(
            contract,
            Arc::new(move |c: &Container| -> Result<ResolvedHandler, HandlerError> {
                Ok(ResolvedHandler::sync_command::<C, H>(Arc::new(f(c)?)))
            }),
        );
    }

    pub fn register_async_command_handler_factory<C, H, F>(&self, f: F)
    where
        C: Command,
        H: AsyncCommandHandler<C> + 'static,
        F: Fn(&Container) -> Result<H, HandlerError> + Send + Sync + 'static,
    {
        let contract = HandlerContract::async_command(RequestType::of::<C>());
        self.insert_factory(
            contract,
            Arc::new(move |c: &Container| -> Result<ResolvedHandler, HandlerError> {
                Ok(ResolvedHandler::async_command::<C, H>(Arc::new(f(c)?)))
            }),
        );
    }

    pub fn register_query_handler_factory<Q, R, H, F>(&self, f: F)
    where
        Q: Query,
        R: Send + 'static,
        H: QueryHandler<Q, R> + 'static,
        F: Fn(&Container) -> Result<H, HandlerError> + Send + Sync + 'static,
    {
        let contract = HandlerContract::sync_query(RequestType::of::<Q>(), ResultType::of::<R>());
        self.insert_factory(
            contract,
            Arc::new(move |c: &Container| -> Result<ResolvedHandler, HandlerError> {
                Ok(ResolvedHandler::sync_query::<Q, R, H>(Arc::new(f(c)?)))
            }),
        );
    }

    pub fn register_async_query_handler_factory<Q, R, H, F>(&self, f: F)
    where
        Q: Query,
        R: Send + 'static,
        H: AsyncQueryHandler<Q, R> + 'static,
        F: Fn(&Container) -> Result<H, HandlerError> + Send + Sync + 'static,
    {
        let contract = HandlerContract::async_query(RequestType::of::<Q>(), ResultType::of::<R>());
        self.insert_factory(
            contract,
            Arc::new(move |c: &Container| -> Result<ResolvedHandler, HandlerError> {
                Ok(ResolvedHandler::async_query::<Q, R, H>(Arc::new(f(c)?)))
            }),
        );
    }

    /// Register an already built handler under its own contract. Used by facades and custom wiring.
    pub fn register_resolved(&self, handler: ResolvedHandler) {
        self.insert(handler);
    }

    /// Remove the registration for `contract`. Returns whether one existed.
    pub fn unregister(&self, contract: &HandlerContract) -> bool {
        let removed = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(contract)
            .is_some();
        if removed {
            debug!(%contract, "handler unregistered");
        }
        removed
    }

    pub fn contains(&self, contract: &HandlerContract) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(contract)
    }

    fn insert(&self, handler: ResolvedHandler) {
        self.insert_at(*handler.contract(), Registration::Instance(handler));
    }

    fn insert_factory(&self, contract: HandlerContract, factory: HandlerFactory) {
        self.insert_at(contract, Registration::Factory(factory));
    }

    fn insert_at(&self, contract: HandlerContract, registration: Registration) {
        let replaced = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(contract, registration)
            .is_some();
        if replaced {
            debug!(%contract, "handler registration replaced");
        } else {
            debug!(%contract, "handler registered");
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerResolver for Container {
    fn try_resolve_handler(
        &self,
        contract: &HandlerContract,
    ) -> Result<Option<ResolvedHandler>, ResolveError> {
        let registration = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(contract)
            .cloned();
        match registration {
            None => Ok(None),
            Some(Registration::Instance(handler)) => Ok(Some(handler)),
            Some(Registration::Factory(factory)) => factory(self)
                .map(Some)
                .map_err(|source| ResolveError::Provider {
                    contract: *contract,
                    source,
                }),
        }
    }
}

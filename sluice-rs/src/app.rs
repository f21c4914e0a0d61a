//! Application: one container, one command dispatcher and one query dispatcher over it.

use std::sync::Arc;

use sluice_core::{
    CommandDispatcher, Container, ContainerError, DispatchError, DispatcherConfig, HandlerContract, IntoCommand,
    IntoQuery, QueryDispatcher,
};
use thiserror::Error;
use tracing::info;

use crate::module::Module;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("module {module}: {contract} is already registered")]
    DuplicateHandler {
        module: String,
        contract: HandlerContract,
    },
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Wiring point for handlers. Modules register into the shared container; both dispatchers see every registration.
pub struct Application {
    container: Arc<Container>,
    commands: CommandDispatcher,
    queries: QueryDispatcher,
}

impl Application {
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self::from_container(Arc::new(Container::new()), config)
    }

    /// Build on an existing container, e.g. one already holding services.
    pub fn from_container(container: Arc<Container>, config: DispatcherConfig) -> Self {
        let commands = CommandDispatcher::with_config(container.clone(), config.clone());
        let queries = QueryDispatcher::with_config(container.clone(), config);
        Self {
            container,
            commands,
            queries,
        }
    }

    /// Register a module: its handlers go into the container.
    pub fn register(&mut self, module: &mut dyn Module) -> Result<&mut Self, AppError> {
        module.register_into(self)?;
        info!(module = module.name(), "module registered");
        Ok(self)
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn commands(&self) -> &CommandDispatcher {
        &self.commands
    }

    pub fn queries(&self) -> &QueryDispatcher {
        &self.queries
    }

    /// Shorthand for `commands().dispatch(command)`.
    pub fn send(&self, command: impl IntoCommand) -> Result<(), DispatchError> {
        self.commands.dispatch(command)
    }

    /// Shorthand for `queries().dispatch(query)`.
    pub fn ask<R: Send + 'static>(&self, query: impl IntoQuery) -> Result<R, DispatchError> {
        self.queries.dispatch(query)
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

//! Handler scaffolding used by the `sluice` binary: one file per request with its handler and registration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("`{0}` is not a PascalCase type name")]
    InvalidRequestName(String),
    #[error("`{0}` is not a valid module name")]
    InvalidModuleName(String),
    #[error("{} already exists, not overwriting", .0.display())]
    AlreadyExists(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What to generate: a command handler, or a query handler when `result` is set.
#[derive(Clone, Debug)]
pub struct HandlerTemplate {
    pub module: String,
    pub request: String,
    pub result: Option<String>,
    pub asynchronous: bool,
}

const COMMAND_RS: &str = r#"//! REQUEST: command and handler.
use sluice_rs::{Command, CommandHandler, HandlerError, HandlerModule};

#[derive(Debug, Command)]
pub struct REQUEST {}

pub struct REQUESTHandler;

impl CommandHandler<REQUEST> for REQUESTHandler {
    fn handle(&self, _command: REQUEST) -> Result<(), HandlerError> {
        Ok(())
    }
}

pub fn register(module: HandlerModule) -> HandlerModule {
    module.command(REQUESTHandler)
}
"#;

const ASYNC_COMMAND_RS: &str = r#"//! REQUEST: command and async handler.
use sluice_rs::{async_trait, AsyncCommandHandler, CancellationToken, Command, HandlerError, HandlerModule};

#[derive(Debug, Command)]
pub struct REQUEST {}

pub struct REQUESTHandler;

#[async_trait]
impl AsyncCommandHandler<REQUEST> for REQUESTHandler {
    async fn handle(&self, _command: REQUEST, _cancel: CancellationToken) -> Result<(), HandlerError> {
        Ok(())
    }
}

pub fn register(module: HandlerModule) -> HandlerModule {
    module.async_command(REQUESTHandler)
}
"#;

const QUERY_RS: &str = r#"//! REQUEST: query and handler.
use sluice_rs::{HandlerError, HandlerModule, Query, QueryHandler};

#[derive(Debug, Query)]
#[query(result = RESULT)]
pub struct REQUEST {}

pub struct REQUESTHandler;

impl QueryHandler<REQUEST, RESULT> for REQUESTHandler {
    fn handle(&self, _query: REQUEST) -> Result<RESULT, HandlerError> {
        Err("REQUEST is not implemented".into())
    }
}

pub fn register(module: HandlerModule) -> HandlerModule {
    module.query(REQUESTHandler)
}
"#;

const ASYNC_QUERY_RS: &str = r#"//! REQUEST: query and async handler.
use sluice_rs::{async_trait, AsyncQueryHandler, CancellationToken, HandlerError, HandlerModule, Query};

#[derive(Debug, Query)]
#[query(result = RESULT)]
pub struct REQUEST {}

pub struct REQUESTHandler;

#[async_trait]
impl AsyncQueryHandler<REQUEST, RESULT> for REQUESTHandler {
    async fn handle(&self, _query: REQUEST, _cancel: CancellationToken) -> Result<RESULT, HandlerError> {
        Err("REQUEST is not implemented".into())
    }
}

pub fn register(module: HandlerModule) -> HandlerModule {
    module.async_query(REQUESTHandler)
}
"#;

/// `DeleteUser` -> `delete_user`.
pub fn snake_case(s: &str) -> String {
    let mut out = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

impl HandlerTemplate {
    pub fn file_name(&self) -> String {
        format!("{}.rs", snake_case(&self.request))
    }

    pub fn render(&self) -> String {
        let template = match (&self.result, self.asynchronous) {
            (None, false) => COMMAND_RS,
            (None, true) => ASYNC_COMMAND_RS,
            (Some(_), false) => QUERY_RS,
            (Some(_), true) => ASYNC_QUERY_RS,
        };
        let rendered = template.replace("REQUEST", &self.request);
        match &self.result {
            Some(result) => rendered.replace("RESULT", result),
            None => rendered,
        }
    }

    /// Write `<root>/<module>/<request_snake>.rs`. Never overwrites.
    pub fn write(&self, root: &Path) -> Result<PathBuf, ScaffoldError> {
        self.validate()?;
        let dir = root.join(&self.module);
        fs::create_dir_all(&dir)?;
        let path = dir.join(self.file_name());
        if path.exists() {
            return Err(ScaffoldError::AlreadyExists(path));
        }
        fs::write(&path, self.render())?;
        Ok(path)
    }

    fn validate(&self) -> Result<(), ScaffoldError> {
        let pascal = self.request.chars().next().is_some_and(|c| c.is_ascii_uppercase())
            && self.request.chars().all(|c| c.is_ascii_alphanumeric());
        if !pascal {
            return Err(ScaffoldError::InvalidRequestName(self.request.clone()));
        }
        let module_ok = self.module.chars().next().is_some_and(|c| c.is_ascii_lowercase() || c == '_')
            && self.module.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !module_ok {
            return Err(ScaffoldError::InvalidModuleName(self.module.clone()));
        }
        Ok(())
    }
}

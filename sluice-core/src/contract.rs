//! Handler contracts: the key a resolver is asked for.

use std::fmt;

use crate::request::{RequestType, ResultType};

/// The four handler capability shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    SyncCommand,
    AsyncCommand,
    SyncQuery,
    AsyncQuery,
}

impl HandlerKind {
    pub fn is_async(self) -> bool {
        matches!(self, HandlerKind::AsyncCommand | HandlerKind::AsyncQuery)
    }

    pub fn is_query(self) -> bool {
        matches!(self, HandlerKind::SyncQuery | HandlerKind::AsyncQuery)
    }
}

/// A handler contract: kind + request type (+ result type for queries).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerContract {
    kind: HandlerKind,
    request: RequestType,
    result: Option<ResultType>,
}

impl HandlerContract {
    pub fn sync_command(request: RequestType) -> Self {
        Self {
            kind: HandlerKind::SyncCommand,
            request,
            result: None,
        }
    }

    pub fn async_command(request: RequestType) -> Self {
        Self {
            kind: HandlerKind::AsyncCommand,
            request,
            result: None,
        }
    }

    pub fn sync_query(request: RequestType, result: ResultType) -> Self {
        Self {
            kind: HandlerKind::SyncQuery,
            request,
            result: Some(result),
        }
    }

    pub fn async_query(request: RequestType, result: ResultType) -> Self {
        Self {
            kind: HandlerKind::AsyncQuery,
            request,
            result: Some(result),
        }
    }

    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    pub fn request(&self) -> RequestType {
        self.request
    }

    pub fn result(&self) -> Option<ResultType> {
        self.result
    }
}

impl fmt::Display for HandlerContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self.kind {
            HandlerKind::SyncCommand => "CommandHandler",
            HandlerKind::AsyncCommand => "AsyncCommandHandler",
            HandlerKind::SyncQuery => "QueryHandler",
            HandlerKind::AsyncQuery => "AsyncQueryHandler",
        };
        match self.result {
            Some(result) => write!(f, "{}<{}, {}>", shape, self.request, result),
            None => write!(f, "{}<{}>", shape, self.request),
        }
    }
}

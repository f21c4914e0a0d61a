//! The one place where invocation failures are turned into what the caller sees.
//!
//! Every invocation path (sync inline, async future, async awaited on a helper thread)
//! reports a [`Fault`]. [`Fault::surface`] strips exactly the layer the dispatch
//! machinery added and hands back the handler's own failure.

use std::any::Any;
use std::panic;

use crate::handler::HandlerError;
use crate::request::RequestType;
use crate::DispatchError;

pub(crate) enum Fault {
    /// The handler returned an error.
    Handler(HandlerError),
    /// The handler panicked on a thread the dispatcher joined.
    Panicked(Box<dyn Any + Send + 'static>),
    /// The caller's token fired while the dispatcher was blocked on the handler.
    Cancelled,
    /// Building a runtime for the blocking wait failed.
    Runtime(std::io::Error),
    /// The invoker received a value of the wrong type.
    Misrouted {
        expected: &'static str,
        found: &'static str,
    },
}

impl Fault {
    /// Unwrap one layer. Panics resume on the caller with the original payload.
    pub(crate) fn surface(self, request: RequestType) -> DispatchError {
        match self {
            Fault::Handler(err) => DispatchError::Handler(err),
            Fault::Panicked(payload) => panic::resume_unwind(payload),
            Fault::Cancelled => DispatchError::Cancelled { request },
            Fault::Runtime(err) => DispatchError::Runtime(err),
            Fault::Misrouted { expected, found } => DispatchError::Misrouted { expected, found },
        }
    }
}

impl From<HandlerError> for Fault {
    fn from(err: HandlerError) -> Self {
        Fault::Handler(err)
    }
}

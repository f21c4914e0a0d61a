//! Request markers: Command, Query and the runtime type identity dispatch keys on.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime identity of a request type. Equality and hashing use the `TypeId` only; the name is for diagnostics.
#[derive(Clone, Copy)]
pub struct RequestType {
    id: TypeId,
    name: &'static str,
}

impl RequestType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type path, e.g. `app::users::DeleteUser`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, e.g. `DeleteUser`.
    pub fn short_name(&self) -> &'static str {
        short(self.name)
    }
}

/// Runtime identity of a query result type. Same rules as [`RequestType`].
#[derive(Clone, Copy)]
pub struct ResultType {
    id: TypeId,
    name: &'static str,
}

impl ResultType {
    pub fn of<R: Any>() -> Self {
        Self {
            id: TypeId::of::<R>(),
            name: type_name::<R>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

macro_rules! type_identity {
    ($ty:ident) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name)
            }
        }
    };
}

type_identity!(RequestType);
type_identity!(ResultType);

fn short(name: &'static str) -> &'static str {
    let base = name.split('<').next().unwrap_or(name);
    match base.rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}

/// Anything that can travel through a dispatcher. Implemented for every `Send + 'static` type;
/// the methods are reachable through `dyn Command` / `dyn Query` so boxed requests keep their runtime type.
pub trait Request: Any + Send {
    fn request_type(&self) -> RequestType;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T: Any + Send> Request for T {
    fn request_type(&self) -> RequestType {
        RequestType::of::<T>()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Command: a request for a state change, no result. Use `#[derive(Command)]` or `impl Command for T {}`.
pub trait Command: Request {}

/// Query: a read request. The result type is chosen by the caller at dispatch time.
pub trait Query: Request {}

/// Query that declares its result type. Use `#[query(result = R)]` with `#[derive(Query)]`.
pub trait QueryOf<R>: Query {}

/// A command as accepted by the dispatch entry points. `None` is the absent command.
pub trait IntoCommand {
    fn into_command(self) -> Option<Box<dyn Command>>;
}

impl<C: Command> IntoCommand for C {
    fn into_command(self) -> Option<Box<dyn Command>> {
        Some(Box::new(self))
    }
}

impl IntoCommand for Box<dyn Command> {
    fn into_command(self) -> Option<Box<dyn Command>> {
        Some(self)
    }
}

impl<C: Command> IntoCommand for Option<C> {
    fn into_command(self) -> Option<Box<dyn Command>> {
        self.map(|c| Box::new(c) as Box<dyn Command>)
    }
}

impl IntoCommand for Option<Box<dyn Command>> {
    fn into_command(self) -> Option<Box<dyn Command>> {
        self
    }
}

/// A query as accepted by the dispatch entry points. `None` is the absent query.
pub trait IntoQuery {
    fn into_query(self) -> Option<Box<dyn Query>>;
}

impl<Q: Query> IntoQuery for Q {
    fn into_query(self) -> Option<Box<dyn Query>> {
        Some(Box::new(self))
    }
}

impl IntoQuery for Box<dyn Query> {
    fn into_query(self) -> Option<Box<dyn Query>> {
        Some(self)
    }
}

impl<Q: Query> IntoQuery for Option<Q> {
    fn into_query(self) -> Option<Box<dyn Query>> {
        self.map(|q| Box::new(q) as Box<dyn Query>)
    }
}

impl IntoQuery for Option<Box<dyn Query>> {
    fn into_query(self) -> Option<Box<dyn Query>> {
        self
    }
}

/// Type-erased request on its way to an invoker.
pub(crate) struct ErasedRequest {
    pub(crate) request_type: RequestType,
    pub(crate) value: Box<dyn Any + Send>,
}

impl ErasedRequest {
    pub(crate) fn from_command(command: Box<dyn Command>) -> Self {
        let request_type = Request::request_type(&*command);
        Self {
            request_type,
            value: <dyn Command as Request>::into_any(command),
        }
    }

    pub(crate) fn from_query(query: Box<dyn Query>) -> Self {
        let request_type = Request::request_type(&*query);
        Self {
            request_type,
            value: <dyn Query as Request>::into_any(query),
        }
    }
}

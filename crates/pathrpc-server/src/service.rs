//! Service description: how a receiver type exposes its methods
//!
//! A type becomes routable by implementing [`Service`]. Its
//! [`Service::methods`] function hands every callable method to a
//! [`MethodSink`] together with the concrete argument and reply types, so the
//! method shape is fixed at compile time and validated once, at registration.
//!
//! ```ignore
//! impl Service for Arith {
//!     const NAME: &'static str = "Arith";
//!
//!     fn methods<T: MethodSink<Self>>(sink: &mut T) {
//!         sink.by_value("Add", ReplyKind::Value, |svc: &Self, _ctx: &mut CallContext, args: Args, reply: &mut Sum| {
//!             reply.c = args.a + args.b;
//!             Ok(())
//!         });
//!     }
//! }
//! ```
//!
//! Most services derive this with `#[rpc_service]` instead of writing it out.

use pathrpc_core::{CallContext, HandlerResult};
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;

/// How a method receives its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// The method takes `()`: the request body is never decoded
    None,
    /// Arguments are passed by value
    Value,
    /// Arguments are passed by shared reference
    Reference,
}

/// What a method writes into its reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// The method replies with `()`: the response body is left empty
    None,
    /// A plain value
    Value,
    /// A map, sequence or array, encoded empty rather than null when untouched
    Container,
}

/// A receiver type whose methods can be registered with a server
pub trait Service: Sized + Send + Sync + 'static {
    /// Type name; must start with an ASCII uppercase letter to be registrable
    const NAME: &'static str;

    /// Describe every callable method to `sink`
    fn methods<T: MethodSink<Self>>(sink: &mut T);
}

/// Receives the method table of a [`Service`]
///
/// Handlers have the fixed shape `(receiver, context, args, reply) -> result`.
/// The reply is allocated with `Default::default()` before the handler runs.
pub trait MethodSink<S> {
    /// Register a method taking its arguments by value
    fn by_value<A, R, F>(&mut self, name: &'static str, reply: ReplyKind, handler: F)
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Default + Send + 'static,
        F: Fn(&S, &mut CallContext, A, &mut R) -> HandlerResult + Send + Sync + 'static;

    /// Register a method taking its arguments by reference
    fn by_ref<A, R, F>(&mut self, name: &'static str, reply: ReplyKind, handler: F)
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Default + Send + 'static,
        F: Fn(&S, &mut CallContext, &A, &mut R) -> HandlerResult + Send + Sync + 'static;

    /// Promote the methods of an embedded service reachable through `project`
    ///
    /// Methods already registered under the same name take precedence.
    fn embed<E: Service>(&mut self, project: fn(&S) -> &E)
    where
        Self: Sized,
        S: Send + Sync + 'static,
    {
        let mut projected = Projected {
            sink: self,
            project,
            _outer: PhantomData,
        };
        E::methods(&mut projected);
    }
}

/// Sink adapter that re-targets an embedded service's handlers at the outer receiver
struct Projected<'a, T, S, E> {
    sink: &'a mut T,
    project: fn(&S) -> &E,
    _outer: PhantomData<fn(&S)>,
}

impl<T, S, E> MethodSink<E> for Projected<'_, T, S, E>
where
    T: MethodSink<S>,
    S: Send + Sync + 'static,
    E: 'static,
{
    fn by_value<A, R, F>(&mut self, name: &'static str, reply: ReplyKind, handler: F)
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Default + Send + 'static,
        F: Fn(&E, &mut CallContext, A, &mut R) -> HandlerResult + Send + Sync + 'static,
    {
        let project = self.project;
        self.sink.by_value(
            name,
            reply,
            move |svc: &S, ctx: &mut CallContext, args: A, out: &mut R| {
                handler(project(svc), ctx, args, out)
            },
        );
    }

    fn by_ref<A, R, F>(&mut self, name: &'static str, reply: ReplyKind, handler: F)
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Default + Send + 'static,
        F: Fn(&E, &mut CallContext, &A, &mut R) -> HandlerResult + Send + Sync + 'static,
    {
        let project = self.project;
        self.sink.by_ref(
            name,
            reply,
            move |svc: &S, ctx: &mut CallContext, args: &A, out: &mut R| {
                handler(project(svc), ctx, args, out)
            },
        );
    }
}

/// Whether `name` is an externally visible type name
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

//! Registered methods and per-call invocation state

use crate::service::{ArgKind, MethodSink, ReplyKind, Service};
use pathrpc_core::{CallContext, HandlerResult};
use pathrpc_transport::{Codec, CodecError};
use serde::de::IntoDeserializer;
use serde::{Serialize, de::DeserializeOwned};
use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

/// State of one in-flight call: decoded arguments and the reply being built
///
/// The dispatcher drives it through decode, invoke and encode in that order.
pub trait PendingCall<C: Codec> {
    /// Decode the request body into a fresh argument value
    fn decode_args(&mut self, codec: &C, body: &[u8]) -> Result<(), CodecError>;

    /// Run the handler against the decoded arguments
    fn invoke(&mut self, ctx: &mut CallContext) -> HandlerResult;

    /// Encode the reply
    fn encode_reply(&self, codec: &C) -> Result<Vec<u8>, CodecError>;
}

type Invoker<S, A, R> = dyn Fn(&S, &mut CallContext, A, &mut R) -> HandlerResult + Send + Sync;

type CallFactory<C> = dyn Fn() -> Box<dyn PendingCall<C>> + Send + Sync;

struct TypedCall<S, A, R> {
    receiver: Arc<S>,
    handler: Arc<Invoker<S, A, R>>,
    skip_decode: bool,
    args: Option<A>,
    reply: R,
}

impl<C, S, A, R> PendingCall<C> for TypedCall<S, A, R>
where
    C: Codec,
    A: DeserializeOwned,
    R: Serialize,
{
    fn decode_args(&mut self, codec: &C, body: &[u8]) -> Result<(), CodecError> {
        let args = if self.skip_decode {
            A::deserialize(().into_deserializer()).map_err(|err: serde::de::value::Error| {
                CodecError::Deserialization(err.to_string())
            })?
        } else {
            codec.decode(body)?
        };
        self.args = Some(args);
        Ok(())
    }

    fn invoke(&mut self, ctx: &mut CallContext) -> HandlerResult {
        let args = self
            .args
            .take()
            .ok_or_else(|| anyhow::anyhow!("arguments were not decoded"))?;
        (self.handler)(&*self.receiver, ctx, args, &mut self.reply)
    }

    fn encode_reply(&self, codec: &C) -> Result<Vec<u8>, CodecError> {
        codec.encode(&self.reply)
    }
}

/// One routable method of a registered class
pub struct Method<C> {
    name: &'static str,
    args: ArgKind,
    reply: ReplyKind,
    factory: Arc<CallFactory<C>>,
}

impl<C: Codec> Method<C> {
    /// Method name as matched against the last path segment
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// How arguments are received
    pub fn args(&self) -> ArgKind {
        self.args
    }

    /// What the reply holds
    pub fn reply(&self) -> ReplyKind {
        self.reply
    }

    /// Allocate fresh per-call state with a default-initialized reply
    pub fn prepare(&self) -> Box<dyn PendingCall<C>> {
        (self.factory)()
    }
}

impl<C> std::fmt::Debug for Method<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("reply", &self.reply)
            .finish_non_exhaustive()
    }
}

fn is_unit<T: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<()>()
}

/// Collects the methods of one receiver into a name-indexed table
///
/// The first method registered under a name wins; later ones are ignored.
pub struct MethodTable<S, C> {
    receiver: Arc<S>,
    methods: HashMap<String, Method<C>>,
}

impl<S: Service, C: Codec> MethodTable<S, C> {
    /// Build the table for `receiver` from its [`Service`] description
    pub fn build(receiver: Arc<S>) -> Self {
        let mut table = Self {
            receiver,
            methods: HashMap::new(),
        };
        S::methods(&mut table);
        table
    }

    /// Number of methods collected
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether no method was collected
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Consume the table, yielding the methods by name
    pub fn into_methods(self) -> HashMap<String, Method<C>> {
        self.methods
    }

    fn insert<A, R>(
        &mut self,
        name: &'static str,
        args: ArgKind,
        reply: ReplyKind,
        handler: Arc<Invoker<S, A, R>>,
    ) where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Default + Send + 'static,
    {
        let entry = match self.methods.entry(name.to_string()) {
            Entry::Occupied(_) => {
                tracing::debug!(
                    service = S::NAME,
                    method = name,
                    "method shadowed by earlier registration"
                );
                return;
            }
            Entry::Vacant(entry) => entry,
        };

        let receiver = Arc::clone(&self.receiver);
        let skip_decode = is_unit::<A>();
        let factory = move || -> Box<dyn PendingCall<C>> {
            Box::new(TypedCall {
                receiver: Arc::clone(&receiver),
                handler: Arc::clone(&handler),
                skip_decode,
                args: None,
                reply: R::default(),
            })
        };

        let args = if skip_decode { ArgKind::None } else { args };
        let reply = if is_unit::<R>() { ReplyKind::None } else { reply };
        entry.insert(Method {
            name,
            args,
            reply,
            factory: Arc::new(factory),
        });
    }
}

impl<S: Service, C: Codec> MethodSink<S> for MethodTable<S, C> {
    fn by_value<A, R, F>(&mut self, name: &'static str, reply: ReplyKind, handler: F)
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Default + Send + 'static,
        F: Fn(&S, &mut CallContext, A, &mut R) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert(name, ArgKind::Value, reply, Arc::new(handler));
    }

    fn by_ref<A, R, F>(&mut self, name: &'static str, reply: ReplyKind, handler: F)
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Default + Send + 'static,
        F: Fn(&S, &mut CallContext, &A, &mut R) -> HandlerResult + Send + Sync + 'static,
    {
        let by_value = move |svc: &S, ctx: &mut CallContext, args: A, out: &mut R| {
            handler(svc, ctx, &args, out)
        };
        self.insert(name, ArgKind::Reference, reply, Arc::new(by_value));
    }
}

#[cfg(test)]
#[path = "method/method_tests.rs"]
mod method_tests;

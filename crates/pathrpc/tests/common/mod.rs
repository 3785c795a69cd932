//! Services shared by the integration tests

#![allow(dead_code)]

use pathrpc::prelude::*;
use pathrpc::{LoopbackTransport, JsonCodec, anyhow};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const NOT_EVEN: Code = Code(42_001);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Args {
    pub a: i64,
    pub b: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Sum {
    pub c: i64,
}

pub struct Greeter {
    pub greeting: String,
}

#[rpc_service]
impl Greeter {
    pub fn greet(&self, _ctx: &CallContext, name: &String, reply: &mut String) -> HandlerResult {
        *reply = format!("{}, {name}", self.greeting);
        Ok(())
    }

    /// Shadowed by `Arith::add` when embedded
    pub fn add(&self, _ctx: &mut CallContext, _args: Args, reply: &mut Sum) -> HandlerResult {
        reply.c = -1;
        Ok(())
    }
}

pub struct Arith {
    pub greeter: Greeter,
    calls: AtomicUsize,
}

impl Arith {
    pub fn new() -> Self {
        Self {
            greeter: Greeter {
                greeting: "hello".into(),
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[rpc_service(embed(greeter = Greeter))]
impl Arith {
    pub fn add(&self, _ctx: &mut CallContext, args: Args, reply: &mut Sum) -> HandlerResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        reply.c = args.a + args.b;
        Ok(())
    }

    pub fn mul(&self, _ctx: &CallContext, args: &Args, reply: &mut Sum) -> HandlerResult {
        reply.c = args.a * args.b;
        Ok(())
    }

    pub fn div(&self, _ctx: &mut CallContext, args: Args, reply: &mut Sum) -> HandlerResult {
        if args.b == 0 {
            anyhow::bail!("divide by zero");
        }
        reply.c = args.a / args.b;
        Ok(())
    }

    pub fn string(&self, _ctx: &mut CallContext, args: &Args, reply: &mut String) -> HandlerResult {
        *reply = format!("{}+{}={}", args.a, args.b, args.a + args.b);
        Ok(())
    }

    pub fn even(&self, _ctx: &mut CallContext, args: Args, reply: &mut Sum) -> RpcResult<()> {
        if args.a % 2 != 0 {
            return Err(RpcError::msg(NOT_EVEN, format!("{} is odd", args.a)));
        }
        reply.c = args.a;
        Ok(())
    }

    pub fn error(&self, _ctx: &mut CallContext, _args: Args, _reply: &mut Sum) -> HandlerResult {
        panic!("ERROR");
    }

    pub fn trace(&self, ctx: &mut CallContext, _args: (), reply: &mut String) -> HandlerResult {
        ctx.add_response_header(
            http::HeaderName::from_static("x-handled-by"),
            http::HeaderValue::from_static("arith"),
        );
        *reply = ctx.trace_id().to_string();
        Ok(())
    }

    #[rpc(name = "Squares")]
    pub fn squares_up_to(&self, _ctx: &mut CallContext, count: i64, reply: &mut Vec<i64>) -> HandlerResult {
        reply.extend((0..count).map(|i| i * i));
        Ok(())
    }

    pub fn reset(&self, _ctx: &mut CallContext, _args: (), _reply: &mut ()) -> HandlerResult {
        self.calls.store(0, Ordering::SeqCst);
        Ok(())
    }

    #[rpc(skip)]
    pub fn internal(&self, _ctx: &mut CallContext, _args: Args, _reply: &mut Sum) -> HandlerResult {
        Ok(())
    }
}

pub fn register_codes() {
    let _ = pathrpc::register(NOT_EVEN, "not even", http::StatusCode::UNPROCESSABLE_ENTITY);
}

/// Server with `Arith` registered under `/arith`
pub fn arith_server() -> (Arc<Server>, Arc<Arith>) {
    register_codes();
    let arith = Arc::new(Arith::new());
    let server = Arc::new(Server::json());
    server.register_shared("/arith", arith.clone()).unwrap();
    (server, arith)
}

/// Client talking to `server` in-process
pub fn loopback_client(server: Arc<Server>) -> Client<LoopbackTransport<JsonCodec>, JsonCodec> {
    Client::with_transport("http://loopback", LoopbackTransport::new(server), JsonCodec::new())
}

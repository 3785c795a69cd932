//! Services shared by the unit tests

use crate::service::{MethodSink, ReplyKind, Service};
use pathrpc_core::{CallContext, Code, HandlerResult, RpcError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Args {
    pub a: i64,
    pub b: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reply {
    pub c: i64,
}

pub const NOT_EVEN: Code = Code(41_001);

pub struct Arith;

impl Arith {
    fn add(&self, _ctx: &mut CallContext, args: Args, reply: &mut Reply) -> HandlerResult {
        reply.c = args.a + args.b;
        Ok(())
    }

    fn mul(&self, _ctx: &mut CallContext, args: &Args, reply: &mut Reply) -> HandlerResult {
        reply.c = args.a * args.b;
        Ok(())
    }

    fn div(&self, _ctx: &mut CallContext, args: Args, reply: &mut Reply) -> HandlerResult {
        if args.b == 0 {
            anyhow::bail!("divide by zero");
        }
        reply.c = args.a / args.b;
        Ok(())
    }

    fn string(&self, _ctx: &mut CallContext, args: &Args, reply: &mut String) -> HandlerResult {
        *reply = format!("{}+{}={}", args.a, args.b, args.a + args.b);
        Ok(())
    }

    fn even(&self, _ctx: &mut CallContext, args: Args, reply: &mut Reply) -> HandlerResult {
        if args.a % 2 != 0 {
            return Err(RpcError::msg(NOT_EVEN, format!("{} is odd", args.a)).into());
        }
        reply.c = args.a;
        Ok(())
    }

    fn error(&self, _ctx: &mut CallContext, _args: Args, _reply: &mut Reply) -> HandlerResult {
        panic!("ERROR");
    }

    fn trace(&self, ctx: &mut CallContext, _args: (), reply: &mut String) -> HandlerResult {
        ctx.add_response_header(
            http::HeaderName::from_static("x-handled-by"),
            http::HeaderValue::from_static("arith"),
        );
        *reply = ctx.trace_id().to_string();
        Ok(())
    }
}

impl Service for Arith {
    const NAME: &'static str = "Arith";

    fn methods<T: MethodSink<Self>>(sink: &mut T) {
        sink.by_value("Add", ReplyKind::Value, Self::add);
        sink.by_ref("Mul", ReplyKind::Value, Self::mul);
        sink.by_value("Div", ReplyKind::Value, Self::div);
        sink.by_ref("String", ReplyKind::Value, Self::string);
        sink.by_value("Even", ReplyKind::Value, Self::even);
        sink.by_value("Error", ReplyKind::Value, Self::error);
        sink.by_value("Trace", ReplyKind::Value, Self::trace);
    }
}

pub struct Builtin;

impl Builtin {
    fn map(
        &self,
        _ctx: &mut CallContext,
        count: i32,
        reply: &mut HashMap<String, i32>,
    ) -> HandlerResult {
        for i in 0..count {
            reply.insert(format!("k{i}"), i);
        }
        Ok(())
    }

    fn slice(&self, _ctx: &mut CallContext, count: i32, reply: &mut Vec<i32>) -> HandlerResult {
        reply.extend(0..count);
        Ok(())
    }

    fn array(&self, _ctx: &mut CallContext, value: i32, reply: &mut [i32; 3]) -> HandlerResult {
        *reply = [value; 3];
        Ok(())
    }

    fn printer(&self, _ctx: &mut CallContext, _line: String, _reply: &mut ()) -> HandlerResult {
        Ok(())
    }
}

impl Service for Builtin {
    const NAME: &'static str = "Builtin";

    fn methods<T: MethodSink<Self>>(sink: &mut T) {
        sink.by_value("Map", ReplyKind::Container, Self::map);
        sink.by_value("Slice", ReplyKind::Container, Self::slice);
        sink.by_value("Array", ReplyKind::Container, Self::array);
        sink.by_value("Printer", ReplyKind::None, Self::printer);
    }
}

pub struct Greeter {
    pub greeting: &'static str,
}

impl Service for Greeter {
    const NAME: &'static str = "Greeter";

    fn methods<T: MethodSink<Self>>(sink: &mut T) {
        sink.by_ref(
            "Greet",
            ReplyKind::Value,
            |svc: &Self, _ctx: &mut CallContext, name: &String, reply: &mut String| {
                *reply = format!("{}, {name}", svc.greeting);
                Ok(())
            },
        );
        sink.by_value(
            "Add",
            ReplyKind::Value,
            |_svc: &Self, _ctx: &mut CallContext, _args: Args, reply: &mut Reply| {
                reply.c = -1;
                Ok(())
            },
        );
    }
}

/// Outer service promoting the methods of an embedded `Greeter`
pub struct Embed {
    pub greeter: Greeter,
}

impl Service for Embed {
    const NAME: &'static str = "Embed";

    fn methods<T: MethodSink<Self>>(sink: &mut T) {
        sink.by_value(
            "Add",
            ReplyKind::Value,
            |_svc: &Self, _ctx: &mut CallContext, args: Args, reply: &mut Reply| {
                reply.c = args.a + args.b;
                Ok(())
            },
        );
        sink.embed::<Greeter>(|svc| &svc.greeter);
    }
}

pub struct Empty;

impl Service for Empty {
    const NAME: &'static str = "Empty";

    fn methods<T: MethodSink<Self>>(_sink: &mut T) {}
}

#[allow(non_camel_case_types)]
pub struct hidden;

impl Service for hidden {
    const NAME: &'static str = "hidden";

    fn methods<T: MethodSink<Self>>(sink: &mut T) {
        sink.by_value(
            "Ping",
            ReplyKind::None,
            |_svc: &Self, _ctx: &mut CallContext, _args: (), _reply: &mut ()| Ok(()),
        );
    }
}

//! Panic isolation for handler invocation
//!
//! A handler panic must never take down the serving process or leak into
//! other requests. [`catch_panic`] runs a closure under `catch_unwind` and
//! turns a panic into a [`PanicReport`] carrying the message, the source
//! location and a backtrace captured at the panic site.
//!
//! The backtrace can only be captured while the panic is being raised, so a
//! process-wide hook is installed on first use. Inside a guarded region the
//! hook records the report for the current thread and stays silent; outside
//! one it defers to the hook that was installed before it.

use pathrpc_core::{Code, RpcError, stack_trace_enabled};
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::Once;

thread_local! {
    static IN_GUARD: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Option<PanicReport>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Details of a recovered panic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicReport {
    /// Panic message
    pub message: String,
    /// `file:line:column` of the panic, when known
    pub location: Option<String>,
    /// Backtrace captured at the panic site
    pub stack: String,
}

impl PanicReport {
    /// Convert into a structured error with [`Code::PANIC`]
    ///
    /// The panic-site stack is attached only when stack capture is enabled.
    pub fn into_error(self) -> RpcError {
        let err = RpcError::msg(Code::PANIC, self.message);
        if stack_trace_enabled() {
            err.with_stack(self.stack)
        } else {
            err
        }
    }
}

/// Run `f`, recovering from any panic it raises
///
/// The panic is logged at error level together with its stack.
pub fn catch_panic<F, R>(f: F) -> Result<R, PanicReport>
where
    F: FnOnce() -> R,
{
    install_panic_hook();

    let was_guarded = IN_GUARD.with(|flag| flag.replace(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    IN_GUARD.with(|flag| flag.set(was_guarded));

    outcome.map_err(|payload| {
        let report = LAST_PANIC
            .with(|last| last.borrow_mut().take())
            .unwrap_or_else(|| unhooked_report(payload.as_ref()));

        tracing::error!(
            panic = %report.message,
            location = report.location.as_deref().unwrap_or("unknown"),
            stack = %report.stack,
            "handler panicked"
        );
        report
    })
}

/// Report for a panic our hook did not see, e.g. because another hook
/// replaced it; the stack is taken from the unwind site instead
fn unhooked_report(payload: &(dyn Any + Send)) -> PanicReport {
    PanicReport {
        message: panic_to_string(payload),
        location: None,
        stack: Backtrace::force_capture().to_string(),
    }
}

/// Convert a panic payload to a human-readable string
fn panic_to_string(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Install the recording panic hook once per process
///
/// Called automatically by [`catch_panic`]; calling it early keeps the
/// previous hook chain deterministic when other code also sets hooks.
pub fn install_panic_hook() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            if IN_GUARD.with(Cell::get) {
                let report = PanicReport {
                    message: panic_to_string(info.payload()),
                    location: info
                        .location()
                        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())),
                    stack: Backtrace::force_capture().to_string(),
                };
                LAST_PANIC.with(|last| *last.borrow_mut() = Some(report));
            } else {
                previous(info);
            }
        }));
    });
}

#[cfg(test)]
#[path = "panic_guard/panic_guard_tests.rs"]
mod panic_guard_tests;

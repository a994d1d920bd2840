use crate::engine::{Engine, Origin};
use futures::FutureExt;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::error;
use trust_dns_proto::op::Message;

thread_local! {
    // Set by the panic hook on the panicking thread, taken by the dispatcher that caught it.
    static PANIC_BACKTRACE: RefCell<Option<Backtrace>> = RefCell::new(None);
}

/// Replace the default panic hook with one that reports through `tracing` and keeps the
/// backtrace for the [`Dispatcher`] to log alongside the faulted request.
pub fn capture_panic_backtraces() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = Backtrace::force_capture();
        error!("{info}");
        PANIC_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(backtrace));
    }));
}

fn take_panic_backtrace() -> Option<Backtrace> {
    PANIC_BACKTRACE.with(|slot| slot.borrow_mut().take())
}

/// Runs the [`Engine`] for one request at a time behind a fault barrier.
///
/// A panic while resolving a query is caught here, logged, and answered with `SERVFAIL` for
/// that query alone. It never reaches the listener or any other in-flight request.
#[derive(Clone)]
pub struct Dispatcher {
    engine: Arc<Engine>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(engine: Arc<Engine>) -> Self {
        Dispatcher { engine }
    }

    pub async fn dispatch(&self, query: &Message, origin: Origin) -> Message {
        match AssertUnwindSafe(self.engine.resolve(query, origin))
            .catch_unwind()
            .await
        {
            Ok(response) => response,
            Err(payload) => {
                let backtrace = take_panic_backtrace()
                    .map_or_else(String::new, |backtrace| format!("\n{backtrace}"));
                error!(
                    "PANIC: {} (query {:?} from {} over {}){backtrace}",
                    panic_message(payload.as_ref()),
                    query.queries(),
                    origin.addr,
                    origin.transport,
                );
                self.engine.refuse_on_fault(query)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faulting(fail: bool) -> u32 {
        assert!(!fail, "fault trigger hit for panic.test");
        1
    }

    #[test]
    fn hook_keeps_backtrace_for_the_catching_thread() {
        capture_panic_backtraces();
        let caught = std::panic::catch_unwind(|| faulting(true));
        let backtrace = take_panic_backtrace();
        drop(std::panic::take_hook());

        let payload = caught.unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "fault trigger hit for panic.test");
        assert!(backtrace.is_some());
        assert!(take_panic_backtrace().is_none());
    }

    #[test]
    fn no_backtrace_without_a_panic() {
        assert_eq!(faulting(false), 1);
        assert!(take_panic_backtrace().is_none());
    }
}

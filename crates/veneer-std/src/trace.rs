//! # Trace
//!
//! Logs each call through `tracing` without touching its result.
//!
//! Every call runs inside a `veneer.call` span carrying the type name and
//! method. On completion a `debug!` event records the outcome and the
//! elapsed time in microseconds.

use std::time::Instant;
use tracing::{debug, debug_span};
use veneer_core::{Arguments, Decoratable, Decorator, Next, Result};

/// Structured call logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trace;

impl<T> Decorator<T> for Trace
where
    T: Decoratable,
    T::Output: Default,
{
    fn handle(
        &self,
        _instance: &T,
        method: &str,
        args: &Arguments,
        next: Option<Next<'_, T::Output>>,
    ) -> Result<T::Output> {
        let span = debug_span!("veneer.call", type_name = T::type_name(), method);
        let _entered = span.enter();

        let Some(next) = next else {
            debug!("Nothing to call");
            return Ok(T::Output::default());
        };

        debug!(arguments = args.len(), "Call started");
        let start = Instant::now();

        let result = next.run();

        let elapsed_us = start.elapsed().as_micros() as u64;
        match &result {
            Ok(_) => debug!(elapsed_us, "Call completed"),
            Err(err) => debug!(elapsed_us, error = %err, "Call failed"),
        }

        result
    }

    fn name(&self) -> &str {
        "trace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veneer_core::{Error, MethodTable, Value, args, json};

    struct Ledger;

    impl Decoratable for Ledger {
        type Output = Value;

        fn methods() -> MethodTable<Self> {
            MethodTable::new()
        }
    }

    #[test]
    fn passes_success_through() {
        let body = || -> Result<Value> { Ok(json!({ "balance": 12 })) };
        let result = Trace.handle(&Ledger, "balance", &args![], Some(Next::new(&body)));
        assert_eq!(result.ok(), Some(json!({ "balance": 12 })));
    }

    #[test]
    fn passes_failure_through() {
        let body = || -> Result<Value> { Err(Error::undefined_method("Ledger", "close")) };
        let result = Trace.handle(&Ledger, "close", &args![], Some(Next::new(&body)));
        assert!(matches!(result, Err(Error::UndefinedMethod { .. })));
    }

    #[test]
    fn absent_next_yields_default() {
        let result = Trace.handle(&Ledger, "balance", &args![], None);
        assert_eq!(result.ok(), Some(Value::Null));
    }
}

//! Lifecycle reporting for wrapped calls
//!
//! An [`Observer`] is handed to the client once at construction and is notified
//! at four points of every invocation: before the first attempt, after a
//! success, after each failure that will be retried, and after the terminal
//! failure. Observers are one-way sinks: they return nothing and must not fail.
//!
//! Three observers ship with the crate:
//!
//! - [`NullObserver`] discards everything
//! - [`ConsoleObserver`] prints one JSON line per event to standard output
//! - [`TracingObserver`] forwards events into the `tracing` log stream

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::io::Write;
use tracing::{debug, error, warn};

use crate::error::Failure;

/// Receiver of lifecycle notifications for wrapped calls
///
/// # Examples
///
/// ```
/// use clerk_guard::observer::Observer;
/// use clerk_guard::error::Failure;
/// use serde_json::Value;
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct Counter(Mutex<usize>);
///
/// impl Observer for Counter {
///     fn report_input(&self, _: &str, _: &Value) { *self.0.lock().unwrap() += 1; }
///     fn report_output(&self, _: &str, _: &Value) {}
///     fn report_retry(&self, _: &str, _: u32, _: &dyn Failure) {}
///     fn report_failure(&self, _: &str, _: &dyn Failure) {}
/// }
/// ```
pub trait Observer: Send + Sync {
    /// Called once, before the first attempt
    fn report_input(&self, operation_name: &str, arguments: &Value);

    /// Called once, with the value about to be returned to the caller
    fn report_output(&self, operation_name: &str, result: &Value);

    /// Called each time an attempt fails and another attempt will follow
    fn report_retry(&self, operation_name: &str, attempt_number: u32, error: &dyn Failure);

    /// Called once, right before the invocation fails
    fn report_failure(&self, operation_name: &str, error: &dyn Failure);
}

/// Serializable record of one lifecycle notification
///
/// Renders as `{"type": "<event>", "operationName": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ObserverEvent {
    Input {
        operation_name: String,
        arguments: Value,
    },
    Output {
        operation_name: String,
        result: Value,
    },
    RetryError {
        operation_name: String,
        attempt_number: u32,
        error: Value,
    },
    Error {
        operation_name: String,
        error: Value,
    },
}

impl ObserverEvent {
    pub fn operation_name(&self) -> &str {
        match self {
            ObserverEvent::Input { operation_name, .. }
            | ObserverEvent::Output { operation_name, .. }
            | ObserverEvent::RetryError { operation_name, .. }
            | ObserverEvent::Error { operation_name, .. } => operation_name,
        }
    }
}

/// Renders a failure as `{"status": <u16 or null>, "message": "<display>", ...}`
///
/// Any [`Failure::details`] are merged in after the two fixed fields, so a
/// platform error also carries its `errors` entries and `clerkTraceId`.
pub fn describe_failure(error: &dyn Failure) -> Value {
    let mut described = Map::new();
    described.insert("status".into(), json!(error.status()));
    described.insert("message".into(), json!(error.to_string()));
    for (key, value) in error.details() {
        described.entry(key).or_insert(value);
    }
    Value::Object(described)
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn report_input(&self, _operation_name: &str, _arguments: &Value) {}
    fn report_output(&self, _operation_name: &str, _result: &Value) {}
    fn report_retry(&self, _operation_name: &str, _attempt_number: u32, _error: &dyn Failure) {}
    fn report_failure(&self, _operation_name: &str, _error: &dyn Failure) {}
}

/// Observer that writes each event as a JSON line to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleObserver;

impl ConsoleObserver {
    fn emit(&self, event: ObserverEvent) {
        // Serializing a Value-backed enum cannot fail, and a closed stdout is
        // not something an observer is allowed to surface.
        if let Ok(line) = serde_json::to_string(&event) {
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "{}", line);
        }
    }
}

impl Observer for ConsoleObserver {
    fn report_input(&self, operation_name: &str, arguments: &Value) {
        self.emit(ObserverEvent::Input {
            operation_name: operation_name.to_string(),
            arguments: arguments.clone(),
        });
    }

    fn report_output(&self, operation_name: &str, result: &Value) {
        self.emit(ObserverEvent::Output {
            operation_name: operation_name.to_string(),
            result: result.clone(),
        });
    }

    fn report_retry(&self, operation_name: &str, attempt_number: u32, error: &dyn Failure) {
        self.emit(ObserverEvent::RetryError {
            operation_name: operation_name.to_string(),
            attempt_number,
            error: describe_failure(error),
        });
    }

    fn report_failure(&self, operation_name: &str, error: &dyn Failure) {
        self.emit(ObserverEvent::Error {
            operation_name: operation_name.to_string(),
            error: describe_failure(error),
        });
    }
}

/// Observer that forwards events to `tracing`
///
/// Inputs and outputs are logged at debug level, retries at warn and terminal
/// failures at error, each with the operation name as a structured field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn report_input(&self, operation_name: &str, arguments: &Value) {
        debug!(operation = operation_name, %arguments, "clerk call started");
    }

    fn report_output(&self, operation_name: &str, result: &Value) {
        debug!(operation = operation_name, %result, "clerk call succeeded");
    }

    fn report_retry(&self, operation_name: &str, attempt_number: u32, error: &dyn Failure) {
        warn!(
            operation = operation_name,
            attempt = attempt_number,
            status = ?error.status(),
            "clerk call failed, retrying: {}",
            error
        );
    }

    fn report_failure(&self, operation_name: &str, error: &dyn Failure) {
        error!(
            operation = operation_name,
            status = ?error.status(),
            "clerk call failed: {}",
            error
        );
    }
}

//! Tool execution seam used by the turn controller

use serde_json::{Map, Value};

use crate::types::{unknown_tool, ToolDefinition};

/// A set of tools the model may call during a turn
///
/// `call` never fails: problems become `{"status": "error", ...}` results
/// so the model can read them.
pub trait ToolBox {
    /// Declarations sent with each request; empty means "no tools"
    fn declarations(&self) -> &[ToolDefinition];

    /// Run the named tool with already-decoded arguments
    fn call(&mut self, name: &str, args: &Map<String, Value>) -> Value;

    /// Remember the state tools may mutate; taken with the turn snapshot
    fn checkpoint(&mut self) {}

    /// Return to the last checkpoint; called whenever the history is rolled back
    fn rollback(&mut self) {}
}

/// A toolbox with nothing in it
#[derive(Debug, Default)]
pub struct NoTools;

impl ToolBox for NoTools {
    fn declarations(&self) -> &[ToolDefinition] {
        &[]
    }

    fn call(&mut self, name: &str, _args: &Map<String, Value>) -> Value {
        unknown_tool(name)
    }
}

/// Read an optional string argument
pub(crate) fn str_arg<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// Read an optional integer argument, falling back to `default`
///
/// Models sometimes send numbers as strings (`"2"`) or floats (`2.0`).
pub(crate) fn int_arg(args: &Map<String, Value>, key: &str, default: i32) -> i32 {
    match args.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(|v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
            .unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

use serde::Serialize;
use thiserror::Error;

/// Recoverable conditions met while walking a script.
///
/// None of these abort a walk; they are collected in the walk report so a
/// corrupt room degrades to a partial trace instead of a failed load.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptError {
    #[error("function index {index} is outside the {count}-entry function table")]
    FunctionOutOfRange { index: usize, count: usize },
    #[error("instruction ceiling of {limit} reached")]
    InstructionLimit { limit: usize },
    #[error("instruction at 0x{offset:08x} wants {wanted} bytes but only {available} remain")]
    Truncated {
        offset: usize,
        wanted: usize,
        available: usize,
    },
}

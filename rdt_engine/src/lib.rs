//! Room script engine: decodes, executes and disassembles the bytecode
//! embedded in RE1, RE2 and RE3 room files.

pub mod config;
pub mod cursor;
pub mod disasm;
pub mod error;
pub mod exec;
pub mod facade;
pub mod resolver;
pub mod section;
pub mod variant;
pub mod walk;

pub use config::EngineConfig;
pub use disasm::{dump, render, DisasmLine, Disassembly};
pub use error::ScriptError;
pub use exec::{execute, ExecutionEngine};
pub use facade::{GameFacade, RoomState};
pub use resolver::{resolve, resolve_gosub, EntryTable, ScriptSegment};
pub use section::{dump_section, execute_section, load_room, ScriptKind};
pub use walk::{walk, Visit, Visitor, WalkReport};

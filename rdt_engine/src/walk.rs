//! The instruction walk shared by execution and disassembly.
//!
//! A walk decodes a segment front to back. Block openers hand their body to a
//! nested walk one level deeper, then the outer walk resumes right after the
//! body; the closing instruction (`end_if`, `next`, ...) is decoded by the
//! outer level. Embedded scripts are walked with their own language.

use serde::Serialize;

use crate::cursor::Cursor;
use crate::error::ScriptError;
use crate::variant::{BlockKind, Instruction, ScriptVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    /// Abandon the rest of the current body.
    Stop,
}

pub trait Visitor {
    fn visit(&mut self, variant: &dyn ScriptVariant, inst: &Instruction<'_>, depth: usize) -> Visit;

    /// Called before a block body is walked; `false` skips the body.
    fn enter(&mut self, _inst: &Instruction<'_>, _kind: BlockKind, _depth: usize) -> bool {
        true
    }

    /// `completed` is false when the body was abandoned part way.
    fn leave(&mut self, _inst: &Instruction<'_>, _kind: BlockKind, _depth: usize, _completed: bool) {
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct WalkReport {
    pub instructions: usize,
    pub errors: Vec<ScriptError>,
}

impl WalkReport {
    pub fn merge(&mut self, other: WalkReport) {
        self.instructions += other.instructions;
        self.errors.extend(other.errors);
    }

    pub fn hit_limit(&self) -> bool {
        self.errors
            .iter()
            .any(|err| matches!(err, ScriptError::InstructionLimit { .. }))
    }
}

struct Walk<'v> {
    visitor: &'v mut dyn Visitor,
    limit: usize,
    halted: bool,
    report: WalkReport,
}

/// Walks `code`, whose first byte sits at section-relative offset `origin`,
/// visiting at most `limit` instructions (nested ones included).
pub fn walk(
    code: &[u8],
    origin: usize,
    variant: &dyn ScriptVariant,
    visitor: &mut dyn Visitor,
    limit: usize,
) -> WalkReport {
    let mut walk = Walk {
        visitor,
        limit,
        halted: false,
        report: WalkReport::default(),
    };
    walk.level(code, origin, variant, 0);
    walk.report
}

impl Walk<'_> {
    /// Returns whether the level ran to its end.
    fn level(&mut self, code: &[u8], origin: usize, variant: &dyn ScriptVariant, depth: usize) -> bool {
        let mut cursor = Cursor::new(code, origin);
        while let Some(step) = cursor.step(variant) {
            if self.report.instructions >= self.limit {
                log::warn!("stopping walk after {} instructions", self.limit);
                self.report
                    .errors
                    .push(ScriptError::InstructionLimit { limit: self.limit });
                self.halted = true;
                return false;
            }
            self.report.instructions += 1;

            let inst = step.instruction;
            if step.consumed < step.wanted {
                log::warn!(
                    "{} instruction 0x{:02x} at 0x{:08x} runs past the end of its segment",
                    variant.name(),
                    inst.opcode(),
                    inst.offset
                );
                self.report.errors.push(ScriptError::Truncated {
                    offset: inst.offset,
                    wanted: step.wanted,
                    available: step.consumed,
                });
            }

            if self.visitor.visit(variant, &inst, depth) == Visit::Stop {
                return false;
            }

            if let Some(embedded) = variant.embedded(&inst) {
                let start = embedded.start.min(inst.len());
                let end = start.saturating_add(embedded.length).min(inst.len());
                self.level(
                    &inst.bytes[start..end],
                    inst.offset + start,
                    embedded.variant,
                    depth + 1,
                );
                if self.halted {
                    return false;
                }
            }

            if let Some(block) = variant.block(&inst, cursor.rest()) {
                let body = block.body.min(cursor.remaining());
                if self.visitor.enter(&inst, block.kind, depth) {
                    let completed =
                        self.level(&cursor.rest()[..body], cursor.offset(), variant, depth + 1);
                    if self.halted {
                        return false;
                    }
                    self.visitor.leave(&inst, block.kind, depth, completed);
                }
                cursor.skip(body);
            }
        }
        true
    }
}

use crate::config::EngineConfig;
use crate::facade::GameFacade;
use crate::resolver::ScriptSegment;
use crate::variant::{BlockKind, Condition, Instruction, ScriptVariant};
use crate::walk::{walk, Visit, Visitor, WalkReport};

/// Applies each decoded instruction to a [`GameFacade`].
///
/// By default every body is executed whatever its condition says, which
/// populates a room with everything its scripts can create. With
/// `evaluate_conditions` a failed flag test abandons the rest of the body it
/// sits in, and an `else` only runs when its `if` body was abandoned.
pub struct ExecutionEngine<'f> {
    facade: &'f mut dyn GameFacade,
    evaluate_conditions: bool,
    // outcome of the last `if` body closed at each depth
    if_completed: Vec<Option<bool>>,
}

impl<'f> ExecutionEngine<'f> {
    pub fn new(facade: &'f mut dyn GameFacade, evaluate_conditions: bool) -> Self {
        ExecutionEngine {
            facade,
            evaluate_conditions,
            if_completed: Vec::new(),
        }
    }

    fn slot(&mut self, depth: usize) -> &mut Option<bool> {
        if self.if_completed.len() <= depth {
            self.if_completed.resize(depth + 1, None);
        }
        &mut self.if_completed[depth]
    }
}

impl Visitor for ExecutionEngine<'_> {
    fn visit(&mut self, variant: &dyn ScriptVariant, inst: &Instruction<'_>, depth: usize) -> Visit {
        let condition = variant.execute_one(inst, &mut *self.facade);
        if self.evaluate_conditions && depth > 0 && condition == Condition::Flag(false) {
            return Visit::Stop;
        }
        Visit::Continue
    }

    fn enter(&mut self, _inst: &Instruction<'_>, kind: BlockKind, depth: usize) -> bool {
        match kind {
            BlockKind::If => {
                *self.slot(depth) = None;
                true
            }
            BlockKind::Else if self.evaluate_conditions => self.slot(depth).take() != Some(true),
            _ => true,
        }
    }

    fn leave(&mut self, _inst: &Instruction<'_>, kind: BlockKind, depth: usize, completed: bool) {
        if kind == BlockKind::If {
            *self.slot(depth) = Some(completed);
        }
    }
}

/// Runs one function of a room against `facade`.
pub fn execute(
    room: &[u8],
    segment: &ScriptSegment,
    variant: &dyn ScriptVariant,
    facade: &mut dyn GameFacade,
    config: &EngineConfig,
) -> WalkReport {
    log::debug!(
        "executing {} function {} at 0x{:08x} ({} bytes)",
        variant.name(),
        segment.index,
        segment.base_offset,
        segment.byte_length
    );
    let mut engine = ExecutionEngine::new(facade, config.evaluate_conditions);
    walk(
        segment.code(room),
        segment.entry_offset() as usize,
        variant,
        &mut engine,
        config.max_instructions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::RoomState;
    use crate::variant::RE2;

    // IFEL_CK { CK 4/0x12 on; SET 1/1 } ELSE_CK { SET 1/2; CUT_CHG 5 } ENDIF; SET 1/3
    const GATED: [u8; 28] = [
        0x06, 0x00, 0x0c, 0x00, // if, stored 12
        0x21, 0x04, 0x12, 0x01, //
        0x22, 0x01, 0x01, 0x01, //
        0x07, 0x00, 0x0a, 0x00, // else, stored 10
        0x22, 0x01, 0x02, 0x01, //
        0x29, 0x05, //
        0x08, 0x00, //
        0x22, 0x01, 0x03, 0x01,
    ];

    fn run(state: &mut RoomState, evaluate_conditions: bool) {
        let mut engine = ExecutionEngine::new(state, evaluate_conditions);
        let report = walk(&GATED, 0, &RE2, &mut engine, 100);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn conditions_are_ignored_by_default() {
        let mut state = RoomState::default();
        run(&mut state, false);
        assert!(state.flag(1, 1));
        assert!(state.flag(1, 2));
        assert!(state.flag(1, 3));
    }

    #[test]
    fn failed_test_takes_the_else_branch() {
        let mut state = RoomState::default();
        run(&mut state, true);
        assert!(!state.flag(1, 1));
        assert!(state.flag(1, 2));
        assert!(state.flag(1, 3));
    }

    #[test]
    fn passed_test_skips_the_else_branch() {
        let mut state = RoomState::default();
        state.set_flag(crate::facade::FlagOp {
            array: 4,
            bit: 0x12,
            op: crate::facade::FlagOpKind::Set,
        });
        run(&mut state, true);
        assert!(state.flag(1, 1));
        assert!(!state.flag(1, 2));
        assert!(state.flag(1, 3));
    }
}

//! RE2 script bytecode.

use super::names::bit_array_comment;
use super::{
    aot_door, aot_item, effective_if_length, format_call, format_door, format_goto, format_item,
    format_message, Block, BlockKind, Condition, FormatContext, Formatted, Instruction, Mode,
    ScriptVariant, UNKNOWN_LENGTH,
};
use crate::facade::{
    CameraSwitch, Compare, FlagOp, FlagOpKind, GameFacade, Message, Operand, VarOp, VarOpKind,
};

pub const EVT_EXEC: u8 = 0x04;
pub const IFEL_CK: u8 = 0x06;
pub const ELSE_CK: u8 = 0x07;
pub const ENDIF: u8 = 0x08;
pub const SLEEPING: u8 = 0x0a;
pub const FOR: u8 = 0x0d;
pub const NEXT: u8 = 0x0e;
pub const WHILE: u8 = 0x0f;
pub const EWHILE: u8 = 0x10;
pub const DO: u8 = 0x11;
pub const EDWHILE: u8 = 0x12;
pub const SWITCH: u8 = 0x13;
pub const CASE: u8 = 0x14;
pub const GOTO: u8 = 0x17;
pub const GOSUB: u8 = 0x18;
pub const WORK_COPY: u8 = 0x1d;
pub const CK: u8 = 0x21;
pub const SET: u8 = 0x22;
pub const CMP: u8 = 0x23;
pub const SAVE: u8 = 0x24;
pub const COPY: u8 = 0x25;
pub const CALC: u8 = 0x26;
pub const CALC2: u8 = 0x27;
pub const CUT_CHG: u8 = 0x29;
pub const MESSAGE_ON: u8 = 0x2b;
pub const DOOR_AOT_SET: u8 = 0x3b;
pub const ITEM_AOT_SET: u8 = 0x4e;

#[rustfmt::skip]
const OPCODES: [(&str, u8); 0x8f] = [
    ("NOP", 1), ("EVT_END", 2), ("EVT_NEXT", 1), ("EVT_CHAIN", 2),
    ("EVT_EXEC", 4), ("EVT_KILL", 2), ("IFEL_CK", 4), ("ELSE_CK", 4),
    ("ENDIF", 2), ("SLEEP", 1), ("SLEEPING", 3), ("WSLEEP", 1),
    ("WSLEEPING", 1), ("FOR", 6), ("NEXT", 2), ("WHILE", 4),
    // 0x10
    ("EWHILE", 2), ("DO", 4), ("EDWHILE", 2), ("SWITCH", 4),
    ("CASE", 6), ("DEFAULT", 2), ("ESWITCH", 2), ("GOTO", 6),
    ("GOSUB", 2), ("RETURN", 2), ("BREAK", 2), ("FOR2", 6),
    ("BREAK_POINT", 1), ("WORK_COPY", 4), ("NOP", 1), ("NOP", 1),
    // 0x20
    ("NOP", 1), ("CK", 4), ("SET", 4), ("CMP", 6),
    ("SAVE", 4), ("COPY", 3), ("CALC", 6), ("CALC2", 4),
    ("SCE_RND", 1), ("CUT_CHG", 2), ("CUT_OLD", 1), ("MESSAGE_ON", 6),
    ("AOT_SET", 20), ("OBJ_MODEL_SET", 38), ("WORK_SET", 3), ("SPEED_SET", 4),
    // 0x30
    ("ADD_SPEED", 1), ("ADD_ASPEED", 1), ("POS_SET", 8), ("DIR_SET", 8),
    ("MEMBER_SET", 4), ("MEMBER_SET2", 3), ("SE_ON", 12), ("SCA_ID_SET", 4),
    ("FLR_SET", 3), ("DIR_CK", 8), ("SCE_ESPR_ON", 16), ("DOOR_AOT_SET", 32),
    ("CUT_AUTO", 2), ("MEMBER_COPY", 3), ("MEMBER_CMP", 6), ("PLC_MOTION", 4),
    // 0x40
    ("PLC_DEST", 8), ("PLC_NECK", 10), ("PLC_RET", 1), ("PLC_FLG", 4),
    ("SCE_EM_SET", 22), ("COL_CHG_SET", 5), ("AOT_RESET", 10), ("AOT_ON", 2),
    ("SUPER_SET", 16), ("SUPER_RESET", 8), ("PLC_GUN", 2), ("CUT_REPLACE", 3),
    ("SCE_ESPR_KILL", 5), ("DOOR_MODEL_SET", 22), ("ITEM_AOT_SET", 22), ("SCE_KEY_CK", 4),
    // 0x50
    ("SCE_TRG_CK", 4), ("SCE_BGM_CONTROL", 6), ("SCE_ESPR_CONTROL", 6), ("SCE_FADE_SET", 6),
    ("SCE_ESPR3D_ON", 22), ("MEMBER_CALC", 6), ("MEMBER_CALC2", 4), ("SCE_BGMTBL_SET", 8),
    ("PLC_ROT", 4), ("XA_ON", 4), ("WEAPON_CHG", 2), ("PLC_CNT", 2),
    ("SCE_SHAKE_ON", 3), ("MIZU_DIV_SET", 2), ("KEEP_ITEM_CK", 2), ("XA_VOL", 2),
    // 0x60
    ("KAGE_SET", 14), ("CUT_BE_SET", 4), ("SCE_ITEM_LOST", 2), ("PLC_GUN_EFF", 1),
    ("SCE_ESPR_ON2", 16), ("SCE_ESPR_KILL2", 2), ("PLC_STOP", 1), ("AOT_SET_4P", 28),
    ("DOOR_AOT_SET_4P", 40), ("ITEM_AOT_SET_4P", 30), ("LIGHT_POS_SET", 6), ("LIGHT_KIDO_SET", 4),
    ("RBJ_RESET", 1), ("SCE_SCR_MOVE", 4), ("PARTS_SET", 6), ("MOVIE_ON", 2),
    // 0x70
    ("SPLC_RET", 1), ("SPLC_SCE", 1), ("SUPER_ON", 16), ("MIRROR_SET", 8),
    ("SCE_FADE_ADJUST", 4), ("SCE_ESPR3D_ON2", 22), ("SCE_ITEM_GET", 3), ("SCE_LINE_START", 4),
    ("SCE_LINE_MAIN", 6), ("SCE_LINE_END", 1), ("SCE_PARTS_BOMB", 16), ("SCE_PARTS_DOWN", 16),
    ("LIGHT_COLOR_SET", 6), ("LIGHT_POS_SET2", 6), ("LIGHT_KIDO_SET2", 6), ("LIGHT_COLOR_SET2", 6),
    // 0x80
    ("SE_VOL", 2), ("SCE_ITEM_CMP", 3), ("SCE_ESPR_TASK", 3), ("PLC_HEAL", 1),
    ("ST_MAP_HINT", 2), ("SCE_EM_POS_CK", 6), ("POISON_CK", 1), ("POISON_CLR", 1),
    ("SCE_ITEM_CK_LOST", 3), ("EVT_NEXT2", 1), ("VIB_SET0", 6), ("VIB_SET1", 6),
    ("VIB_FADE_SET", 8), ("ITEM_AOT_SET2", 24), ("SCE_EM_SET2", 24),
];

/// Block length stored in the u16 at byte 2.
const BLOCK_LENGTH_AT: usize = 2;

const DOOR_ID_AT: usize = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct Re2;

fn opcode_name(opcode: u8) -> Option<&'static str> {
    OPCODES.get(usize::from(opcode)).map(|(name, _)| *name)
}

fn set_op(code: u8) -> Option<FlagOpKind> {
    match code {
        0 => Some(FlagOpKind::Clear),
        1 => Some(FlagOpKind::Set),
        7 => Some(FlagOpKind::Toggle),
        _ => None,
    }
}

/// `(var, op, operand)` of the arithmetic opcodes.
fn var_op(inst: &Instruction<'_>) -> Option<VarOp> {
    let op = match inst.opcode() {
        CMP => VarOp {
            id: inst.u8_at(2),
            op: VarOpKind::Compare(Compare::from_code(inst.u8_at(3))?),
            operand: Operand::Immediate(inst.i16_at(4)),
        },
        SAVE => VarOp {
            id: inst.u8_at(1),
            op: VarOpKind::Set,
            operand: Operand::Immediate(inst.i16_at(2)),
        },
        COPY => VarOp {
            id: inst.u8_at(1),
            op: VarOpKind::Set,
            operand: Operand::Var(inst.u8_at(2)),
        },
        CALC => VarOp {
            id: inst.u8_at(3),
            op: VarOpKind::from_calc_code(inst.u8_at(2))?,
            operand: Operand::Immediate(inst.i16_at(4)),
        },
        CALC2 => VarOp {
            id: inst.u8_at(2),
            op: VarOpKind::from_calc_code(inst.u8_at(1))?,
            operand: Operand::Var(inst.u8_at(3)),
        },
        _ => return None,
    };
    Some(op)
}

fn format_var_op(op: &VarOp) -> String {
    let operand = match op.operand {
        Operand::Immediate(value) => value.to_string(),
        Operand::Var(id) => format!("var{id:02x}.W"),
    };
    match op.op {
        VarOpKind::Compare(compare) => {
            format!("CMP var{:02x}.W {} {operand}", op.id, compare.mnemonic())
        }
        VarOpKind::Not => format!("var{0:02x}.W = !var{0:02x}.W", op.id),
        kind => format!("var{:02x}.W {} {operand}", op.id, kind.symbol()),
    }
}

fn with_flag_comment(text: String, array: u8, bit: u8) -> Formatted {
    let formatted = Formatted::line(text);
    match bit_array_comment(array, bit) {
        Some(comment) => formatted.comment(comment),
        None => formatted,
    }
}

impl ScriptVariant for Re2 {
    fn name(&self) -> &'static str {
        "re2"
    }

    fn decode_length(&self, code: &[u8], _mode: Mode) -> usize {
        match code.first() {
            None => 0,
            Some(opcode) => OPCODES
                .get(usize::from(*opcode))
                .map_or(UNKNOWN_LENGTH, |(_, length)| usize::from(*length)),
        }
    }

    fn block(&self, inst: &Instruction<'_>, following: &[u8]) -> Option<Block> {
        let stored = usize::from(inst.u16_at(BLOCK_LENGTH_AT));
        let len = inst.len();
        let (kind, body) = match inst.opcode() {
            IFEL_CK => (
                BlockKind::If,
                effective_if_length(stored, following, ENDIF).saturating_sub(len),
            ),
            ELSE_CK => (BlockKind::Else, stored.saturating_sub(len)),
            FOR | WHILE | DO => (BlockKind::Loop, stored.saturating_sub(2)),
            SWITCH => (BlockKind::Switch, stored.saturating_sub(2)),
            CASE => (BlockKind::Case, stored),
            _ => return None,
        };
        Some(Block { kind, body })
    }

    fn execute_one(&self, inst: &Instruction<'_>, facade: &mut dyn GameFacade) -> Condition {
        match inst.opcode() {
            CK => {
                let (array, bit) = (inst.u8_at(1), inst.u8_at(2));
                facade.set_flag(FlagOp {
                    array,
                    bit,
                    op: FlagOpKind::Test,
                });
                return Condition::Flag(facade.test_flag(array, bit) == (inst.u8_at(3) != 0));
            }
            SET => {
                if let Some(op) = set_op(inst.u8_at(3)) {
                    facade.set_flag(FlagOp {
                        array: inst.u8_at(1),
                        bit: inst.u8_at(2),
                        op,
                    });
                }
            }
            CMP | SAVE | COPY | CALC | CALC2 => {
                if let Some(op) = var_op(inst) {
                    facade.set_var(op);
                }
            }
            CUT_CHG => facade.switch_camera(CameraSwitch { id: inst.u8_at(1) }),
            MESSAGE_ON => facade.show_message(Message { id: inst.u8_at(2) }),
            DOOR_AOT_SET => facade.add_door(aot_door(inst, DOOR_ID_AT)),
            ITEM_AOT_SET => facade.add_item(aot_item(inst)),
            _ => {}
        }
        Condition::None
    }

    fn format_one(&self, inst: &Instruction<'_>, ctx: &FormatContext<'_>) -> Formatted {
        let opcode = inst.opcode();
        let text = match opcode {
            IFEL_CK => "BEGIN_IF".to_string(),
            ELSE_CK => "ELSE".to_string(),
            ENDIF => "END_IF".to_string(),
            FOR => format!("BEGIN_FOR {}", inst.u16_at(4)),
            NEXT => "END_FOR".to_string(),
            WHILE => "BEGIN_WHILE".to_string(),
            EWHILE => "END_WHILE".to_string(),
            DO => "DO".to_string(),
            EDWHILE => "WHILE".to_string(),
            SWITCH => format!("BEGIN_SWITCH var{:02x}.W", inst.u8_at(1)),
            CASE => format!("CASE 0x{:04x}", inst.u16_at(4)),
            SLEEPING => format!("SLEEPING {}", inst.u16_at(1)),
            GOTO => return format_goto(inst, inst.i16_at(4)),
            GOSUB => return format_call("GOSUB ", inst.u8_at(1), ctx),
            EVT_EXEC if inst.u8_at(2) == GOSUB => {
                let prefix = format!("EVT_EXEC 0x{:02x} ", inst.u8_at(1));
                return format_call(&prefix, inst.u8_at(3), ctx);
            }
            WORK_COPY => format!(
                "script[0x{:04x}] = var{:02x}.W & 0xff",
                inst.u8_at(2),
                inst.u8_at(1)
            ),
            CK => {
                let (array, bit, value) = (inst.u8_at(1), inst.u8_at(2), inst.u8_at(3));
                let state = if value != 0 { "on" } else { "off" };
                return with_flag_comment(
                    format!("CK array 0x{array:02x} bit 0x{bit:02x} {state}"),
                    array,
                    bit,
                );
            }
            SET => {
                let (array, bit) = (inst.u8_at(1), inst.u8_at(2));
                let op = match set_op(inst.u8_at(3)) {
                    Some(FlagOpKind::Clear) => "CLEAR",
                    Some(FlagOpKind::Set) => "SET",
                    Some(_) => "CHG",
                    None => "???",
                };
                return with_flag_comment(
                    format!("BIT_CHG {op} array 0x{array:02x} bit 0x{bit:02x}"),
                    array,
                    bit,
                );
            }
            CMP | SAVE | COPY | CALC | CALC2 => match var_op(inst) {
                Some(op) => format_var_op(&op),
                None => format!("{} ???", opcode_name(opcode).unwrap_or_default()),
            },
            CUT_CHG => format!("CUT_CHG {}", inst.u8_at(1)),
            MESSAGE_ON => {
                let id = inst.u8_at(2);
                return format_message(format!("MESSAGE_ON 0x{id:02x}"), id, ctx);
            }
            DOOR_AOT_SET => format_door("DOOR_AOT_SET", &aot_door(inst, DOOR_ID_AT)),
            ITEM_AOT_SET => format_item("ITEM_AOT_SET", &aot_item(inst)),
            _ => match opcode_name(opcode) {
                Some(name) => name.to_string(),
                None => format!("Unknown opcode 0x{opcode:02x}"),
            },
        };
        Formatted::line(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::RoomState;
    use crate::variant::testing::{execute, format, inst};

    #[test]
    fn lengths_come_from_the_opcode_table() {
        assert_eq!(Re2.decode_length(&[DOOR_AOT_SET], Mode::M0), 32);
        assert_eq!(Re2.decode_length(&[0x8e], Mode::M0), 24);
        assert_eq!(Re2.decode_length(&[WHILE], Mode::M0), 4);
        assert_eq!(Re2.decode_length(&[0x8f], Mode::M0), UNKNOWN_LENGTH);
        assert_eq!(Re2.decode_length(&[], Mode::M0), 0);
    }

    #[test]
    fn every_table_opcode_has_its_documented_length() {
        for (opcode, (name, expected)) in OPCODES.iter().enumerate() {
            let code = [opcode as u8, 0, 0, 0];
            assert_eq!(
                Re2.decode_length(&code, Mode::M0),
                usize::from(*expected),
                "{name} (0x{opcode:02x})"
            );
        }
        for opcode in OPCODES.len()..=0xff {
            assert_eq!(Re2.decode_length(&[opcode as u8], Mode::M0), UNKNOWN_LENGTH);
        }
    }

    #[test]
    fn if_body_includes_trailing_end_marker() {
        // IFEL_CK stored length 10: header 4, CK 4, then ENDIF at stored - 2
        let header = [IFEL_CK, 0x00, 0x0a, 0x00];
        let following = [CK, 1, 2, 1, 0x00, 0x00, 0x00, 0x00, ENDIF, 0x00];
        let block = Re2.block(&inst(&header), &following).unwrap();
        assert_eq!(block.kind, BlockKind::If);
        assert_eq!(block.body, 8);

        let following = [CK, 1, 2, 1, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(Re2.block(&inst(&header), &following).unwrap().body, 6);
    }

    #[test]
    fn loop_and_case_bodies() {
        let for_header = [FOR, 0x00, 0x0a, 0x00, 0x03, 0x00];
        let block = Re2.block(&inst(&for_header), &[]).unwrap();
        assert_eq!((block.kind, block.body), (BlockKind::Loop, 8));

        let case = [CASE, 0x00, 0x06, 0x00, 0x01, 0x00];
        assert_eq!(Re2.block(&inst(&case), &[]).unwrap().body, 6);
        assert!(Re2.block(&inst(&[GOSUB, 0]), &[]).is_none());
    }

    #[test]
    fn flag_and_variable_effects() {
        let mut state = RoomState::default();
        execute(&Re2, &[SET, 4, 0x12, 1], &mut state);
        assert!(state.flag(4, 0x12));
        execute(&Re2, &[SET, 4, 0x12, 3], &mut state);
        assert!(state.flag(4, 0x12));
        assert_eq!(
            execute(&Re2, &[CK, 4, 0x12, 1], &mut state),
            Condition::Flag(true)
        );

        execute(&Re2, &[SAVE, 0x01, 0x10, 0x00], &mut state);
        execute(&Re2, &[CALC, 0x00, 0x00, 0x01, 0x05, 0x00], &mut state);
        execute(&Re2, &[COPY, 0x02, 0x01], &mut state);
        assert_eq!(state.var(1), 0x15);
        assert_eq!(state.var(2), 0x15);
    }

    #[test]
    fn door_and_message_effects() {
        let mut door = vec![0u8; 32];
        door[0] = DOOR_AOT_SET;
        door[1] = 0x03;
        door[2] = 0xee;
        door[22] = 0x01;
        door[23] = 0x0a;
        door[24] = 0x02;
        let mut state = RoomState::default();
        execute(&Re2, &door, &mut state);
        assert_eq!(state.doors[0].id, 0x03);
        assert_eq!(state.doors[0].next_stage, 2);
        assert_eq!(state.doors[0].next_room, 0x0a);
        assert_eq!(state.doors[0].next_camera, 2);

        execute(&Re2, &[MESSAGE_ON, 0, 0x05, 0, 0, 0], &mut state);
        execute(&Re2, &[CUT_CHG, 0x03], &mut state);
        assert_eq!(state.messages[0].id, 5);
        assert_eq!(state.camera, 3);
    }

    #[test]
    fn formats_variables_and_flags() {
        assert_eq!(
            format(&Re2, &[SAVE, 0x1f, 0xff, 0xff]),
            "var1f.W = -1"
        );
        assert_eq!(
            format(&Re2, &[CALC2, 0x08, 0x03, 0x04]),
            "var03.W = !var03.W"
        );
        assert_eq!(
            format(&Re2, &[CMP, 0, 0x02, 0x01, 0x0a, 0x00]),
            "CMP var02.W GT 10"
        );
        assert_eq!(
            format(&Re2, &[CK, 1, 0, 1]),
            "CK array 0x01 bit 0x00 on"
        );
        assert_eq!(format(&Re2, &[WORK_COPY, 0x07, 0x10, 0]), "script[0x0010] = var07.W & 0xff");
        assert_eq!(format(&Re2, &[0x95]), "Unknown opcode 0x95");
        assert_eq!(format(&Re2, &[0x09]), "SLEEP");
    }

    #[test]
    fn flag_names_become_comments() {
        let ctx = FormatContext {
            entry_offsets: &[],
            text: &crate::variant::testing::NO_TEXT,
            languages: 0,
        };
        let formatted = Re2.format_one(&inst(&[SET, 6, 0x0a, 1]), &ctx);
        assert_eq!(formatted.text, "BIT_CHG SET array 0x06 bit 0x0a");
        assert_eq!(formatted.comments, vec!["killed[0x0a]".to_string()]);
    }
}

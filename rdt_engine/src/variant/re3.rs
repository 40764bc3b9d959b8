//! RE3 script bytecode.

use super::names::work_set_name;
use super::{
    aot_door, aot_item, effective_if_length, fixed_length, format_call, format_door, format_goto,
    format_item, format_message, Block, BlockKind, Condition, FormatContext, Formatted,
    Instruction, Mode, ScriptVariant,
};
use crate::facade::{
    CameraSwitch, FlagOp, FlagOpKind, GameFacade, Message, Operand, VarOp, VarOpKind,
};

pub const EVT_EXEC: u8 = 0x04;
pub const IF: u8 = 0x06;
pub const ELSE: u8 = 0x07;
pub const END_IF: u8 = 0x08;
pub const SLEEPING: u8 = 0x0a;
pub const BEGIN_FOR: u8 = 0x0d;
pub const BEGIN_WHILE: u8 = 0x10;
pub const DO: u8 = 0x12;
pub const BEGIN_SWITCH: u8 = 0x14;
pub const CASE: u8 = 0x15;
pub const GOTO: u8 = 0x18;
pub const GOSUB: u8 = 0x19;
pub const CALC_OP: u8 = 0x20;
pub const AHEAD_ROOM_SET: u8 = 0x33;
pub const MEMB_SET: u8 = 0x40;
pub const WORK_SET: u8 = 0x47;
pub const CK: u8 = 0x4c;
pub const SET: u8 = 0x4d;
pub const CUT_CHG: u8 = 0x50;
pub const MESSAGE_ON: u8 = 0x5b;
pub const DOOR_AOT_SET: u8 = 0x61;
pub const ITEM_AOT_SET: u8 = 0x67;

// byte 1 of DOOR_AOT_SET is padding
const DOOR_ID_AT: usize = 2;

#[rustfmt::skip]
const LENGTHS: [u8; 0x90] = [
    // 0x00
    1, 2, 1, 2, 4, 2, 4, 4, 2, 1, 3, 1, 1, 6, 5, 2,
    // 0x10
    4, 2, 4, 2, 4, 6, 2, 2, 6, 2, 4, 2, 1, 4, 4, 4,
    // 0x20
    6, 4, 4, 1, 2, 4, 6, 1, 1, 8, 6, 2, 2, 4, 6, 2,
    // 0x30
    6, 6, 6, 4, 10, 6, 3, 2, 2, 16, 16, 3, 1, 2, 2, 3,
    // 0x40
    4, 3, 3, 6, 6, 4, 11, 3, 4, 1, 1, 1, 4, 4, 6, 1,
    // 0x50
    2, 1, 2, 3, 4, 8, 8, 6, 6, 8, 2, 6, 2, 1, 3, 2,
    // 0x60
    22, 32, 40, 20, 28, 10, 2, 22, 30, 14, 16, 2, 4, 4, 4, 2,
    // 0x70
    16, 18, 22, 24, 5, 2, 3, 12, 6, 4, 2, 6, 1, 24, 2, 40,
    // 0x80 (0x8d is not listed)
    4, 8, 10, 1, 4, 2, 1, 1, 4, 2, 1, 1, 1, 0, 4, 2,
];

#[rustfmt::skip]
const NAMES: [Option<&str>; 0x90] = [
    // 0x00
    Some("NOP"), Some("EVT_END"), Some("EVT_NEXT"), Some("EVT_CHAIN"),
    Some("EVT_EXEC"), Some("EVT_KILL"), Some("IF"), Some("ELSE"),
    Some("END_IF"), Some("SLEEP"), Some("SLEEPING"), Some("WSLEEP"),
    Some("WSLEEPING"), Some("BEGIN_FOR"), None, Some("END_FOR"),
    // 0x10
    Some("BEGIN_WHILE"), Some("END_WHILE"), Some("DO"), Some("WHILE"),
    Some("BEGIN_SWITCH"), Some("CASE"), Some("DEFAULT"), Some("END_SWITCH"),
    Some("GOTO"), Some("GOSUB"), Some("RETURN"), Some("BREAK"),
    Some("BREAKPOINT"), Some("EVAL_CC"), Some("VALUE_SET"), Some("SET1"),
    // 0x20
    Some("CALC_OP"), None, Some("EVT_CUT"), None,
    Some("CHASER_EVT_CLR"), Some("MAP_OPEN"), Some("POINT_ADD"), Some("DOOR_CK"),
    Some("DIEDEMO_ON"), Some("DIR_CK"), Some("PARTS_SET"), Some("VLOOP_SET"),
    Some("OTA_BE_SET"), Some("LINE_BEGIN"), Some("LINE_MAIN"), Some("LINE_END"),
    // 0x30
    Some("LIGHT_POS_SET"), Some("LIGHT_KIDO_SET"), Some("LIGHT_COLOR_SET"), Some("AHEAD_ROOM_SET"),
    Some("ESPR_CTR"), Some("BGM_TBL_CK"), Some("ITEM_GET_CK"), Some("OM_REV"),
    Some("CHASER_LIFE_INIT"), Some("PARTS_BOMB"), Some("PARTS_DOWN"), Some("CHASER_ITEM_SET"),
    Some("WEAPON_CHG_OLD"), Some("SEL_EVT_ON"), Some("ITEM_LOST"), Some("FLOOR_SET"),
    // 0x40
    Some("MEMB_SET"), Some("MEMB_SET2"), Some("MEMB_CPY"), Some("MEMB_CMP"),
    Some("MEMB_CALC"), Some("MEMB_CALC2"), Some("FADE_SET"), Some("WORK_SET"),
    Some("SPD_SET"), Some("ADD_SPD"), Some("ADD_ASPD"), Some("ADD_VSPD"),
    Some("CK"), Some("SET"), Some("CMP"), Some("RND"),
    // 0x50
    Some("CUT_CHG"), Some("CUT_OLD"), Some("CUT_AUTO"), Some("CUT_REPLACE"),
    Some("CUT_BE_SET"), Some("POS_SET"), Some("DIR_SET"), Some("SET_VIB0"),
    Some("SET_VIB1"), Some("SET_VIB_FADE"), Some("RBJ_SET"), Some("MESSAGE_ON"),
    Some("RAIN_SET"), Some("MESSAGE_OFF"), Some("SHAKE_ON"), Some("WEAPON_CHG"),
    // 0x60
    None, Some("DOOR_AOT_SET"), None, Some("AOT_SET"),
    Some("AOT_SET_4P"), Some("AOT_RESET"), None, Some("ITEM_AOT_SET"),
    None, Some("KAGE_SET"), Some("SUPER_SET"), None,
    None, None, Some("SCA_ID_SET"), None,
    // 0x70
    Some("ESPR_ON"), None, None, Some("ESPR3D_ON2"),
    Some("ESPR_KILL"), None, None, Some("SE_ON"),
    Some("BGM_CTL"), Some("XA_ON"), None, Some("BGM_TBL_SET"),
    None, Some("EM_SET"), None, Some("OM_SET"),
    // 0x80
    Some("PLC_MOTION"), Some("PLC_DEST"), Some("PLC_NECK"), Some("PLC_RET"),
    Some("PLC_FLG"), None, None, Some("PLC_STOP"),
    Some("PLC_ROT"), Some("PLC_CNT"), None, None,
    None, None, None, None,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Re3;

fn on_off(value: u8) -> &'static str {
    if value != 0 {
        "on"
    } else {
        "off"
    }
}

fn calc_op(inst: &Instruction<'_>) -> Option<VarOp> {
    Some(VarOp {
        id: inst.u8_at(3),
        op: VarOpKind::from_calc_code(inst.u8_at(2))?,
        operand: Operand::Immediate(inst.i16_at(4)),
    })
}

impl ScriptVariant for Re3 {
    fn name(&self) -> &'static str {
        "re3"
    }

    fn decode_length(&self, code: &[u8], _mode: Mode) -> usize {
        code.first()
            .map_or(0, |opcode| fixed_length(&LENGTHS, *opcode))
    }

    fn block(&self, inst: &Instruction<'_>, following: &[u8]) -> Option<Block> {
        let stored = usize::from(inst.u16_at(2));
        let len = inst.len();
        let (kind, body) = match inst.opcode() {
            IF => (
                BlockKind::If,
                effective_if_length(stored, following, END_IF).saturating_sub(len),
            ),
            ELSE => (BlockKind::Else, stored.saturating_sub(len)),
            BEGIN_FOR | BEGIN_WHILE => (BlockKind::Loop, stored.saturating_sub(2)),
            DO => (BlockKind::Loop, stored.saturating_sub(len)),
            BEGIN_SWITCH => (BlockKind::Switch, stored.saturating_sub(2)),
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
                let op = if inst.u8_at(3) == 0 {
                    FlagOpKind::Clear
                } else {
                    FlagOpKind::Set
                };
                facade.set_flag(FlagOp {
                    array: inst.u8_at(1),
                    bit: inst.u8_at(2),
                    op,
                });
            }
            MEMB_SET => facade.set_var(VarOp {
                id: inst.u8_at(1),
                op: VarOpKind::Set,
                operand: Operand::Immediate(inst.i16_at(2)),
            }),
            CALC_OP => {
                if let Some(op) = calc_op(inst) {
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
            CK | SET => format!(
                "{} 0x{:02x} object 0x{:02x} {}",
                if opcode == CK { "CK" } else { "SET" },
                inst.u8_at(1),
                inst.u8_at(2),
                on_off(inst.u8_at(3))
            ),
            MEMB_SET => format!("MEMB_SET var{:02x} = {}", inst.u8_at(1), inst.i16_at(2)),
            CALC_OP => match calc_op(inst) {
                Some(op) => format!("CALC_OP var{:02x} {} {}", op.id, op.op.symbol(), inst.i16_at(4)),
                None => format!("CALC_OP var{:02x} ??? {}", inst.u8_at(3), inst.i16_at(4)),
            },
            WORK_SET => {
                let kind = inst.u8_at(1);
                format!(
                    "WORK_SET {} 0x{:02x}",
                    work_set_name(kind).unwrap_or("???"),
                    inst.u8_at(2)
                )
            }
            AHEAD_ROOM_SET => format!("AHEAD_ROOM_SET 0x{:04x}", inst.u16_at(2)),
            SLEEPING => format!("SLEEPING {}", inst.u16_at(1)),
            BEGIN_FOR => format!("BEGIN_FOR {}", inst.u16_at(4)),
            CASE => format!("CASE 0x{:04x}", inst.u16_at(4)),
            CUT_CHG => format!("CUT_CHG {}", inst.u8_at(1)),
            GOTO => return format_goto(inst, inst.i16_at(4)),
            GOSUB => return format_call("GOSUB ", inst.u8_at(1), ctx),
            EVT_EXEC => {
                let prefix = format!("EVT_EXEC 0x{:02x} ", inst.u8_at(1));
                return format_call(&prefix, inst.u8_at(3), ctx);
            }
            MESSAGE_ON => {
                let id = inst.u8_at(2);
                return format_message(format!("MESSAGE_ON 0x{id:02x}"), id, ctx);
            }
            DOOR_AOT_SET => format_door("DOOR_AOT_SET", &aot_door(inst, DOOR_ID_AT)),
            ITEM_AOT_SET => format_item("ITEM_AOT_SET", &aot_item(inst)),
            _ => match NAMES.get(usize::from(opcode)).copied().flatten() {
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
    use crate::variant::UNKNOWN_LENGTH;

    #[test]
    fn lengths_come_from_the_table() {
        assert_eq!(Re3.decode_length(&[DOOR_AOT_SET], Mode::M0), 32);
        assert_eq!(Re3.decode_length(&[0x46], Mode::M0), 11);
        assert_eq!(Re3.decode_length(&[0x8d], Mode::M0), UNKNOWN_LENGTH);
        assert_eq!(Re3.decode_length(&[0xa0], Mode::M0), UNKNOWN_LENGTH);
    }

    #[test]
    fn every_table_opcode_has_its_documented_length() {
        for (opcode, expected) in LENGTHS.iter().enumerate() {
            let length = Re3.decode_length(&[opcode as u8, 0, 0, 0], Mode::M0);
            match *expected {
                0 => assert_eq!(length, UNKNOWN_LENGTH, "opcode 0x{opcode:02x}"),
                expected => assert_eq!(length, usize::from(expected), "opcode 0x{opcode:02x}"),
            }
        }
        for opcode in LENGTHS.len()..=0xff {
            assert_eq!(Re3.decode_length(&[opcode as u8], Mode::M0), UNKNOWN_LENGTH);
        }
        assert_eq!(Re3.decode_length(&[], Mode::M0), 0);
    }

    #[test]
    fn door_id_follows_the_padding_byte() {
        let mut door = vec![0u8; 32];
        door[0] = DOOR_AOT_SET;
        door[1] = 0xee;
        door[2] = 0x05;
        door[6..8].copy_from_slice(&(-1200i16).to_le_bytes());
        door[22] = 0x00;
        door[23] = 0x0b;
        door[24] = 0x01;
        let mut state = RoomState::default();
        execute(&Re3, &door, &mut state);

        let placed = &state.doors[0];
        assert_eq!(placed.id, 0x05);
        assert_eq!(placed.x, -1200);
        assert_eq!((placed.next_stage, placed.next_room, placed.next_camera), (1, 0x0b, 1));
        assert!(format(&Re3, &door).starts_with("OBJECT #0x05 = DOOR_AOT_SET stage 1 room 0x0b"));
    }

    #[test]
    fn goto_target_is_relative_to_the_instruction() {
        let code = [GOTO, 0x00, 0x00, 0x00, 0xfa, 0xff];
        let goto = Instruction {
            offset: 0x20,
            bytes: &code,
            mode: Mode::M0,
        };
        let ctx = FormatContext {
            entry_offsets: &[],
            text: &crate::variant::testing::NO_TEXT,
            languages: 0,
        };
        assert_eq!(Re3.format_one(&goto, &ctx).text, "GOTO [0x0000001a]");
    }

    #[test]
    fn block_bodies() {
        let if_header = [IF, 0x00, 0x08, 0x00];
        let following = [CK, 1, 2, 0, 0x00, 0x00, END_IF, 0x00];
        let block = Re3.block(&inst(&if_header), &following).unwrap();
        assert_eq!((block.kind, block.body), (BlockKind::If, 6));

        let do_header = [DO, 0x00, 0x0c, 0x00];
        assert_eq!(Re3.block(&inst(&do_header), &[]).unwrap().body, 8);
        let while_header = [BEGIN_WHILE, 0x00, 0x0c, 0x00];
        assert_eq!(Re3.block(&inst(&while_header), &[]).unwrap().body, 10);
        // WHILE closes a DO and opens nothing
        assert!(Re3.block(&inst(&[0x13, 0x00]), &[]).is_none());
    }

    #[test]
    fn effects_reach_the_facade() {
        let mut state = RoomState::default();
        execute(&Re3, &[SET, 2, 7, 5], &mut state);
        assert!(state.flag(2, 7));
        assert_eq!(
            execute(&Re3, &[CK, 2, 7, 0], &mut state),
            Condition::Flag(false)
        );
        execute(&Re3, &[MEMB_SET, 4, 0x10, 0x00], &mut state);
        execute(&Re3, &[CALC_OP, 0, 2, 4, 0x03, 0x00], &mut state);
        assert_eq!(state.var(4), 48);

        let mut item = vec![0u8; 22];
        item[0] = ITEM_AOT_SET;
        item[1] = 9;
        item[14] = 0x21;
        item[16] = 15;
        execute(&Re3, &item, &mut state);
        assert_eq!((state.items[0].kind, state.items[0].amount), (0x21, 15));
    }

    #[test]
    fn formats_named_opcodes() {
        assert_eq!(format(&Re3, &[SET, 0x04, 0x1a, 0x01]), "SET 0x04 object 0x1a on");
        assert_eq!(format(&Re3, &[WORK_SET, 0x03, 0x02]), "WORK_SET EM_WK 0x02");
        assert_eq!(format(&Re3, &[MEMB_SET, 0x05, 0xfe, 0xff]), "MEMB_SET var05 = -2");
        assert_eq!(format(&Re3, &[AHEAD_ROOM_SET, 0, 0x10, 0x02]), "AHEAD_ROOM_SET 0x0210");
        assert_eq!(format(&Re3, &[0x21, 0, 0, 0]), "Unknown opcode 0x21");
        assert_eq!(format(&Re3, &[0x13, 0]), "WHILE");
    }
}

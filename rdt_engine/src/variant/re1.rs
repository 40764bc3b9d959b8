//! RE1 room script bytecode (init and run scripts).

use super::names::em_model_name;
use super::{
    fixed_length, format_message, Block, BlockKind, Condition, FormatContext, Formatted,
    Instruction, Mode, ScriptVariant,
};
use crate::facade::{
    CameraSwitch, Door, FlagOp, FlagOpKind, GameFacade, Item, Message, Position,
};

pub const NOP: u8 = 0x00;
pub const IF: u8 = 0x01;
pub const ELSE: u8 = 0x02;
pub const END_IF: u8 = 0x03;
pub const BIT_TEST: u8 = 0x04;
pub const BIT_OP: u8 = 0x05;
pub const OBJ06_TEST: u8 = 0x06;
pub const OBJ07_TEST: u8 = 0x07;
pub const STAGEROOMCAM_SET: u8 = 0x08;
pub const PRINT_MSG: u8 = 0x0b;
pub const DOOR_SET: u8 = 0x0c;
pub const ITEM_SET: u8 = 0x0d;
pub const NOP0E: u8 = 0x0e;
pub const OBJ10_TEST: u8 = 0x10;
pub const OBJ11_TEST: u8 = 0x11;
pub const ITEM_ATTR_SET: u8 = 0x12;
pub const ITEM_ATTR2_SET: u8 = 0x13;
pub const ITEM_MODEL_SET: u8 = 0x18;
pub const EM_SET: u8 = 0x1b;
pub const OM_SET: u8 = 0x1f;
pub const PLAYER_POS_SET: u8 = 0x20;
pub const EM_POS_SET: u8 = 0x21;
pub const ARRAY_SET: u8 = 0x37;

const CAMERA_OBJECT: u8 = 2;

#[rustfmt::skip]
pub(crate) const LENGTHS: [u8; 0x51] = [
    // 0x00
    2, 2, 2, 2, 4, 4, 4, 6, 4, 2, 2, 4, 26, 18, 2, 8,
    // 0x10
    2, 2, 10, 4, 4, 2, 2, 10, 26, 4, 2, 22, 6, 2, 4, 28,
    // 0x20 (0x26, 0x28 and 0x2e are not fixed)
    14, 14, 4, 2, 4, 4, 0, 2, 0, 2, 12, 4, 2, 4, 0, 4,
    // 0x30 (0x33 is not fixed)
    12, 4, 4, 0, 8, 4, 4, 4, 4, 2, 4, 6, 6, 12, 2, 6,
    // 0x40
    16, 4, 4, 4, 2, 2, 44, 14, 2, 2, 2, 2, 4, 2, 4, 2,
    // 0x50
    2,
];

/// Script language of RE1 init/run sections.
#[derive(Debug, Clone, Copy, Default)]
pub struct Re1Scd;

/// Length of `0x28`, selected by its sub-operation byte.
fn length_28(code: &[u8]) -> usize {
    match code.get(2) {
        Some(0 | 2 | 3 | 5 | 9 | 10) => 6,
        Some(1) => 8,
        Some(6 | 8) => 4,
        _ => 0,
    }
}

/// Length of `0x33`, selected by its sub-operation byte.
fn length_33(code: &[u8]) -> usize {
    match code.get(1) {
        Some(0 | 4 | 6 | 7) => 2,
        Some(1 | 3 | 5 | 8 | 9 | 10) => 4,
        _ => 0,
    }
}

/// Stage byte of a door: bits 6-5 hold a stage delta, bits 4-0 the room.
fn next_stage(current: u8, packed: u8) -> u8 {
    match (packed >> 5) & 3 {
        1 => current.saturating_sub(1),
        2 => current.saturating_add(1),
        _ => current,
    }
}

fn stage_delta_label(packed: u8) -> &'static str {
    match (packed >> 5) & 3 {
        1 => "-1",
        2 => "+1",
        _ => "+0",
    }
}

fn door(inst: &Instruction<'_>, current_stage: u8) -> Door {
    let packed = inst.u8_at(15);
    Door {
        id: inst.u8_at(1),
        x: inst.i16_at(2),
        y: inst.i16_at(4),
        w: inst.i16_at(6),
        h: inst.i16_at(8),
        next_stage: next_stage(current_stage, packed),
        next_room: packed & 0x1f,
        next_camera: 0,
        next_pos: Position {
            x: inst.i16_at(16),
            y: inst.i16_at(18),
            z: inst.i16_at(20),
            dir: inst.i16_at(22),
        },
    }
}

fn item(inst: &Instruction<'_>) -> Item {
    Item {
        id: inst.u8_at(1),
        x: inst.i16_at(2),
        y: inst.i16_at(4),
        w: inst.i16_at(6),
        h: inst.i16_at(8),
        kind: u16::from(inst.u8_at(10)),
        amount: 0,
    }
}

fn bit_op_kind(value: u8) -> FlagOpKind {
    match value {
        0 => FlagOpKind::Clear,
        1 => FlagOpKind::Set,
        _ => FlagOpKind::Toggle,
    }
}

fn on_off(value: u8) -> &'static str {
    if value != 0 {
        "on"
    } else {
        "off"
    }
}

impl ScriptVariant for Re1Scd {
    fn name(&self) -> &'static str {
        "re1-scd"
    }

    fn decode_length(&self, code: &[u8], _mode: Mode) -> usize {
        match code.first().copied() {
            None => 0,
            Some(0x28) => length_28(code),
            Some(0x33) => length_33(code),
            Some(opcode) => fixed_length(&LENGTHS, opcode),
        }
    }

    fn block(&self, inst: &Instruction<'_>, _following: &[u8]) -> Option<Block> {
        let kind = match inst.opcode() {
            IF => BlockKind::If,
            ELSE => BlockKind::Else,
            _ => return None,
        };
        let stored = usize::from(inst.u8_at(1));
        Some(Block {
            kind,
            body: stored.saturating_sub(inst.len()),
        })
    }

    fn execute_one(&self, inst: &Instruction<'_>, facade: &mut dyn GameFacade) -> Condition {
        match inst.opcode() {
            BIT_TEST => {
                let (array, bit) = (inst.u8_at(1), inst.u8_at(2));
                facade.set_flag(FlagOp {
                    array,
                    bit,
                    op: FlagOpKind::Test,
                });
                return Condition::Flag(facade.test_flag(array, bit) == (inst.u8_at(3) != 0));
            }
            BIT_OP => facade.set_flag(FlagOp {
                array: inst.u8_at(1),
                bit: inst.u8_at(2),
                op: bit_op_kind(inst.u8_at(3)),
            }),
            STAGEROOMCAM_SET if inst.u8_at(1) == CAMERA_OBJECT => {
                facade.switch_camera(CameraSwitch {
                    id: inst.u16_at(2) as u8,
                })
            }
            PRINT_MSG => facade.show_message(Message { id: inst.u8_at(1) }),
            DOOR_SET => {
                let door = door(inst, facade.current_stage());
                facade.add_door(door);
            }
            ITEM_SET => facade.add_item(item(inst)),
            _ => {}
        }
        Condition::None
    }

    fn format_one(&self, inst: &Instruction<'_>, ctx: &FormatContext<'_>) -> Formatted {
        let text = match inst.opcode() {
            NOP | NOP0E => "nop".to_string(),
            IF => "BEGIN_IF".to_string(),
            ELSE => "ELSE".to_string(),
            END_IF => "END_IF".to_string(),
            BIT_TEST => format!(
                "BIT_TEST flag 0x{:02x} object 0x{:02x} {}",
                inst.u8_at(1),
                inst.u8_at(2),
                on_off(inst.u8_at(3))
            ),
            BIT_OP => {
                let op = match bit_op_kind(inst.u8_at(3)) {
                    FlagOpKind::Clear => "clear",
                    FlagOpKind::Set => "set",
                    _ => "toggle",
                };
                format!(
                    "BIT_OP flag 0x{:02x} object 0x{:02x} {op}",
                    inst.u8_at(1),
                    inst.u8_at(2)
                )
            }
            OBJ06_TEST => "OBJ06_TEST".to_string(),
            OBJ07_TEST => "OBJ07_TEST".to_string(),
            OBJ10_TEST => "OBJ10_TEST".to_string(),
            OBJ11_TEST => "OBJ11_TEST".to_string(),
            STAGEROOMCAM_SET => {
                let object = inst.u8_at(1);
                let label = match object {
                    0 => "Stage",
                    1 => "Room",
                    2 => "Camera",
                    _ => "Unknown",
                };
                let value = inst.u16_at(2);
                format!("STAGEROOMCAM_SET 0x{object:02x} ({label}) = 0x{value:02x} ({value})")
            }
            PRINT_MSG => {
                let id = inst.u8_at(1);
                return format_message(format!("PRINT_MSG 0x{id:02x}"), id, ctx);
            }
            DOOR_SET => {
                let packed = inst.u8_at(15);
                format!(
                    "OBJECT #0x{:02x} = DOOR_SET stage {} room 0x{:02x} pos ({},{},{}) dir {}",
                    inst.u8_at(1),
                    stage_delta_label(packed),
                    packed & 0x1f,
                    inst.i16_at(16),
                    inst.i16_at(18),
                    inst.i16_at(20),
                    inst.i16_at(22)
                )
            }
            ITEM_SET => format!(
                "OBJECT #0x{:02x} = ITEM_SET type 0x{:02x}",
                inst.u8_at(1),
                inst.u8_at(10)
            ),
            ITEM_ATTR_SET => format!("ITEM_ATTR_SET #0x{:02x}", inst.u8_at(1)),
            ITEM_ATTR2_SET => format!("ITEM_ATTR2_SET #0x{:02x}", inst.u8_at(1)),
            ITEM_MODEL_SET => format!("OBJECT #0x{:02x} = ITEM_MODEL_SET", inst.u8_at(1)),
            EM_SET => {
                let model = inst.u8_at(1);
                format!(
                    "EM_SET #0x{:02x} model=0x{model:02x} ({}) pos ({},{},{})",
                    inst.u8_at(18),
                    em_model_name(model).unwrap_or("???"),
                    inst.i16_at(12),
                    inst.i16_at(14),
                    inst.i16_at(16)
                )
            }
            OM_SET => format!("OM_SET #0x{:02x}", inst.u8_at(1)),
            PLAYER_POS_SET => format!(
                "PLAYER_POS_SET a={} x={} y={} z={}",
                inst.i16_at(4),
                inst.i16_at(8),
                inst.i16_at(10),
                inst.i16_at(12)
            ),
            EM_POS_SET => format!(
                "EM_POS_SET #0x{:02x} a={} x={} y={} z={}",
                inst.u8_at(1),
                inst.i16_at(4),
                inst.i16_at(8),
                inst.i16_at(10),
                inst.i16_at(12)
            ),
            ARRAY_SET => format!(
                "INST37_ARRAY_SET[{}][{}] = {}",
                inst.u8_at(1),
                inst.u8_at(2),
                inst.u8_at(3)
            ),
            opcode if LENGTHS.get(usize::from(opcode)).is_some_and(|len| *len != 0) => {
                format!("INST_{opcode:02x}")
            }
            0x28 | 0x33 => format!("INST_{:02x} 0x{:02x}", inst.opcode(), inst.u8_at(1)),
            opcode => format!("Unknown opcode 0x{opcode:02x}"),
        };
        Formatted::line(text)
    }
}

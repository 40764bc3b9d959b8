//! RE1 event scripts: a moded bytecode whose decode table changes as the
//! script runs, with room-script fragments embedded in some instructions.

use super::{
    Condition, Embedded, FormatContext, Formatted, Instruction, Mode, ScriptVariant, RE1_SCD,
};
use crate::facade::GameFacade;

/// Opcode that runs an embedded room-script fragment (length byte counts the header).
pub const EXEC_SCD: u8 = 0x06;
/// Opcode carrying a room-script fragment after a two byte header.
pub const EXEC_SCD_BLOCK: u8 = 0x07;
pub const SKIP: u8 = 0xfc;

/// Lengths of the opcodes shared by every mode.
fn common_length(code: &[u8]) -> Option<usize> {
    let length = match *code.first()? {
        0xf6 | 0xf7 | 0xf8 | 0xfb | 0xfd | 0xff => 1,
        0xf9 => 3,
        0xfa => 4,
        0xfe => 2,
        SKIP => code.get(1).map_or(0, |n| usize::from(*n)),
        _ => return None,
    };
    Some(length)
}

fn mode0_length(code: &[u8]) -> usize {
    match code[0] {
        0x00..=0x03 | 0x08 => 1,
        0x04 => 3,
        0x05 => 4,
        EXEC_SCD => code.get(1).map_or(0, |n| usize::from(*n) + 1),
        EXEC_SCD_BLOCK => code.get(1).map_or(0, |n| usize::from(*n)),
        0x09 => 2,
        _ => 1,
    }
}

fn mode1_length(opcode: u8) -> usize {
    match opcode {
        0x80 | 0x82 | 0x86 | 0x8b => 1,
        0x81 => 10,
        0x83 => 7,
        0x84 | 0x88 => 4,
        0x85 | 0x87 | 0x89 | 0x8a => 2,
        _ => 1,
    }
}

fn mode2_length(opcode: u8) -> usize {
    match opcode {
        0x00..=0x04 => 1,
        0x05 | 0x06 | 0x0a => 4,
        0x07 | 0x0b => 8,
        0x08 => 3,
        0x09 => 2,
        _ => 1,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Re1Event;

impl ScriptVariant for Re1Event {
    fn name(&self) -> &'static str {
        "re1-event"
    }

    fn decode_length(&self, code: &[u8], mode: Mode) -> usize {
        if code.is_empty() {
            return 0;
        }
        if let Some(length) = common_length(code) {
            return length;
        }
        match mode {
            Mode::M0 => mode0_length(code),
            Mode::M1 => mode1_length(code[0]),
            Mode::M2 => mode2_length(code[0]),
            Mode::M3 => 2,
        }
    }

    fn next_mode(&self, opcode: u8, mode: Mode) -> Mode {
        match (mode, opcode) {
            (_, 0xf6..=0xff) => mode,
            (Mode::M0, 0x01) => Mode::M1,
            (Mode::M0, 0x02 | 0x03) => Mode::M2,
            (Mode::M1, 0x8b) => Mode::M0,
            (Mode::M2, 0x01) => Mode::M0,
            _ => mode,
        }
    }

    fn embedded(&self, inst: &Instruction<'_>) -> Option<Embedded> {
        if inst.mode != Mode::M0 {
            return None;
        }
        let length = match inst.opcode() {
            EXEC_SCD => usize::from(inst.u8_at(1)).checked_sub(1)?,
            EXEC_SCD_BLOCK => usize::from(inst.u8_at(1)).checked_sub(2)?,
            _ => return None,
        };
        Some(Embedded {
            start: 2,
            length,
            variant: &RE1_SCD,
        })
    }

    fn execute_one(&self, _inst: &Instruction<'_>, _facade: &mut dyn GameFacade) -> Condition {
        Condition::None
    }

    fn format_one(&self, inst: &Instruction<'_>, _ctx: &FormatContext<'_>) -> Formatted {
        let mut text = format!("INST_{:02x}", inst.opcode());
        if inst.mode != Mode::M0 {
            text.push_str(&format!(" [{}]", inst.mode));
        }
        match (inst.mode, inst.opcode()) {
            (Mode::M0, EXEC_SCD) => text.push_str(" EXEC_SCD"),
            (Mode::M0, EXEC_SCD_BLOCK) => text.push_str(" SCD_BLOCK"),
            (_, SKIP) => text.push_str(&format!(" SKIP {}", inst.u8_at(1))),
            _ => {}
        }
        Formatted::line(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::testing::format;

    #[test]
    fn mode_selects_the_decode_table() {
        let v = Re1Event;
        assert_eq!(v.decode_length(&[0x05], Mode::M0), 4);
        assert_eq!(v.decode_length(&[0x05], Mode::M2), 4);
        assert_eq!(v.decode_length(&[0x81], Mode::M1), 10);
        assert_eq!(v.decode_length(&[0x81], Mode::M0), 1);
        assert_eq!(v.decode_length(&[0x07], Mode::M2), 8);
        assert_eq!(v.decode_length(&[0x42, 0], Mode::M3), 2);
        assert_eq!(v.decode_length(&[0xfa], Mode::M1), 4);
    }

    #[test]
    fn length_bytes_drive_variable_opcodes() {
        let v = Re1Event;
        assert_eq!(v.decode_length(&[EXEC_SCD, 5], Mode::M0), 6);
        assert_eq!(v.decode_length(&[EXEC_SCD_BLOCK, 5], Mode::M0), 5);
        assert_eq!(v.decode_length(&[SKIP, 3], Mode::M2), 3);
        assert_eq!(v.decode_length(&[SKIP, 0], Mode::M0), 0);
        assert_eq!(v.decode_length(&[EXEC_SCD], Mode::M0), 0);
        assert_eq!(v.decode_length(&[], Mode::M0), 0);
    }

    #[test]
    fn mode_transitions() {
        let v = Re1Event;
        assert_eq!(v.next_mode(0x01, Mode::M0), Mode::M1);
        assert_eq!(v.next_mode(0x03, Mode::M0), Mode::M2);
        assert_eq!(v.next_mode(0x8b, Mode::M1), Mode::M0);
        assert_eq!(v.next_mode(0x01, Mode::M2), Mode::M0);
        assert_eq!(v.next_mode(0x01, Mode::M1), Mode::M1);
        assert_eq!(v.next_mode(0xfe, Mode::M2), Mode::M2);
    }

    #[test]
    fn embedded_scripts_only_in_mode_zero() {
        let v = Re1Event;
        let bytes = [EXEC_SCD, 5, 0, 0, 0, 0];
        let inst = Instruction {
            offset: 0,
            bytes: &bytes,
            mode: Mode::M0,
        };
        let embedded = v.embedded(&inst).unwrap();
        assert_eq!((embedded.start, embedded.length), (2, 4));
        assert_eq!(embedded.variant.name(), "re1-scd");

        let block = [EXEC_SCD_BLOCK, 6, 0, 0, 0, 0];
        let inst = Instruction {
            offset: 0,
            bytes: &block,
            mode: Mode::M0,
        };
        assert_eq!(v.embedded(&inst).unwrap().length, 4);

        let inst = Instruction {
            offset: 0,
            bytes: &bytes,
            mode: Mode::M2,
        };
        assert!(v.embedded(&inst).is_none());
    }

    #[test]
    fn formats_with_mode_suffix() {
        assert_eq!(format(&Re1Event, &[0x09, 0x00]), "INST_09");
        assert_eq!(format(&Re1Event, &[EXEC_SCD, 1]), "INST_06 EXEC_SCD");
    }
}

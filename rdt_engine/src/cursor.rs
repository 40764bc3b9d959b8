use crate::variant::{Instruction, Mode, ScriptVariant};

/// Position within one script segment plus the decode mode in effect.
///
/// `origin` is the section-relative offset of the first code byte, so decoded
/// instructions carry offsets comparable with function table entries.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    code: &'a [u8],
    origin: usize,
    position: usize,
    mode: Mode,
}

/// One decoded instruction. `wanted` exceeds `consumed` when the segment
/// ended inside the instruction.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    pub instruction: Instruction<'a>,
    pub consumed: usize,
    pub wanted: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(code: &'a [u8], origin: usize) -> Self {
        Cursor {
            code,
            origin,
            position: 0,
            mode: Mode::M0,
        }
    }

    pub fn offset(&self) -> usize {
        self.origin + self.position
    }

    pub fn remaining(&self) -> usize {
        self.code.len() - self.position
    }

    pub fn rest(&self) -> &'a [u8] {
        &self.code[self.position..]
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Moves past `count` bytes without decoding them, stopping at the end.
    pub fn skip(&mut self, count: usize) {
        self.position += count.min(self.remaining());
    }

    /// Decodes the next instruction; `None` once the segment is exhausted or
    /// the variant reports length 0.
    pub fn step(&mut self, variant: &dyn ScriptVariant) -> Option<Step<'a>> {
        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }
        let wanted = variant.decode_length(rest, self.mode);
        if wanted == 0 {
            return None;
        }
        let consumed = wanted.min(rest.len());
        let instruction = Instruction {
            offset: self.offset(),
            bytes: &rest[..consumed],
            mode: self.mode,
        };
        self.position += consumed;
        self.mode = variant.next_mode(instruction.opcode(), self.mode);
        Some(Step {
            instruction,
            consumed,
            wanted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{RE1_EVENT, RE2};

    #[test]
    fn steps_track_offsets_and_remaining() {
        // NOP, EVT_NEXT, GOSUB 1
        let code = [0x00, 0x02, 0x18, 0x01];
        let mut cursor = Cursor::new(&code, 0x20);
        let first = cursor.step(&RE2).unwrap();
        assert_eq!(first.instruction.offset, 0x20);
        let second = cursor.step(&RE2).unwrap();
        assert_eq!(second.instruction.offset, 0x21);
        assert_eq!(cursor.remaining(), 2);
        let third = cursor.step(&RE2).unwrap();
        assert_eq!((third.consumed, third.wanted), (2, 2));
        assert!(cursor.step(&RE2).is_none());
        assert_eq!(cursor.offset(), 0x24);
    }

    #[test]
    fn truncated_instruction_stops_at_the_end() {
        // CMP wants 6 bytes
        let code = [0x23, 0x00, 0x01];
        let mut cursor = Cursor::new(&code, 0);
        let step = cursor.step(&RE2).unwrap();
        assert_eq!((step.consumed, step.wanted), (3, 6));
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn mode_follows_the_instructions() {
        // 0x01 enters M1, where 0x81 is 10 bytes long
        let mut code = vec![0x01, 0x81];
        code.extend_from_slice(&[0; 9]);
        code.push(0x8b);
        let mut cursor = Cursor::new(&code, 0);
        cursor.step(&RE1_EVENT).unwrap();
        assert_eq!(cursor.mode(), Mode::M1);
        let long = cursor.step(&RE1_EVENT).unwrap();
        assert_eq!(long.consumed, 10);
        cursor.step(&RE1_EVENT).unwrap();
        assert_eq!(cursor.mode(), Mode::M0);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn skip_never_passes_the_end() {
        let code = [0u8; 4];
        let mut cursor = Cursor::new(&code, 0);
        cursor.skip(10);
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.step(&RE2).is_none());
    }
}

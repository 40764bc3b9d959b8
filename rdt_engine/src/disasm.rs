use std::fmt::Write as _;

use rdt_formats::TextSource;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::ScriptError;
use crate::resolver::ScriptSegment;
use crate::variant::{FormatContext, Instruction, ScriptVariant};
use crate::walk::{walk, Visit, Visitor, WalkReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisasmLine {
    /// Section-relative offset of the instruction.
    pub offset: usize,
    pub indent: usize,
    pub text: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Disassembly {
    pub lines: Vec<DisasmLine>,
    pub report: WalkReport,
}

/// Collects one line per instruction, plus `# ` comment lines for resolved
/// text and symbol names.
pub struct Disassembler<'c> {
    ctx: FormatContext<'c>,
    show_bytes: bool,
    base_indent: usize,
    lines: Vec<DisasmLine>,
    errors: Vec<ScriptError>,
}

impl<'c> Disassembler<'c> {
    pub fn new(ctx: FormatContext<'c>, show_bytes: bool) -> Self {
        Disassembler {
            ctx,
            show_bytes,
            base_indent: 0,
            lines: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Indents every line by `indent` extra levels.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.base_indent = indent;
        self
    }

    pub fn finish(self) -> (Vec<DisasmLine>, Vec<ScriptError>) {
        (self.lines, self.errors)
    }
}

impl Visitor for Disassembler<'_> {
    fn visit(&mut self, variant: &dyn ScriptVariant, inst: &Instruction<'_>, depth: usize) -> Visit {
        let formatted = variant.format_one(inst, &self.ctx);
        let indent = self.base_indent + depth;
        let text = if self.show_bytes {
            format!("[{}] {}", inst.hex(), formatted.text)
        } else {
            formatted.text
        };
        self.lines.push(DisasmLine {
            offset: inst.offset,
            indent,
            text,
        });
        for comment in formatted.comments {
            self.lines.push(DisasmLine {
                offset: inst.offset,
                indent,
                text: format!("# {comment}"),
            });
        }
        if let Some(err) = formatted.error {
            log::warn!("0x{:08x}: {err}", inst.offset);
            self.errors.push(err);
        }
        Visit::Continue
    }
}

/// Disassembles one function of a room.
pub fn dump(
    room: &[u8],
    segment: &ScriptSegment,
    variant: &dyn ScriptVariant,
    text: &dyn TextSource,
    config: &EngineConfig,
) -> Disassembly {
    dump_indented(room, segment, variant, text, config, 0)
}

pub(crate) fn dump_indented(
    room: &[u8],
    segment: &ScriptSegment,
    variant: &dyn ScriptVariant,
    text: &dyn TextSource,
    config: &EngineConfig,
    indent: usize,
) -> Disassembly {
    let ctx = FormatContext {
        entry_offsets: &segment.entry_offsets,
        text,
        languages: config.languages,
    };
    let mut disassembler = Disassembler::new(ctx, config.show_bytes).with_indent(indent);
    let mut report = walk(
        segment.code(room),
        segment.entry_offset() as usize,
        variant,
        &mut disassembler,
        config.max_instructions,
    );
    let (lines, errors) = disassembler.finish();
    report.errors.extend(errors);
    Disassembly { lines, report }
}

/// `0x%08x: ` followed by two spaces per indent level and the line text.
pub fn render(lines: &[DisasmLine]) -> String {
    let mut out = String::new();
    for line in lines {
        let _ = writeln!(
            out,
            "0x{:08x}: {:width$}{}",
            line.offset,
            "",
            line.text,
            width = line.indent * 2
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{RE2, RE3};

    struct Messages;

    impl TextSource for Messages {
        fn get_text(&self, language: usize, text_id: usize) -> Option<String> {
            (text_id == 3).then(|| format!("message three ({language})"))
        }
    }

    fn segment(code: &[u8], entry_offsets: Vec<u32>) -> ScriptSegment {
        ScriptSegment {
            index: 0,
            section_offset: 0,
            base_offset: entry_offsets[0],
            byte_length: code.len() as u32,
            entry_offsets,
        }
    }

    fn room_with(code: &[u8], at: usize) -> Vec<u8> {
        let mut room = vec![0u8; at];
        room.extend_from_slice(code);
        room
    }

    #[test]
    fn gosub_renders_the_table_entry() {
        let code = [0x19, 0x02, 0x01, 0x00];
        let room = room_with(&code, 8);
        let seg = segment(&code, vec![8, 0x20, 0x44]);
        let out = dump(&room, &seg, &RE3, &Messages, &EngineConfig::default());
        assert_eq!(out.lines[0].text, "GOSUB func02() [0x00000044]");
        assert_eq!(out.lines[0].offset, 8);
        assert!(out.report.errors.is_empty());
    }

    #[test]
    fn gosub_past_the_table_is_reported() {
        let code = [0x18, 0x07];
        let room = room_with(&code, 4);
        let seg = segment(&code, vec![4, 6]);
        let out = dump(&room, &seg, &RE2, &Messages, &EngineConfig::default());
        assert_eq!(out.lines[0].text, "GOSUB func07() ; out of range");
        assert_eq!(
            out.report.errors,
            vec![ScriptError::FunctionOutOfRange { index: 7, count: 2 }]
        );
    }

    #[test]
    fn goto_renders_absolute_target() {
        // NOP, GOTO -1 (relative to the GOTO itself)
        let code = [0x00, 0x17, 0x00, 0x00, 0x00, 0xff, 0xff];
        let room = room_with(&code, 2);
        let seg = segment(&code, vec![2]);
        let out = dump(&room, &seg, &RE2, &Messages, &EngineConfig::default());
        assert_eq!(out.lines[1].offset, 3);
        assert_eq!(out.lines[1].text, "GOTO [0x00000002]");
        assert!(out.report.errors.is_empty());

        // RE3 GOTO back over a two-byte instruction
        let code = [0x01, 0x00, 0x18, 0x00, 0x00, 0x00, 0xfe, 0xff];
        let room = room_with(&code, 4);
        let seg = segment(&code, vec![4]);
        let out = dump(&room, &seg, &RE3, &Messages, &EngineConfig::default());
        assert_eq!(out.lines[1].text, "GOTO [0x00000004]");
        assert!(out.report.errors.is_empty());
    }

    #[test]
    fn messages_get_one_comment_per_language() {
        let code = [0x2b, 0x00, 0x03, 0x00, 0x00, 0x00];
        let room = room_with(&code, 2);
        let seg = segment(&code, vec![2]);
        let out = dump(&room, &seg, &RE2, &Messages, &EngineConfig::default());
        let texts: Vec<&str> = out.lines.iter().map(|line| line.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "MESSAGE_ON 0x03",
                "# L0\tmessage three (0)",
                "# L1\tmessage three (1)"
            ]
        );
    }

    #[test]
    fn bodies_are_indented_and_rendered() {
        // FOR 2 { SLEEP } NEXT
        let code = [0x0d, 0x00, 0x03, 0x00, 0x02, 0x00, 0x09, 0x0e, 0x00];
        let room = room_with(&code, 2);
        let seg = segment(&code, vec![2]);
        let config = EngineConfig {
            show_bytes: false,
            ..EngineConfig::default()
        };
        let out = dump(&room, &seg, &RE2, &Messages, &config);
        assert_eq!(
            render(&out.lines),
            "0x00000002: BEGIN_FOR 2\n0x00000008:   SLEEP\n0x00000009: END_FOR\n"
        );
    }

    #[test]
    fn raw_bytes_prefix_lines() {
        let code = [0x29, 0x04];
        let room = room_with(&code, 2);
        let seg = segment(&code, vec![2]);
        let config = EngineConfig {
            show_bytes: true,
            ..EngineConfig::default()
        };
        let out = dump(&room, &seg, &RE2, &Messages, &config);
        assert_eq!(out.lines[0].text, "[0x29 0x04] CUT_CHG 4");
    }
}

//! Instruction sets, one per script language.
//!
//! Each language implements [`ScriptVariant`]: it knows how long an
//! instruction is, which instructions open nested blocks, what an instruction
//! does to the game and how it reads as text. The walk in [`crate::walk`]
//! drives any of them.

use std::fmt;

use rdt_formats::bytes::{read_i16, read_u16, read_u8};
use rdt_formats::{Generation, TextSource};
use serde::Serialize;

use crate::error::ScriptError;
use crate::facade::{Door, GameFacade, Item, Position};
use crate::resolver::resolve_gosub;

mod names;
pub mod re1;
pub mod re1_event;
pub mod re2;
pub mod re3;

pub use re1::Re1Scd;
pub use re1_event::Re1Event;
pub use re2::Re2;
pub use re3::Re3;

pub static RE1_SCD: Re1Scd = Re1Scd;
pub static RE1_EVENT: Re1Event = Re1Event;
pub static RE2: Re2 = Re2;
pub static RE3: Re3 = Re3;

/// Length reported for opcodes missing from a table.
pub const UNKNOWN_LENGTH: usize = 1;

/// Decode-table selector of the RE1 event language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Mode {
    #[default]
    M0,
    M1,
    M2,
    M3,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Mode::M0 => "m0",
            Mode::M1 => "m1",
            Mode::M2 => "m2",
            Mode::M3 => "m3",
        };
        f.write_str(label)
    }
}

/// One decoded instruction. `offset` is relative to the start of the script
/// section, `bytes` covers exactly the decoded length (shorter only when the
/// segment ended first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction<'a> {
    pub offset: usize,
    pub bytes: &'a [u8],
    pub mode: Mode,
}

impl<'a> Instruction<'a> {
    pub fn opcode(&self) -> u8 {
        self.u8_at(0)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // Fields cut off by a truncated segment read as zero.

    pub fn u8_at(&self, at: usize) -> u8 {
        read_u8(self.bytes, at).unwrap_or(0)
    }

    pub fn u16_at(&self, at: usize) -> u16 {
        read_u16(self.bytes, at).unwrap_or(0)
    }

    pub fn i16_at(&self, at: usize) -> i16 {
        read_i16(self.bytes, at).unwrap_or(0)
    }

    pub fn hex(&self) -> String {
        self.bytes
            .iter()
            .map(|byte| format!("0x{byte:02x}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    If,
    Else,
    Loop,
    Switch,
    Case,
}

/// Nested body following a block-opening instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub body: usize,
}

/// Sub-script carried inside an instruction, walked with its own language.
#[derive(Clone, Copy)]
pub struct Embedded {
    pub start: usize,
    pub length: usize,
    pub variant: &'static dyn ScriptVariant,
}

/// What a condition-testing instruction reported when executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    None,
    Flag(bool),
}

pub struct FormatContext<'a> {
    pub entry_offsets: &'a [u32],
    pub text: &'a dyn TextSource,
    pub languages: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub text: String,
    pub comments: Vec<String>,
    pub error: Option<ScriptError>,
}

impl Formatted {
    pub fn line(text: impl Into<String>) -> Self {
        Formatted {
            text: text.into(),
            ..Formatted::default()
        }
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }
}

pub trait ScriptVariant {
    fn name(&self) -> &'static str;

    /// Length of the instruction at the head of `code`; `0` ends the walk.
    fn decode_length(&self, code: &[u8], mode: Mode) -> usize;

    fn next_mode(&self, _opcode: u8, mode: Mode) -> Mode {
        mode
    }

    /// Body of a block opener. `following` starts right after the header.
    fn block(&self, _inst: &Instruction<'_>, _following: &[u8]) -> Option<Block> {
        None
    }

    fn embedded(&self, _inst: &Instruction<'_>) -> Option<Embedded> {
        None
    }

    fn execute_one(&self, inst: &Instruction<'_>, facade: &mut dyn GameFacade) -> Condition;

    fn format_one(&self, inst: &Instruction<'_>, ctx: &FormatContext<'_>) -> Formatted;
}

/// Language of the init and run scripts of a generation.
pub fn script_variant(generation: Generation) -> &'static dyn ScriptVariant {
    match generation {
        Generation::Re1 => &RE1_SCD,
        Generation::Re2 => &RE2,
        Generation::Re3 => &RE3,
    }
}

/// `length_of` over a table where `0` marks opcodes the table doesn't know.
pub(crate) fn fixed_length(table: &[u8], opcode: u8) -> usize {
    match table.get(usize::from(opcode)).copied() {
        Some(0) | None => UNKNOWN_LENGTH,
        Some(length) => usize::from(length),
    }
}

/// Effective block length of an RE2/RE3 `if`; `following` starts at the end
/// of the `if` header.
///
/// The stored length sometimes includes the closing `end_if` and sometimes
/// doesn't; when the byte two before the stored end is an `end_if`, the
/// marker is counted in.
pub fn effective_if_length(stored: usize, following: &[u8], end_if: u8) -> usize {
    let marker = stored
        .checked_sub(2)
        .and_then(|at| following.get(at))
        .copied();
    if marker == Some(end_if) {
        stored + 2
    } else {
        stored
    }
}

/// Shared RE2/RE3 door trigger layout; only the id byte moves (1 in RE2,
/// 2 in RE3).
pub(crate) fn aot_door(inst: &Instruction<'_>, id_at: usize) -> Door {
    Door {
        id: inst.u8_at(id_at),
        x: inst.i16_at(6),
        y: inst.i16_at(8),
        w: inst.i16_at(10),
        h: inst.i16_at(12),
        // stages are stored zero-based
        next_stage: inst.u8_at(22).wrapping_add(1),
        next_room: inst.u8_at(23),
        next_camera: inst.u8_at(24),
        next_pos: Position {
            x: inst.i16_at(14),
            y: inst.i16_at(16),
            z: inst.i16_at(18),
            dir: inst.i16_at(20),
        },
    }
}

/// Shared RE2/RE3 item trigger layout.
pub(crate) fn aot_item(inst: &Instruction<'_>) -> Item {
    Item {
        id: inst.u8_at(1),
        x: inst.i16_at(6),
        y: inst.i16_at(8),
        w: inst.i16_at(10),
        h: inst.i16_at(12),
        kind: inst.u16_at(14),
        amount: inst.u16_at(16),
    }
}

pub(crate) fn format_door(name: &str, door: &Door) -> String {
    format!(
        "OBJECT #0x{:02x} = {name} stage {} room 0x{:02x} camera {} pos ({},{},{}) dir {}",
        door.id,
        door.next_stage,
        door.next_room,
        door.next_camera,
        door.next_pos.x,
        door.next_pos.y,
        door.next_pos.z,
        door.next_pos.dir
    )
}

pub(crate) fn format_item(name: &str, item: &Item) -> String {
    format!(
        "OBJECT #0x{:02x} = {name} type 0x{:04x} amount {} at ({},{}) size {}x{}",
        item.id, item.kind, item.amount, item.x, item.y, item.w, item.h
    )
}

/// `GOSUB`-style call line with its resolved entry offset.
pub(crate) fn format_call(prefix: &str, index: u8, ctx: &FormatContext<'_>) -> Formatted {
    match resolve_gosub(ctx.entry_offsets, usize::from(index)) {
        Ok(target) => Formatted::line(format!("{prefix}func{index:02x}() [0x{target:08x}]")),
        Err(err) => Formatted {
            text: format!("{prefix}func{index:02x}() ; out of range"),
            comments: Vec::new(),
            error: Some(err),
        },
    }
}

/// `GOTO` with the relative displacement folded into an absolute offset.
pub(crate) fn format_goto(inst: &Instruction<'_>, rel: i16) -> Formatted {
    let target = inst.offset as i64 + i64::from(rel);
    if target < 0 {
        Formatted::line(format!("GOTO [rel {rel}]"))
    } else {
        Formatted::line(format!("GOTO [0x{target:08x}]"))
    }
}

/// Message line plus one trailing comment per available language.
pub(crate) fn format_message(text: String, id: u8, ctx: &FormatContext<'_>) -> Formatted {
    let mut formatted = Formatted::line(text);
    for language in 0..ctx.languages {
        if let Some(message) = ctx.text.get_text(language, usize::from(id)) {
            formatted = formatted.comment(format!("L{language}\t{message}"));
        }
    }
    formatted
}

//! Script sections of a room: which section, which table layout, which
//! language.

use anyhow::{bail, Result};
use clap::ValueEnum;
use rdt_formats::{Generation, RoomImage, SectionKind};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::disasm::{dump_indented, DisasmLine, Disassembly};
use crate::exec::execute;
use crate::facade::GameFacade;
use crate::resolver::{resolve, EntryTable, ScriptSegment};
use crate::variant::{script_variant, ScriptVariant, RE1_EVENT};
use crate::walk::WalkReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    /// Runs once when the room loads.
    Init,
    /// Runs while the room is active.
    Run,
    /// RE1 event table.
    Events,
}

impl ScriptKind {
    fn section_kind(self) -> SectionKind {
        match self {
            ScriptKind::Init => SectionKind::InitScript,
            ScriptKind::Run => SectionKind::RoomScript,
            ScriptKind::Events => SectionKind::Events,
        }
    }
}

#[derive(Clone, Copy)]
pub struct ScriptSection {
    pub index: usize,
    pub table: EntryTable,
    pub variant: &'static dyn ScriptVariant,
}

pub fn script_section(generation: Generation, kind: ScriptKind) -> Result<ScriptSection> {
    let Some(index) = generation.section_index(kind.section_kind()) else {
        bail!("{generation} rooms have no {} section", kind.section_kind().label());
    };
    let (table, variant): (EntryTable, &'static dyn ScriptVariant) = match (generation, kind) {
        (Generation::Re1, ScriptKind::Events) => (EntryTable::U32Table, &RE1_EVENT),
        (Generation::Re1, _) => (EntryTable::LengthPrefixed, script_variant(generation)),
        _ => (EntryTable::U16Table, script_variant(generation)),
    };
    Ok(ScriptSection {
        index,
        table,
        variant,
    })
}

pub fn section_segments(room: &RoomImage, kind: ScriptKind) -> Result<Vec<ScriptSegment>> {
    let section = script_section(room.generation(), kind)?;
    Ok(resolve(room, section.index, section.table))
}

/// Disassembles every function of a script section, each framed by begin and
/// end lines.
pub fn dump_section(room: &RoomImage, kind: ScriptKind, config: &EngineConfig) -> Result<Disassembly> {
    let section = script_section(room.generation(), kind)?;
    let (begin, end) = match section.table {
        EntryTable::LengthPrefixed => ("BEGIN_FUNC func", "END_FUNC"),
        _ => ("BEGIN_EVENT event", "END_EVENT"),
    };

    let mut out = Disassembly::default();
    for segment in resolve(room, section.index, section.table) {
        let entry = segment.entry_offset() as usize;
        out.lines.push(DisasmLine {
            offset: entry,
            indent: 0,
            text: format!("{begin}{:02x}", segment.index),
        });
        let body = dump_indented(room.bytes(), &segment, section.variant, room, config, 1);
        out.lines.extend(body.lines);
        out.report.merge(body.report);
        out.lines.push(DisasmLine {
            offset: entry + segment.byte_length as usize,
            indent: 0,
            text: end.to_string(),
        });
    }
    Ok(out)
}

/// Executes every function of a script section in table order.
pub fn execute_section(
    room: &RoomImage,
    kind: ScriptKind,
    facade: &mut dyn GameFacade,
    config: &EngineConfig,
) -> Result<WalkReport> {
    let section = script_section(room.generation(), kind)?;
    let mut report = WalkReport::default();
    for segment in resolve(room, section.index, section.table) {
        report.merge(execute(room.bytes(), &segment, section.variant, facade, config));
    }
    Ok(report)
}

/// Room-load pass: the init script, then the run script.
pub fn load_room(
    room: &RoomImage,
    facade: &mut dyn GameFacade,
    config: &EngineConfig,
) -> Result<WalkReport> {
    let mut report = execute_section(room, ScriptKind::Init, facade, config)?;
    report.merge(execute_section(room, ScriptKind::Run, facade, config)?);
    log::debug!(
        "room load ran {} instruction(s), {} problem(s)",
        report.instructions,
        report.errors.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::RoomState;
    use rdt_formats::RoomBuilder;

    #[test]
    fn sections_per_generation() {
        let init = script_section(Generation::Re1, ScriptKind::Init).unwrap();
        assert_eq!((init.index, init.table), (6, EntryTable::LengthPrefixed));
        let events = script_section(Generation::Re1, ScriptKind::Events).unwrap();
        assert_eq!((events.index, events.variant.name()), (8, "re1-event"));
        let run = script_section(Generation::Re3, ScriptKind::Run).unwrap();
        assert_eq!((run.index, run.table, run.variant.name()), (17, EntryTable::U16Table, "re3"));
        assert!(script_section(Generation::Re2, ScriptKind::Events).is_err());
    }

    #[test]
    fn framed_dump_of_every_function() {
        // two functions: SLEEP EVT_END / EVT_END
        let script = vec![0x04, 0x00, 0x07, 0x00, 0x09, 0x01, 0x00, 0x01, 0x00];
        let room = RoomBuilder::new(Generation::Re2)
            .section(17, script)
            .build()
            .unwrap();
        let out = dump_section(&room, ScriptKind::Run, &EngineConfig::default()).unwrap();
        let texts: Vec<(usize, &str)> = out
            .lines
            .iter()
            .map(|line| (line.indent, line.text.as_str()))
            .collect();
        assert_eq!(
            texts,
            vec![
                (0, "BEGIN_EVENT event00"),
                (1, "SLEEP"),
                (1, "EVT_END"),
                (0, "END_EVENT"),
                (0, "BEGIN_EVENT event01"),
                (1, "EVT_END"),
                (0, "END_EVENT"),
            ]
        );
    }

    #[test]
    fn load_runs_init_then_run() {
        // init: CUT_CHG 1, run: CUT_CHG 2
        let room = RoomBuilder::new(Generation::Re2)
            .section(16, vec![0x02, 0x00, 0x29, 0x01])
            .section(17, vec![0x02, 0x00, 0x29, 0x02])
            .build()
            .unwrap();
        let mut state = RoomState::default();
        let report = load_room(&room, &mut state, &EngineConfig::default()).unwrap();
        assert_eq!(state.camera, 2);
        assert_eq!(report.instructions, 2);
    }
}

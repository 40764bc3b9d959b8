use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Game generation a room file belongs to. Selects the header layout and the
/// script languages found in its sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Generation {
    Re1,
    Re2,
    Re3,
}

/// Sections of a room that the script engine and its tooling know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    CameraSwitches,
    Collision,
    Cameras,
    InitScript,
    RoomScript,
    Events,
    Text,
    TextLanguage2,
    Animations,
}

impl SectionKind {
    pub const ALL: [SectionKind; 9] = [
        SectionKind::CameraSwitches,
        SectionKind::Collision,
        SectionKind::Cameras,
        SectionKind::InitScript,
        SectionKind::RoomScript,
        SectionKind::Events,
        SectionKind::Text,
        SectionKind::TextLanguage2,
        SectionKind::Animations,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SectionKind::CameraSwitches => "camera switches",
            SectionKind::Collision => "collision",
            SectionKind::Cameras => "cameras",
            SectionKind::InitScript => "init script",
            SectionKind::RoomScript => "room script",
            SectionKind::Events => "events",
            SectionKind::Text => "text",
            SectionKind::TextLanguage2 => "text (language 2)",
            SectionKind::Animations => "animations",
        }
    }
}

const RE1_OFFSETS_AT: usize = 72;
const RE1_SECTIONS: usize = 19;
const RE23_OFFSETS_AT: usize = 8;
const RE23_SECTIONS: usize = 21;

impl Generation {
    /// Number of `u32` entries in the header's section table.
    pub fn section_count(self) -> usize {
        match self {
            Generation::Re1 => RE1_SECTIONS,
            Generation::Re2 | Generation::Re3 => RE23_SECTIONS,
        }
    }

    /// Byte position of the section table inside the header.
    pub fn offsets_start(self) -> usize {
        match self {
            // u8, u8 cameras, u8[4], u16[3], three 20-byte light records
            Generation::Re1 => RE1_OFFSETS_AT,
            Generation::Re2 | Generation::Re3 => RE23_OFFSETS_AT,
        }
    }

    pub fn header_len(self) -> usize {
        self.offsets_start() + 4 * self.section_count()
    }

    pub fn section_index(self, kind: SectionKind) -> Option<usize> {
        match self {
            Generation::Re1 => match kind {
                SectionKind::CameraSwitches => Some(0),
                SectionKind::Collision => Some(1),
                SectionKind::InitScript => Some(6),
                SectionKind::RoomScript => Some(7),
                SectionKind::Events => Some(8),
                SectionKind::Text => Some(11),
                SectionKind::Cameras | SectionKind::TextLanguage2 | SectionKind::Animations => {
                    None
                }
            },
            Generation::Re2 | Generation::Re3 => match kind {
                SectionKind::Collision => Some(6),
                SectionKind::Cameras => Some(7),
                SectionKind::CameraSwitches => Some(8),
                SectionKind::Text => Some(13),
                SectionKind::TextLanguage2 => Some(14),
                SectionKind::InitScript => Some(16),
                SectionKind::RoomScript => Some(17),
                SectionKind::Animations => Some(18),
                SectionKind::Events => None,
            },
        }
    }

    /// Reverse lookup used when listing a header.
    pub fn section_kind(self, index: usize) -> Option<SectionKind> {
        SectionKind::ALL
            .into_iter()
            .find(|kind| self.section_index(*kind) == Some(index))
    }

    /// Section holding the text table for `language`.
    pub fn text_section(self, language: usize) -> Option<usize> {
        match (self, language) {
            (Generation::Re1, 0) => self.section_index(SectionKind::Text),
            (Generation::Re1, _) => None,
            (_, 0) => self.section_index(SectionKind::Text),
            (_, 1) => self.section_index(SectionKind::TextLanguage2),
            _ => None,
        }
    }

    pub fn language_count(self) -> usize {
        match self {
            Generation::Re1 => 1,
            Generation::Re2 | Generation::Re3 => 2,
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Generation::Re1 => "re1",
            Generation::Re2 => "re2",
            Generation::Re3 => "re3",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_sizes_match_layout() {
        assert_eq!(Generation::Re1.header_len(), 72 + 19 * 4);
        assert_eq!(Generation::Re2.header_len(), 8 + 21 * 4);
        assert_eq!(Generation::Re3.header_len(), Generation::Re2.header_len());
    }

    #[test]
    fn section_indices_differ_per_generation() {
        assert_eq!(Generation::Re1.section_index(SectionKind::InitScript), Some(6));
        assert_eq!(Generation::Re2.section_index(SectionKind::InitScript), Some(16));
        assert_eq!(Generation::Re3.section_index(SectionKind::RoomScript), Some(17));
        assert_eq!(Generation::Re2.section_index(SectionKind::Events), None);
        assert_eq!(Generation::Re1.section_kind(8), Some(SectionKind::Events));
        assert_eq!(Generation::Re2.section_kind(14), Some(SectionKind::TextLanguage2));
        assert_eq!(Generation::Re2.section_kind(0), None);
    }

    #[test]
    fn text_sections_follow_language() {
        assert_eq!(Generation::Re1.text_section(0), Some(11));
        assert_eq!(Generation::Re1.text_section(1), None);
        assert_eq!(Generation::Re2.text_section(1), Some(14));
        assert_eq!(Generation::Re3.text_section(2), None);
    }
}

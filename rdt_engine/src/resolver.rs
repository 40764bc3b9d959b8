//! Function tables at the head of script sections.

use rdt_formats::bytes::{read_u16, read_u32};
use rdt_formats::RoomImage;
use serde::Serialize;

use crate::error::ScriptError;

/// Layout of the entry table that starts a script section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryTable {
    /// A u16 total length, then a single function.
    LengthPrefixed,
    /// u16 offsets; the first one also gives the table size.
    U16Table,
    /// u32 offsets; the first one gives the table size, a zero entry ends it.
    U32Table,
}

/// One function of a script section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptSegment {
    pub index: usize,
    /// Absolute offset of the owning section.
    pub section_offset: u32,
    /// Absolute offset of the first instruction.
    pub base_offset: u32,
    pub byte_length: u32,
    /// Section-relative offsets of every function in the section.
    pub entry_offsets: Vec<u32>,
}

impl ScriptSegment {
    /// Offset of the first instruction relative to the section.
    pub fn entry_offset(&self) -> u32 {
        self.base_offset - self.section_offset
    }

    /// Code bytes of this function within the room buffer.
    pub fn code<'a>(&self, room: &'a [u8]) -> &'a [u8] {
        let start = (self.base_offset as usize).min(room.len());
        let end = start.saturating_add(self.byte_length as usize).min(room.len());
        &room[start..end]
    }
}

fn entry_offsets(section: &[u8], table: EntryTable) -> Vec<u32> {
    match table {
        EntryTable::LengthPrefixed => {
            if section.len() >= 2 {
                vec![2]
            } else {
                Vec::new()
            }
        }
        EntryTable::U16Table => {
            let Some(first) = read_u16(section, 0) else {
                return Vec::new();
            };
            (0..usize::from(first) / 2)
                .map_while(|slot| read_u16(section, slot * 2))
                .map(u32::from)
                .collect()
        }
        EntryTable::U32Table => {
            let Some(first) = read_u32(section, 0) else {
                return Vec::new();
            };
            (0..first as usize / 4)
                .map_while(|slot| read_u32(section, slot * 4))
                .take_while(|entry| *entry != 0)
                .collect()
        }
    }
}

/// Splits a script section into its functions. An absent section yields
/// nothing; entries past the section end or out of order get length 0.
pub fn resolve(room: &RoomImage, section_index: usize, table: EntryTable) -> Vec<ScriptSegment> {
    let (Some(section_offset), Some(section)) = (
        room.section_offset(section_index),
        room.section_bytes(section_index),
    ) else {
        log::debug!("section {section_index} is absent");
        return Vec::new();
    };
    let section_len = section.len();
    let entries = entry_offsets(section, table);

    let segments: Vec<ScriptSegment> = entries
        .iter()
        .enumerate()
        .map(|(index, &entry)| {
            let start = (entry as usize).min(section_len);
            let end = match table {
                EntryTable::LengthPrefixed => read_u16(section, 0)
                    .map_or(section_len, |total| usize::from(total).min(section_len)),
                _ => entries
                    .get(index + 1)
                    .map_or(section_len, |next| (*next as usize).min(section_len)),
            };
            ScriptSegment {
                index,
                section_offset,
                base_offset: section_offset + start as u32,
                byte_length: end.saturating_sub(start) as u32,
                entry_offsets: entries.clone(),
            }
        })
        .collect();

    log::debug!(
        "section {section_index} at 0x{section_offset:08x}: {} function(s) in {section_len} bytes",
        segments.len()
    );
    segments
}

/// Section-relative offset of function `index`.
pub fn resolve_gosub(entry_offsets: &[u32], index: usize) -> Result<u32, ScriptError> {
    entry_offsets
        .get(index)
        .copied()
        .ok_or(ScriptError::FunctionOutOfRange {
            index,
            count: entry_offsets.len(),
        })
}

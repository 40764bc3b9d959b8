//! Room message tables.
//!
//! A text section opens with a `u16` offset table whose first value doubles
//! as its byte size. RE2/RE3 strings end at `0xfe` and embed markup codes;
//! RE1 strings carry no terminator and run to the next table entry.

use crate::bytes::{read_u8, read_u16};
use crate::game::Generation;
use crate::room::RoomImage;

/// Source of decoded message strings, indexed by language and message id.
pub trait TextSource {
    fn get_text(&self, language: usize, text_id: usize) -> Option<String>;
}

/// Text source for rooms without messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoText;

impl TextSource for NoText {
    fn get_text(&self, _language: usize, _text_id: usize) -> Option<String> {
        None
    }
}

impl TextSource for RoomImage {
    fn get_text(&self, language: usize, text_id: usize) -> Option<String> {
        let index = self.generation().text_section(language)?;
        let section = self.section_bytes(index)?;
        let entry = text_entry(section, text_id)?;
        Some(match self.generation() {
            Generation::Re1 => decode_re1(entry),
            Generation::Re2 | Generation::Re3 => decode_re2(entry),
        })
    }
}

/// Number of messages in a text section.
pub fn text_count(section: &[u8]) -> usize {
    read_u16(section, 0).map_or(0, |first| usize::from(first) / 2)
}

/// Raw bytes of message `text_id`, bounded by the next entry or the section end.
pub fn text_entry(section: &[u8], text_id: usize) -> Option<&[u8]> {
    let count = text_count(section);
    if text_id >= count {
        return None;
    }
    let start = usize::from(read_u16(section, text_id * 2)?);
    let end = if text_id + 1 < count {
        usize::from(read_u16(section, (text_id + 1) * 2)?)
    } else {
        section.len()
    };
    section.get(start..end.max(start).min(section.len()))
}

const GLYPHS: [char; 0x90] = [
    ' ', '.', '?', '?', '?', '(', ')', '?', '?', '?', '?', '?', '0', '1', '2', '3', //
    '4', '5', '6', '7', '8', '9', ':', '?', ',', '"', '!', '?', '?', 'A', 'B', 'C', //
    'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', //
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '[', '/', ']', '\'', '-', '_', 'a', 'b', 'c', //
    'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', //
    't', 'u', 'v', 'w', 'x', 'y', 'z', '?', '?', '?', '?', '?', '?', '?', '?', 'à', //
    '?', 'â', '?', 'è', '?', 'é', '?', 'ê', '?', 'ï', '?', '?', '?', '?', '?', 'ù', //
    '?', 'û', 'ç', 'ç', 'S', 'T', 'A', 'R', '"', '.', '?', '?', '?', '?', '?', '?', //
    '?', '?', '?', '?', '?', '?', '?', '?', '°', '?', '?', '?', '?', '?', '?', '?', //
];

const COLORS: [&str; 6] = ["white", "green", "red", "grey", "blue", "black"];

const RE2_END: u8 = 0xfe;

pub fn decode_re2(entry: &[u8]) -> String {
    let mut out = String::new();
    let mut at = 0;
    while let Some(byte) = read_u8(entry, at) {
        if byte == RE2_END {
            break;
        }
        let arg = read_u8(entry, at + 1);
        match byte {
            0x74 => out.push_str("S."),
            0x75 => out.push_str("T."),
            0x76 => out.push_str("A."),
            0x77 => out.push_str("R."),
            0xf3 => out.push_str("[0xf3]"),
            0xf8 => {
                out.push_str(&format!("<item id=\"{}\">", arg.unwrap_or(0)));
                at += 1;
            }
            0xf9 => {
                let value = arg.unwrap_or(0);
                match COLORS.get(usize::from(value)) {
                    Some(name) => out.push_str(&format!("<text color=\"{name}\">")),
                    None => out.push_str(&format!("<text color=\"0x{value:02x}\">")),
                }
                at += 1;
            }
            0xfa => {
                match arg {
                    Some(0) => out.push_str("<p>"),
                    Some(1) => out.push_str("</p>"),
                    other => out.push_str(&format!("[0xfa][0x{:02x}]", other.unwrap_or(0))),
                }
                at += 1;
            }
            0xfb => out.push_str("[Yes/No]"),
            0xfc => out.push_str("<br>"),
            0xfd => {
                out.push_str("[Pause]");
                at += 1;
            }
            glyph if usize::from(glyph) < GLYPHS.len() => out.push(GLYPHS[usize::from(glyph)]),
            other => out.push_str(&format!("[0x{other:02x}]")),
        }
        at += 1;
    }
    out
}

pub fn decode_re1(entry: &[u8]) -> String {
    let mut out = String::new();
    for &byte in entry {
        match byte {
            // the RE1 font stops before the accented glyphs
            0x5f => out.push('?'),
            glyph if glyph < 0x60 => out.push(GLYPHS[usize::from(glyph)]),
            other => out.push_str(&format!("[0x{other:02x}]")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::RoomBuilder;

    fn table(strings: &[&[u8]]) -> Vec<u8> {
        let mut data = Vec::new();
        let mut offset = (strings.len() * 2) as u16;
        for s in strings {
            data.extend_from_slice(&offset.to_le_bytes());
            offset += s.len() as u16;
        }
        for s in strings {
            data.extend_from_slice(s);
        }
        data
    }

    #[test]
    fn decodes_re2_markup() {
        // "Hi" <br> item 3, green text, then terminator and junk
        let entry = [0x24, 0x45, 0xfc, 0xf8, 0x03, 0xf9, 0x01, 0x74, 0xfe, 0x2d];
        assert_eq!(
            decode_re2(&entry),
            "Hi<br><item id=\"3\"><text color=\"green\">S."
        );
        assert_eq!(decode_re2(&[0xfa, 0x00, 0x0c, 0xfa, 0x01]), "<p>0</p>");
        assert_eq!(decode_re2(&[0x95]), "[0x95]");
    }

    #[test]
    fn decodes_re1_without_terminator() {
        assert_eq!(decode_re1(&[0x24, 0x45, 0x00, 0x5f, 0x60]), "Hi ?[0x60]");
    }

    #[test]
    fn resolves_messages_per_language() {
        let lang1 = table(&[&[0x24, 0x45, 0xfe], &[0x0d, 0xfe]]);
        let lang2 = table(&[&[0x2c, 0x45, 0xfe]]);
        let room = RoomBuilder::new(Generation::Re2)
            .section(13, lang1)
            .section(14, lang2)
            .build()
            .unwrap();

        assert_eq!(room.get_text(0, 0).as_deref(), Some("Hi"));
        assert_eq!(room.get_text(0, 1).as_deref(), Some("1"));
        assert_eq!(room.get_text(1, 0).as_deref(), Some("Pi"));
        assert_eq!(room.get_text(1, 1), None);
        assert_eq!(room.get_text(2, 0), None);
    }

    #[test]
    fn re1_messages_end_at_next_entry() {
        let text = table(&[&[0x24, 0x45], &[0x0e]]);
        let room = RoomBuilder::new(Generation::Re1)
            .section(11, text)
            .build()
            .unwrap();
        assert_eq!(room.get_text(0, 0).as_deref(), Some("Hi"));
        assert_eq!(room.get_text(0, 1).as_deref(), Some("2"));
        assert_eq!(NoText.get_text(0, 0), None);
    }
}

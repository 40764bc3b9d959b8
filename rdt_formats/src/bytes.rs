//! Bounds-checked little-endian readers over room buffers.
//!
//! Every multi-byte field in a room file is little-endian. These helpers
//! return `None` instead of panicking when a read would cross the end of the
//! slice, so callers can treat truncated data as absent.

use byteorder::{ByteOrder, LittleEndian};

pub fn read_u8(bytes: &[u8], at: usize) -> Option<u8> {
    bytes.get(at).copied()
}

pub fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    field(bytes, at, 2).map(LittleEndian::read_u16)
}

pub fn read_i16(bytes: &[u8], at: usize) -> Option<i16> {
    field(bytes, at, 2).map(LittleEndian::read_i16)
}

pub fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    field(bytes, at, 4).map(LittleEndian::read_u32)
}

pub fn read_i32(bytes: &[u8], at: usize) -> Option<i32> {
    field(bytes, at, 4).map(LittleEndian::read_i32)
}

/// Sub-slice `[at, at + len)` or `None` when it would leave `bytes`.
pub fn field(bytes: &[u8], at: usize, len: usize) -> Option<&[u8]> {
    let end = at.checked_add(len)?;
    bytes.get(at..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let data = [0x34, 0x12, 0xfe, 0xff, 0x78, 0x56, 0x34, 0x12];
        assert_eq!(read_u8(&data, 1), Some(0x12));
        assert_eq!(read_u16(&data, 0), Some(0x1234));
        assert_eq!(read_i16(&data, 2), Some(-2));
        assert_eq!(read_u32(&data, 4), Some(0x1234_5678));
        assert_eq!(read_i32(&data, 0), Some(0xfffe_1234_u32 as i32));
    }

    #[test]
    fn reads_past_the_end_are_absent() {
        let data = [0x01, 0x02, 0x03];
        assert_eq!(read_u8(&data, 3), None);
        assert_eq!(read_u16(&data, 2), None);
        assert_eq!(read_u32(&data, 0), None);
        assert_eq!(field(&data, usize::MAX, 2), None);
    }
}

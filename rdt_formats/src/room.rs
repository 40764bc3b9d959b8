use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, ensure};
use serde::Serialize;

use crate::bytes::{read_u8, read_u32};
use crate::game::{Generation, SectionKind};

/// One loaded room: the raw file bytes plus its validated section table.
///
/// Offsets of `0` mark absent sections. Every other offset is guaranteed to
/// point inside `bytes`, which is checked once when the image is built.
#[derive(Debug, Clone)]
pub struct RoomImage {
    generation: Generation,
    path: Option<PathBuf>,
    bytes: Vec<u8>,
    section_offsets: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionInfo {
    pub index: usize,
    pub kind: Option<SectionKind>,
    pub offset: u32,
    pub length: usize,
}

impl RoomImage {
    pub fn open<P: AsRef<Path>>(path: P, generation: Generation) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let bytes = fs::read(&path_buf)
            .with_context(|| format!("reading room file {}", path_buf.display()))?;
        let mut room = Self::from_bytes(generation, bytes)
            .with_context(|| format!("parsing {generation} room {}", path_buf.display()))?;
        log::debug!(
            "{} holds {} {generation} section(s)",
            path_buf.display(),
            room.sections().len()
        );
        room.path = Some(path_buf);
        Ok(room)
    }

    pub fn from_bytes(generation: Generation, bytes: Vec<u8>) -> Result<Self> {
        let header_len = generation.header_len();
        ensure!(
            bytes.len() >= header_len,
            "room file is too small to contain a {generation} header ({} < {header_len} bytes)",
            bytes.len()
        );

        let start = generation.offsets_start();
        let mut section_offsets = Vec::with_capacity(generation.section_count());
        for index in 0..generation.section_count() {
            let offset = read_u32(&bytes, start + index * 4)
                .ok_or_else(|| anyhow!("room header truncated at section {index}"))?;
            ensure!(
                offset == 0 || (offset as usize) < bytes.len(),
                "section {index} offset 0x{offset:08x} lies outside the {}-byte room",
                bytes.len()
            );
            section_offsets.push(offset);
        }

        Ok(RoomImage {
            generation,
            path: None,
            bytes,
            section_offsets,
        })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn num_cameras(&self) -> u8 {
        read_u8(&self.bytes, 1).unwrap_or(0)
    }

    pub fn section_offsets(&self) -> &[u32] {
        &self.section_offsets
    }

    /// Offset of section `index`, `None` when absent or not part of the header.
    pub fn section_offset(&self, index: usize) -> Option<u32> {
        self.section_offsets
            .get(index)
            .copied()
            .filter(|offset| *offset != 0)
    }

    /// Sections are not self-delimiting: a section runs up to the smallest
    /// sibling offset above it, or to the end of the file.
    pub fn section_length(&self, index: usize) -> Option<usize> {
        let offset = self.section_offset(index)?;
        let end = self
            .section_offsets
            .iter()
            .copied()
            .filter(|other| *other > offset)
            .min()
            .map(|other| other as usize)
            .unwrap_or(self.bytes.len());
        Some(end - offset as usize)
    }

    pub fn section_bytes(&self, index: usize) -> Option<&[u8]> {
        let start = self.section_offset(index)? as usize;
        let length = self.section_length(index)?;
        self.bytes.get(start..start + length)
    }

    pub fn section(&self, kind: SectionKind) -> Option<&[u8]> {
        self.section_bytes(self.generation.section_index(kind)?)
    }

    pub fn sections(&self) -> Vec<SectionInfo> {
        (0..self.section_offsets.len())
            .filter_map(|index| {
                let offset = self.section_offset(index)?;
                Some(SectionInfo {
                    index,
                    kind: self.generation.section_kind(index),
                    offset,
                    length: self.section_length(index).unwrap_or(0),
                })
            })
            .collect()
    }
}

/// Lays out a synthetic room: header first, then each non-empty section in
/// the order it was added. Handy for fixtures and for re-packing sections.
#[derive(Debug, Clone)]
pub struct RoomBuilder {
    generation: Generation,
    num_cameras: u8,
    sections: Vec<(usize, Vec<u8>)>,
}

impl RoomBuilder {
    pub fn new(generation: Generation) -> Self {
        RoomBuilder {
            generation,
            num_cameras: 1,
            sections: Vec::new(),
        }
    }

    pub fn cameras(mut self, count: u8) -> Self {
        self.num_cameras = count;
        self
    }

    pub fn section(mut self, index: usize, bytes: impl Into<Vec<u8>>) -> Self {
        self.sections.push((index, bytes.into()));
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let count = self.generation.section_count();
        let mut data = vec![0u8; self.generation.header_len()];
        data[1] = self.num_cameras;

        for (index, bytes) in &self.sections {
            ensure!(
                *index < count,
                "{} rooms only have {count} sections (got index {index})",
                self.generation
            );
            if bytes.is_empty() {
                continue;
            }
            let offset = u32::try_from(data.len()).context("room grew past 4 GiB")?;
            let slot = self.generation.offsets_start() + index * 4;
            data[slot..slot + 4].copy_from_slice(&offset.to_le_bytes());
            data.extend_from_slice(bytes);
        }

        Ok(data)
    }

    pub fn build(&self) -> Result<RoomImage> {
        RoomImage::from_bytes(self.generation, self.to_bytes()?)
    }
}

//! Flat save buffer with a trailing block table.
//!
//! The last 0x200 bytes hold the footer: the `BEEF` magic at +0x10 and one
//! 8-byte entry per block from +0x14 (`len u32, id u16, crc u16`). Block
//! offsets are implicit: the first starts at 0 and each following one at the
//! next 0x200 boundary. The block that contains the footer is not
//! checksummed.

use crate::bytes::{get_u16, get_u32, put_u16, put_u32};
use crate::core_api::{CoreError, CoreErrorCode};
use crate::crypto::crc::crc16_invert;
use crate::layout::{ByteRange, Region, RegionLayout};

pub const FOOTER_LENGTH: usize = 0x200;
pub const FOOTER_MAGIC: u32 = 0x4245_4546;
const MAGIC_OFFSET: usize = 0x10;
const ENTRIES_OFFSET: usize = 0x14;
const ENTRY_SIZE: usize = 8;
const BLOCK_ALIGN: usize = 0x200;

#[derive(Debug, Clone)]
pub struct FlatStore {
    data: Vec<u8>,
    layout: RegionLayout,
}

pub fn footer_start(len: usize) -> Option<usize> {
    len.checked_sub(FOOTER_LENGTH)
}

/// Whether the buffer carries the block table magic.
pub fn has_footer(data: &[u8]) -> bool {
    footer_start(data.len())
        .and_then(|start| get_u32(data, start + MAGIC_OFFSET))
        .is_some_and(|magic| magic == FOOTER_MAGIC)
}

fn align(ofs: usize) -> Option<usize> {
    Some(ofs.checked_add(BLOCK_ALIGN - 1)? & !(BLOCK_ALIGN - 1))
}

fn entry_offset(len: usize, index: usize) -> usize {
    len - FOOTER_LENGTH + ENTRIES_OFFSET + ENTRY_SIZE * index
}

impl FlatStore {
    pub fn open(data: Vec<u8>, block_count: usize) -> Result<Self, CoreError> {
        if !has_footer(&data) {
            return Err(CoreError::new(
                CoreErrorCode::UnrecognizedFormat,
                "block table magic not found",
            ));
        }
        if ENTRIES_OFFSET + ENTRY_SIZE * block_count > FOOTER_LENGTH {
            return Err(CoreError::new(
                CoreErrorCode::UnrecognizedFormat,
                format!("{block_count} blocks do not fit in the footer"),
            ));
        }

        let mut regions = Vec::with_capacity(block_count);
        let mut start = 0usize;
        for index in 0..block_count {
            let entry = entry_offset(data.len(), index);
            let (Some(len), Some(id), Some(checksum)) = (
                get_u32(&data, entry),
                get_u16(&data, entry + 4),
                get_u16(&data, entry + 6),
            ) else {
                return Err(CoreError::truncated("block table", data.len(), entry + ENTRY_SIZE));
            };
            let range = ByteRange::new(start, len as usize).ok_or_else(|| {
                CoreError::new(CoreErrorCode::UnrecognizedFormat, "block length overflows")
            })?;
            regions.push(Region { id, range, checksum });
            start = align(range.end).ok_or_else(|| {
                CoreError::new(CoreErrorCode::UnrecognizedFormat, "block length overflows")
            })?;
        }

        let layout = RegionLayout {
            buffer_len: data.len(),
            regions,
        };
        layout.validate()?;
        Ok(Self { data, layout })
    }

    /// Zeroed buffer of `len` bytes whose footer lists `block_lengths`, with
    /// fresh checksums.
    pub fn with_blocks(len: usize, block_lengths: &[u32]) -> Result<Self, CoreError> {
        let Some(footer) = footer_start(len) else {
            return Err(CoreError::truncated("flat save", len, FOOTER_LENGTH));
        };
        let mut data = vec![0u8; len];
        put_u32(&mut data, footer + MAGIC_OFFSET, FOOTER_MAGIC);
        for (index, &block_len) in block_lengths.iter().enumerate() {
            let entry = entry_offset(len, index);
            if !put_u32(&mut data, entry, block_len) || !put_u16(&mut data, entry + 4, index as u16)
            {
                return Err(CoreError::truncated("block table", len, entry + ENTRY_SIZE));
            }
        }
        let mut store = Self::open(data, block_lengths.len())?;
        store.refresh_checksums();
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8], CoreError> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| CoreError::truncated("region", self.data.len(), usize::MAX))?;
        self.data
            .get(offset..end)
            .ok_or_else(|| CoreError::truncated("region", self.data.len(), end))
    }

    pub fn slice_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8], CoreError> {
        let total = self.data.len();
        let end = offset
            .checked_add(len)
            .ok_or_else(|| CoreError::truncated("region", total, usize::MAX))?;
        self.data
            .get_mut(offset..end)
            .ok_or_else(|| CoreError::truncated("region", total, end))
    }

    pub fn regions(&self) -> &[Region] {
        &self.layout.regions
    }

    fn checksummed(&self) -> impl Iterator<Item = (usize, &Region)> {
        let footer = self.data.len() - FOOTER_LENGTH;
        self.layout
            .regions
            .iter()
            .enumerate()
            .filter(move |(_, region)| region.range.end <= footer)
    }

    /// Ids of blocks whose stored CRC disagrees with their contents.
    pub fn checksum_mismatches(&self) -> Vec<u16> {
        self.checksummed()
            .filter(|(_, region)| {
                crc16_invert(&self.data[region.range.start..region.range.end]) != region.checksum
            })
            .map(|(_, region)| region.id)
            .collect()
    }

    pub fn checksums_valid(&self) -> bool {
        self.checksum_mismatches().is_empty()
    }

    pub fn refresh_checksums(&mut self) {
        let updates: Vec<(usize, u16)> = self
            .checksummed()
            .map(|(index, region)| {
                (index, crc16_invert(&self.data[region.range.start..region.range.end]))
            })
            .collect();
        let len = self.data.len();
        for (index, crc) in updates {
            put_u16(&mut self.data, entry_offset(len, index) + 6, crc);
            self.layout.regions[index].checksum = crc;
        }
    }

    /// Serialised copy with every block checksum recomputed.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut copy = self.clone();
        copy.refresh_checksums();
        copy.data
    }
}

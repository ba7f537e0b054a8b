//! Keyed block store for Gen 8 saves.
//!
//! Each block is `key u32` in the clear followed by a type byte and a
//! type-dependent header and payload, all masked by an [`XorShift32`] stream
//! seeded with the key.

use std::collections::BTreeMap;

use crate::bytes::LittleEndianReader;
use crate::core_api::{CoreError, CoreErrorCode};
use crate::crypto::xorshift::XorShift32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Bool1,
    Bool2,
    Bool3,
    Object,
    Array,
    Byte,
    UInt16,
    UInt32,
    UInt64,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
}

impl BlockType {
    pub fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            1 => Self::Bool1,
            2 => Self::Bool2,
            3 => Self::Bool3,
            4 => Self::Object,
            5 => Self::Array,
            8 => Self::Byte,
            9 => Self::UInt16,
            10 => Self::UInt32,
            11 => Self::UInt64,
            12 => Self::SByte,
            13 => Self::Int16,
            14 => Self::Int32,
            15 => Self::Int64,
            16 => Self::Single,
            17 => Self::Double,
            _ => return None,
        })
    }

    pub fn raw(self) -> u8 {
        match self {
            Self::Bool1 => 1,
            Self::Bool2 => 2,
            Self::Bool3 => 3,
            Self::Object => 4,
            Self::Array => 5,
            Self::Byte => 8,
            Self::UInt16 => 9,
            Self::UInt32 => 10,
            Self::UInt64 => 11,
            Self::SByte => 12,
            Self::Int16 => 13,
            Self::Int32 => 14,
            Self::Int64 => 15,
            Self::Single => 16,
            Self::Double => 17,
        }
    }

    /// Payload width of a primitive, or of one array element. Bools occupy a
    /// byte inside arrays and nothing as standalone blocks.
    fn element_size(self) -> Option<usize> {
        match self {
            Self::Bool1 | Self::Bool2 | Self::Bool3 => Some(1),
            Self::Byte | Self::SByte => Some(1),
            Self::UInt16 | Self::Int16 => Some(2),
            Self::UInt32 | Self::Int32 | Self::Single => Some(4),
            Self::UInt64 | Self::Int64 | Self::Double => Some(8),
            Self::Object | Self::Array => None,
        }
    }

    fn is_bool(self) -> bool {
        matches!(self, Self::Bool1 | Self::Bool2 | Self::Bool3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Encrypted,
    Decrypted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    key: u32,
    kind: BlockType,
    sub_type: Option<BlockType>,
    data: Vec<u8>,
    state: BlockState,
}

impl Block {
    pub fn object(key: u32, data: Vec<u8>) -> Self {
        Self {
            key,
            kind: BlockType::Object,
            sub_type: None,
            data,
            state: BlockState::Decrypted,
        }
    }

    pub fn array(key: u32, sub_type: BlockType, data: Vec<u8>) -> Self {
        Self {
            key,
            kind: BlockType::Array,
            sub_type: Some(sub_type),
            data,
            state: BlockState::Decrypted,
        }
    }

    /// Zero-valued primitive block.
    pub fn primitive(key: u32, kind: BlockType) -> Self {
        let len = if kind.is_bool() {
            0
        } else {
            kind.element_size().unwrap_or(0)
        };
        Self {
            key,
            kind,
            sub_type: None,
            data: vec![0; len],
            state: BlockState::Decrypted,
        }
    }

    pub fn key(&self) -> u32 {
        self.key
    }

    pub fn kind(&self) -> BlockType {
        self.kind
    }

    pub fn sub_type(&self) -> Option<BlockType> {
        self.sub_type
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    /// Payload bytes in the block's current state.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Stream bytes spent on the type byte and header before the payload.
    fn header_len(&self) -> usize {
        match self.kind {
            BlockType::Object => 1 + 4,
            BlockType::Array => 1 + 4 + 1,
            _ => 1,
        }
    }

    fn payload_stream(&self) -> XorShift32 {
        let mut xs = XorShift32::new(self.key);
        for _ in 0..self.header_len() {
            xs.next_u8();
        }
        xs
    }

    pub fn decrypt(&mut self) {
        if self.state == BlockState::Encrypted {
            self.payload_stream().apply(&mut self.data);
            self.state = BlockState::Decrypted;
        }
    }

    pub fn encrypt(&mut self) {
        if self.state == BlockState::Decrypted {
            self.payload_stream().apply(&mut self.data);
            self.state = BlockState::Encrypted;
        }
    }

    fn read(reader: &mut LittleEndianReader<'_>) -> Result<Self, CoreError> {
        let key = reader.read_u32()?;
        let mut xs = XorShift32::new(key);
        let raw_kind = reader.read_u8()? ^ xs.next_u8();
        let kind = BlockType::from_raw(raw_kind).ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::UnrecognizedFormat,
                format!("block {key:#010X} has unknown type {raw_kind}"),
            )
        })?;

        let (sub_type, len) = match kind {
            BlockType::Object => (None, (reader.read_u32()? ^ xs.next_u32()) as usize),
            BlockType::Array => {
                let count = (reader.read_u32()? ^ xs.next_u32()) as usize;
                let raw_sub = reader.read_u8()? ^ xs.next_u8();
                let sub = BlockType::from_raw(raw_sub)
                    .filter(|t| t.element_size().is_some())
                    .ok_or_else(|| {
                        CoreError::new(
                            CoreErrorCode::UnrecognizedFormat,
                            format!("block {key:#010X} has unknown array type {raw_sub}"),
                        )
                    })?;
                let size = sub.element_size().unwrap_or(1);
                let len = count
                    .checked_mul(size)
                    .ok_or_else(|| CoreError::truncated("block array", reader.remaining(), usize::MAX))?;
                (Some(sub), len)
            }
            t if t.is_bool() => (None, 0),
            t => (None, t.element_size().unwrap_or(0)),
        };

        let data = reader.read_bytes(len)?.to_vec();
        let mut block = Self {
            key,
            kind,
            sub_type,
            data,
            state: BlockState::Encrypted,
        };
        block.decrypt();
        Ok(block)
    }

    fn write(&self, out: &mut Vec<u8>) {
        let mut plain = self.clone();
        plain.decrypt();

        let mut body = vec![self.kind.raw()];
        match self.kind {
            BlockType::Object => body.extend_from_slice(&(plain.data.len() as u32).to_le_bytes()),
            BlockType::Array => {
                let sub = self.sub_type.unwrap_or(BlockType::Byte);
                let count = plain.data.len() / sub.element_size().unwrap_or(1);
                body.extend_from_slice(&(count as u32).to_le_bytes());
                body.push(sub.raw());
            }
            _ => {}
        }
        body.extend_from_slice(&plain.data);
        XorShift32::new(self.key).apply(&mut body);

        out.extend_from_slice(&self.key.to_le_bytes());
        out.extend_from_slice(&body);
    }
}

/// Decrypted working copies of every block in a save, in file order.
#[derive(Debug, Clone, Default)]
pub struct KeyedStore {
    blocks: Vec<Block>,
    index: BTreeMap<u32, usize>,
}

impl KeyedStore {
    /// Parses blocks until the buffer is exhausted; every declared length
    /// must fit in what remains.
    pub fn parse(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut reader = LittleEndianReader::new(bytes);
        let mut store = Self::default();
        while !reader.is_empty() {
            let block = Block::read(&mut reader)?;
            store.insert(block);
        }
        tracing::debug!(blocks = store.blocks.len(), "parsed key blocks");
        Ok(store)
    }

    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        let mut store = Self::default();
        for block in blocks {
            store.insert(block);
        }
        store
    }

    /// Adds a block, replacing any block with the same key in place.
    pub fn insert(&mut self, block: Block) {
        match self.index.get(&block.key) {
            Some(&i) => self.blocks[i] = block,
            None => {
                self.index.insert(block.key, self.blocks.len());
                self.blocks.push(block);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, key: u32) -> bool {
        self.index.contains_key(&key)
    }

    pub fn block(&self, key: u32) -> Result<&Block, CoreError> {
        self.index
            .get(&key)
            .map(|&i| &self.blocks[i])
            .ok_or_else(|| CoreError::block_not_found(key))
    }

    pub fn block_mut(&mut self, key: u32) -> Result<&mut Block, CoreError> {
        match self.index.get(&key) {
            Some(&i) => Ok(&mut self.blocks[i]),
            None => Err(CoreError::block_not_found(key)),
        }
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Re-encrypts every block into a fresh buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for block in &self.blocks {
            block.write(&mut out);
        }
        out
    }
}

//! Entity record encryption: a 4-way block shuffle keyed by the encryption
//! constant, followed by an LCG XOR stream.

pub mod crc;
pub mod xorshift;

use crate::bytes::{read_u16, read_u32, write_u16};

/// Byte layout parameters a record variant hands to the cipher.
pub trait CryptLayout {
    const BOX_LENGTH: usize;
    const PARTY_LENGTH: usize;
    const BLOCK_LENGTH: usize;
    const ENCRYPTION_START: usize = 8;
    const CHECKSUM_OFFSET: usize = 6;

    /// Structural check distinguishing the on-disk form from the in-memory one.
    fn is_encrypted(data: &[u8]) -> bool;
}

/// Source block for each destination block, per shuffle value. Rows 24..32
/// repeat rows 0..8 so a 5-bit index never needs a modulus.
pub const BLOCK_POSITION: [[u8; 4]; 32] = [
    [0, 1, 2, 3],
    [0, 1, 3, 2],
    [0, 2, 1, 3],
    [0, 3, 1, 2],
    [0, 2, 3, 1],
    [0, 3, 2, 1],
    [1, 0, 2, 3],
    [1, 0, 3, 2],
    [2, 0, 1, 3],
    [3, 0, 1, 2],
    [2, 0, 3, 1],
    [3, 0, 2, 1],
    [1, 2, 0, 3],
    [1, 3, 0, 2],
    [2, 1, 0, 3],
    [3, 1, 0, 2],
    [2, 3, 0, 1],
    [3, 2, 0, 1],
    [1, 2, 3, 0],
    [1, 3, 2, 0],
    [2, 1, 3, 0],
    [3, 1, 2, 0],
    [2, 3, 1, 0],
    [3, 2, 1, 0],
    [0, 1, 2, 3],
    [0, 1, 3, 2],
    [0, 2, 1, 3],
    [0, 3, 1, 2],
    [0, 2, 3, 1],
    [0, 3, 2, 1],
    [1, 0, 2, 3],
    [1, 0, 3, 2],
];

/// Row of `BLOCK_POSITION` that undoes the row at the same index.
pub const BLOCK_POSITION_INVERT: [u8; 32] = [
    0, 1, 2, 4, 3, 5, 6, 7, 12, 18, 13, 19, 8, 10, 14, 20, 16, 22, 9, 11, 15, 21, 17, 23, 0, 1, 2,
    4, 3, 5, 6, 7,
];

pub fn encryption_constant(data: &[u8]) -> u32 {
    read_u32(data, 0)
}

pub fn shuffle_value(encryption_constant: u32) -> usize {
    ((encryption_constant >> 13) & 31) as usize
}

/// Reorders four `block_len` blocks starting at `start`.
pub fn shuffle_blocks(data: &mut [u8], start: usize, block_len: usize, sv: usize) {
    let end = start + block_len * 4;
    let original = data[start..end].to_vec();
    for (dst, &src) in BLOCK_POSITION[sv].iter().enumerate() {
        let src = src as usize * block_len;
        let dst = start + dst * block_len;
        data[dst..dst + block_len].copy_from_slice(&original[src..src + block_len]);
    }
}

/// XORs `data` with the LCG stream seeded by `seed`; applying it twice is a no-op.
pub fn crypt(data: &mut [u8], seed: u32) {
    let mut seed = seed;
    for pair in data.chunks_exact_mut(2) {
        seed = seed.wrapping_mul(0x41C6_4E6D).wrapping_add(0x0000_6073);
        pair[0] ^= (seed >> 16) as u8;
        pair[1] ^= (seed >> 24) as u8;
    }
}

pub fn checksum<L: CryptLayout>(data: &[u8]) -> u16 {
    (L::ENCRYPTION_START..L::BOX_LENGTH)
        .step_by(2)
        .fold(0u16, |acc, i| acc.wrapping_add(read_u16(data, i)))
}

pub fn stored_checksum<L: CryptLayout>(data: &[u8]) -> u16 {
    read_u16(data, L::CHECKSUM_OFFSET)
}

pub fn refresh_checksum<L: CryptLayout>(data: &mut [u8]) {
    let chk = checksum::<L>(data);
    write_u16(data, L::CHECKSUM_OFFSET, chk);
}

fn stream<L: CryptLayout>(data: &mut [u8], ec: u32) {
    crypt(&mut data[L::ENCRYPTION_START..L::BOX_LENGTH], ec);
    if data.len() == L::PARTY_LENGTH {
        crypt(&mut data[L::BOX_LENGTH..L::PARTY_LENGTH], ec);
    }
}

pub fn decrypt<L: CryptLayout>(data: &mut [u8]) {
    if !L::is_encrypted(data) {
        return;
    }
    let ec = encryption_constant(data);
    stream::<L>(data, ec);
    shuffle_blocks(data, L::ENCRYPTION_START, L::BLOCK_LENGTH, shuffle_value(ec));
}

pub fn encrypt<L: CryptLayout>(data: &mut [u8]) {
    if L::is_encrypted(data) {
        return;
    }
    let ec = encryption_constant(data);
    refresh_checksum::<L>(data);
    let sv = BLOCK_POSITION_INVERT[shuffle_value(ec)] as usize;
    shuffle_blocks(data, L::ENCRYPTION_START, L::BLOCK_LENGTH, sv);
    stream::<L>(data, ec);
}

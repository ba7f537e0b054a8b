//! Fixed-width UTF-16LE string slots.
//!
//! A slot of `n` code units holds at most `n - 1` characters followed by a
//! zero terminator; unused units are zero-filled on write.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// Plain UTF-16.
    Unicode,
    /// Gen 6/7 table: the gender symbols live in the private-use area.
    Gen67,
}

const MALE: u16 = 0x2642;
const FEMALE: u16 = 0x2640;
const MALE_PUA: u16 = 0xE08E;
const FEMALE_PUA: u16 = 0xE08F;

impl Charset {
    // The mapping is its own inverse, so decode and encode share it.
    fn translate(self, unit: u16) -> u16 {
        match self {
            Self::Unicode => unit,
            Self::Gen67 => match unit {
                MALE => MALE_PUA,
                FEMALE => FEMALE_PUA,
                MALE_PUA => MALE,
                FEMALE_PUA => FEMALE,
                other => other,
            },
        }
    }
}

/// Byte width of a slot holding `units` UTF-16 code units.
pub const fn slot_bytes(units: usize) -> usize {
    units * 2
}

pub fn decode(slot: &[u8], charset: Charset) -> String {
    let units: Vec<u16> = slot
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .map(|unit| charset.translate(unit))
        .collect();
    String::from_utf16_lossy(&units)
}

pub fn encode(slot: &mut [u8], text: &str, charset: Charset) {
    let capacity = (slot.len() / 2).saturating_sub(1);
    let mut units: Vec<u16> = text
        .encode_utf16()
        .map(|unit| charset.translate(unit))
        .take(capacity)
        .collect();
    if units
        .last()
        .is_some_and(|&unit| (0xD800..0xDC00).contains(&unit))
    {
        units.pop();
    }

    slot.fill(0);
    for (dst, unit) in slot.chunks_exact_mut(2).zip(units) {
        dst.copy_from_slice(&unit.to_le_bytes());
    }
}

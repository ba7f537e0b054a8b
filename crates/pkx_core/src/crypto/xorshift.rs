//! Byte stream used to mask Gen 8 key-block headers and payloads.

#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
    counter: u32,
}

impl XorShift32 {
    pub fn new(key: u32) -> Self {
        let mut state = key;
        for _ in 0..key.count_ones() {
            state = advance(state);
        }
        Self { state, counter: 0 }
    }

    pub fn next_u8(&mut self) -> u8 {
        let out = (self.state >> (self.counter << 3)) as u8;
        if self.counter == 3 {
            self.state = advance(self.state);
            self.counter = 0;
        } else {
            self.counter += 1;
        }
        out
    }

    pub fn next_u32(&mut self) -> u32 {
        u32::from_le_bytes([
            self.next_u8(),
            self.next_u8(),
            self.next_u8(),
            self.next_u8(),
        ])
    }

    pub fn apply(&mut self, data: &mut [u8]) {
        for b in data {
            *b ^= self.next_u8();
        }
    }
}

fn advance(mut x: u32) -> u32 {
    x ^= x << 2;
    x ^= x >> 15;
    x ^= x << 13;
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_is_self_inverse_for_same_key() {
        let plain: Vec<u8> = (0..=255).collect();
        let mut data = plain.clone();
        XorShift32::new(0x47E1_CEAB).apply(&mut data);
        assert_ne!(data, plain);
        XorShift32::new(0x47E1_CEAB).apply(&mut data);
        assert_eq!(data, plain);
    }

    #[test]
    fn word_reads_match_byte_reads() {
        let mut a = XorShift32::new(0x1234_5678);
        let mut b = a.clone();
        let word = a.next_u32();
        let bytes = [b.next_u8(), b.next_u8(), b.next_u8(), b.next_u8()];
        assert_eq!(word, u32::from_le_bytes(bytes));
    }

    #[test]
    fn zero_key_stays_zero() {
        let mut x = XorShift32::new(0);
        assert_eq!(x.next_u32(), 0);
    }
}

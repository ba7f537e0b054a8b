use crate::core_api::{CoreError, CoreErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, len: usize) -> Option<Self> {
        Some(Self {
            start,
            end: start.checked_add(len)?,
        })
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One block listed in a save footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub id: u16,
    pub range: ByteRange,
    pub checksum: u16,
}

#[derive(Debug, Clone)]
pub struct RegionLayout {
    pub buffer_len: usize,
    pub regions: Vec<Region>,
}

impl RegionLayout {
    /// Regions must start at 0, ascend without overlapping, and stay inside
    /// the buffer. Gaps between regions are padding.
    pub fn validate(&self) -> Result<(), CoreError> {
        let Some(first) = self.regions.first() else {
            return Err(CoreError::new(
                CoreErrorCode::UnrecognizedFormat,
                "region layout must contain at least one region",
            ));
        };

        if first.range.start != 0 {
            return Err(CoreError::new(
                CoreErrorCode::UnrecognizedFormat,
                "layout does not start at byte 0",
            ));
        }

        let mut floor = 0usize;
        for region in &self.regions {
            if region.range.start < floor {
                return Err(CoreError::new(
                    CoreErrorCode::UnrecognizedFormat,
                    format!(
                        "region {} overlaps its predecessor: starts at {:#X}, previous ended at {:#X}",
                        region.id, region.range.start, floor
                    ),
                ));
            }
            if region.range.end > self.buffer_len {
                return Err(CoreError::truncated(
                    &format!("region {}", region.id),
                    self.buffer_len,
                    region.range.end,
                ));
            }
            floor = region.range.end;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: u16, start: usize, len: usize) -> Region {
        Region {
            id,
            range: ByteRange::new(start, len).unwrap(),
            checksum: 0,
        }
    }

    #[test]
    fn padded_ascending_regions_are_valid() {
        let layout = RegionLayout {
            buffer_len: 0x600,
            regions: vec![region(0, 0, 0x10), region(1, 0x200, 0x200), region(2, 0x400, 0x200)],
        };
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn overlap_and_overrun_are_rejected() {
        let overlap = RegionLayout {
            buffer_len: 0x600,
            regions: vec![region(0, 0, 0x300), region(1, 0x200, 0x10)],
        };
        assert_eq!(
            overlap.validate().unwrap_err().code,
            CoreErrorCode::UnrecognizedFormat
        );

        let overrun = RegionLayout {
            buffer_len: 0x100,
            regions: vec![region(0, 0, 0x200)],
        };
        assert_eq!(
            overrun.validate().unwrap_err().code,
            CoreErrorCode::TruncatedBuffer
        );
    }
}

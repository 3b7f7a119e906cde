//! Decoding of run-length compressed animation curves
//!
//! A curve is a list of 16-bit slots. Each span starts with a header slot
//! holding `valid` (low byte) and `total` (high byte), followed by `valid`
//! signed samples. Frames past the last explicit sample of a span repeat it.
//! The first sample of the next span acts as the guard used to interpolate
//! across the span boundary.

use crate::chunks::{ANIM_RECORD_SIZE, AnimRecord};

/// The two samples bracketing a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveSample {
    /// Sample at the requested frame
    pub v1: i16,
    /// Sample at the following frame
    pub v2: i16,
}

/// Borrowed view of one compressed channel curve
#[derive(Debug, Clone, Copy)]
pub struct AnimCurve<'a> {
    data: &'a [u8],
}

impl<'a> AnimCurve<'a> {
    /// Wrap the bytes starting at the curve's first span header
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn slot(&self, index: usize) -> Option<[u8; 2]> {
        let start = index.checked_mul(2)?;
        let bytes = self.data.get(start..start + 2)?;
        Some([bytes[0], bytes[1]])
    }

    /// Span header at `index` as `(valid, total)`
    fn span(&self, index: usize) -> Option<(usize, usize)> {
        self.slot(index)
            .map(|[valid, total]| (valid as usize, total as usize))
    }

    fn value(&self, index: usize) -> Option<i16> {
        self.slot(index).map(i16::from_le_bytes)
    }

    /// Decode the samples bracketing `frame`
    ///
    /// Returns `None` when the span walk runs off the end of the data; the
    /// caller then falls back to the bone's default value. A guard sample
    /// past the end clamps to the last explicit sample.
    pub fn sample(&self, frame: usize) -> Option<CurveSample> {
        let mut k = frame;
        let mut index = 0;
        let (mut valid, mut total) = self.span(index)?;

        // malformed span
        if total < valid {
            k = 0;
        }

        while total <= k {
            k -= total;
            index += valid + 1;
            (valid, total) = self.span(index)?;
            if total < valid {
                k = 0;
            }
        }

        if valid > k {
            let v1 = self.value(index + k + 1)?;
            let v2 = if valid > k + 1 {
                self.value(index + k + 2)?
            } else if total > k + 1 {
                v1
            } else {
                self.value(index + valid + 2).unwrap_or(v1)
            };
            Some(CurveSample { v1, v2 })
        } else {
            let v1 = self.value(index + valid)?;
            let v2 = if total > k + 1 {
                v1
            } else {
                self.value(index + valid + 2).unwrap_or(v1)
            };
            Some(CurveSample { v1, v2 })
        }
    }
}

/// Borrowed view of one blend layer: an animation record per bone
#[derive(Debug, Clone, Copy)]
pub struct AnimTrack<'a> {
    data: &'a [u8],
    base: usize,
    num_bones: usize,
}

impl<'a> AnimTrack<'a> {
    /// Create a track whose first record starts at `base` inside `data`
    ///
    /// Returns `None` when the records for `num_bones` bones do not fit.
    pub fn new(data: &'a [u8], base: usize, num_bones: usize) -> Option<Self> {
        let end = num_bones
            .checked_mul(ANIM_RECORD_SIZE)
            .and_then(|size| base.checked_add(size))?;
        if end > data.len() {
            return None;
        }
        Some(Self {
            data,
            base,
            num_bones,
        })
    }

    /// Number of bones covered by this track
    pub fn bone_count(&self) -> usize {
        self.num_bones
    }

    fn record_offset(&self, bone: usize) -> Option<usize> {
        if bone >= self.num_bones {
            return None;
        }
        Some(self.base + bone * ANIM_RECORD_SIZE)
    }

    /// Animation record for a bone
    pub fn record(&self, bone: usize) -> Option<AnimRecord> {
        let offset = self.record_offset(bone)?;
        AnimRecord::from_bytes(self.data.get(offset..)?)
    }

    /// Curve for one channel of a bone, or `None` when the channel is static
    pub fn curve(&self, bone: usize, channel: usize) -> Option<AnimCurve<'a>> {
        let offset = self.record_offset(bone)?;
        let relative = AnimRecord::from_bytes(self.data.get(offset..)?)?.channel(channel)?;
        let start = offset.checked_add(relative)?;
        match self.data.get(start..) {
            Some(bytes) => Some(AnimCurve::new(bytes)),
            None => {
                log::trace!("Curve for bone {bone} channel {channel} starts past the data");
                None
            }
        }
    }
}

/// Encode spans into the on-disk slot layout
///
/// Each span is `(total, samples)`; `samples.len()` becomes `valid`.
pub fn encode_curve(spans: &[(u8, &[i16])]) -> Vec<u8> {
    let mut data = Vec::new();
    for (total, samples) in spans {
        data.push(samples.len() as u8);
        data.push(*total);
        for sample in *samples {
            data.extend_from_slice(&sample.to_le_bytes());
        }
    }
    data
}

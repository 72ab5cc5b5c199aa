//! Audio block buffer shared between operators.

use crate::data::GraphData;
use crate::literal::Literal;
use crate::settings::OperatorSettings;

/// One block of mono audio samples.
///
/// The buffer is allocated once at operator construction and reused every
/// render cycle; its length always equals the owning render instance's
/// block size. The silent buffer is the replacement value installed when
/// an audio connection is removed.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
}

impl AudioBuffer {
    /// Creates a silent buffer of `len` samples.
    pub fn silent(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    /// Creates a buffer from existing samples.
    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    /// Returns the number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the buffer holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the samples as a slice.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Returns the samples as a mutable slice.
    #[inline]
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Zeroes every sample.
    pub fn fill_silence(&mut self) {
        self.samples.fill(0.0);
    }

    /// Copies as many samples as fit from `other`.
    pub fn copy_from(&mut self, other: &AudioBuffer) {
        let len = self.samples.len().min(other.samples.len());
        self.samples[..len].copy_from_slice(&other.samples[..len]);
    }
}

impl GraphData for AudioBuffer {
    const TYPE_NAME: &'static str = "audio";

    /// Audio has no literal representation; every literal is silence sized
    /// to the render instance's block.
    fn from_literal(_literal: &Literal, settings: &OperatorSettings) -> Self {
        Self::silent(settings.block_size())
    }
}

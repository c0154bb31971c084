use std::collections::TryReserveError;

/// Interleaved scratch buffer the render source mixes into each period.
///
/// Sized to `frames * channels` samples. Resizing releases the previous
/// allocation before requesting the new one, so a failed resize leaves no
/// buffer at all rather than a stale one.
#[derive(Debug, Default)]
pub struct ScratchBuffer {
    samples: Vec<f32>,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reallocate for `frames * channels` samples, zero-filled.
    ///
    /// Returns the requested sample count on failure.
    pub fn resize(&mut self, frames: usize, channels: usize) -> Result<(), ScratchAllocError> {
        self.samples = Vec::new();

        let requested = frames.checked_mul(channels).ok_or(ScratchAllocError {
            samples: usize::MAX,
            source: None,
        })?;
        self.samples
            .try_reserve_exact(requested)
            .map_err(|e| ScratchAllocError {
                samples: requested,
                source: Some(e),
            })?;
        self.samples.resize(requested, 0.0);
        Ok(())
    }

    /// Drop the allocation.
    pub fn release(&mut self) {
        self.samples = Vec::new();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The first `count` samples, or `None` if the buffer is smaller.
    pub fn prefix_mut(&mut self, count: usize) -> Option<&mut [f32]> {
        self.samples.get_mut(..count)
    }
}

/// Failed scratch buffer allocation.
#[derive(Debug)]
pub struct ScratchAllocError {
    pub samples: usize,
    pub source: Option<TryReserveError>,
}

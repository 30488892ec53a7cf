//! Offline rendering.
//!
//! Builds a graph for the whole buffer, runs it block by block as fast as the
//! CPU allows, and collects the destination output into a new buffer. The
//! output holds `ceil(frames / rate)` frames; the reverb tail that would ring
//! past the last source frame is cut, matching what an offline audio context
//! of that length captures.

use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::builder::build;
use crate::error::Result;
use crate::params::EffectParameters;
use crate::stage::Stage;

/// Block size used when none is given.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Offline renderer with a configurable block size.
#[derive(Debug, Clone, Copy)]
pub struct OfflineRenderer {
    block_size: usize,
}

impl Default for OfflineRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineRenderer {
    /// Creates a renderer using [`DEFAULT_BLOCK_SIZE`].
    pub fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Sets the processing block size. Zero is treated as one.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Processing block size.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Renders `buffer` through `stages`.
    ///
    /// # Errors
    ///
    /// Any failure is returned as [`Error::Render`](crate::Error::Render)
    /// wrapping the cause.
    pub fn render(
        &self,
        buffer: &Arc<AudioBuffer>,
        stages: &[Box<dyn Stage>],
    ) -> Result<AudioBuffer> {
        self.render_with_progress(buffer, stages, |_, _| {})
    }

    /// Renders `buffer` through `stages`, calling `progress(done, total)` after
    /// every block.
    pub fn render_with_progress<F>(
        &self,
        buffer: &Arc<AudioBuffer>,
        stages: &[Box<dyn Stage>],
        progress: F,
    ) -> Result<AudioBuffer>
    where
        F: FnMut(u64, u64),
    {
        self.run(buffer, stages, progress)
            .map_err(crate::Error::into_render)
    }

    fn run<F>(
        &self,
        buffer: &Arc<AudioBuffer>,
        stages: &[Box<dyn Stage>],
        mut progress: F,
    ) -> Result<AudioBuffer>
    where
        F: FnMut(u64, u64),
    {
        let mut graph = build(buffer, stages, 0.0)?.into_compiled(self.block_size)?;
        let total = graph.total_frames();
        let channel_count = graph.channel_count();
        let capacity = usize::try_from(total).unwrap_or(usize::MAX);
        let mut channels: Vec<Vec<f32>> = Vec::with_capacity(channel_count);
        for _ in 0..channel_count {
            let mut channel = Vec::new();
            channel.try_reserve_exact(capacity).map_err(|_| {
                crate::Error::invalid(format!("{total} output frames do not fit in memory"))
            })?;
            channels.push(channel);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            input_frames = buffer.frame_count(),
            output_frames = total,
            block_size = self.block_size,
            "offline render started"
        );

        while !graph.is_finished() {
            let valid = graph.process_block();
            for (dst, src) in channels.iter_mut().zip(graph.output()) {
                dst.extend_from_slice(&src[..valid]);
            }
            progress(graph.frames_processed(), total);
        }

        AudioBuffer::new(channels, buffer.sample_rate())
    }
}

/// Renders `buffer` through `stages` with the default block size.
pub fn render(buffer: &Arc<AudioBuffer>, stages: &[Box<dyn Stage>]) -> Result<AudioBuffer> {
    OfflineRenderer::new().render(buffer, stages)
}

/// Renders `buffer` with the stages for `params`.
pub fn render_with_params(
    buffer: &Arc<AudioBuffer>,
    params: &EffectParameters,
) -> Result<AudioBuffer> {
    params.validate().map_err(crate::Error::into_render)?;
    render(buffer, &params.stages())
}

//! Zero-latency partitioned convolution.
//!
//! A reverb impulse is two seconds long, far too long for direct convolution
//! inside an audio callback. [`PartitionedConvolver`] splits the impulse into
//! block-sized partitions and convolves in the frequency domain (uniformly
//! partitioned overlap-save):
//!
//! 1. The last two input blocks form a `2B` window that is transformed once.
//! 2. The spectrum goes into a frequency-domain delay line of `P` slots.
//! 3. Slot `p` (the input from `p` blocks ago) is multiplied with partition `p`
//!    of the impulse and everything is accumulated.
//! 4. One inverse FFT yields the block; its second half is the valid output.
//!
//! Every block costs one forward and one inverse FFT of size `2B` plus `P`
//! complex multiply-adds per bin, and output is sample-aligned with input.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::impulse::ImpulseResponse;

/// Single-channel uniformly partitioned convolver.
pub struct PartitionedConvolver {
    block_size: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    /// Impulse partitions, already transformed and scaled.
    partitions: Vec<Vec<Complex<f32>>>,
    /// Frequency-domain delay line, one input spectrum per partition.
    history: Vec<Vec<Complex<f32>>>,
    head: usize,
    /// `[previous block | current block]`.
    window: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    accum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl core::fmt::Debug for PartitionedConvolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PartitionedConvolver")
            .field("block_size", &self.block_size)
            .field("partitions", &self.partitions.len())
            .finish_non_exhaustive()
    }
}

impl PartitionedConvolver {
    /// Prepares a convolver for `impulse`, scaled by `scale`.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero.
    pub fn new(impulse: &[f32], block_size: usize, scale: f32) -> Self {
        assert!(block_size > 0, "block size must be non-zero");
        let fft_len = block_size * 2;
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_len);
        let ifft = planner.plan_fft_inverse(fft_len);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());
        let mut scratch = vec![Complex::default(); scratch_len];

        let partitions: Vec<Vec<Complex<f32>>> = impulse
            .chunks(block_size)
            .map(|chunk| {
                let mut buf = vec![Complex::default(); fft_len];
                for (dst, &h) in buf.iter_mut().zip(chunk) {
                    *dst = Complex::new(h * scale, 0.0);
                }
                fft.process_with_scratch(&mut buf, &mut scratch);
                buf
            })
            .collect();
        let count = partitions.len().max(1);

        Self {
            block_size,
            fft,
            ifft,
            partitions,
            history: vec![vec![Complex::default(); fft_len]; count],
            head: 0,
            window: vec![0.0; fft_len],
            spectrum: vec![Complex::default(); fft_len],
            accum: vec![Complex::default(); fft_len],
            scratch,
        }
    }

    /// Block size this convolver was prepared for.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of impulse partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Convolves one block. Both slices must be exactly `block_size` long.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        let b = self.block_size;
        debug_assert_eq!(input.len(), b);
        debug_assert_eq!(output.len(), b);

        self.window.copy_within(b.., 0);
        self.window[b..].copy_from_slice(input);
        for (dst, &s) in self.spectrum.iter_mut().zip(&self.window) {
            *dst = Complex::new(s, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let slots = self.history.len();
        self.history[self.head].copy_from_slice(&self.spectrum);

        self.accum.fill(Complex::default());
        for (p, partition) in self.partitions.iter().enumerate() {
            let delayed = &self.history[(self.head + slots - p) % slots];
            for ((acc, &x), &h) in self.accum.iter_mut().zip(delayed).zip(partition) {
                *acc += x * h;
            }
        }
        self.ifft
            .process_with_scratch(&mut self.accum, &mut self.scratch);

        let norm = 1.0 / (2 * b) as f32;
        for (out, acc) in output.iter_mut().zip(&self.accum[b..]) {
            *out = acc.re * norm;
        }
        self.head = (self.head + 1) % slots;
    }
}

/// Convolution node: one [`PartitionedConvolver`] per graph channel.
///
/// Graph channel `c` uses impulse channel `c % impulse_channels`, so a mono
/// signal only hears the first impulse channel and a stereo signal hears both.
#[derive(Debug)]
pub struct ConvolverNode {
    impulse: ImpulseResponse,
    normalize: bool,
    engines: Vec<PartitionedConvolver>,
}

impl ConvolverNode {
    /// Creates a normalizing convolver node for `impulse`.
    pub fn new(impulse: ImpulseResponse) -> Self {
        Self {
            impulse,
            normalize: true,
            engines: Vec::new(),
        }
    }

    /// Enables or disables equal-power normalization of the impulse.
    pub fn set_normalize(&mut self, normalize: bool) {
        self.normalize = normalize;
    }

    /// Whether the impulse is normalized.
    pub fn normalize(&self) -> bool {
        self.normalize
    }

    /// The impulse response.
    pub fn impulse(&self) -> &ImpulseResponse {
        &self.impulse
    }

    /// Scale applied to the impulse before convolution.
    pub fn scale(&self) -> f32 {
        if self.normalize {
            self.impulse.normalization_scale()
        } else {
            1.0
        }
    }

    /// Builds per-channel engines. Called once when the graph is compiled.
    pub(crate) fn prepare(&mut self, channel_count: usize, block_size: usize) {
        let scale = self.scale();
        let ir_channels = self.impulse.channel_count();
        self.engines = (0..channel_count)
            .map(|c| {
                let taps = self.impulse.channel(c % ir_channels);
                PartitionedConvolver::new(taps, block_size, scale)
            })
            .collect();
    }

    /// Convolves one block per channel.
    pub(crate) fn process(&mut self, input: &[Vec<f32>], output: &mut [Vec<f32>]) {
        let lanes = self.engines.iter_mut().zip(input).zip(output.iter_mut());
        for ((engine, inp), out) in lanes {
            engine.process_block(inp, out);
        }
    }
}

//! Template plan precomputation for multi-channel ZNCC.

use crate::frame::{Frame, Size, CHANNELS};
use crate::util::{TriggerError, TriggerResult};

/// Precomputed statistics and zero-mean buffer for template matching.
///
/// Channel statistics are kept as exact integer sums so that flat templates
/// and flat windows can be detected without floating-point tolerance.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    sums: [u64; CHANNELS],
    energy: f64,
    zero_mean: Vec<f64>,
}

impl TemplatePlan {
    /// Builds a plan from a template frame.
    pub fn from_frame(tpl: &Frame) -> TriggerResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(TriggerError::InvalidDimensions { width, height })?;

        let mut sums = [0u64; CHANNELS];
        let mut sums_sq = [0u64; CHANNELS];
        for px in tpl.as_raw().chunks_exact(CHANNELS) {
            for c in 0..CHANNELS {
                let v = px[c] as u64;
                sums[c] += v;
                sums_sq[c] += v * v;
            }
        }

        let n = count as f64;
        let means: [f64; CHANNELS] = std::array::from_fn(|c| sums[c] as f64 / n);
        let energy = (0..CHANNELS)
            .map(|c| centered_energy(sums[c], sums_sq[c], count))
            .sum();

        let zero_mean = tpl
            .as_raw()
            .iter()
            .enumerate()
            .map(|(idx, &v)| v as f64 - means[idx % CHANNELS])
            .collect();

        Ok(Self {
            width,
            height,
            sums,
            energy,
            zero_mean,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the template dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Returns the number of pixels in the template.
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Returns the per-channel sums of the template pixels.
    pub fn channel_sums(&self) -> &[u64; CHANNELS] {
        &self.sums
    }

    /// Returns `Σ_c Σ (T_c - mean_c)²`.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Returns true when every channel is constant across the template.
    pub fn is_flat(&self) -> bool {
        self.energy <= 0.0
    }

    /// Returns the zero-mean template buffer, interleaved and row-major.
    pub fn zero_mean(&self) -> &[f64] {
        &self.zero_mean
    }

    /// Returns the zero-mean values of template row `y`.
    pub(crate) fn zero_mean_row(&self, y: usize) -> &[f64] {
        let stride = self.width * CHANNELS;
        &self.zero_mean[y * stride..(y + 1) * stride]
    }
}

/// Computes `Σ v² - (Σ v)² / n` from exact integer sums.
///
/// Returns exactly zero for a constant signal.
pub(crate) fn centered_energy(sum: u64, sum_sq: u64, count: usize) -> f64 {
    let n = count as u128;
    let numer = (sum_sq as u128 * n).saturating_sub(sum as u128 * sum as u128);
    numer as f64 / count as f64
}

use crate::error::{SlicError, SlicResult};
use std::ops::Range;

/// Changes between parallelization schemas.
///
/// Both produce identical labels and centers. Assignment is split into bands of rows and inside
/// every band the centers are visited in index order, so the center that wins a tie is the same
/// one the sequential loop picks. Center sums are integers, so the reduction order does not matter.
#[derive(Clone, PartialEq, Debug, Copy)]
pub enum ThreadingStrategy {
    /// No threading - used for correctness checks and very small rasters.
    SingleThread,
    /// Split the raster to horizontal bands by number of available threads
    /// (`rayon::current_num_threads()`).
    RowBased,
}

/// Main config for the processing.
#[derive(Clone, Debug)]
pub struct Config {
    /// Spacing of the initial seeds. It's also the half-width of the search window of every center.
    pub step: usize,
    /// Intensity normalizer. Lower means intensity similarity dominates over locality.
    pub nc: f64,
    /// Spatial normalizer, `None` means the same as `step`.
    pub ns: Option<f64>,
    /// How many assign/update iterations are done.
    ///
    /// There is no convergence check, all iterations are always run.
    pub iterations: u16,
    /// Threading strategy for the assign and update steps.
    pub threading_strategy: ThreadingStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            step: 10,
            nc: 10f64,
            ns: None,
            iterations: 10,
            threading_strategy: ThreadingStrategy::RowBased,
        }
    }
}

impl Config {
    /// Spatial distance normalizer (`ns`), defaults to `step`.
    pub fn spatial_normalizer(&self) -> f64 {
        self.ns.unwrap_or(self.step as f64)
    }

    pub fn validate(&self) -> SlicResult<()> {
        if self.step == 0 {
            return Err(SlicError::InvalidParameter(
                "step must be larger than zero".to_string(),
            ));
        }
        if !(self.nc.is_finite() && self.nc > 0.0) {
            return Err(SlicError::InvalidParameter(format!(
                "nc must be finite and positive, got {}",
                self.nc
            )));
        }
        let ns = self.spatial_normalizer();
        if !(ns.is_finite() && ns > 0.0) {
            return Err(SlicError::InvalidParameter(format!(
                "ns must be finite and positive, got {ns}"
            )));
        }
        Ok(())
    }
}

pub(crate) fn split_length_to_ranges(length: usize, splits: usize) -> Vec<Range<usize>> {
    let chunk_size = length / splits;
    let rem = length % splits;
    (0..splits)
        .scan((rem, 0usize), |(r, acc), _split| {
            let mut size = chunk_size;
            if *r > 0 {
                *r -= 1;
                size += 1;
            }
            let out = (*acc, *acc + size);
            *acc += size;
            Some(out.0..out.1)
        })
        .collect()
}

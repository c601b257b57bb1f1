use crate::arrays::{Grid, LabelGrid};
use crate::common::{split_length_to_ranges, ThreadingStrategy};
use rayon::current_num_threads;
use rayon::prelude::*;
use std::ops::Range;

/// Struct of SLIC cluster center/superpixel.
///
/// The position of a center in `Clusters::centers` is its label. Fields are updated by
/// `slic::update()` and replaced by `conectivity::enforce_connectivity()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Center {
    /// x position of center (number of column (starting from 0))
    pub x: f64,
    /// y position of center (number of row)
    pub y: f64,
    /// Average intensity of the cluster
    pub intensity: f64,
    /// Number of pixels assigned in the last update. Zero before the first update and for
    /// degenerate centers.
    pub num_members: u32,
}

impl Center {
    pub fn new(x: f64, y: f64, intensity: f64) -> Self {
        Self {
            x,
            y,
            intensity,
            num_members: 0,
        }
    }

    /// Columns scanned by this center: `[c - step, c + step)` with truncated start.
    #[inline(always)]
    pub(crate) fn column_window(&self, step: usize, width: usize) -> Range<usize> {
        window_axis(self.x, step, width)
    }

    /// Rows scanned by this center.
    #[inline(always)]
    pub(crate) fn row_window(&self, step: usize, height: usize) -> Range<usize> {
        window_axis(self.y, step, height)
    }

    /// Combined distance `sqrt((dc / nc)^2 + (ds / ns)^2)`.
    #[inline(always)]
    pub fn distance(&self, x: usize, y: usize, value: i32, nc: f64, ns: f64) -> f64 {
        let dc = (self.intensity - value as f64).abs();
        let dx = self.x - x as f64;
        let dy = self.y - y as f64;
        let ds = (dx * dx + dy * dy).sqrt();
        ((dc / nc).powi(2) + (ds / ns).powi(2)).sqrt()
    }

    /// Applies the accumulated sums. Returns `false` and keeps the old position and intensity
    /// when no pixel contributed.
    pub(crate) fn apply(&mut self, sums: &[i64; 4]) -> bool {
        let count = sums[3];
        self.num_members = count as u32;
        if count == 0 {
            return false;
        }
        let n = count as f64;
        self.x = sums[0] as f64 / n;
        self.y = sums[1] as f64 / n;
        self.intensity = sums[2] as f64 / n;
        true
    }
}

#[inline(always)]
fn window_axis(c: f64, step: usize, len: usize) -> Range<usize> {
    let s = step as f64;
    let start = (c - s).max(0.0) as usize;
    let end = ((c + s).ceil().max(0.0) as usize).min(len);
    start.min(end)..end
}

/// Running sums `[sum_x, sum_y, sum_intensity, count]` for every center.
///
/// It's always built from scratch by folding over a label grid, never kept between updates.
#[derive(Debug, Clone, PartialEq)]
pub struct CenterAccumulator {
    pub sums: Vec<[i64; 4]>,
}

impl CenterAccumulator {
    pub fn new(num_centers: usize) -> Self {
        Self {
            sums: vec![[0; 4]; num_centers],
        }
    }

    /// Sums the pixels of every label in `[0, num_centers)`. Other labels (`-1`) are skipped.
    pub fn from_assignments(
        assignments: &LabelGrid,
        grid: &Grid,
        num_centers: usize,
        strategy: ThreadingStrategy,
    ) -> Self {
        debug_assert!(grid.check_dimensions(assignments).is_ok());
        match strategy {
            ThreadingStrategy::SingleThread => {
                Self::from_rows(0..grid.height, assignments, grid, num_centers)
            }
            ThreadingStrategy::RowBased => split_length_to_ranges(grid.height, current_num_threads())
                .into_par_iter()
                .map(|rows| Self::from_rows(rows, assignments, grid, num_centers))
                .reduce(|| CenterAccumulator::new(num_centers), CenterAccumulator::merge),
        }
    }

    fn from_rows(
        rows: Range<usize>,
        assignments: &LabelGrid,
        grid: &Grid,
        num_centers: usize,
    ) -> Self {
        let mut acc = CenterAccumulator::new(num_centers);
        for row in rows {
            acc.add_row(row, grid.get_row(row), assignments.get_row(row));
        }
        acc
    }

    fn add_row(&mut self, row: usize, image_row: &[i32], assignments_row: &[i32]) {
        for (column, (value, label)) in image_row.iter().zip(assignments_row).enumerate() {
            if *label < 0 || *label as usize >= self.sums.len() {
                continue;
            }
            let acc = &mut self.sums[*label as usize];
            acc[0] += column as i64;
            acc[1] += row as i64;
            acc[2] += *value as i64;
            acc[3] += 1;
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (acc, part) in self.sums.iter_mut().zip(other.sums) {
            for (a, p) in acc.iter_mut().zip(part) {
                *a += p;
            }
        }
        self
    }
}

use crate::arrays::{Array2D, DistanceGrid, Grid, LabelGrid};
use crate::assign::assign;
use crate::cluster::{Center, CenterAccumulator};
use crate::common::Config;
use crate::conectivity::enforce_connectivity;
use crate::error::{SlicError, SlicResult};
use log::{debug, warn};

/// Convenient struct for passing values around.
#[derive(Debug, Clone)]
pub struct Clusters {
    /// For every pixel this stores to which center it belongs (index into `centers`), `-1` when
    /// no center claimed it yet.
    pub assignments: LabelGrid,
    pub centers: Vec<Center>,
}

impl Clusters {
    /// Default initialize clusters function (seeding).
    ///
    /// Seeds are placed on a regular lattice starting at `(step, step)` with spacing `step`,
    /// columns first. Every seed is moved inside its 3x3 neighbourhood to the pixel with the
    /// lowest gradient, so it doesn't sit on an edge or a noisy pixel.
    ///
    /// A grid smaller than about `2 * step` gets no seeds at all.
    pub fn initialize_clusters(grid: &Grid, config: &Config) -> SlicResult<Clusters> {
        config.validate()?;
        let step = config.step;
        let mut clusters = Clusters {
            assignments: LabelGrid::from_fill(-1, grid.width, grid.height),
            centers: Vec::new(),
        };
        for x in (step..grid.width.saturating_sub(step / 2)).step_by(step) {
            for y in (step..grid.height.saturating_sub(step / 2)).step_by(step) {
                let (cx, cy) = find_local_minimum(grid, x, y);
                clusters.centers.push(Center::new(
                    cx as f64,
                    cy as f64,
                    grid[(cx, cy)] as f64,
                ));
            }
        }
        if clusters.centers.is_empty() {
            warn!(
                "no seeds placed on {}x{} grid with step {step}",
                grid.width, grid.height
            );
        }
        Ok(clusters)
    }

    /// Indices of centers which got no pixel in the last update.
    pub fn degenerate_centers(&self) -> Vec<usize> {
        self.centers
            .iter()
            .enumerate()
            .filter(|(_, c)| c.num_members == 0)
            .map(|(i, _)| i)
            .collect()
    }

    /// `N x 3` matrix with rows `(x, y, intensity)` in label order.
    pub fn center_matrix(&self) -> Array2D<f64> {
        let mut matrix = Array2D::from_fill(0f64, 3, self.centers.len());
        for (row, center) in self.centers.iter().enumerate() {
            matrix
                .get_row_mut(row)
                .copy_from_slice(&[center.x, center.y, center.intensity]);
        }
        matrix
    }
}

/// Gradient `|g(y+1,x) - g(y,x)| + |g(y,x+1) - g(y,x)|`, `None` on the last row or column.
#[inline(always)]
fn gradient(grid: &Grid, x: usize, y: usize) -> Option<i64> {
    if x + 1 >= grid.width || y + 1 >= grid.height {
        return None;
    }
    let value = grid[(x, y)] as i64;
    Some((grid[(x, y + 1)] as i64 - value).abs() + (grid[(x + 1, y)] as i64 - value).abs())
}

/// Position with the lowest gradient in the 3x3 neighbourhood of `(x, y)`. The seed moves only on
/// strict improvement.
fn find_local_minimum(grid: &Grid, x: usize, y: usize) -> (usize, usize) {
    let mut best = (x, y);
    let mut min_grad = gradient(grid, x, y).unwrap_or(i64::MAX);
    for i in x.saturating_sub(1)..=x + 1 {
        for j in y.saturating_sub(1)..=y + 1 {
            if let Some(grad) = gradient(grid, i, j) {
                if grad < min_grad {
                    min_grad = grad;
                    best = (i, j);
                }
            }
        }
    }
    best
}

/// This function is the main loop.
///
/// The steps are:
/// - N iterations
///     - reset min distances
///     - assign
///     - update
///
/// Labels are kept between iterations, so a pixel which falls out of every window keeps its
/// last label.
pub fn iterate(grid: &Grid, config: &Config, clusters: &mut Clusters) -> SlicResult<()> {
    config.validate()?;
    grid.check_dimensions(&clusters.assignments)?;
    let mut min_distances = DistanceGrid::from_fill(f64::INFINITY, grid.width, grid.height);
    for i in 0..config.iterations {
        min_distances.fill(f64::INFINITY);
        assign(grid, config, clusters, &mut min_distances);
        update(clusters, grid, config);
        debug!(
            "iteration {i}: {} centers, {} degenerate",
            clusters.centers.len(),
            clusters.centers.iter().filter(|c| c.num_members == 0).count()
        );
    }
    Ok(())
}

/// This function does the update step.
///
/// Every center becomes the mean position and intensity of the pixels labeled with it. Centers
/// without any pixel keep their previous values and get `num_members == 0`.
pub fn update(clusters: &mut Clusters, grid: &Grid, config: &Config) {
    let accumulator = CenterAccumulator::from_assignments(
        &clusters.assignments,
        grid,
        clusters.centers.len(),
        config.threading_strategy,
    );
    for (label, (center, sums)) in clusters
        .centers
        .iter_mut()
        .zip(&accumulator.sums)
        .enumerate()
    {
        if !center.apply(sums) {
            warn!(
                "center {label} at ({}, {}) has no pixels, keeping previous values",
                center.x, center.y
            );
        }
    }
}

/// Segmentation engine keeping the state between the calls.
///
/// ```text
/// generate_superpixels -> create_connectivity -> return_centers / return_clusters
/// ```
#[derive(Debug, Clone, Default)]
pub struct Slic {
    config: Config,
    clusters: Option<Clusters>,
}

impl Slic {
    /// `step` and `nc` of the config are overwritten by `generate_superpixels()`.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clusters: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Retained state of the last run.
    pub fn clusters(&self) -> Option<&Clusters> {
        self.clusters.as_ref()
    }

    /// Seeds and iterates. Returns the `N x 3` center matrix `(x, y, intensity)`.
    ///
    /// Any state of a previous call is dropped first.
    pub fn generate_superpixels(
        &mut self,
        grid: &Grid,
        step: usize,
        nc: f64,
    ) -> SlicResult<Array2D<f64>> {
        self.clusters = None;
        let config = Config {
            step,
            nc,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        let mut clusters = Clusters::initialize_clusters(grid, &self.config)?;
        debug!(
            "seeded {} centers on {}x{} grid (step {step}, nc {nc})",
            clusters.centers.len(),
            grid.width,
            grid.height
        );
        iterate(grid, &self.config, &mut clusters)?;
        let matrix = clusters.center_matrix();
        self.clusters = Some(clusters);
        Ok(matrix)
    }

    /// Enforces 4-connectivity of the retained labels and recomputes the centers.
    pub fn create_connectivity(&mut self, grid: &Grid) -> SlicResult<()> {
        let clusters = self.clusters.as_mut().ok_or(SlicError::NotGenerated)?;
        enforce_connectivity(clusters, grid, &self.config)?;
        Ok(())
    }

    /// Per-pixel label grid, in the same orientation as the input grid.
    pub fn return_centers(&self) -> SlicResult<LabelGrid> {
        self.clusters
            .as_ref()
            .map(|c| c.assignments.clone())
            .ok_or(SlicError::NotGenerated)
    }

    /// `N x 3` center matrix `(x, y, intensity)`.
    pub fn return_clusters(&self) -> SlicResult<Array2D<f64>> {
        self.clusters
            .as_ref()
            .map(Clusters::center_matrix)
            .ok_or(SlicError::NotGenerated)
    }
}

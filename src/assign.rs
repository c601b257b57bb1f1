use crate::arrays::{DistanceGrid, Grid};
use crate::cluster::Center;
use crate::common::{Config, ThreadingStrategy};
use crate::slic::Clusters;
use assume::assume;
use multiversion::multiversion;
use rayon::current_num_threads;
use rayon::prelude::*;

/// This function does the assignment step.
///
/// Every center scans only its `2*step x 2*step` window and claims the pixels where its distance
/// is strictly lower than the best one found so far. `min_distances` must be reset by the caller.
///
/// With `ThreadingStrategy::RowBased` the raster is split to bands of rows, and every band walks
/// the centers in index order, so the result is the same as with single thread.
pub fn assign(
    grid: &Grid,
    config: &Config,
    clusters: &mut Clusters,
    min_distances: &mut DistanceGrid,
) {
    debug_assert!(grid.check_dimensions(&clusters.assignments).is_ok());
    debug_assert!(grid.check_dimensions(min_distances).is_ok());
    if grid.width == 0 || grid.height == 0 {
        return;
    }
    let nc = config.nc;
    let ns = config.spatial_normalizer();
    let step = config.step;
    let centers = clusters.centers.as_slice();

    match config.threading_strategy {
        ThreadingStrategy::SingleThread => assign_band(
            grid,
            centers,
            step,
            nc,
            ns,
            0,
            &mut clusters.assignments.data,
            &mut min_distances.data,
        ),
        ThreadingStrategy::RowBased => {
            let band_rows = grid.height.div_ceil(current_num_threads()).max(1);
            let chunk_len = band_rows * grid.width;
            clusters
                .assignments
                .data
                .par_chunks_mut(chunk_len)
                .zip(min_distances.data.par_chunks_mut(chunk_len))
                .enumerate()
                .for_each(|(band, (assignments, distances))| {
                    assign_band(
                        grid,
                        centers,
                        step,
                        nc,
                        ns,
                        band * band_rows,
                        assignments,
                        distances,
                    )
                });
        }
    }
}

/// Assigns pixels of the rows starting at `first_row`. `assignments` and `distances` hold whole
/// rows of the band.
#[allow(clippy::too_many_arguments)]
#[multiversion(targets = "simd")]
fn assign_band(
    grid: &Grid,
    centers: &[Center],
    step: usize,
    nc: f64,
    ns: f64,
    first_row: usize,
    assignments: &mut [i32],
    distances: &mut [f64],
) {
    let width = grid.width;
    debug_assert_eq!(assignments.len(), distances.len());
    debug_assert_eq!(assignments.len() % width, 0);
    let end_row = first_row + assignments.len() / width;

    for (label, center) in centers.iter().enumerate() {
        let rows = center.row_window(step, grid.height);
        let top = rows.start.max(first_row);
        let bottom = rows.end.min(end_row);
        if top >= bottom {
            continue;
        }
        let columns = center.column_window(step, width);
        for row in top..bottom {
            let image_row = grid.get_row(row);
            let offset = (row - first_row) * width;
            for column in columns.clone() {
                let index = offset + column;
                assume!(unsafe: index < distances.len(), "index {index} >= {}", distances.len());
                assume!(unsafe: index < assignments.len(), "index {index} >= {}", assignments.len());
                assume!(unsafe: column < image_row.len(), "column {column} >= {}", image_row.len());
                let d = center.distance(column, row, image_row[column], nc, ns);
                if d < distances[index] {
                    distances[index] = d;
                    assignments[index] = label as i32;
                }
            }
        }
    }
}

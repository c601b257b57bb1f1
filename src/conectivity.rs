use crate::arrays::{Grid, LabelGrid};
use crate::cluster::{Center, CenterAccumulator};
use crate::common::Config;
use crate::error::{SlicError, SlicResult};
use crate::slic::Clusters;
use log::debug;
use std::collections::VecDeque;

/// Neighbour offsets `(dx, dy)` in the order N, E, S, W.
const NEIGHBOURS_4: [(isize, isize); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

#[inline(always)]
fn neighbour(
    labels: &LabelGrid,
    (x, y): (usize, usize),
    (dx, dy): (isize, isize),
) -> Option<(usize, usize)> {
    let nx = x.checked_add_signed(dx)?;
    let ny = y.checked_add_signed(dy)?;
    (nx < labels.width && ny < labels.height).then_some((nx, ny))
}

/// This function implements the CCA step.
///
/// Pixels are visited column by column. Every not yet relabeled pixel starts a flood fill over
/// the 4-connected pixels sharing its original label. Components of at most
/// `(width * height / centers) >> 2` pixels don't get their own label, they take the label of
/// the first already relabeled neighbour (N, E, S, W) of the pixel which started them.
///
/// The labels are replaced by dense labels `[0, K)` and centers are recomputed, so there are `K`
/// centers afterward. Returns `K`.
///
/// The first component has no relabeled neighbour, it falls back to label 0 even when it's small.
pub fn enforce_connectivity(
    clusters: &mut Clusters,
    grid: &Grid,
    config: &Config,
) -> SlicResult<usize> {
    if clusters.centers.is_empty() {
        return Err(SlicError::NoCenters);
    }
    grid.check_dimensions(&clusters.assignments)?;

    let width = grid.width;
    let height = grid.height;
    let lims = (width * height) / clusters.centers.len();
    let min_size = lims >> 2;

    let old_labels = &clusters.assignments;
    let mut new_labels = LabelGrid::from_fill(-1, width, height);
    let mut label: i32 = 0;
    let mut adjlabel: i32 = 0;
    let mut num_merged: usize = 0;
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    let mut component: Vec<(usize, usize)> = Vec::new();

    for x in 0..width {
        for y in 0..height {
            if new_labels[(x, y)] != -1 {
                continue;
            }
            let source = old_labels[(x, y)];
            new_labels[(x, y)] = label;

            if let Some(adjacent) = NEIGHBOURS_4
                .iter()
                .filter_map(|d| neighbour(&new_labels, (x, y), *d))
                .map(|p| new_labels[p])
                .find(|l| *l >= 0)
            {
                adjlabel = adjacent;
            }

            component.clear();
            component.push((x, y));
            queue.push_back((x, y));
            while let Some(p) = queue.pop_front() {
                for d in NEIGHBOURS_4 {
                    if let Some(n) = neighbour(&new_labels, p, d) {
                        if new_labels[n] == -1 && old_labels[n] == source {
                            new_labels[n] = label;
                            component.push(n);
                            queue.push_back(n);
                        }
                    }
                }
            }

            if component.len() <= min_size {
                for p in component.iter() {
                    new_labels[*p] = adjlabel;
                }
                num_merged += 1;
            } else {
                label += 1;
            }
        }
    }

    let num_labels = new_labels.data.iter().copied().max().map_or(0, |l| l as usize + 1);
    debug!(
        "connectivity: {num_labels} labels from {} centers, {num_merged} components merged (min size {min_size})",
        clusters.centers.len()
    );

    let accumulator = CenterAccumulator::from_assignments(
        &new_labels,
        grid,
        num_labels,
        config.threading_strategy,
    );
    clusters.centers = accumulator
        .sums
        .iter()
        .map(|sums| {
            let mut center = Center::new(0.0, 0.0, 0.0);
            center.apply(sums);
            center
        })
        .collect();
    clusters.assignments = new_labels;
    Ok(num_labels)
}

#[cfg(test)]
mod tests {
    use super::enforce_connectivity;
    use crate::arrays::{Grid, LabelGrid};
    use crate::cluster::Center;
    use crate::common::Config;
    use crate::error::SlicError;
    use crate::slic::{Clusters, Slic};
    use std::collections::{HashSet, VecDeque};

    fn clusters_from_labels(labels: &[i32], width: usize, height: usize, n: usize) -> Clusters {
        Clusters {
            assignments: LabelGrid::from_slice(labels, width, height).unwrap(),
            centers: vec![Center::new(0.0, 0.0, 0.0); n],
        }
    }

    /// Number of 4-connected components carrying `label`.
    fn count_components(labels: &LabelGrid, label: i32) -> usize {
        let mut seen = HashSet::new();
        let mut components = 0;
        for y in 0..labels.height {
            for x in 0..labels.width {
                if labels[(x, y)] != label || seen.contains(&(x, y)) {
                    continue;
                }
                components += 1;
                let mut queue = VecDeque::from([(x, y)]);
                seen.insert((x, y));
                while let Some((px, py)) = queue.pop_front() {
                    let candidates = [
                        (px.wrapping_sub(1), py),
                        (px + 1, py),
                        (px, py.wrapping_sub(1)),
                        (px, py + 1),
                    ];
                    for (nx, ny) in candidates {
                        if nx < labels.width
                            && ny < labels.height
                            && labels[(nx, ny)] == label
                            && seen.insert((nx, ny))
                        {
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }
        }
        components
    }

    #[test]
    fn island_is_absorbed() {
        let mut labels = vec![3; 100];
        labels[4 * 10 + 6] = 7;
        let mut clusters = clusters_from_labels(&labels, 10, 10, 8);
        let grid = Grid::from_fill(1, 10, 10);
        // lims = 100 / 8 = 12, components of at most 3 pixels are merged
        let k = enforce_connectivity(&mut clusters, &grid, &Config::default()).unwrap();
        assert_eq!(k, 1);
        assert!(clusters.assignments.data.iter().all(|l| *l == 0));
        assert!(!clusters.assignments.data.contains(&7));
        assert_eq!(clusters.centers.len(), 1);
        assert_eq!(clusters.centers[0].num_members, 100);
    }

    #[test]
    fn split_label_gets_two_labels() {
        // label 1 occurs in two separate halves split by a band of label 0
        #[rustfmt::skip]
        let labels = [
            1, 1, 0, 1, 1,
            1, 1, 0, 1, 1,
            1, 1, 0, 1, 1,
            1, 1, 0, 1, 1,
        ];
        let mut clusters = clusters_from_labels(&labels, 5, 4, 2);
        let grid = Grid::from_fill(0, 5, 4);
        // lims = 20 / 2 = 10, min size 2, every component is kept
        let k = enforce_connectivity(&mut clusters, &grid, &Config::default()).unwrap();
        assert_eq!(k, 3);
        assert_eq!(clusters.assignments[(0, 0)], 0);
        assert_eq!(clusters.assignments[(2, 0)], 1);
        assert_eq!(clusters.assignments[(4, 3)], 2);
        assert_eq!(clusters.centers[1].x, 2.0);
        assert_eq!(clusters.centers[1].y, 1.5);
        assert_eq!(clusters.centers[2].x, 3.5);
    }

    #[test]
    fn adjacent_label_probes_north_first() {
        #[rustfmt::skip]
        let labels = [
            0, 0, 1, 1,
            0, 0, 1, 1,
            2, 2, 9, 1,
            2, 2, 1, 1,
        ];
        let mut clusters = clusters_from_labels(&labels, 4, 4, 4);
        let grid = Grid::from_fill(0, 4, 4);
        // lims = 16 / 4 = 4, only the single pixel of label 9 is merged
        let k = enforce_connectivity(&mut clusters, &grid, &Config::default()).unwrap();
        assert_eq!(k, 3);
        // west neighbour has label 1, north neighbour label 2
        assert_eq!(clusters.assignments[(1, 2)], 1);
        assert_eq!(clusters.assignments[(2, 1)], 2);
        assert_eq!(clusters.assignments[(2, 2)], 2);
    }

    #[test]
    fn small_first_component_falls_back_to_zero() {
        let mut labels = vec![5; 36];
        labels[0] = 2;
        let mut clusters = clusters_from_labels(&labels, 6, 6, 3);
        let grid = Grid::from_fill(0, 6, 6);
        // lims = 36 / 3 = 12, min size 3
        let k = enforce_connectivity(&mut clusters, &grid, &Config::default()).unwrap();
        assert_eq!(k, 1);
        assert!(clusters.assignments.data.iter().all(|l| *l == 0));
    }

    #[test]
    fn unassigned_pixels_are_labeled() {
        #[rustfmt::skip]
        let labels = [
            0, 0, 0, -1,
            0, 0, 0, -1,
            0, 0, 0, -1,
        ];
        let mut clusters = clusters_from_labels(&labels, 4, 3, 1);
        let grid = Grid::from_fill(0, 4, 3);
        // lims = 12, min size 3, the column of -1 is merged
        let k = enforce_connectivity(&mut clusters, &grid, &Config::default()).unwrap();
        assert_eq!(k, 1);
        assert!(clusters.assignments.data.iter().all(|l| *l == 0));
    }

    #[test]
    fn errors() {
        let grid = Grid::from_fill(0, 4, 4);
        let mut clusters = clusters_from_labels(&[0; 16], 4, 4, 0);
        assert_eq!(
            enforce_connectivity(&mut clusters, &grid, &Config::default()),
            Err(SlicError::NoCenters)
        );
        let mut clusters = clusters_from_labels(&[0; 16], 4, 4, 1);
        let other = Grid::from_fill(0, 8, 2);
        assert!(matches!(
            enforce_connectivity(&mut clusters, &other, &Config::default()),
            Err(SlicError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn pipeline_labels_are_connected_and_dense() {
        let width = 40;
        let height = 40;
        let values: Vec<i32> = (0..width * height)
            .map(|i| ((i % width) + (i / width)) as i32)
            .collect();
        let grid = Grid::from_slice(&values, width, height).unwrap();
        let mut slic = Slic::default();
        let centers = slic.generate_superpixels(&grid, 8, 40.0).unwrap();
        let num_centers = centers.height;
        assert_eq!(num_centers, 16);
        slic.create_connectivity(&grid).unwrap();

        let labels = slic.return_centers().unwrap();
        let distinct: HashSet<i32> = labels.data.iter().copied().collect();
        let k = distinct.len();
        assert!(k <= num_centers);
        assert_eq!(distinct, (0..k as i32).collect::<HashSet<i32>>());
        for label in 0..k as i32 {
            assert_eq!(count_components(&labels, label), 1, "label {label}");
        }

        let final_centers = slic.return_clusters().unwrap();
        assert_eq!(final_centers.height, k);
        let clusters = slic.clusters().unwrap();
        assert!(clusters.degenerate_centers().is_empty());
        let total: u32 = clusters.centers.iter().map(|c| c.num_members).sum();
        assert_eq!(total as usize, width * height);
    }
}

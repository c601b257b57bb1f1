//! SLIC superpixel segmentation of single-band integer rasters in Rust.
//!
//! This crate partitions a 2D grid of integer intensities (elevation model, land-cover class
//! raster, gray image, ...) into compact superpixels of similar intensity. It follows the
//! original SLIC: seeds on a regular lattice moved to the lowest gradient, a fixed number of
//! assign/update iterations where every center scans only a `2*step x 2*step` window, and a
//! connected-component pass which makes every superpixel 4-connected and absorbs tiny fragments.
//!
//! The following example describes how to segment a raster:
//!
//! ```rust
//! use raster_slic::arrays::Grid;
//! use raster_slic::common::Config;
//! use raster_slic::error::SlicResult;
//! use raster_slic::slic::Slic;
//!
//! fn main() -> SlicResult<()> {
//!     // 30x20 raster with a step in intensity at column 15
//!     let values: Vec<i32> = (0..30 * 20)
//!         .map(|i| if i % 30 < 15 { 10 } else { 200 })
//!         .collect();
//!     let grid = Grid::from_slice(&values, 30, 20)?;
//!     // create engine with defaults (10 iterations, multithreaded)
//!     let mut slic = Slic::new(Config::default());
//!     // seeds every 5 pixels, intensity normalizer 10
//!     let centers = slic.generate_superpixels(&grid, 5, 10.0)?;
//!     assert_eq!(centers.width, 3);
//!     // make every superpixel a single 4-connected region
//!     slic.create_connectivity(&grid)?;
//!     let labels = slic.return_centers()?;
//!     assert!(labels.data.iter().all(|l| *l >= 0));
//!     Ok(())
//! }
//! ```
//!
//! The pipeline pieces (`Clusters::initialize_clusters()`, `iterate()`, `assign()`, `update()`,
//! `enforce_connectivity()`) are public too, so it's possible to run them on custom seeds or
//! labelings.
//!
//! Centers which lose all their pixels during an update are not normalized (that would be a
//! division by zero), they keep their previous position and are listed by
//! `Clusters::degenerate_centers()`.
//!
//! The assign and update steps can run on the rayon thread pool
//! (`ThreadingStrategy::RowBased`, the default). The results are the same as with single thread.
//!
//! This crate has also benchmarks and tests. It's recommended to use this in release build,
//! the assignment loop uses `assume!` macro to avoid boundary checks.

pub mod arrays;
pub mod assign;
pub mod cluster;
pub mod common;
pub mod conectivity;
pub mod error;
pub mod slic;

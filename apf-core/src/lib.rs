//! Aliev-Panfilov cardiac excitation on a 2D grid.
//!
//! Explicit finite differences: each step mirrors the ghost border of the
//! previous excitation field, applies a 5-point Laplacian and then the two
//! reaction ODEs per cell, and swaps the current and previous buffers.
//!
//! ```no_run
//! use apf_core::{SimConfig, Simulation};
//!
//! let mut sim = Simulation::new(SimConfig::square(200))?;
//! let summary = sim.run(None)?;
//! let diag = sim.diagnostics()?;
//! println!("{} iterations, max {}, l2 {}", summary.niter, diag.max, diag.l2norm);
//! # Ok::<(), apf_core::ApfError>(())
//! ```

pub mod boundary;
pub mod device;
pub mod diagnostics;
pub mod error;
pub mod grid;
pub mod ic;
pub mod kernel;
pub mod params;
pub mod report;
pub mod snapshot;
pub mod solver;

pub use device::{DeviceBuffer, DeviceGrid, HostBuffer};
pub use diagnostics::{Diagnostics, Throughput};
pub use error::{ApfError, Result};
pub use grid::{Grid, Shape};
pub use params::{ModelConstants, Params, SimConfig};
pub use report::RunReport;
pub use snapshot::SnapshotSink;
pub use solver::{RunSummary, Simulation};

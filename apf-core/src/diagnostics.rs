use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// Flops charged per cell update when estimating throughput.
pub const FLOPS_PER_CELL: f64 = 28.0;
/// Fields touched per cell update, double precision.
pub const BYTES_PER_CELL: f64 = 4.0 * 8.0;

/// Summary of a field, used as the correctness oracle between runs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub max: f64,
    /// Root-mean-square over interior cells.
    pub l2norm: f64,
}

impl Diagnostics {
    /// Reduce over the interior of `field`, ghosts excluded.
    ///
    /// The reduction runs serially in row-major order so the result does not
    /// depend on how the kernel was partitioned.
    pub fn compute(field: &Grid) -> Diagnostics {
        let mut max = f64::NEG_INFINITY;
        let mut sum_sq = 0.0;
        for row in field.interior_rows() {
            for &v in row {
                max = max.max(v);
                sum_sq += v * v;
            }
        }
        let cells = field.shape().cells() as f64;
        Diagnostics {
            max,
            l2norm: (sum_sq / cells).sqrt(),
        }
    }
}

/// Advisory performance figures for a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Throughput {
    pub gflops: f64,
    pub bandwidth_gbs: f64,
}

impl Throughput {
    pub fn new(niter: u64, cells: usize, elapsed_secs: f64) -> Throughput {
        if elapsed_secs <= 0.0 {
            return Throughput {
                gflops: 0.0,
                bandwidth_gbs: 0.0,
            };
        }
        let updates = niter as f64 * cells as f64;
        Throughput {
            gflops: updates * FLOPS_PER_CELL / elapsed_secs / 1e9,
            bandwidth_gbs: updates * BYTES_PER_CELL / elapsed_secs / 1e9,
        }
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, Throughput};
use crate::params::{Params, SimConfig};
use crate::solver::RunSummary;

/// Everything printed or saved at the end of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub config: SimConfig,
    pub dt: f64,
    pub alpha: f64,
    pub niter: u64,
    pub t: f64,
    pub elapsed_secs: f64,
    pub throughput: Throughput,
    pub diagnostics: Diagnostics,
}

impl RunReport {
    pub fn new(
        config: SimConfig,
        params: &Params,
        summary: RunSummary,
        elapsed_secs: f64,
        diagnostics: Diagnostics,
    ) -> RunReport {
        RunReport {
            config,
            dt: params.dt,
            alpha: params.alpha,
            niter: summary.niter,
            t: summary.t,
            elapsed_secs,
            throughput: Throughput::new(summary.niter, config.shape().cells(), elapsed_secs),
            diagnostics,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "End at time: {:.4}; Iterations: {}", self.t, self.niter)?;
        writeln!(f, "Elapsed Time (sec): {:.6}", self.elapsed_secs)?;
        writeln!(
            f,
            "Sustained Gflops Rate: {:.3}; Sustained Bandwidth (GB/sec): {:.3}",
            self.throughput.gflops, self.throughput.bandwidth_gbs
        )?;
        write!(
            f,
            "Max: {:.6e} L2norm: {:.6e}",
            self.diagnostics.max, self.diagnostics.l2norm
        )
    }
}

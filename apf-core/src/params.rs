use serde::{Deserialize, Serialize};

use crate::error::{ApfError, Result};
use crate::grid::Shape;

/// Safety factor applied to the stability limit.
pub const DT_SAFETY: f64 = 0.95;

/// Aliev-Panfilov model constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConstants {
    /// Diffusion coefficient.
    pub d: f64,
    /// Excitation threshold.
    pub a: f64,
    pub b: f64,
    pub kk: f64,
    pub m1: f64,
    pub m2: f64,
    /// Restitution rate.
    pub epsilon: f64,
}

impl Default for ModelConstants {
    fn default() -> Self {
        ModelConstants {
            d: 5e-5,
            a: 0.1,
            b: 0.1,
            kk: 8.0,
            m1: 0.07,
            m2: 0.3,
            epsilon: 0.01,
        }
    }
}

/// Run configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Simulated-time horizon.
    pub t_final: f64,
    pub rows: usize,
    pub cols: usize,
    /// Snapshot period in simulated time, 0 disables.
    pub plot_freq: f64,
    /// Rows per parallel work group. Shapes the launch only.
    pub block_rows: usize,
    pub constants: ModelConstants,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            t_final: 1000.0,
            rows: 200,
            cols: 200,
            plot_freq: 0.0,
            block_rows: 16,
            constants: ModelConstants::default(),
        }
    }
}

impl SimConfig {
    pub fn square(n: usize) -> Self {
        SimConfig {
            rows: n,
            cols: n,
            ..SimConfig::default()
        }
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.rows, self.cols)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows < 2 || self.cols < 2 {
            return Err(ApfError::config(format!(
                "grid must be at least 2x2, got {}x{}",
                self.rows, self.cols
            )));
        }
        self.shape().checked_len()?;
        if !self.t_final.is_finite() || self.t_final < 0.0 {
            return Err(ApfError::config(format!(
                "t_final must be finite and >= 0, got {}",
                self.t_final
            )));
        }
        if !self.plot_freq.is_finite() || self.plot_freq < 0.0 {
            return Err(ApfError::config(format!(
                "plot_freq must be finite and >= 0, got {}",
                self.plot_freq
            )));
        }
        if self.block_rows == 0 {
            return Err(ApfError::config("block_rows must be >= 1"));
        }
        Ok(())
    }
}

/// Scalars the kernel needs, fixed for the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub constants: ModelConstants,
    pub dx: f64,
    pub dt: f64,
    /// `d * dt / dx^2`.
    pub alpha: f64,
}

impl Params {
    /// Derive `dt` from the diffusion and reaction stability limits.
    pub fn derive(constants: ModelConstants, cols: usize) -> Params {
        let ModelConstants {
            d, b, kk, m1, m2, epsilon, ..
        } = constants;

        let dx = 1.0 / (cols as f64 - 1.0);
        let dx2 = dx * dx;
        let rp = kk * (b + 1.0) * (b + 1.0) / 4.0;
        let dte = dx2 / (d * 4.0 + dx2 * (rp + kk));
        let dtr = 1.0 / (epsilon + (m1 / m2) * rp);
        let dt = DT_SAFETY * dte.min(dtr);

        Params {
            constants,
            dx,
            dt,
            alpha: d * dt / dx2,
        }
    }

    /// Explicit Euler update of the reaction terms for one cell.
    ///
    /// `e` is the post-diffusion excitation, `r` the recovery value from the
    /// previous step. Both right-hand sides are evaluated at `(e, r)`.
    #[inline]
    pub fn react(&self, e: f64, r: f64) -> (f64, f64) {
        let ModelConstants {
            a, b, kk, m1, m2, epsilon, ..
        } = self.constants;
        let dt = self.dt;

        let e_next = e - dt * (kk * e * (e - a) * (e - 1.0) + e * r);
        let r_next = r + dt * (epsilon + m1 * r / (e + m2)) * (-r - kk * e * (e - b - 1.0));
        (e_next, r_next)
    }

    /// Iterations needed to reach `t_final`.
    pub fn expected_iterations(&self, t_final: f64) -> u64 {
        (t_final / self.dt).ceil() as u64
    }
}

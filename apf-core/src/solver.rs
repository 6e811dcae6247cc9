//! Time-stepping driver.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::boundary::mirror_ghosts;
use crate::device::{DeviceBuffer, DeviceGrid, HostBuffer};
use crate::diagnostics::Diagnostics;
use crate::error::{ApfError, Result};
use crate::grid::{Grid, Shape};
use crate::ic::step_pattern;
use crate::kernel;
use crate::params::{Params, SimConfig};
use crate::snapshot::{SnapshotSink, snapshot_due};

/// Where the clock stopped.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub niter: u64,
    pub t: f64,
}

/// Aliev-Panfilov simulation on an execution domain `B`.
///
/// `e_prev` always holds the newest state; `e` is the write target of the
/// next step. The two trade places after every step.
pub struct Simulation<B = HostBuffer<f64>> {
    config: SimConfig,
    params: Params,
    e: DeviceGrid<B>,
    e_prev: DeviceGrid<B>,
    r: DeviceGrid<B>,
    t: f64,
    niter: u64,
}

impl Simulation<HostBuffer<f64>> {
    /// Seed the plane-wave initial condition on the CPU backend.
    pub fn new(config: SimConfig) -> Result<Self> {
        Self::on_device(config)
    }

    /// Seed arbitrary excitation and recovery fields on the CPU backend.
    pub fn with_state(config: SimConfig, e_prev: Grid, r: Grid) -> Result<Self> {
        Self::on_device_with_state(config, e_prev, r)
    }
}

impl<B: DeviceBuffer<f64>> Simulation<B> {
    pub fn on_device(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let (e_prev, r) = step_pattern(config.shape())?;
        Self::on_device_with_state(config, e_prev, r)
    }

    pub fn on_device_with_state(config: SimConfig, e_prev: Grid, r: Grid) -> Result<Self> {
        config.validate()?;
        let shape = config.shape();
        for (name, grid) in [("excitation", &e_prev), ("recovery", &r)] {
            if grid.shape() != shape {
                return Err(ApfError::config(format!(
                    "{name} field is {}x{}, config expects {}x{}",
                    grid.rows(),
                    grid.cols(),
                    shape.rows,
                    shape.cols
                )));
            }
        }

        let params = Params::derive(config.constants, config.cols);

        Ok(Simulation {
            config,
            params,
            // the write target starts as a copy of the initial state
            e: e_prev.materialize()?,
            e_prev: e_prev.materialize()?,
            r: r.materialize()?,
            t: 0.0,
            niter: 0,
        })
    }

    // ---- Accessors ----
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn shape(&self) -> Shape {
        self.config.shape()
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn niter(&self) -> u64 {
        self.niter
    }

    /// Download the newest excitation field.
    pub fn excitation(&self) -> Result<Grid> {
        self.e_prev.download()
    }

    pub fn recovery(&self) -> Result<Grid> {
        self.r.download()
    }

    pub fn diagnostics(&self) -> Result<Diagnostics> {
        Ok(Diagnostics::compute(&self.excitation()?))
    }

    // ---- State edits ----

    /// Restore the initial condition and rewind the clock.
    pub fn reset(&mut self) -> Result<()> {
        let (e_prev, r) = step_pattern(self.shape())?;
        self.e.as_mut_slice().copy_from_slice(e_prev.as_slice());
        self.e_prev.as_mut_slice().copy_from_slice(e_prev.as_slice());
        self.r.as_mut_slice().copy_from_slice(r.as_slice());
        self.t = 0.0;
        self.niter = 0;
        Ok(())
    }

    /// Overwrite the newest excitation at an interior cell. Ghost or
    /// out-of-range coordinates are ignored.
    pub fn excite(&mut self, row: usize, col: usize, value: f64) {
        let shape = self.shape();
        if row == 0 || col == 0 || row > shape.rows || col > shape.cols {
            return;
        }
        self.e_prev.as_mut_slice()[shape.offset(row, col)] = value;
    }

    // ---- Core: stepping ----

    /// Mirror, stencil + reaction, swap, advance the clock.
    pub fn step(&mut self) {
        let shape = self.shape();
        mirror_ghosts(self.e_prev.as_mut_slice(), shape);
        kernel::step(
            self.e.as_mut_slice(),
            self.r.as_mut_slice(),
            self.e_prev.as_slice(),
            shape,
            &self.params,
            self.config.block_rows,
        );
        self.swap_buffers();

        self.niter += 1;
        // derived from the counter so that no drift accumulates in t
        self.t = self.niter as f64 * self.params.dt;
        trace!(niter = self.niter, t = self.t, "step");
    }

    /// Step until the horizon, exporting snapshots every `plot_freq`.
    pub fn run(&mut self, mut sink: Option<&mut dyn SnapshotSink>) -> Result<RunSummary> {
        let shape = self.shape();
        let t_final = self.config.t_final;
        let plot_freq = self.config.plot_freq;

        info!(
            "Running {}x{} grid to t={} (dt={:.6e}, alpha={:.6e}, ~{} iterations, {} rows/band)",
            shape.rows,
            shape.cols,
            t_final,
            self.params.dt,
            self.params.alpha,
            self.params.expected_iterations(t_final),
            self.config.block_rows
        );

        let mut frame = match (&sink, plot_freq > 0.0) {
            (Some(_), true) => Some(Grid::zeros(shape)?),
            _ => None,
        };

        while self.t < t_final {
            self.step();

            if let (Some(sink), Some(frame)) = (sink.as_mut(), frame.as_mut()) {
                if snapshot_due(self.t, plot_freq, self.params.dt) {
                    self.e_prev.download_into(frame)?;
                    debug!(niter = self.niter, t = self.t, "exporting snapshot");
                    sink.export(frame, self.t, self.niter);
                }
            }
        }

        info!("Finished at t={} after {} iterations", self.t, self.niter);
        Ok(RunSummary {
            niter: self.niter,
            t: self.t,
        })
    }

    /// Step until simulated time reaches `t`, returning the steps taken.
    /// No snapshots are exported.
    pub fn advance_to(&mut self, t: f64) -> Result<u64> {
        if !t.is_finite() {
            return Err(ApfError::config(format!("target time must be finite, got {t}")));
        }
        let start = self.niter;
        while self.t < t {
            self.step();
        }
        Ok(self.niter - start)
    }

    fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.e, &mut self.e_prev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<(f64, u64, Shape)>,
    }

    impl SnapshotSink for Recorder {
        fn export(&mut self, field: &Grid, t: f64, niter: u64) {
            self.frames.push((t, niter, field.shape()));
        }
    }

    fn small(n: usize, t_final: f64) -> SimConfig {
        SimConfig {
            t_final,
            ..SimConfig::square(n)
        }
    }

    #[test]
    fn iteration_count_is_ceil_of_horizon_over_dt() {
        let mut sim = Simulation::new(small(8, 3.0)).unwrap();
        let dt = sim.params().dt;
        let summary = sim.run(None).unwrap();
        assert_eq!(summary.niter, (3.0 / dt).ceil() as u64);
        assert!(summary.t >= 3.0);
        assert!(summary.t - dt < 3.0);
    }

    #[test]
    fn zero_horizon_runs_no_steps() {
        let mut sim = Simulation::new(small(4, 0.0)).unwrap();
        let summary = sim.run(None).unwrap();
        assert_eq!(summary.niter, 0);
        assert_eq!(summary.t, 0.0);
    }

    /// One cell of one step, computed outside the kernel.
    fn advance_cell(e_prev: &Grid, r: &Grid, p: &Params, row: usize, col: usize) -> (f64, f64) {
        let mut mirrored = e_prev.clone();
        let shape = mirrored.shape();
        mirror_ghosts(mirrored.as_mut_slice(), shape);
        let lap = mirrored.get(row, col + 1)
            + mirrored.get(row, col - 1)
            + mirrored.get(row - 1, col)
            + mirrored.get(row + 1, col)
            - 4.0 * mirrored.get(row, col);
        p.react(mirrored.get(row, col) + p.alpha * lap, r.get(row, col))
    }

    #[test]
    fn written_field_feeds_next_diffusion() {
        let cfg = small(6, 1.0);
        let shape = cfg.shape();
        let mut seeded = Grid::zeros(shape).unwrap();
        for row in 1..=shape.rows {
            for col in 1..=shape.cols {
                seeded.set(row, col, ((row * 7 + col * 3) % 5) as f64 * 0.2);
            }
        }
        let r0 = Grid::zeros(shape).unwrap();
        let mut sim = Simulation::with_state(cfg, seeded.clone(), r0.clone()).unwrap();
        let p = *sim.params();

        // step 1 diffuses the seeded pattern
        sim.step();
        let written = sim.excitation().unwrap();
        let r1 = sim.recovery().unwrap();
        for (row, col) in [(1, 1), (3, 4), (6, 6)] {
            let (want_e, want_r) = advance_cell(&seeded, &r0, &p, row, col);
            assert_eq!(written.get(row, col), want_e);
            assert_eq!(r1.get(row, col), want_r);
        }

        // mark the buffer step 1 wrote; step 2 must read it, spike included
        sim.excite(3, 4, 0.9);
        let mut marked = written.clone();
        marked.set(3, 4, 0.9);
        let (want_e, want_r) = advance_cell(&marked, &r1, &p, 3, 3);
        let (unmarked_e, _) = advance_cell(&written, &r1, &p, 3, 3);
        assert_ne!(want_e, unmarked_e);

        sim.step();
        assert_eq!(sim.excitation().unwrap().get(3, 3), want_e);
        assert_eq!(sim.recovery().unwrap().get(3, 3), want_r);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_grid_reports_allocation_failure() {
        let cfg = SimConfig::square((1usize << 32) - 2);
        assert!(matches!(cfg.validate(), Err(ApfError::Allocation { .. })));
        assert!(matches!(
            Simulation::new(cfg),
            Err(ApfError::Allocation { .. })
        ));
    }

    #[test]
    fn advance_to_stops_at_target_time() {
        let mut sim = Simulation::new(small(6, 100.0)).unwrap();
        let dt = sim.params().dt;
        let steps = sim.advance_to(1.0).unwrap();
        assert_eq!(steps, (1.0 / dt).ceil() as u64);
        assert_eq!(sim.advance_to(0.5).unwrap(), 0);

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(sim.advance_to(bad), Err(ApfError::InvalidConfig(_))));
        }
        assert_eq!(sim.niter(), steps);
    }

    #[test]
    fn snapshots_fire_only_with_a_period() {
        let mut rec = Recorder::default();
        let mut sim = Simulation::new(small(4, 2.0)).unwrap();
        sim.run(Some(&mut rec)).unwrap();
        assert!(rec.frames.is_empty());

        let cfg = SimConfig {
            plot_freq: 0.5,
            ..small(4, 2.0)
        };
        let mut sim = Simulation::new(cfg).unwrap();
        sim.run(Some(&mut rec)).unwrap();
        assert!(!rec.frames.is_empty());
        assert!(rec.frames.iter().all(|&(_, _, s)| s == Shape::square(4)));
        assert!(rec.frames.windows(2).all(|w| w[0].1 < w[1].1));
    }

    #[test]
    fn state_shape_must_match_config() {
        let cfg = SimConfig::square(4);
        let e = Grid::zeros(Shape::square(5)).unwrap();
        let r = Grid::zeros(Shape::square(4)).unwrap();
        assert!(matches!(
            Simulation::with_state(cfg, e, r),
            Err(ApfError::InvalidConfig(_))
        ));
    }

    #[test]
    fn reset_restores_initial_condition() {
        let mut sim = Simulation::new(small(6, 1.0)).unwrap();
        let initial = sim.excitation().unwrap();
        sim.excite(2, 2, 0.7);
        for _ in 0..5 {
            sim.step();
        }
        sim.reset().unwrap();
        assert_eq!(sim.niter(), 0);
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.excitation().unwrap(), initial);
    }

    #[test]
    fn excite_ignores_ghosts() {
        let mut sim = Simulation::new(small(4, 1.0)).unwrap();
        let before = sim.excitation().unwrap();
        sim.excite(0, 2, 5.0);
        sim.excite(2, 5, 5.0);
        assert_eq!(sim.excitation().unwrap(), before);
        sim.excite(1, 1, 0.5);
        assert_eq!(sim.excitation().unwrap().get(1, 1), 0.5);
    }
}

use crate::grid::Grid;

/// Receives periodic copies of the excitation field.
///
/// Export is fire-and-forget: nothing flows back into the simulation, so
/// implementations handle (and log) their own I/O failures. Dimensions are
/// taken from `field.shape()`.
pub trait SnapshotSink {
    fn export(&mut self, field: &Grid, t: f64, niter: u64);
}

/// Whether a snapshot is due at simulated time `t`.
///
/// Best effort: drift in `t` can make this fire zero or several times around
/// a period boundary.
pub fn snapshot_due(t: f64, plot_freq: f64, dt: f64) -> bool {
    if plot_freq <= 0.0 {
        return false;
    }
    let k = (t / plot_freq).floor();
    t - k * plot_freq < dt
}

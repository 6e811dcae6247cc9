mod frames;

use apf_core::{ModelConstants, RunReport, SimConfig, Simulation, SnapshotSink};
use clap::Parser;
use frames::FrameWriter;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "apf", author, version, about)]
struct Args {
    /// Simulated-time horizon
    #[arg(short = 't', long, default_value_t = 1000.0)]
    t_final: f64,

    /// Grid size N (NxN interior cells)
    #[arg(short = 'n', long, default_value_t = 200)]
    n: usize,

    /// Snapshot period in simulated time (0 disables)
    #[arg(short = 'p', long, default_value_t = 0.0)]
    plot_freq: f64,

    /// Rows per parallel work group
    #[arg(short = 'x', long, default_value_t = 16)]
    block_rows: usize,

    /// Worker threads (default: one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Directory for snapshot frames (frames.bin + frames.jsonl)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write the final report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_logging(args.verbose, args.quiet);

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let config = SimConfig {
        t_final: args.t_final,
        rows: args.n,
        cols: args.n,
        plot_freq: args.plot_freq,
        block_rows: args.block_rows,
        constants: ModelConstants::default(),
    };

    let mut sim = Simulation::new(config).map_err(|e| format!("Simulation::new: {e}"))?;
    let params = *sim.params();

    println!("dt = {:.6e}, alpha = {:.6e}", params.dt, params.alpha);
    println!(
        "m x n = {} x {}, T = {}, # iterations ~ {}",
        config.rows,
        config.cols,
        config.t_final,
        params.expected_iterations(config.t_final)
    );
    println!(
        "Work groups: {} rows, {} threads",
        config.block_rows,
        rayon::current_num_threads()
    );

    let mut writer = match (&args.out, config.plot_freq > 0.0) {
        (Some(dir), true) => Some(FrameWriter::create(dir)?),
        (Some(_), false) => {
            info!("--out given without --plot-freq, no frames will be written");
            None
        }
        _ => None,
    };

    let t0 = Instant::now();
    let summary = sim.run(writer.as_mut().map(|w| w as &mut dyn SnapshotSink))?;
    let elapsed = t0.elapsed().as_secs_f64();

    let diagnostics = sim.diagnostics()?;
    let report = RunReport::new(config, &params, summary, elapsed, diagnostics);

    if let Some(w) = writer.as_mut() {
        w.flush()?;
        println!("Wrote {} frames to: {}", w.frames(), w.dir().display());
    }

    println!("{report}");

    if let Some(path) = &args.report {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, &report)?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

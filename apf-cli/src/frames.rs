use apf_core::{Grid, SnapshotSink};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Appends excitation snapshots to `frames.bin` (padded grid, f64 LE) with
/// one metadata line per frame in `frames.jsonl`.
pub struct FrameWriter {
    dir: PathBuf,
    data: BufWriter<File>,
    meta: BufWriter<File>,
    frames: u64,
    offset: u64,
}

#[derive(Serialize)]
struct FrameMeta {
    frame_idx: u64,
    niter: u64,
    t: f64,

    rows: usize,     // interior rows
    cols: usize,     // interior cols
    padded: bool,

    byte_offset: u64,
}

impl FrameWriter {
    pub fn create(dir: &Path) -> std::io::Result<FrameWriter> {
        fs::create_dir_all(dir)?;

        let data = BufWriter::new(File::create(dir.join("frames.bin"))?);
        let meta = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(dir.join("frames.jsonl"))?,
        );

        Ok(FrameWriter {
            dir: dir.to_path_buf(),
            data,
            meta,
            frames: 0,
            offset: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.data.flush()?;
        self.meta.flush()
    }

    fn write_frame(&mut self, field: &Grid, t: f64, niter: u64) -> std::io::Result<()> {
        write_f64_vec(&mut self.data, field.as_slice())?;

        let row = FrameMeta {
            frame_idx: self.frames,
            niter,
            t,
            rows: field.rows(),
            cols: field.cols(),
            padded: true,
            byte_offset: self.offset,
        };
        serde_json::to_writer(&mut self.meta, &row)?;
        self.meta.write_all(b"\n")?;

        self.frames += 1;
        self.offset += (field.as_slice().len() * std::mem::size_of::<f64>()) as u64;
        Ok(())
    }
}

impl SnapshotSink for FrameWriter {
    fn export(&mut self, field: &Grid, t: f64, niter: u64) {
        if let Err(e) = self.write_frame(field, t, niter) {
            warn!("Dropping snapshot at t={t:.3} (niter={niter}): {e}");
        }
    }
}

fn write_f64_vec<W: Write>(w: &mut W, v: &[f64]) -> std::io::Result<()> {
    for &x in v {
        w.write_all(&x.to_le_bytes())?;
    }
    Ok(())
}

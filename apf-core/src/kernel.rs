//! Stencil and reaction update.
//!
//! One logical task per interior cell: a 5-point Laplacian on the previous
//! excitation field, an explicit diffusion step, then the Aliev-Panfilov
//! reaction terms. Cells are independent, so work is split into bands of
//! whole rows; each band owns its rows of `e` and `r` and only reads `e_prev`.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::grid::Shape;
use crate::params::Params;

/// Advance every interior cell by one timestep.
///
/// `e_prev` must already carry mirrored ghosts. Ghost cells of `e` and `r`
/// are not written.
pub fn step(
    e: &mut [f64],
    r: &mut [f64],
    e_prev: &[f64],
    shape: Shape,
    params: &Params,
    block_rows: usize,
) {
    debug_assert_eq!(e.len(), shape.len());
    debug_assert_eq!(r.len(), shape.len());
    debug_assert_eq!(e_prev.len(), shape.len());

    let stride = shape.stride();
    let block_rows = block_rows.max(1);
    let band = stride * block_rows;

    let run_band = |(b, (e_band, r_band)): (usize, (&mut [f64], &mut [f64]))| {
        let first = b * block_rows;
        let rows = e_band.chunks_mut(stride).zip(r_band.chunks_mut(stride));
        for (k, (e_row, r_row)) in rows.enumerate() {
            let row = first + k;
            if row == 0 || row > shape.rows {
                continue;
            }
            update_row(row, e_row, r_row, e_prev, shape, params);
        }
    };

    #[cfg(feature = "parallel")]
    e.par_chunks_mut(band)
        .zip(r.par_chunks_mut(band))
        .enumerate()
        .for_each(run_band);

    #[cfg(not(feature = "parallel"))]
    e.chunks_mut(band)
        .zip(r.chunks_mut(band))
        .enumerate()
        .for_each(run_band);
}

#[inline]
fn update_row(
    row: usize,
    e_row: &mut [f64],
    r_row: &mut [f64],
    e_prev: &[f64],
    shape: Shape,
    params: &Params,
) {
    let stride = shape.stride();
    let base = row * stride;

    for col in 1..=shape.cols {
        let i = base + col;
        let centre = e_prev[i];
        let lap = e_prev[i + 1] + e_prev[i - 1] + e_prev[i - stride] + e_prev[i + stride]
            - 4.0 * centre;

        let diffused = centre + params.alpha * lap;
        let (e_next, r_next) = params.react(diffused, r_row[col]);

        e_row[col] = e_next;
        r_row[col] = r_next;
    }
}

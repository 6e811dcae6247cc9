//! Zero-flux boundary by mirroring.
//!
//! Each ghost cell takes the value of the interior cell two steps inward, so
//! the centred difference across the domain edge vanishes. Corners are never
//! read by the 5-point stencil and are left alone.

use crate::grid::Shape;

/// Fill the four ghost borders of a padded field in place.
pub fn mirror_ghosts(field: &mut [f64], shape: Shape) {
    debug_assert_eq!(field.len(), shape.len());
    let Shape { rows, cols } = shape;
    let stride = shape.stride();

    for row in 1..=rows {
        let base = row * stride;
        field[base] = field[base + 2];
        field[base + cols + 1] = field[base + cols - 1];
    }

    let (top, rest) = field.split_at_mut(stride);
    top[1..=cols].copy_from_slice(&rest[stride + 1..=stride + cols]);

    let bottom = (rows + 1) * stride;
    let src = (rows - 1) * stride;
    field.copy_within(src + 1..=src + cols, bottom + 1);
}

//! Padded row-major grids.
//!
//! A grid with `rows x cols` interior cells is stored as
//! `(rows + 2) x (cols + 2)` samples. Row 0, row `rows + 1`, column 0 and
//! column `cols + 1` are ghost cells; the interior is addressed `1..=rows`,
//! `1..=cols`. Cell `(row, col)` lives at `row * (cols + 2) + col`.

use serde::{Deserialize, Serialize};

use crate::device::{DeviceBuffer, DeviceGrid};
use crate::error::{ApfError, Result};

/// Interior dimensions of a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Shape { rows, cols }
    }

    pub fn square(n: usize) -> Self {
        Shape { rows: n, cols: n }
    }

    /// Samples per padded row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.cols + 2
    }

    /// Padded rows, ghosts included.
    #[inline]
    pub fn padded_rows(&self) -> usize {
        self.rows + 2
    }

    /// Total samples, ghosts included.
    #[inline]
    pub fn len(&self) -> usize {
        self.padded_rows() * self.stride()
    }

    /// Total samples, or an allocation error when the padded size does not
    /// fit in `usize`.
    pub fn checked_len(&self) -> Result<usize> {
        self.rows
            .checked_add(2)
            .zip(self.cols.checked_add(2))
            .and_then(|(r, c)| r.checked_mul(c))
            .ok_or(ApfError::Allocation {
                cells: self.rows.saturating_mul(self.cols),
            })
    }

    /// Interior cell count.
    #[inline]
    pub fn cells(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> usize {
        debug_assert!(
            row < self.padded_rows() && col < self.stride(),
            "cell ({row}, {col}) outside padded {}x{} grid",
            self.padded_rows(),
            self.stride()
        );
        row * self.stride() + col
    }
}

/// Allocate a zeroed sample vector, reporting exhaustion instead of aborting.
pub(crate) fn alloc_zeroed(len: usize) -> Result<Vec<f64>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| ApfError::Allocation { cells: len })?;
    data.resize(len, 0.0);
    Ok(data)
}

/// Host-resident padded field.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    shape: Shape,
    data: Vec<f64>,
}

impl Grid {
    pub fn zeros(shape: Shape) -> Result<Grid> {
        Ok(Grid {
            shape,
            data: alloc_zeroed(shape.checked_len()?)?,
        })
    }

    /// Wrap an existing padded sample vector.
    pub fn from_vec(shape: Shape, data: Vec<f64>) -> Result<Grid> {
        let len = shape.checked_len()?;
        if data.len() != len {
            return Err(ApfError::Transfer {
                expected: len,
                actual: data.len(),
            });
        }
        Ok(Grid { shape, data })
    }

    // ---- Accessors ----
    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[self.shape.offset(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let i = self.shape.offset(row, col);
        self.data[i] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Iterate interior rows, ghost columns stripped.
    pub fn interior_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        let stride = self.shape.stride();
        let cols = self.shape.cols;
        self.data
            .chunks_exact(stride)
            .skip(1)
            .take(self.shape.rows)
            .map(move |row| &row[1..=cols])
    }

    /// Copy onto an execution domain.
    pub fn materialize<B: DeviceBuffer<f64>>(&self) -> Result<DeviceGrid<B>> {
        DeviceGrid::upload(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_row_major_with_ghosts() {
        let shape = Shape::new(3, 4);
        assert_eq!(shape.stride(), 6);
        assert_eq!(shape.len(), 5 * 6);
        assert_eq!(shape.offset(2, 3), 2 * 6 + 3);

        let mut g = Grid::zeros(shape).unwrap();
        g.set(2, 3, 7.5);
        assert_eq!(g.as_slice()[15], 7.5);
        assert_eq!(g.get(2, 3), 7.5);
    }

    #[test]
    fn interior_rows_skip_ghosts() {
        let shape = Shape::new(2, 3);
        let mut g = Grid::zeros(shape).unwrap();
        g.as_mut_slice().fill(-1.0);
        for row in 1..=2 {
            for col in 1..=3 {
                g.set(row, col, (row * 10 + col) as f64);
            }
        }
        let rows: Vec<Vec<f64>> = g.interior_rows().map(|r| r.to_vec()).collect();
        assert_eq!(rows, vec![vec![11.0, 12.0, 13.0], vec![21.0, 22.0, 23.0]]);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_shape_is_an_allocation_error() {
        let shape = Shape::square((1usize << 32) - 2);
        assert!(matches!(shape.checked_len(), Err(ApfError::Allocation { .. })));
        assert!(matches!(Grid::zeros(shape), Err(ApfError::Allocation { .. })));
        assert!(matches!(
            Shape::new(usize::MAX, 2).checked_len(),
            Err(ApfError::Allocation { .. })
        ));
        assert_eq!(Shape::new(3, 4).checked_len(), Ok(30));
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        let err = Grid::from_vec(Shape::square(2), vec![0.0; 3]).unwrap_err();
        assert_eq!(err, ApfError::Transfer { expected: 16, actual: 3 });
    }
}

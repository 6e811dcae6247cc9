use crate::error::Result;
use crate::grid::{Grid, Shape};

/// Plane-wave initial condition: excitation is 1 on the right half of the
/// domain, recovery is 1 on the bottom half. Ghost cells start at 0.
pub fn step_pattern(shape: Shape) -> Result<(Grid, Grid)> {
    let mut e = Grid::zeros(shape)?;
    let mut r = Grid::zeros(shape)?;

    for row in 1..=shape.rows {
        for col in (shape.cols / 2 + 1)..=shape.cols {
            e.set(row, col, 1.0);
        }
    }
    for row in (shape.rows / 2 + 1)..=shape.rows {
        for col in 1..=shape.cols {
            r.set(row, col, 1.0);
        }
    }

    Ok((e, r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_are_set() {
        let (e, r) = step_pattern(Shape::square(4)).unwrap();
        for row in 1..=4 {
            for col in 1..=4 {
                assert_eq!(e.get(row, col), if col > 2 { 1.0 } else { 0.0 });
                assert_eq!(r.get(row, col), if row > 2 { 1.0 } else { 0.0 });
            }
        }
        for i in 0..6 {
            assert_eq!(e.get(0, i), 0.0);
            assert_eq!(e.get(5, i), 0.0);
            assert_eq!(r.get(i, 0), 0.0);
            assert_eq!(r.get(i, 5), 0.0);
        }
    }

    #[test]
    fn odd_widths_round_the_midline_down() {
        let (e, r) = step_pattern(Shape::new(3, 5)).unwrap();
        assert_eq!(e.get(1, 2), 0.0);
        assert_eq!(e.get(1, 3), 1.0);
        assert_eq!(r.get(1, 1), 0.0);
        assert_eq!(r.get(2, 1), 1.0);
    }
}

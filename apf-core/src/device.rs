//! Execution-domain buffers.
//!
//! The kernel never touches host grids directly. Fields are materialised into
//! a [`DeviceBuffer`] before the run and copied back for diagnostics and
//! snapshots. [`HostBuffer`] backs the rayon pool, where "device" memory is
//! ordinary heap memory; other backends only need to implement the trait.

use crate::error::{ApfError, Result};
use crate::grid::{Grid, Shape, alloc_zeroed};

/// A buffer resident on the execution domain the kernel runs on.
pub trait DeviceBuffer<T: Copy>: Sized + Send {
    /// Allocate `len` zeroed elements.
    fn allocate(len: usize) -> Result<Self>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy host data into the buffer.
    fn upload_from(&mut self, host: &[T]) -> Result<()>;

    /// Copy buffer contents back to the host.
    fn download_to(&self, host: &mut [T]) -> Result<()>;

    fn as_slice(&self) -> &[T];

    fn as_mut_slice(&mut self) -> &mut [T];
}

/// Heap-backed buffer for CPU execution.
#[derive(Debug, Clone)]
pub struct HostBuffer<T> {
    data: Vec<T>,
}

impl DeviceBuffer<f64> for HostBuffer<f64> {
    fn allocate(len: usize) -> Result<Self> {
        Ok(HostBuffer {
            data: alloc_zeroed(len)?,
        })
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn upload_from(&mut self, host: &[f64]) -> Result<()> {
        check_len(self.data.len(), host.len())?;
        self.data.copy_from_slice(host);
        Ok(())
    }

    fn download_to(&self, host: &mut [f64]) -> Result<()> {
        check_len(self.data.len(), host.len())?;
        host.copy_from_slice(&self.data);
        Ok(())
    }

    fn as_slice(&self) -> &[f64] {
        &self.data
    }

    fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(ApfError::Transfer { expected, actual });
    }
    Ok(())
}

/// A padded field living on the execution domain.
#[derive(Debug)]
pub struct DeviceGrid<B> {
    shape: Shape,
    buf: B,
}

impl<B: DeviceBuffer<f64>> DeviceGrid<B> {
    pub fn upload(host: &Grid) -> Result<Self> {
        let shape = host.shape();
        let mut buf = B::allocate(shape.len())?;
        buf.upload_from(host.as_slice())?;
        Ok(DeviceGrid { shape, buf })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Synchronise back into an existing host grid of the same shape.
    pub fn download_into(&self, host: &mut Grid) -> Result<()> {
        if host.shape() != self.shape {
            return Err(ApfError::Transfer {
                expected: self.shape.len(),
                actual: host.shape().len(),
            });
        }
        self.buf.download_to(host.as_mut_slice())
    }

    /// Synchronise back into a fresh host grid.
    pub fn download(&self) -> Result<Grid> {
        let mut host = Grid::zeros(self.shape)?;
        self.download_into(&mut host)?;
        Ok(host)
    }

    pub fn as_slice(&self) -> &[f64] {
        self.buf.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        self.buf.as_mut_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_device_grid() {
        let shape = Shape::square(3);
        let mut host = Grid::zeros(shape).unwrap();
        host.set(2, 2, 0.25);

        let mut dev: DeviceGrid<HostBuffer<f64>> = host.materialize().unwrap();
        dev.as_mut_slice()[shape.offset(1, 3)] = 4.0;

        let back = dev.download().unwrap();
        assert_eq!(back.get(2, 2), 0.25);
        assert_eq!(back.get(1, 3), 4.0);
        // upload is a copy, the source is untouched
        assert_eq!(host.get(1, 3), 0.0);
    }

    #[test]
    fn download_rejects_mismatched_shape() {
        let dev: DeviceGrid<HostBuffer<f64>> =
            Grid::zeros(Shape::square(3)).unwrap().materialize().unwrap();
        let mut other = Grid::zeros(Shape::square(4)).unwrap();
        assert!(matches!(
            dev.download_into(&mut other),
            Err(ApfError::Transfer { .. })
        ));
    }

    #[test]
    fn upload_rejects_wrong_length() {
        let mut buf = HostBuffer::<f64>::allocate(4).unwrap();
        assert_eq!(
            buf.upload_from(&[1.0, 2.0]),
            Err(ApfError::Transfer { expected: 4, actual: 2 })
        );
    }
}

//! Binary archive holding the grid, the sample times and the solution
//! matrix of a run.
//!
//! Layout, all numbers in native byte order:
//!
//! ```text
//! b"CDRA1"                      magic bytes
//! u8                            size of a float in bytes
//! u32 N, u32 M                  grid size, number of samples
//! [float; N]                    grid positions
//! [float; M]                    sample times
//! FF FF FF FF                   marker
//! [float; N] * M                solution, one column per sample
//! FF FF FF FF                   marker
//! ```

use std::io::{self, Read, Write};

use bytemuck::bytes_of;
use faer::{Mat, MatRef};

use crate::{driver::SimError, faer_add, method::Snapshots, Float};

pub const ARCHIVE_HEADER: &[u8] = b"CDRA1";
pub const ARCHIVE_EXTENSION: &str = "cdra";
const MARKER: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
// floats per read, the buffer grows with the data actually present
const READ_CHUNK: usize = 1 << 16;

pub(crate) fn write_header<W: Write>(
    output: &mut W,
    grid: &[Float],
    times: &[Float],
) -> Result<(), SimError> {
    // magic bytes
    output.write_all(ARCHIVE_HEADER)?;
    // float precision
    output.write_all(bytes_of(&(std::mem::size_of::<Float>() as u8)))?;
    // dimensions
    output.write_all(bytes_of(&(grid.len() as u32)))?;
    output.write_all(bytes_of(&(times.len() as u32)))?;
    // axes
    output.write_all(bytemuck::cast_slice(grid))?;
    output.write_all(bytemuck::cast_slice(times))?;

    output.write_all(&MARKER)?;
    Ok(())
}

pub(crate) fn write_column<W: Write>(
    output: &mut W,
    u: MatRef<'_, Float>,
) -> Result<(), SimError> {
    let column = faer_add::column_to_vec(u);
    output
        .write_all(bytemuck::cast_slice(&column))
        .map_err(SimError::from)
}

pub(crate) fn write_footer<W: Write>(output: &mut W) -> Result<(), SimError> {
    output.write_all(&MARKER)?;
    output.flush().map_err(SimError::from)
}

/// Grid, sample times and solution of a run, as stored on disk.
#[derive(Debug, Clone)]
pub struct Archive {
    pub grid: Vec<Float>,
    pub times: Vec<Float>,
    /// `grid.len()` rows, `times.len()` columns
    pub solution: Mat<Float>,
}

impl Archive {
    pub fn new(grid: Vec<Float>, snapshots: &Snapshots) -> Self {
        Self {
            grid,
            times: snapshots.times().to_vec(),
            solution: snapshots.states().to_owned(),
        }
    }

    pub fn into_snapshots(self) -> Result<Snapshots, SimError> {
        Snapshots::from_parts(self.times, self.solution)
    }

    pub fn write<W: Write>(&self, mut output: W) -> Result<(), SimError> {
        if self.solution.nrows() != self.grid.len() || self.solution.ncols() != self.times.len() {
            return Err(SimError::Archive(format!(
                "solution is {}x{} for a grid of {} and {} samples",
                self.solution.nrows(),
                self.solution.ncols(),
                self.grid.len(),
                self.times.len()
            )));
        }

        write_header(&mut output, &self.grid, &self.times)?;
        for j in 0..self.solution.ncols() {
            write_column(&mut output, self.solution.as_ref().col(j))?;
        }
        write_footer(&mut output)
    }

    pub fn read<R: Read>(mut input: R) -> Result<Self, SimError> {
        let mut magic = [0u8; 5];
        read_exact(&mut input, &mut magic)?;
        if magic != ARCHIVE_HEADER {
            return Err(SimError::Archive("bad magic bytes".to_string()));
        }

        let mut precision = [0u8; 1];
        read_exact(&mut input, &mut precision)?;
        if precision[0] as usize != std::mem::size_of::<Float>() {
            return Err(SimError::Archive(format!(
                "stored floats are {} bytes wide, expected {}",
                precision[0],
                std::mem::size_of::<Float>()
            )));
        }

        let rows = read_u32(&mut input)? as usize;
        let cols = read_u32(&mut input)? as usize;
        let grid = read_floats(&mut input, rows)?;
        let times = read_floats(&mut input, cols)?;
        read_marker(&mut input)?;

        let count = rows.checked_mul(cols).ok_or_else(|| {
            SimError::Archive(format!("a {rows}x{cols} solution does not fit in memory"))
        })?;
        let data = read_floats(&mut input, count)?;
        read_marker(&mut input)?;

        // column-major on disk
        let solution = Mat::from_fn(rows, cols, |i, j| data[j * rows + i]);
        Ok(Self {
            grid,
            times,
            solution,
        })
    }
}

// a file ending early is malformed, not an I/O failure
fn read_exact<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<(), SimError> {
    input.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            SimError::Archive("file ends before the announced data".to_string())
        }
        _ => SimError::Io(e),
    })
}

fn read_u32<R: Read>(input: &mut R) -> Result<u32, SimError> {
    let mut buf = [0u8; 4];
    read_exact(input, &mut buf)?;
    Ok(bytemuck::pod_read_unaligned(&buf))
}

fn read_floats<R: Read>(input: &mut R, count: usize) -> Result<Vec<Float>, SimError> {
    let width = std::mem::size_of::<Float>();
    if count.checked_mul(width).is_none() {
        return Err(SimError::Archive(format!(
            "{count} floats do not fit in memory"
        )));
    }

    let mut values = Vec::new();
    let mut buf = vec![0u8; READ_CHUNK.min(count) * width];
    while values.len() < count {
        let chunk = READ_CHUNK.min(count - values.len());
        let bytes = &mut buf[..chunk * width];
        read_exact(input, bytes)?;
        values.extend(
            bytes
                .chunks_exact(width)
                .map(bytemuck::pod_read_unaligned::<Float>),
        );
    }
    Ok(values)
}

fn read_marker<R: Read>(input: &mut R) -> Result<(), SimError> {
    let mut buf = [0u8; 4];
    read_exact(input, &mut buf)?;
    if buf != MARKER {
        return Err(SimError::Archive("missing section marker".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Archive {
        Archive {
            grid: vec![-1.0, -0.5, 0.0, 0.5],
            times: vec![0.0, 0.25, 0.5],
            solution: Mat::from_fn(4, 3, |i, j| (i * 10 + j) as Float + 0.125),
        }
    }

    #[test]
    fn header_layout() {
        let mut bytes = Vec::new();
        sample().write(&mut bytes).unwrap();
        assert_eq!(&bytes[..5], ARCHIVE_HEADER);
        assert_eq!(bytes[5], 8);
        // header + axes + markers + solution
        assert_eq!(bytes.len(), 5 + 1 + 8 + (4 + 3) * 8 + 4 + 12 * 8 + 4);
        assert_eq!(&bytes[bytes.len() - 4..], &MARKER);
    }

    #[test]
    fn solution_is_column_major() {
        let mut bytes = Vec::new();
        sample().write(&mut bytes).unwrap();
        let offset = 5 + 1 + 8 + (4 + 3) * 8 + 4;
        // second stored value is row 1 of column 0
        let value: Float = bytemuck::pod_read_unaligned(&bytes[offset + 8..offset + 16]);
        assert_eq!(value, 10.125);
    }

    #[test]
    fn rejects_foreign_files() {
        let err = Archive::read(&b"CSFF1\x08"[..]).unwrap_err();
        assert!(matches!(err, SimError::Archive(_)));
    }

    #[test]
    fn rejects_truncated_files() {
        let mut bytes = Vec::new();
        sample().write(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 10);
        assert!(matches!(Archive::read(&bytes[..]), Err(SimError::Archive(_))));
    }

    #[test]
    fn huge_announced_sizes_are_rejected() {
        let mut bytes = ARCHIVE_HEADER.to_vec();
        bytes.push(8);
        bytes.extend_from_slice(bytes_of(&u32::MAX));
        bytes.extend_from_slice(bytes_of(&u32::MAX));
        assert!(matches!(Archive::read(&bytes[..]), Err(SimError::Archive(_))));
    }

    #[test]
    fn data_spanning_several_reads_is_kept_in_order() {
        let rows = READ_CHUNK / 2 + 3;
        let archive = Archive {
            grid: (0..rows).map(|i| i as Float).collect(),
            times: vec![0.0, 1.0, 2.0],
            solution: Mat::from_fn(rows, 3, |i, j| (i + j * rows) as Float),
        };
        let mut bytes = Vec::new();
        archive.write(&mut bytes).unwrap();

        let reloaded = Archive::read(&bytes[..]).unwrap();
        assert_eq!(reloaded.grid, archive.grid);
        for j in 0..3 {
            for i in (0..rows).step_by(997) {
                assert_eq!(reloaded.solution.read(i, j), (i + j * rows) as Float);
            }
        }
    }

    #[test]
    fn rejects_inconsistent_shapes() {
        let mut archive = sample();
        archive.times.pop();
        assert!(matches!(
            archive.write(Vec::new()),
            Err(SimError::Archive(_))
        ));
    }
}

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("blob length {len} is not a multiple of element width {width}")]
    Misaligned { len: usize, width: usize },
    #[error("blob length {len} does not match {rows}x{cols} elements of width {width}")]
    ShapeMismatch { len: usize, rows: usize, cols: usize, width: usize },
}

mod private {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
}

/// Element kinds that pass through the blob codec: fixed-width numeric
/// values with a big-endian byte layout.
pub trait Element: Copy + private::Sealed {
    const WIDTH: usize;
    fn write_be(self, buf: &mut [u8]);
    fn read_be(buf: &[u8]) -> Self;
}

impl Element for i32 {
    const WIDTH: usize = 4;

    fn write_be(self, buf: &mut [u8]) {
        BigEndian::write_i32(buf, self);
    }

    fn read_be(buf: &[u8]) -> Self {
        BigEndian::read_i32(buf)
    }
}

impl Element for f32 {
    const WIDTH: usize = 4;

    fn write_be(self, buf: &mut [u8]) {
        BigEndian::write_f32(buf, self);
    }

    fn read_be(buf: &[u8]) -> Self {
        BigEndian::read_f32(buf)
    }
}

/// A row-major 2d numeric matrix.
///
/// The serialized form is exactly `rows * cols * WIDTH` bytes, row-major,
/// big-endian, with no shape header: the caller must carry `rows`/`cols`
/// out-of-band and pass them back to [`Matrix::decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Element> Matrix<T> {
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, CodecError> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(CodecError::ShapeMismatch {
                len: data.len() * T::WIDTH,
                rows,
                cols,
                width: T::WIDTH,
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Get one row; panics when `n` is out of range.
    pub fn row(&self, n: usize) -> &[T] {
        &self.data[n * self.cols..(n + 1) * self.cols]
    }

    /// Serialize into big-endian bytes. An empty matrix yields an empty vec.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.data.len() * T::WIDTH];
        for (value, chunk) in self.data.iter().zip(buf.chunks_exact_mut(T::WIDTH)) {
            value.write_be(chunk);
        }
        buf
    }

    /// Rebuild a matrix from bytes with the shape supplied by the caller.
    pub fn decode(bytes: &[u8], rows: usize, cols: usize) -> Result<Self, CodecError> {
        if bytes.len() % T::WIDTH != 0 {
            return Err(CodecError::Misaligned { len: bytes.len(), width: T::WIDTH });
        }
        // rows 和 cols 来自外部存储，乘法溢出视为形状不匹配
        let expected = rows.checked_mul(cols).and_then(|n| n.checked_mul(T::WIDTH));
        if expected != Some(bytes.len()) {
            return Err(CodecError::ShapeMismatch { len: bytes.len(), rows, cols, width: T::WIDTH });
        }
        let data = bytes.chunks_exact(T::WIDTH).map(T::read_be).collect();
        Ok(Self { rows, cols, data })
    }
}

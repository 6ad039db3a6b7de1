//! Fixed-width sample types for raw image files.

/// A pixel type with a fixed little-endian byte representation.
pub trait Sample: Copy + Default + PartialEq + Send + 'static {
    /// Encoded width in bytes.
    const SIZE: usize;

    /// Decode from exactly `SIZE` little-endian bytes.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than `SIZE`.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode into exactly `SIZE` bytes.
    ///
    /// # Panics
    /// Panics if `out` is shorter than `SIZE`.
    fn write_le(self, out: &mut [u8]);

    /// Lossy widening used for checksums and reports.
    fn to_f64(self) -> f64;

    /// Lossy conversion used to generate values; saturates for integers.
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_sample {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Sample for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_sample!(u8, u16, u32, i16, i32, i64, f32, f64);

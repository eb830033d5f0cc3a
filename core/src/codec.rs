//! # Big-Endian Codec
//!
//! SCSI is big-endian on the wire. These helpers read and write fixed-width
//! unsigned integers at byte offsets of a CDB, a reply or a parameter list.
//! Buffers are fixed-size arrays sized by the command definitions, so an out
//! of bounds window is a programming error and panics.

/// Fixed-width unsigned integer with a big-endian wire form
pub trait BigEndian: Sized + Copy {
    /// Encoded width in bytes
    const WIDTH: usize;

    /// Wire representation
    type Bytes: AsRef<[u8]>;

    /// Encode to big-endian bytes
    fn to_big_endian(self) -> Self::Bytes;

    /// Decode from big-endian bytes
    fn from_big_endian(bytes: Self::Bytes) -> Self;

    /// Decode from the first `WIDTH` bytes of `src`
    fn read_be(src: &[u8]) -> Self;
}

macro_rules! impl_big_endian {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BigEndian for $ty {
                const WIDTH: usize = core::mem::size_of::<$ty>();

                type Bytes = [u8; core::mem::size_of::<$ty>()];

                #[inline]
                fn to_big_endian(self) -> Self::Bytes {
                    self.to_be_bytes()
                }

                #[inline]
                fn from_big_endian(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                #[inline]
                fn read_be(src: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&src[..Self::WIDTH]);
                    <$ty>::from_be_bytes(raw)
                }
            }
        )*
    };
}

impl_big_endian!(u16, u32, u64);

/// Write `value` big-endian at `buf[offset..]`
#[inline]
pub fn put<T: BigEndian>(buf: &mut [u8], offset: usize, value: T) {
    buf[offset..offset + T::WIDTH].copy_from_slice(value.to_big_endian().as_ref());
}

/// Read a big-endian value at `buf[offset..]`
#[inline]
pub fn get<T: BigEndian>(buf: &[u8], offset: usize) -> T {
    T::read_be(&buf[offset..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let mut buf = [0u8; 14];
        put(&mut buf, 0, 0x0102u16);
        put(&mut buf, 2, 0x0304_0506u32);
        put(&mut buf, 6, 0x0708_090A_0B0C_0D0Eu64);
        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);

        assert_eq!(get::<u16>(&buf, 0), 0x0102);
        assert_eq!(get::<u32>(&buf, 2), 0x0304_0506);
        assert_eq!(get::<u64>(&buf, 6), 0x0708_090A_0B0C_0D0E);
    }

    #[test]
    fn test_round_trip_edges() {
        for v in [0u16, 1, 0x00FF, 0xFF00, u16::MAX] {
            assert_eq!(u16::from_big_endian(v.to_big_endian()), v);
        }
        for v in [0u32, 1, 0xDEAD_BEEF, u32::MAX] {
            assert_eq!(u32::from_big_endian(v.to_big_endian()), v);
        }
        for v in [0u64, 1, 0x0123_4567_89AB_CDEF, u64::MAX] {
            assert_eq!(u64::from_big_endian(v.to_big_endian()), v);
        }
    }

    #[test]
    fn test_put_leaves_neighbours() {
        let mut buf = [0xEEu8; 6];
        put(&mut buf, 1, 0u32);
        assert_eq!(buf, [0xEE, 0, 0, 0, 0, 0xEE]);
    }

    #[test]
    #[should_panic]
    fn test_short_window_panics() {
        let buf = [0u8; 3];
        let _ = get::<u32>(&buf, 0);
    }
}

use crate::common::rid::Rid;

/// Fixed-width on-page encoding for keys and values stored inside index
/// pages. Integer encodings are little-endian.
pub trait FixedCodec: Clone + Send + Sync + 'static {
    /// Number of bytes this type occupies on a page.
    const ENCODED_LEN: usize;

    /// Writes the encoded form into `buf[..Self::ENCODED_LEN]`.
    fn encode_to(&self, buf: &mut [u8]);

    /// Reads a value back from `buf[..Self::ENCODED_LEN]`.
    fn decode_from(buf: &[u8]) -> Self;
}

macro_rules! impl_fixed_codec_for_int {
    ($($t:ty),*) => {
        $(
            impl FixedCodec for $t {
                const ENCODED_LEN: usize = std::mem::size_of::<$t>();

                fn encode_to(&self, buf: &mut [u8]) {
                    buf[..Self::ENCODED_LEN].copy_from_slice(&self.to_le_bytes());
                }

                fn decode_from(buf: &[u8]) -> Self {
                    <$t>::from_le_bytes(buf[..Self::ENCODED_LEN].try_into().unwrap())
                }
            }
        )*
    };
}

impl_fixed_codec_for_int!(i32, u32, i64, u64);

impl FixedCodec for Rid {
    const ENCODED_LEN: usize = Rid::ENCODED_LEN;

    fn encode_to(&self, buf: &mut [u8]) {
        buf[..Self::ENCODED_LEN].copy_from_slice(&self.to_bytes_le());
    }

    fn decode_from(buf: &[u8]) -> Self {
        Rid::deserialize(buf)
    }
}

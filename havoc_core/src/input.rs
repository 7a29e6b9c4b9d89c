use crate::buffer::MutationBuffer;
use crate::havoc::MutationMode;

/// A value that can be mutated by reinterpreting it as a byte buffer.
///
/// Scalars expose their raw little-endian bytes and are mutated in
/// [`MutationMode::FixedSize`]; strings and byte sequences are copied into a
/// sentinel-extended buffer and mutated in [`MutationMode::VariableLength`].
pub trait Input: Clone + Default + Send + Sync + std::fmt::Debug + 'static {
    /// How the driver may treat this type's buffer.
    const MODE: MutationMode;

    fn to_buffer(&self) -> MutationBuffer;

    /// Rebuilds a value from a (possibly mutated) buffer.
    fn from_buffer(buffer: MutationBuffer) -> Self;
}

/// Copies up to `N` leading bytes; a short buffer leaves the rest zeroed.
fn raw_bytes<const N: usize>(buffer: &MutationBuffer) -> [u8; N] {
    let mut raw = [0u8; N];
    let bytes = buffer.as_slice();
    let n = bytes.len().min(N);
    raw[..n].copy_from_slice(&bytes[..n]);
    raw
}

impl Input for i32 {
    const MODE: MutationMode = MutationMode::FixedSize;

    fn to_buffer(&self) -> MutationBuffer {
        MutationBuffer::new(self.to_le_bytes().to_vec())
    }

    fn from_buffer(buffer: MutationBuffer) -> Self {
        i32::from_le_bytes(raw_bytes(&buffer))
    }
}

impl Input for f64 {
    const MODE: MutationMode = MutationMode::FixedSize;

    fn to_buffer(&self) -> MutationBuffer {
        MutationBuffer::new(self.to_le_bytes().to_vec())
    }

    fn from_buffer(buffer: MutationBuffer) -> Self {
        f64::from_le_bytes(raw_bytes(&buffer))
    }
}

impl Input for Vec<u8> {
    const MODE: MutationMode = MutationMode::VariableLength;

    fn to_buffer(&self) -> MutationBuffer {
        MutationBuffer::with_sentinel(self)
    }

    fn from_buffer(buffer: MutationBuffer) -> Self {
        buffer.into_vec()
    }
}

/// The UTF-8 bytes of a string are mutated; each resulting byte decodes to the
/// code point of the same value (Latin-1), so the string has exactly as many
/// chars as the mutated buffer has bytes.
impl Input for String {
    const MODE: MutationMode = MutationMode::VariableLength;

    fn to_buffer(&self) -> MutationBuffer {
        MutationBuffer::with_sentinel(self.as_bytes())
    }

    fn from_buffer(buffer: MutationBuffer) -> Self {
        buffer.as_slice().iter().map(|&b| b as char).collect()
    }
}

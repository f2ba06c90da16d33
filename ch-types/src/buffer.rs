/// A contiguous, growable byte buffer used as the encode target for every
/// codec in the workspace.
///
/// Doubles its backing allocation on demand (preserving existing bytes) the
/// same way `Vec<u8>` would; this type exists as a distinct name because
/// codecs also need in-place patching (see [`Buffer::write_at`]) that
/// `Vec<u8>::extend` alone does not make convenient to reason about.
#[derive(Debug, Default, Clone)]
pub struct Buffer {
    bytes: Vec<u8>,
}

impl Buffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Creates an empty buffer with room for at least `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Current write offset; equal to the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Appends `data` to the end of the buffer.
    pub fn write(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Appends a single byte.
    pub fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    /// Reserves one byte, returning its index, to be patched later via
    /// [`Buffer::write_at`]. Used by the string encoder's speculative
    /// one-byte LEB128 length reservation (§4.1).
    pub fn reserve_byte(&mut self) -> usize {
        let at = self.bytes.len();
        self.bytes.push(0);
        at
    }

    /// Overwrites the byte at `at` (previously returned by
    /// [`Buffer::reserve_byte`]) in place.
    pub fn write_at(&mut self, at: usize, byte: u8) {
        self.bytes[at] = byte;
    }

    /// Shifts the bytes from `from` to the buffer's current end forward by
    /// `by` positions, growing the buffer by `by` bytes. Used when a
    /// speculatively-reserved one-byte length turns out to need more bytes
    /// (§4.1's "shifts the body forward" path).
    pub fn shift_forward(&mut self, from: usize, by: usize) {
        if by == 0 {
            return;
        }
        let old_len = self.bytes.len();
        self.bytes.resize(old_len + by, 0);
        self.bytes.copy_within(from..old_len, from + by);
    }

    /// Consumes the buffer, returning the written bytes.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    /// Borrows the bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Buffer> for Vec<u8> {
    fn from(buf: Buffer) -> Self {
        buf.finish()
    }
}

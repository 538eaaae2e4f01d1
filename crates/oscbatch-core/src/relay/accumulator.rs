/// Fixed-capacity byte buffer collecting argument blocks until a blob's
/// worth has arrived.
///
/// The capacity is an exact multiple of the argument block length, and the
/// relay loop flushes whenever the buffer fills, so `append` can never
/// overrun. `reset` only rewinds the cursor; stale bytes past the cursor
/// are always overwritten before the next full read.
pub struct Accumulator {
    buf: Vec<u8>,
    cursor: usize,
}

impl Accumulator {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity],
            cursor: 0,
        }
    }

    pub fn append(&mut self, block: &[u8]) {
        let end = self.cursor + block.len();
        debug_assert!(end <= self.buf.len());
        self.buf[self.cursor..end].copy_from_slice(block);
        self.cursor = end;
    }

    pub fn is_full(&self) -> bool {
        self.cursor == self.buf.len()
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.cursor]
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

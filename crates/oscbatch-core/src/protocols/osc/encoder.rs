use super::layout::PacketLayout;

/// Reusable outbound packet buffer for one OSC blob message.
///
/// The address and type-tag blocks are written once at construction and
/// never touched again; `encode` rewrites only the blob-size field and the
/// blob data. The buffer is allocated once and never grows.
pub struct BlobPacket {
    buf: Vec<u8>,
    blob_size_offset: usize,
    blob_data_offset: usize,
    blob_len: usize,
}

impl BlobPacket {
    pub fn new(layout: &PacketLayout) -> Self {
        let mut buf = vec![0u8; layout.out_packet_len];
        buf[..layout.out_prefix.len()].copy_from_slice(&layout.out_prefix);
        Self {
            buf,
            blob_size_offset: layout.blob_size_offset,
            blob_data_offset: layout.blob_data_offset,
            blob_len: layout.blob_len,
        }
    }

    /// Write the accumulated argument bytes into the packet and return the
    /// bytes to transmit. `args` must be exactly `blob_len` bytes.
    pub fn encode(&mut self, args: &[u8]) -> &[u8] {
        debug_assert_eq!(args.len(), self.blob_len);
        self.buf[self.blob_size_offset..self.blob_data_offset]
            .copy_from_slice(&(self.blob_len as i32).to_be_bytes());
        self.buf[self.blob_data_offset..self.blob_data_offset + self.blob_len]
            .copy_from_slice(args);
        &self.buf
    }
}

use super::error::OscError;

pub const ALIGN: usize = 4;
pub const FLOAT_SIZE: usize = 4;
pub const BLOB_SIZE_FIELD_LEN: usize = 4;
pub const OUT_TYPE_TAGS: &str = ",b";

/// Round `n` up to the next multiple of 4.
pub fn pad4(n: usize) -> usize {
    (n + ALIGN - 1) & !(ALIGN - 1)
}

/// Fixed shape of the relayed message stream, resolved before startup.
#[derive(Debug, Clone)]
pub struct MessageShape {
    pub in_address: String,
    pub out_address: String,
    pub floats_per_msg: usize,
    pub msgs_per_blob: usize,
    pub max_packet_bytes: usize,
}

impl MessageShape {
    /// Inbound type-tag string, one `f` per float (e.g. `,fff`).
    pub fn in_type_tags(&self) -> String {
        let mut tags = String::with_capacity(1 + self.floats_per_msg);
        tags.push(',');
        for _ in 0..self.floats_per_msg {
            tags.push('f');
        }
        tags
    }
}

/// Byte offsets and prebuilt blocks derived once from a `MessageShape`.
///
/// The inbound blocks double as the strict-mode comparison prefix; the
/// outbound prefix holds the address and type-tag blocks that never change
/// for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct PacketLayout {
    pub in_addr_block: Vec<u8>,
    pub in_type_block: Vec<u8>,
    pub in_args_offset: usize,
    pub in_args_len: usize,
    pub in_min_datagram: usize,
    pub out_prefix: Vec<u8>,
    pub blob_size_offset: usize,
    pub blob_data_offset: usize,
    pub blob_len: usize,
    pub out_packet_len: usize,
}

impl PacketLayout {
    pub fn from_shape(shape: &MessageShape) -> Result<Self, OscError> {
        let in_addr_block = padded_block(&shape.in_address);
        let in_type_block = padded_block(&shape.in_type_tags());
        let in_args_offset = in_addr_block.len() + in_type_block.len();
        let in_args_len = FLOAT_SIZE * shape.floats_per_msg;
        let in_min_datagram = in_args_offset + in_args_len;

        let out_addr_block = padded_block(&shape.out_address);
        let out_type_block = padded_block(OUT_TYPE_TAGS);
        let blob_size_offset = out_addr_block.len() + out_type_block.len();
        let blob_data_offset = blob_size_offset + BLOB_SIZE_FIELD_LEN;
        // 4-byte float arguments keep the blob a multiple of 4, so the blob
        // itself needs no trailing padding.
        let blob_len = in_args_len * shape.msgs_per_blob;
        let out_packet_len = blob_data_offset + blob_len;
        if out_packet_len > shape.max_packet_bytes {
            return Err(OscError::PacketTooLarge {
                len: out_packet_len,
                max: shape.max_packet_bytes,
            });
        }

        let mut out_prefix = out_addr_block;
        out_prefix.extend_from_slice(&out_type_block);

        Ok(Self {
            in_addr_block,
            in_type_block,
            in_args_offset,
            in_args_len,
            in_min_datagram,
            out_prefix,
            blob_size_offset,
            blob_data_offset,
            blob_len,
            out_packet_len,
        })
    }
}

/// String bytes plus a NUL terminator, zero-padded to a 4-byte boundary.
fn padded_block(value: &str) -> Vec<u8> {
    let mut block = vec![0u8; pad4(value.len() + 1)];
    block[..value.len()].copy_from_slice(value.as_bytes());
    block
}

use super::error::OscError;
use super::layout::PacketLayout;
use super::reader::OscReader;

/// Extract the float argument bytes of one inbound OSC message.
///
/// The datagram must be at least `in_min_datagram` bytes; anything shorter
/// is an error the relay loop drops silently. With `strict` set, the
/// address and type-tag blocks are compared byte-for-byte against the
/// layout's prebuilt blocks and a mismatch returns `Ok(None)`. Without it
/// the sender is trusted and the argument bytes are read at the fixed
/// offset with no per-packet verification.
///
/// The returned slice borrows from `datagram` and is never byte-swapped.
pub fn decode_args<'a>(
    datagram: &'a [u8],
    layout: &PacketLayout,
    strict: bool,
) -> Result<Option<&'a [u8]>, OscError> {
    let reader = OscReader::new(datagram);
    reader.require_len(layout.in_min_datagram)?;

    if strict {
        let addr = reader.read_slice(0..layout.in_addr_block.len())?;
        if addr != layout.in_addr_block.as_slice() {
            return Ok(None);
        }
        let tags = reader.read_slice(layout.in_addr_block.len()..layout.in_args_offset)?;
        if tags != layout.in_type_block.as_slice() {
            return Ok(None);
        }
    }

    let args = reader.read_slice(layout.in_args_offset..layout.in_args_offset + layout.in_args_len)?;
    Ok(Some(args))
}

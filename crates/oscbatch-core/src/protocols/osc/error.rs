use thiserror::Error;

#[derive(Debug, Error)]
pub enum OscError {
    #[error("datagram too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("outbound packet of {len} bytes exceeds the {max} byte limit")]
    PacketTooLarge { len: usize, max: usize },
}

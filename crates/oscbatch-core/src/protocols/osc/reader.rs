use super::error::OscError;

pub struct OscReader<'a> {
    datagram: &'a [u8],
}

impl<'a> OscReader<'a> {
    pub fn new(datagram: &'a [u8]) -> Self {
        Self { datagram }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), OscError> {
        if self.datagram.len() < needed {
            return Err(OscError::TooShort {
                needed,
                actual: self.datagram.len(),
            });
        }
        Ok(())
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], OscError> {
        self.datagram
            .get(range.clone())
            .ok_or(OscError::TooShort {
                needed: range.end,
                actual: self.datagram.len(),
            })
    }
}

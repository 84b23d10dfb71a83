use super::error::UsbPcapError;

pub struct UsbPcapReader<'a> {
    frame: &'a [u8],
}

impl<'a> UsbPcapReader<'a> {
    pub fn new(frame: &'a [u8]) -> Self {
        Self { frame }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), UsbPcapError> {
        if self.frame.len() < needed {
            return Err(UsbPcapError::TooShort {
                needed,
                actual: self.frame.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, UsbPcapError> {
        self.frame
            .get(offset)
            .copied()
            .ok_or(UsbPcapError::TooShort {
                needed: offset + 1,
                actual: self.frame.len(),
            })
    }

    pub fn read_u16_le(&self, range: std::ops::Range<usize>) -> Result<u16, UsbPcapError> {
        let bytes = self.read_slice(range)?;
        if bytes.len() != 2 {
            return Err(UsbPcapError::TooShort {
                needed: 2,
                actual: bytes.len(),
            });
        }
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_le(&self, range: std::ops::Range<usize>) -> Result<u32, UsbPcapError> {
        let bytes = self.read_slice(range)?;
        if bytes.len() != 4 {
            return Err(UsbPcapError::TooShort {
                needed: 4,
                actual: bytes.len(),
            });
        }
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64_le(&self, range: std::ops::Range<usize>) -> Result<u64, UsbPcapError> {
        let bytes = self.read_slice(range)?;
        if bytes.len() != 8 {
            return Err(UsbPcapError::TooShort {
                needed: 8,
                actual: bytes.len(),
            });
        }
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], UsbPcapError> {
        self.frame
            .get(range.clone())
            .ok_or(UsbPcapError::TooShort {
                needed: range.end,
                actual: self.frame.len(),
            })
    }
}

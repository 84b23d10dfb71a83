use thiserror::Error;

/// Errors returned by USBPcap header reading and parsing.
#[derive(Debug, Error)]
pub enum UsbPcapError {
    #[error("record too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("invalid header length: {value}")]
    InvalidHeaderLen { value: u16 },
}

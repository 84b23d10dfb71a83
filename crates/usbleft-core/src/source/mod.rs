mod pcap;

pub use pcap::PcapFileSource;

use thiserror::Error;

/// One decoded USB event, read-only to the extractor.
///
/// `captured_payload` and `fragment` are payload bytes already isolated by
/// the dissection layer; when neither is present the extractor falls back to
/// slicing `frame` at the declared header length.
#[derive(Debug, Clone)]
pub struct UsbEvent {
    /// 1-based capture record index, monotonically increasing.
    pub frame_number: u64,
    /// Capture timestamp in seconds since epoch, when the format reports one.
    pub ts: Option<f64>,
    /// Sending endpoint label (`bus.device.endpoint` or `host`).
    pub src: String,
    /// Receiving endpoint label.
    pub dst: String,
    /// Protocol-declared payload length, 0 if absent.
    pub data_length: u32,
    /// Payload offset within `frame`, when the capture header reports it.
    pub header_len: Option<u32>,
    /// Total captured frame length in bytes.
    pub frame_len: u32,
    /// Full captured frame bytes.
    pub frame: Vec<u8>,
    /// Payload isolated by the dissector's primary payload field.
    pub captured_payload: Option<Vec<u8>>,
    /// Payload isolated via a secondary fragment field.
    pub fragment: Option<Vec<u8>>,
}

/// Ordered stream of decoded USB events plus an end-of-capture signal
/// (`Ok(None)`).
pub trait EventSource {
    fn next_event(&mut self) -> Result<Option<UsbEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PCAP parse error: {0}")]
    Pcap(String),
}

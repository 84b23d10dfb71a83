//! usbleft core library for extracting leftover capture data from USB captures.
//!
//! This crate implements the extraction pipeline used by the CLI: a packet
//! source dissects USBPcap records into [`UsbEvent`]s, the extraction layer
//! resolves payload bytes through a prioritized set of fallback strategies,
//! and the session layer filters, renders, and writes the report. Resolution
//! and rendering are byte-oriented and side-effect free; all I/O is isolated
//! in `source` and the session sink. Wire-format conventions live in the
//! `protocols` readers so the rest of the code never indexes raw bytes.
//!
//! Invariants:
//! - Payload resolution follows a fixed priority: dissector payload field,
//!   then fragment field, then a bounds-checked direct frame slice.
//! - Resolution and rendering are pure; running them twice over the same
//!   event and options yields byte-identical output.
//! - The session flushes and closes its sink exactly once per run.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use usbleft_core::{ExtractOptions, extract_pcap_file};
//!
//! let summary = extract_pcap_file(
//!     Path::new("capture.pcapng"),
//!     Path::new("gcode.txt"),
//!     ExtractOptions::default(),
//! )?;
//! println!("{} packets with data", summary.packets_with_payload);
//! # Ok::<(), usbleft_core::ExtractError>(())
//! ```

use serde::{Deserialize, Serialize};

mod extract;
mod protocols;
mod session;
mod source;

pub use extract::render::{render_hex, render_text};
pub use extract::{PacketInspection, PayloadRecord, Provenance, inspect_event, resolve_payload};
pub use protocols::usbpcap::error::UsbPcapError;
pub use protocols::usbpcap::{TransferType, UsbPcapHeader, parse_usbpcap};
pub use session::{
    ExtractError, ExtractSession, FileSink, SinkOpen, WriterSink, extract_pcap_file,
    extract_source,
};
pub use source::{EventSource, PcapFileSource, SourceError, UsbEvent};

/// Default minimum payload length; single-byte payloads are near-universally
/// status/interrupt noise rather than application data.
pub const DEFAULT_MIN_LENGTH: usize = 2;
/// Default payload offset for frames whose capture header does not report
/// one: the fixed 27-byte USBPcap record header.
pub const DEFAULT_HEADER_LEN: u32 = 27;

/// Run configuration threaded into the extractor at construction time.
///
/// # Examples
/// ```
/// use usbleft_core::ExtractOptions;
///
/// let options = ExtractOptions::default();
/// assert!(!options.raw_mode);
/// assert_eq!(options.min_length, 2);
/// assert_eq!(options.fallback_header_len, 27);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Render payloads as hex instead of decoded text.
    pub raw_mode: bool,
    /// Reject payloads shorter than this many bytes.
    pub min_length: usize,
    /// In text mode, show `\r` and `\xHH` escapes instead of dropping
    /// non-printable bytes.
    pub show_escapes: bool,
    /// Payload offset used by the direct-slice fallback when an event does
    /// not carry an explicit header length.
    pub fallback_header_len: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            raw_mode: false,
            min_length: DEFAULT_MIN_LENGTH,
            show_escapes: false,
            fallback_header_len: DEFAULT_HEADER_LEN,
        }
    }
}

/// Counters accumulated over one extraction run.
///
/// # Examples
/// ```
/// use usbleft_core::ExtractionSummary;
///
/// let summary = ExtractionSummary::default();
/// assert_eq!(summary.total_packets, 0);
/// assert_eq!(summary.packets_with_payload, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Total USB packets seen during the run.
    pub total_packets: u64,
    /// Packets that passed resolution and filtering and were written out.
    pub packets_with_payload: u64,
}

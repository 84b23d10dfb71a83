//! Run orchestration: `Idle -> Running -> Finalized`.
//!
//! The session consumes events one at a time, lazily opens its sink on the
//! first event, writes a packet block per accepted payload, and writes the
//! trailing summary exactly once on `finish`. `reset` returns a finalized
//! session to idle so the same instance can re-run over another capture.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::extract::{render_accepted, resolve_payload};
use crate::source::{EventSource, SourceError, UsbEvent};
use crate::{ExtractOptions, ExtractionSummary};

const RULE: &str =
    "================================================================================";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to open output {target}: {source}")]
    SinkOpen { target: String, source: io::Error },
    #[error("failed to write output after {processed} packets: {source}")]
    SinkWrite { processed: u64, source: io::Error },
    #[error("run already finalized; reset the session before pushing more events")]
    Finalized,
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Output destination for a run. Opened lazily by the session on the first
/// event, so a fresh run after `reset` gets a fresh writer.
pub trait SinkOpen {
    type Writer: Write;

    fn open_sink(&mut self) -> io::Result<Self::Writer>;

    /// Human-readable target for error messages.
    fn label(&self) -> String;
}

/// File-backed sink; creates (or truncates) the file at open time.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SinkOpen for FileSink {
    type Writer = BufWriter<File>;

    fn open_sink(&mut self) -> io::Result<Self::Writer> {
        Ok(BufWriter::new(File::create(&self.path)?))
    }

    fn label(&self) -> String {
        self.path.display().to_string()
    }
}

/// One-shot sink around an existing writer (stdout, an in-memory buffer).
/// The writer is handed out on first open; a reset run cannot re-open it.
pub struct WriterSink<W: Write> {
    writer: Option<W>,
    label: String,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, label: impl Into<String>) -> Self {
        Self {
            writer: Some(writer),
            label: label.into(),
        }
    }
}

impl<W: Write> SinkOpen for WriterSink<W> {
    type Writer = W;

    fn open_sink(&mut self) -> io::Result<Self::Writer> {
        self.writer
            .take()
            .ok_or_else(|| io::Error::other("writer already consumed by a previous run"))
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

enum RunState<W> {
    Idle,
    Running(W),
    Finalized,
}

/// Extraction run over a sequence of [`UsbEvent`]s.
pub struct ExtractSession<S: SinkOpen> {
    sink: S,
    options: ExtractOptions,
    state: RunState<S::Writer>,
    summary: ExtractionSummary,
}

impl<S: SinkOpen> ExtractSession<S> {
    pub fn new(sink: S, options: ExtractOptions) -> Self {
        Self {
            sink,
            options,
            state: RunState::Idle,
            summary: ExtractionSummary::default(),
        }
    }

    /// Consume one event. Returns whether a packet block was written.
    ///
    /// The first event of a run opens the sink and writes the report header;
    /// an open failure aborts the run before any event is counted.
    pub fn push(&mut self, event: &UsbEvent) -> Result<bool, ExtractError> {
        self.ensure_running()?;
        self.summary.total_packets += 1;

        let Some(record) = resolve_payload(event, self.options.fallback_header_len) else {
            return Ok(false);
        };
        let Some(body) = render_accepted(&record, &self.options) else {
            return Ok(false);
        };

        let processed = self.summary.total_packets;
        if let RunState::Running(writer) = &mut self.state {
            write_packet_block(writer, event, record.bytes.len(), &body)
                .map_err(|source| ExtractError::SinkWrite { processed, source })?;
        }
        self.summary.packets_with_payload += 1;
        Ok(true)
    }

    /// Write the trailing summary, flush, and close the sink.
    ///
    /// Finishing an idle session still produces a complete report (header
    /// plus a zero summary); finishing twice is a no-op returning the same
    /// counters.
    pub fn finish(&mut self) -> Result<ExtractionSummary, ExtractError> {
        let processed = self.summary.total_packets;
        let write_err = |source| ExtractError::SinkWrite { processed, source };

        match std::mem::replace(&mut self.state, RunState::Finalized) {
            RunState::Finalized => Ok(self.summary),
            RunState::Idle => {
                let mut writer = self.sink.open_sink().map_err(|source| {
                    ExtractError::SinkOpen {
                        target: self.sink.label(),
                        source,
                    }
                })?;
                write_report_header(&mut writer, self.options.raw_mode).map_err(write_err)?;
                write_summary(&mut writer, &self.summary).map_err(write_err)?;
                writer.flush().map_err(write_err)?;
                Ok(self.summary)
            }
            RunState::Running(mut writer) => {
                write_summary(&mut writer, &self.summary).map_err(write_err)?;
                writer.flush().map_err(write_err)?;
                Ok(self.summary)
            }
        }
    }

    /// Return to idle for a subsequent run: counters cleared, sink re-opened
    /// on the next event. A running sink is dropped without a summary.
    pub fn reset(&mut self) {
        self.state = RunState::Idle;
        self.summary = ExtractionSummary::default();
    }

    pub fn summary(&self) -> ExtractionSummary {
        self.summary
    }

    fn ensure_running(&mut self) -> Result<(), ExtractError> {
        match self.state {
            RunState::Running(_) => Ok(()),
            RunState::Finalized => Err(ExtractError::Finalized),
            RunState::Idle => {
                let mut writer = self.sink.open_sink().map_err(|source| {
                    ExtractError::SinkOpen {
                        target: self.sink.label(),
                        source,
                    }
                })?;
                write_report_header(&mut writer, self.options.raw_mode)
                    .map_err(|source| ExtractError::SinkWrite {
                        processed: 0,
                        source,
                    })?;
                self.state = RunState::Running(writer);
                Ok(())
            }
        }
    }
}

/// Drain an event source into a session and finalize it.
pub fn extract_source<T, S>(
    mut source: T,
    session: &mut ExtractSession<S>,
) -> Result<ExtractionSummary, ExtractError>
where
    T: EventSource,
    S: SinkOpen,
{
    while let Some(event) = source.next_event()? {
        session.push(&event)?;
    }
    session.finish()
}

/// Extract one capture file into a report file.
pub fn extract_pcap_file(
    input: &Path,
    output: &Path,
    options: ExtractOptions,
) -> Result<ExtractionSummary, ExtractError> {
    let source = crate::source::PcapFileSource::open(input)?;
    let mut session = ExtractSession::new(FileSink::new(output), options);
    extract_source(source, &mut session)
}

fn write_report_header<W: Write>(w: &mut W, raw_mode: bool) -> io::Result<()> {
    let stamp = OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .map_err(io::Error::other)?;
    let mode = if raw_mode { "Raw Hex" } else { "ASCII/G-code" };
    writeln!(w, "{RULE}")?;
    writeln!(w, "USB Leftover Capture Data Extraction")?;
    writeln!(w, "Generated: {stamp}")?;
    writeln!(w, "Mode: {mode}")?;
    writeln!(w, "{RULE}")?;
    writeln!(w)
}

fn write_packet_block<W: Write>(
    w: &mut W,
    event: &UsbEvent,
    length: usize,
    body: &str,
) -> io::Result<()> {
    writeln!(w, "--- Packet #{} ---", event.frame_number)?;
    match event.ts {
        Some(ts) => writeln!(w, "Time: {ts:.6}")?,
        None => writeln!(w, "Time: unknown")?,
    }
    writeln!(w, "Source: {}  ->  Destination: {}", event.src, event.dst)?;
    writeln!(w, "Length: {length} bytes")?;
    writeln!(w, "Data:")?;
    writeln!(w, "{body}")?;
    writeln!(w)
}

fn write_summary<W: Write>(w: &mut W, summary: &ExtractionSummary) -> io::Result<()> {
    writeln!(w, "{RULE}")?;
    writeln!(
        w,
        "Summary: {} packets with data out of {} total USB packets",
        summary.packets_with_payload, summary.total_packets
    )?;
    writeln!(w, "{RULE}")
}

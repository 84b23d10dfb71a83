//! Capture-header decoding modules.
//!
//! Each format follows a layered structure:
//! - `layout`: byte offsets and ranges (source of truth)
//! - `reader`: safe byte access and endianness conventions
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `error`: explicit, actionable errors
//!
//! Parsers are pure and contain no I/O; sources handle file access and turn
//! decoded headers into events.

pub mod usbpcap;

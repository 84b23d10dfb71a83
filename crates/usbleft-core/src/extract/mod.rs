//! Payload resolution and filtering.
//!
//! Different capture pipelines and transfer types surface leftover data
//! through different channels, so resolution runs a fixed priority of
//! fallbacks: a dedicated payload field is most trustworthy, raw offset math
//! into the frame is a last resort and only valid when the declared lengths
//! are self-consistent with the captured frame size.

pub mod render;

use crate::ExtractOptions;
use crate::source::UsbEvent;

/// Which resolution strategy produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    PrimaryField,
    FragmentField,
    DirectFrameSlice,
}

/// Payload bytes borrowed from one event; constructed per event and consumed
/// immediately by the renderer, never retained.
#[derive(Debug, Clone, Copy)]
pub struct PayloadRecord<'a> {
    pub bytes: &'a [u8],
    pub provenance: Provenance,
}

/// Resolve the payload for one event, in strict priority order.
///
/// Returns `None` when no strategy yields bytes, which includes slice math
/// that would run past the captured frame. Never reads out of bounds.
pub fn resolve_payload(event: &UsbEvent, fallback_header_len: u32) -> Option<PayloadRecord<'_>> {
    if let Some(bytes) = event.captured_payload.as_deref() {
        if !bytes.is_empty() {
            return Some(PayloadRecord {
                bytes,
                provenance: Provenance::PrimaryField,
            });
        }
    }
    if let Some(bytes) = event.fragment.as_deref() {
        if !bytes.is_empty() {
            return Some(PayloadRecord {
                bytes,
                provenance: Provenance::FragmentField,
            });
        }
    }
    if event.data_length == 0 {
        return None;
    }
    let offset = event.header_len.unwrap_or(fallback_header_len) as usize;
    let len = (event.frame_len as usize).saturating_sub(offset);
    if len == 0 {
        return None;
    }
    let bytes = event.frame.get(offset..offset + len)?;
    Some(PayloadRecord {
        bytes,
        provenance: Provenance::DirectFrameSlice,
    })
}

/// Apply the filtering policy and render the accepted payload.
///
/// Returns `None` for payloads shorter than `min_length`, and in text mode
/// for payloads whose rendering is empty or all-whitespace. Raw mode filters
/// on length only.
pub(crate) fn render_accepted(record: &PayloadRecord<'_>, options: &ExtractOptions) -> Option<String> {
    if record.bytes.len() < options.min_length {
        return None;
    }
    if options.raw_mode {
        return Some(render::render_hex(record.bytes));
    }
    let text = render::render_text(record.bytes, options.show_escapes);
    if text.trim().is_empty() {
        return None;
    }
    Some(text)
}

/// Decoded text and hex views of one event's payload, for per-packet detail
/// display. Always computed without raw mode or escapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketInspection {
    pub text: String,
    pub hex: String,
}

pub fn inspect_event(event: &UsbEvent, fallback_header_len: u32) -> Option<PacketInspection> {
    let record = resolve_payload(event, fallback_header_len)?;
    Some(PacketInspection {
        text: render::render_text(record.bytes, false),
        hex: render::render_hex(record.bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with_frame(data_length: u32, header_len: Option<u32>, frame: Vec<u8>) -> UsbEvent {
        UsbEvent {
            frame_number: 1,
            ts: Some(1.5),
            src: "1.3.1".to_string(),
            dst: "host".to_string(),
            data_length,
            header_len,
            frame_len: frame.len() as u32,
            frame,
            captured_payload: None,
            fragment: None,
        }
    }

    fn slice_frame(payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0u8; 27];
        frame.extend_from_slice(payload);
        frame
    }

    #[test]
    fn primary_field_wins_over_all() {
        let mut event = event_with_frame(4, Some(27), slice_frame(b"MISS"));
        event.captured_payload = Some(b"G28\n".to_vec());
        event.fragment = Some(b"M105\n".to_vec());

        let record = resolve_payload(&event, 27).unwrap();
        assert_eq!(record.provenance, Provenance::PrimaryField);
        assert_eq!(record.bytes, b"G28\n");
    }

    #[test]
    fn fragment_wins_over_slice() {
        let mut event = event_with_frame(4, Some(27), slice_frame(b"MISS"));
        event.fragment = Some(b"M105\n".to_vec());

        let record = resolve_payload(&event, 27).unwrap();
        assert_eq!(record.provenance, Provenance::FragmentField);
        assert_eq!(record.bytes, b"M105\n");
    }

    #[test]
    fn slice_used_as_last_resort() {
        let event = event_with_frame(7, Some(27), slice_frame(b"G1 X10\n"));
        let record = resolve_payload(&event, 27).unwrap();
        assert_eq!(record.provenance, Provenance::DirectFrameSlice);
        assert_eq!(record.bytes, b"G1 X10\n");
    }

    #[test]
    fn empty_primary_field_falls_through() {
        let mut event = event_with_frame(7, Some(27), slice_frame(b"G1 X10\n"));
        event.captured_payload = Some(Vec::new());
        let record = resolve_payload(&event, 27).unwrap();
        assert_eq!(record.provenance, Provenance::DirectFrameSlice);
    }

    #[test]
    fn fallback_header_len_applies_when_unreported() {
        let event = event_with_frame(7, None, slice_frame(b"G1 X10\n"));
        let record = resolve_payload(&event, 27).unwrap();
        assert_eq!(record.bytes, b"G1 X10\n");
    }

    #[test]
    fn zero_declared_length_yields_none() {
        let event = event_with_frame(0, Some(27), slice_frame(b"G1 X10\n"));
        assert!(resolve_payload(&event, 27).is_none());
    }

    #[test]
    fn slice_never_reads_past_frame() {
        // frame_len claims more bytes than were actually captured
        let mut event = event_with_frame(64, Some(27), vec![0u8; 30]);
        event.frame_len = 128;
        assert!(resolve_payload(&event, 27).is_none());
    }

    #[test]
    fn header_past_frame_yields_none() {
        let event = event_with_frame(4, Some(64), vec![0u8; 30]);
        assert!(resolve_payload(&event, 27).is_none());
    }

    #[test]
    fn length_filter_rejects_in_both_modes() {
        let record = PayloadRecord {
            bytes: b"X",
            provenance: Provenance::DirectFrameSlice,
        };
        let text = ExtractOptions::default();
        let raw = ExtractOptions {
            raw_mode: true,
            ..ExtractOptions::default()
        };
        assert!(render_accepted(&record, &text).is_none());
        assert!(render_accepted(&record, &raw).is_none());
    }

    #[test]
    fn all_cr_payload_rejected_in_text_accepted_in_raw() {
        let record = PayloadRecord {
            bytes: &[0x0d, 0x0d, 0x0d],
            provenance: Provenance::FragmentField,
        };
        let text = ExtractOptions::default();
        let raw = ExtractOptions {
            raw_mode: true,
            ..ExtractOptions::default()
        };
        assert!(render_accepted(&record, &text).is_none());
        assert_eq!(render_accepted(&record, &raw).as_deref(), Some("0D 0D 0D"));
    }

    #[test]
    fn inspection_ignores_run_mode() {
        let mut event = event_with_frame(0, Some(27), Vec::new());
        event.captured_payload = Some(b"M116 X0\n".to_vec());
        let view = inspect_event(&event, 27).unwrap();
        assert_eq!(view.text, "M116 X0\n");
        assert_eq!(view.hex, "4D 31 31 36 20 58 30 0A");
    }

    #[test]
    fn inspection_of_payloadless_event_is_none() {
        let event = event_with_frame(0, Some(27), vec![0u8; 27]);
        assert!(inspect_event(&event, 27).is_none());
    }

    #[test]
    fn resolution_and_rendering_are_idempotent() {
        let mut event = event_with_frame(0, Some(27), Vec::new());
        event.captured_payload = Some(b"G1 X-0.12\n".to_vec());
        let options = ExtractOptions::default();

        let first = resolve_payload(&event, 27)
            .and_then(|record| render_accepted(&record, &options))
            .unwrap();
        let second = resolve_payload(&event, 27)
            .and_then(|record| render_accepted(&record, &options))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "G1 X-0.12\n");
    }
}

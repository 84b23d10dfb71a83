use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use usbleft_core::{
    EventSource, ExtractOptions, ExtractSession, FileSink, SourceError, UsbEvent, extract_source,
};

struct VecSource(std::vec::IntoIter<UsbEvent>);

impl VecSource {
    fn new(events: Vec<UsbEvent>) -> Self {
        Self(events.into_iter())
    }
}

impl EventSource for VecSource {
    fn next_event(&mut self) -> Result<Option<UsbEvent>, SourceError> {
        Ok(self.0.next())
    }
}

fn temp_report(tag: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("usbleft_{tag}_{unique}.txt"))
}

fn base_event(frame_number: u64) -> UsbEvent {
    UsbEvent {
        frame_number,
        ts: Some(1700000000.0 + frame_number as f64),
        src: "1.3.1".to_string(),
        dst: "host".to_string(),
        data_length: 0,
        header_len: Some(27),
        frame_len: 0,
        frame: Vec::new(),
        captured_payload: None,
        fragment: None,
    }
}

// Three events covering each resolution strategy plus the filters:
// (a) primary-field G-code line, (b) a 1-byte slice-derived status
// payload, (c) a fragment of pure carriage returns.
fn scenario_events() -> Vec<UsbEvent> {
    let mut primary = base_event(1);
    primary.captured_payload = Some(b"G1 X-0.12\n".to_vec());

    let mut slice = base_event(2);
    slice.data_length = 1;
    slice.frame = {
        let mut frame = vec![0u8; 27];
        frame.push(b'A');
        frame
    };
    slice.frame_len = 28;

    let mut fragment = base_event(3);
    fragment.fragment = Some(vec![0x0d, 0x0d, 0x0d]);

    vec![primary, slice, fragment]
}

#[test]
fn text_mode_accepts_one_of_three() {
    let path = temp_report("text");
    let mut session = ExtractSession::new(FileSink::new(&path), ExtractOptions::default());

    let summary = extract_source(VecSource::new(scenario_events()), &mut session).unwrap();
    assert_eq!(summary.total_packets, 3);
    assert_eq!(summary.packets_with_payload, 1);

    let report = fs::read_to_string(&path).unwrap();
    let _ = fs::remove_file(&path);

    assert!(report.contains("Mode: ASCII/G-code"));
    assert!(report.contains("--- Packet #1 ---"));
    assert!(report.contains("G1 X-0.12"));
    assert!(report.contains("Length: 10 bytes"));
    assert!(!report.contains("--- Packet #2 ---"));
    assert!(!report.contains("--- Packet #3 ---"));
    assert!(report.contains("Summary: 1 packets with data out of 3 total USB packets"));
}

#[test]
fn raw_mode_accepts_two_of_three() {
    let path = temp_report("raw");
    let options = ExtractOptions {
        raw_mode: true,
        ..ExtractOptions::default()
    };
    let mut session = ExtractSession::new(FileSink::new(&path), options);

    let summary = extract_source(VecSource::new(scenario_events()), &mut session).unwrap();
    assert_eq!(summary.total_packets, 3);
    assert_eq!(summary.packets_with_payload, 2);

    let report = fs::read_to_string(&path).unwrap();
    let _ = fs::remove_file(&path);

    assert!(report.contains("Mode: Raw Hex"));
    assert!(report.contains("--- Packet #1 ---"));
    // the all-CR fragment survives in raw mode as hex
    assert!(report.contains("--- Packet #3 ---"));
    assert!(report.contains("0D 0D 0D"));
    assert!(!report.contains("--- Packet #2 ---"));
    assert!(report.contains("Summary: 2 packets with data out of 3 total USB packets"));
}

#[test]
fn session_reset_supports_a_second_run() {
    let path = temp_report("reset");
    let mut session = ExtractSession::new(FileSink::new(&path), ExtractOptions::default());

    extract_source(VecSource::new(scenario_events()), &mut session).unwrap();
    session.reset();

    let mut primary = base_event(1);
    primary.captured_payload = Some(b"M104 S200\n".to_vec());
    let summary = extract_source(VecSource::new(vec![primary]), &mut session).unwrap();
    assert_eq!(summary.total_packets, 1);
    assert_eq!(summary.packets_with_payload, 1);

    let report = fs::read_to_string(&path).unwrap();
    let _ = fs::remove_file(&path);

    // second run re-opened the sink, so only its packets remain
    assert!(report.contains("M104 S200"));
    assert!(!report.contains("G1 X-0.12"));
    assert!(report.contains("Summary: 1 packets with data out of 1 total USB packets"));
}

#[test]
fn min_length_filter_is_configurable() {
    let path = temp_report("minlen");
    let options = ExtractOptions {
        min_length: 11,
        ..ExtractOptions::default()
    };
    let mut session = ExtractSession::new(FileSink::new(&path), options);

    // 10 bytes falls below the raised threshold
    let summary = extract_source(VecSource::new(scenario_events()), &mut session).unwrap();
    let _ = fs::remove_file(&path);
    assert_eq!(summary.packets_with_payload, 0);
}

#[test]
fn escape_mode_renders_cr_fragment() {
    let path = temp_report("escapes");
    let options = ExtractOptions {
        show_escapes: true,
        ..ExtractOptions::default()
    };
    let mut session = ExtractSession::new(FileSink::new(&path), options);

    let summary = extract_source(VecSource::new(scenario_events()), &mut session).unwrap();
    assert_eq!(summary.packets_with_payload, 2);

    let report = fs::read_to_string(&path).unwrap();
    let _ = fs::remove_file(&path);
    assert!(report.contains("\\r\\r\\r"));
}

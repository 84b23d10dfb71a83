//! Deterministic byte renderers; pure functions of the byte sequence.

use std::fmt::Write as _;

/// Render bytes as uppercase two-digit hex, single-space separated.
///
/// # Examples
/// ```
/// use usbleft_core::render_hex;
///
/// assert_eq!(render_hex(&[0x4d, 0x31, 0x31, 0x36]), "4D 31 31 36");
/// assert_eq!(render_hex(&[]), "");
/// ```
pub fn render_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render bytes as text: printable ASCII, LF, and TAB pass through
/// literally. CR and other non-printable bytes are dropped, or shown as
/// `\r` / `\xHH` escapes when `show_escapes` is set.
///
/// Deliberately lossy by default so text-protocol output stays clean; the
/// escape mode exists for diagnosing malformed or binary traffic.
///
/// # Examples
/// ```
/// use usbleft_core::render_text;
///
/// assert_eq!(render_text(b"M116 X0\n", false), "M116 X0\n");
/// assert_eq!(render_text(&[0x01], false), "");
/// assert_eq!(render_text(&[0x01], true), "\\x01");
/// ```
pub fn render_text(bytes: &[u8], show_escapes: bool) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            0x20..=0x7e => out.push(b as char),
            b'\n' => out.push('\n'),
            b'\t' => out.push('\t'),
            b'\r' => {
                if show_escapes {
                    out.push_str("\\r");
                }
            }
            other => {
                if show_escapes {
                    let _ = write!(out, "\\x{other:02X}");
                }
            }
        }
    }
    out
}

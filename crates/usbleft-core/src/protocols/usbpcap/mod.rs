//! USBPcap record header decoding.
//!
//! Every record in a LINKTYPE_USBPCAP capture starts with a little-endian
//! pseudo-header describing the transfer; leftover application data follows
//! at the offset the header itself declares. The fixed portion is 27 bytes;
//! control transfers append a stage byte, which is why the payload offset is
//! read from the header rather than assumed.
//!
//! Wire-format details are defined in `layout`, safe reads live in `reader`.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{TransferType, UsbPcapHeader, parse_usbpcap};

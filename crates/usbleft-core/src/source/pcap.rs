use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapNGReader, traits::PcapReaderIterator,
};

use super::{EventSource, SourceError, UsbEvent};
use crate::protocols::usbpcap::parse_usbpcap;

const LINKTYPE_USBPCAP: Linktype = Linktype(249);

/// Reads legacy PCAP and PCAPNG files and dissects USBPcap records into
/// [`UsbEvent`]s. Records on other linktypes, and records whose USBPcap
/// header cannot be decoded, still consume a frame number but produce no
/// event.
pub struct PcapFileSource {
    inner: PcapReader,
    frame_number: u64,
}

enum PcapReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Option<Linktype>,
    },
    Ng {
        reader: PcapNGReader<File>,
        linktypes: Vec<Linktype>,
    },
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let mut file = File::open(path)?;
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        file.seek(SeekFrom::Start(0))?;

        let inner = if magic == [0x0a, 0x0d, 0x0d, 0x0a] {
            let reader =
                PcapNGReader::new(64 * 1024, file).map_err(|e| SourceError::Pcap(e.to_string()))?;
            PcapReader::Ng {
                reader,
                linktypes: Vec::new(),
            }
        } else {
            let reader = LegacyPcapReader::new(64 * 1024, file)
                .map_err(|e| SourceError::Pcap(e.to_string()))?;
            PcapReader::Legacy {
                reader,
                linktype: None,
            }
        };

        Ok(Self {
            inner,
            frame_number: 0,
        })
    }
}

impl EventSource for PcapFileSource {
    fn next_event(&mut self) -> Result<Option<UsbEvent>, SourceError> {
        loop {
            match &mut self.inner {
                PcapReader::Legacy { reader, linktype } => match reader.next() {
                    Ok((offset, block)) => {
                        let event = match block {
                            PcapBlockOwned::LegacyHeader(header) => {
                                *linktype = Some(header.network);
                                None
                            }
                            PcapBlockOwned::Legacy(packet) => {
                                self.frame_number += 1;
                                let ts = packet.ts_sec as f64 + (packet.ts_usec as f64 * 1e-6);
                                let lt = linktype.unwrap_or(Linktype::ETHERNET);
                                dissect_frame(self.frame_number, Some(ts), lt, packet.data)
                            }
                            _ => None,
                        };
                        reader.consume(offset);
                        if event.is_some() {
                            return Ok(event);
                        }
                    }
                    Err(pcap_parser::PcapError::Eof) => return Ok(None),
                    Err(pcap_parser::PcapError::Incomplete(_)) => {
                        reader
                            .refill()
                            .map_err(|e| SourceError::Pcap(e.to_string()))?;
                    }
                    Err(e) => return Err(SourceError::Pcap(e.to_string())),
                },
                PcapReader::Ng { reader, linktypes } => match reader.next() {
                    Ok((offset, block)) => {
                        let event = match block {
                            PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                                linktypes.push(intf.linktype);
                                None
                            }
                            PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
                                self.frame_number += 1;
                                let ts = Some(pcapng_ts_to_seconds(packet.ts_high, packet.ts_low));
                                let lt = linktypes
                                    .get(packet.if_id as usize)
                                    .copied()
                                    .unwrap_or(Linktype::ETHERNET);
                                dissect_frame(self.frame_number, ts, lt, packet.data)
                            }
                            _ => None,
                        };
                        reader.consume(offset);
                        if event.is_some() {
                            return Ok(event);
                        }
                    }
                    Err(pcap_parser::PcapError::Eof) => return Ok(None),
                    Err(pcap_parser::PcapError::Incomplete(_)) => {
                        reader
                            .refill()
                            .map_err(|e| SourceError::Pcap(e.to_string()))?;
                    }
                    Err(e) => return Err(SourceError::Pcap(e.to_string())),
                },
            }
        }
    }
}

fn dissect_frame(
    frame_number: u64,
    ts: Option<f64>,
    linktype: Linktype,
    data: &[u8],
) -> Option<UsbEvent> {
    if linktype != LINKTYPE_USBPCAP {
        return None;
    }
    // Undecodable headers are a per-record skip, not a source failure.
    let header = parse_usbpcap(data).ok()?;
    let header_len = header.header_len as usize;

    // The primary payload field is only trusted when the declared length is
    // self-consistent with the captured frame; anything else is left to the
    // extractor's direct-slice fallback.
    let captured_payload = if header.data_length > 0
        && data.len() == header_len + header.data_length as usize
    {
        Some(data[header_len..].to_vec())
    } else {
        None
    };

    let (src, dst) = if header.is_in() {
        (header.device_label(), "host".to_string())
    } else {
        ("host".to_string(), header.device_label())
    };

    Some(UsbEvent {
        frame_number,
        ts,
        src,
        dst,
        data_length: header.data_length,
        header_len: Some(header.header_len as u32),
        frame_len: data.len() as u32,
        frame: data.to_vec(),
        captured_payload,
        fragment: None,
    })
}

fn pcapng_ts_to_seconds(ts_high: u32, ts_low: u32) -> f64 {
    let ts = ((ts_high as u64) << 32) | (ts_low as u64);
    ts as f64 * 1e-6
}

use super::error::UsbPcapError;
use super::layout;
use super::reader::UsbPcapReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Isochronous,
    Interrupt,
    Control,
    Bulk,
    Unknown(u8),
}

impl From<u8> for TransferType {
    fn from(value: u8) -> Self {
        match value {
            layout::TRANSFER_ISOCHRONOUS => TransferType::Isochronous,
            layout::TRANSFER_INTERRUPT => TransferType::Interrupt,
            layout::TRANSFER_CONTROL => TransferType::Control,
            layout::TRANSFER_BULK => TransferType::Bulk,
            other => TransferType::Unknown(other),
        }
    }
}

/// Decoded USBPcap record header.
#[derive(Debug, Clone)]
pub struct UsbPcapHeader {
    pub header_len: u16,
    pub irp_id: u64,
    pub status: u32,
    pub function: u16,
    pub info: u8,
    pub bus: u16,
    pub device: u16,
    pub endpoint: u8,
    pub transfer: TransferType,
    pub data_length: u32,
}

impl UsbPcapHeader {
    /// Direction bit of the endpoint address; set means device-to-host.
    pub fn is_in(&self) -> bool {
        self.endpoint & layout::ENDPOINT_DIRECTION_IN != 0
    }

    pub fn endpoint_number(&self) -> u8 {
        self.endpoint & layout::ENDPOINT_NUMBER_MASK
    }

    /// Endpoint label in the `bus.device.endpoint` convention.
    pub fn device_label(&self) -> String {
        format!("{}.{}.{}", self.bus, self.device, self.endpoint_number())
    }
}

pub fn parse_usbpcap(frame: &[u8]) -> Result<UsbPcapHeader, UsbPcapError> {
    let reader = UsbPcapReader::new(frame);
    reader.require_len(layout::MIN_LEN)?;

    let header_len = reader.read_u16_le(layout::HEADER_LEN_RANGE.clone())?;
    if (header_len as usize) < layout::FIXED_HEADER_LEN {
        return Err(UsbPcapError::InvalidHeaderLen { value: header_len });
    }

    Ok(UsbPcapHeader {
        header_len,
        irp_id: reader.read_u64_le(layout::IRP_ID_RANGE.clone())?,
        status: reader.read_u32_le(layout::STATUS_RANGE.clone())?,
        function: reader.read_u16_le(layout::FUNCTION_RANGE.clone())?,
        info: reader.read_u8(layout::INFO_OFFSET)?,
        bus: reader.read_u16_le(layout::BUS_RANGE.clone())?,
        device: reader.read_u16_le(layout::DEVICE_RANGE.clone())?,
        endpoint: reader.read_u8(layout::ENDPOINT_OFFSET)?,
        transfer: TransferType::from(reader.read_u8(layout::TRANSFER_TYPE_OFFSET)?),
        data_length: reader.read_u32_le(layout::DATA_LENGTH_RANGE.clone())?,
    })
}

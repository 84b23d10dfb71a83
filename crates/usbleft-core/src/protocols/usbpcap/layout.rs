pub const HEADER_LEN_RANGE: std::ops::Range<usize> = 0..2;
pub const IRP_ID_RANGE: std::ops::Range<usize> = 2..10;
pub const STATUS_RANGE: std::ops::Range<usize> = 10..14;
pub const FUNCTION_RANGE: std::ops::Range<usize> = 14..16;
pub const INFO_OFFSET: usize = 16;
pub const BUS_RANGE: std::ops::Range<usize> = 17..19;
pub const DEVICE_RANGE: std::ops::Range<usize> = 19..21;
pub const ENDPOINT_OFFSET: usize = 21;
pub const TRANSFER_TYPE_OFFSET: usize = 22;
pub const DATA_LENGTH_RANGE: std::ops::Range<usize> = 23..27;

pub const FIXED_HEADER_LEN: usize = 27;
pub const ENDPOINT_DIRECTION_IN: u8 = 0x80;
pub const ENDPOINT_NUMBER_MASK: u8 = 0x7f;

pub const TRANSFER_ISOCHRONOUS: u8 = 0;
pub const TRANSFER_INTERRUPT: u8 = 1;
pub const TRANSFER_CONTROL: u8 = 2;
pub const TRANSFER_BULK: u8 = 3;

pub const MIN_LEN: usize = FIXED_HEADER_LEN;

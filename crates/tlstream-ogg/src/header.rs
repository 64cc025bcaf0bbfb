//! Ogg page header structures and parsing

use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

use crate::error::OggResult;

/// Ogg capture pattern that starts every page
pub const CAPTURE_PATTERN: [u8; 4] = *b"OggS";

/// Size of the fixed page header, capture pattern and segment count included
pub const HEADER_SIZE: usize = 27;

/// Maximum number of lacing values in one page
pub const MAX_SEGMENTS: usize = 255;

/// Largest possible page: full header, full segment table, 255 full segments
pub const MAX_PAGE_SIZE: usize = HEADER_SIZE + MAX_SEGMENTS + MAX_SEGMENTS * 255;

/// Offset of the CRC field inside the header
pub const CHECKSUM_OFFSET: usize = 22;

/// Header type flag: page continues a packet from the previous page
pub const FLAG_CONTINUED: u8 = 0x01;
/// Header type flag: first page of a logical bitstream
pub const FLAG_FIRST_PAGE: u8 = 0x02;
/// Header type flag: last page of a logical bitstream
pub const FLAG_LAST_PAGE: u8 = 0x04;

/// Granule position meaning "no packet finishes on this page"
const NO_GRANULE: u64 = u64::MAX;

/// Ogg page header
///
/// Layout (all multi-byte fields little-endian):
/// - Capture pattern "OggS" (4 bytes)
/// - Stream structure version (1 byte)
/// - Header type flags (1 byte)
/// - Granule position (8 bytes)
/// - Bitstream serial number (4 bytes)
/// - Page sequence number (4 bytes)
/// - CRC checksum (4 bytes)
/// - Segment count (1 byte)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct OggPageHeader {
    /// Capture pattern, always "OggS"
    #[br(assert(capture_pattern == CAPTURE_PATTERN, "invalid capture pattern: {:02X?}", capture_pattern))]
    pub capture_pattern: [u8; 4],

    /// Stream structure version, 0 in every known stream
    pub version: u8,

    /// Header type flags
    pub header_type: u8,

    /// Codec-defined position of the last packet finishing on this page
    pub granule_position: u64,

    /// Logical bitstream serial number
    pub serial: u32,

    /// Page sequence number within the logical bitstream
    pub sequence: u32,

    /// CRC-32 over the whole page with this field zeroed
    pub checksum: u32,

    /// Number of lacing values in the segment table
    pub segment_count: u8,
}

impl OggPageHeader {
    /// Create a header with zeroed checksum and no segments
    pub fn new(serial: u32, sequence: u32) -> Self {
        Self {
            capture_pattern: CAPTURE_PATTERN,
            version: 0,
            header_type: 0,
            granule_position: 0,
            serial,
            sequence,
            checksum: 0,
            segment_count: 0,
        }
    }

    /// Parse a header from its 27 raw bytes
    pub fn parse(data: &[u8]) -> OggResult<Self> {
        Ok(Self::read(&mut Cursor::new(data))?)
    }

    /// Serialize the header to its 27 raw bytes
    pub fn to_bytes(&self) -> OggResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(HEADER_SIZE));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Page continues a packet started on a previous page
    pub fn is_continuation(&self) -> bool {
        self.header_type & FLAG_CONTINUED != 0
    }

    /// Page opens a logical bitstream
    pub fn is_first_page(&self) -> bool {
        self.header_type & FLAG_FIRST_PAGE != 0
    }

    /// Page closes a logical bitstream
    pub fn is_last_page(&self) -> bool {
        self.header_type & FLAG_LAST_PAGE != 0
    }

    /// Granule position, or `None` when no packet finishes on this page
    pub fn granule_position(&self) -> Option<u64> {
        (self.granule_position != NO_GRANULE).then_some(self.granule_position)
    }
}

//! Page builder
//!
//! Produces well-formed pages (lacing values and CRC filled in). Used to
//! generate test streams and by consumers that need to re-frame data.

use crate::crc::ogg_crc32;
use crate::error::{OggError, OggResult};
use crate::header::{CHECKSUM_OFFSET, MAX_SEGMENTS, OggPageHeader};

/// Builder for a single Ogg page
#[derive(Debug, Clone)]
pub struct OggPageBuilder {
    header: OggPageHeader,
    lacing: Vec<u8>,
    payload: Vec<u8>,
}

impl OggPageBuilder {
    /// Start a page for the given bitstream serial and sequence number
    pub fn new(serial: u32, sequence: u32) -> Self {
        Self {
            header: OggPageHeader::new(serial, sequence),
            lacing: Vec::new(),
            payload: Vec::new(),
        }
    }

    /// Set the header type flags
    pub fn header_type(mut self, flags: u8) -> Self {
        self.header.header_type = flags;
        self
    }

    /// Set the granule position
    pub fn granule_position(mut self, granule: u64) -> Self {
        self.header.granule_position = granule;
        self
    }

    /// Append a complete packet
    ///
    /// A packet is laced as a run of 255 values followed by one value below
    /// 255 (zero when the packet length is a multiple of 255).
    pub fn packet(mut self, data: &[u8]) -> OggResult<Self> {
        let full = data.len() / 255;
        let needed = self.lacing.len() + full + 1;
        if needed > MAX_SEGMENTS {
            return Err(OggError::TooManySegments(needed));
        }

        self.lacing.extend(std::iter::repeat_n(255u8, full));
        self.lacing.push((data.len() % 255) as u8);
        self.payload.extend_from_slice(data);
        Ok(self)
    }

    /// Serialize the page, computing the segment count and CRC
    pub fn build(mut self) -> OggResult<Vec<u8>> {
        self.header.segment_count = self.lacing.len() as u8;
        self.header.checksum = 0;

        let mut page = self.header.to_bytes()?;
        page.extend_from_slice(&self.lacing);
        page.extend_from_slice(&self.payload);

        let crc = ogg_crc32(&page);
        page[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&crc.to_le_bytes());
        Ok(page)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::header::{FLAG_LAST_PAGE, HEADER_SIZE};

    #[test]
    fn test_lacing_for_exact_multiple() {
        let page = OggPageBuilder::new(1, 0)
            .packet(&[0u8; 510])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(page[26], 3);
        assert_eq!(&page[HEADER_SIZE..HEADER_SIZE + 3], &[255, 255, 0]);
        assert_eq!(page.len(), HEADER_SIZE + 3 + 510);
    }

    #[test]
    fn test_multiple_packets() {
        let page = OggPageBuilder::new(1, 4)
            .header_type(FLAG_LAST_PAGE)
            .granule_position(4800)
            .packet(b"abc")
            .unwrap()
            .packet(b"defg")
            .unwrap()
            .build()
            .unwrap();
        let header = OggPageHeader::parse(&page[..HEADER_SIZE]).unwrap();
        assert_eq!(header.segment_count, 2);
        assert_eq!(header.granule_position(), Some(4800));
        assert!(header.is_last_page());
        assert_eq!(&page[HEADER_SIZE + 2..], b"abcdefg");
    }

    #[test]
    fn test_segment_overflow() {
        let result = OggPageBuilder::new(1, 0).packet(&vec![0u8; 255 * 255]);
        assert!(matches!(result, Err(OggError::TooManySegments(256))));
    }

    #[test]
    fn test_checksum_is_filled_in() {
        let page = OggPageBuilder::new(7, 1).packet(b"data").unwrap().build().unwrap();
        let header = OggPageHeader::parse(&page[..HEADER_SIZE]).unwrap();

        let mut zeroed = page.clone();
        zeroed[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].fill(0);
        assert_eq!(header.checksum, ogg_crc32(&zeroed));
        assert_ne!(header.checksum, 0);
    }
}

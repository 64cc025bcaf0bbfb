//! Page scanner
//!
//! Splits a raw byte stream into complete Ogg pages. The scanner has no
//! knowledge of the codec carried inside the pages: it locates a capture
//! pattern, reads the fixed header and the segment table, and takes as many
//! payload bytes as the lacing values add up to.
//!
//! Pages are assembled in an internal buffer before they are handed out, so
//! a page that is cut short by the end of the input never reaches a sink.

use std::io::{self, BufRead, Write};

use crate::crc::ogg_crc32;
use crate::error::{OggError, OggResult, PageSection};
use crate::header::{CAPTURE_PATTERN, CHECKSUM_OFFSET, HEADER_SIZE, MAX_PAGE_SIZE, OggPageHeader};

/// Counters maintained while scanning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Complete pages produced
    pub pages: u64,
    /// Bytes belonging to complete pages
    pub page_bytes: u64,
    /// Bytes discarded while searching for a capture pattern
    pub skipped_bytes: u64,
}

/// Borrowed view of one complete page
#[derive(Debug, Clone, Copy)]
pub struct PageRef<'a> {
    header: &'a OggPageHeader,
    bytes: &'a [u8],
}

impl<'a> PageRef<'a> {
    /// Parsed fixed header
    pub fn header(&self) -> &'a OggPageHeader {
        self.header
    }

    /// Verbatim page bytes: header, segment table and payload
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Total page length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// A page always carries at least its header
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lacing values
    pub fn segment_table(&self) -> &'a [u8] {
        &self.bytes[HEADER_SIZE..HEADER_SIZE + usize::from(self.header.segment_count)]
    }

    /// Page body
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[HEADER_SIZE + usize::from(self.header.segment_count)..]
    }

    /// Payload length as declared by the segment table
    pub fn payload_len(&self) -> usize {
        self.segment_table().iter().map(|&lace| usize::from(lace)).sum()
    }

    /// Recompute the page CRC and compare it with the header field
    pub fn checksum_matches(&self) -> bool {
        let mut zeroed = self.bytes.to_vec();
        zeroed[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].fill(0);
        ogg_crc32(&zeroed) == self.header.checksum
    }

    /// Copy into an owned page
    pub fn to_owned_page(&self) -> OggPage {
        OggPage {
            header: self.header.clone(),
            bytes: self.bytes.to_vec(),
        }
    }
}

/// Owned page, as yielded by the scanner's iterator
///
/// Always holds exactly one complete page: the byte length matches the
/// header and segment table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OggPage {
    header: OggPageHeader,
    bytes: Vec<u8>,
}

impl OggPage {
    /// Check and wrap the verbatim bytes of one page
    ///
    /// Fails with [`OggError::Truncated`] when the bytes stop short of the
    /// length the segment table declares and with [`OggError::TrailingBytes`]
    /// when they run past it.
    pub fn from_bytes(bytes: Vec<u8>) -> OggResult<Self> {
        let header_bytes = bytes.get(..HEADER_SIZE).ok_or(OggError::Truncated {
            section: PageSection::Header,
            expected: HEADER_SIZE,
            actual: bytes.len(),
        })?;
        let header = OggPageHeader::parse(header_bytes)?;

        let table_end = HEADER_SIZE + usize::from(header.segment_count);
        let table = bytes.get(HEADER_SIZE..table_end).ok_or(OggError::Truncated {
            section: PageSection::SegmentTable,
            expected: usize::from(header.segment_count),
            actual: bytes.len() - HEADER_SIZE,
        })?;
        let payload_len: usize = table.iter().map(|&lace| usize::from(lace)).sum();

        let expected = table_end + payload_len;
        if bytes.len() < expected {
            return Err(OggError::Truncated {
                section: PageSection::Payload,
                expected: payload_len,
                actual: bytes.len() - table_end,
            });
        }
        if bytes.len() > expected {
            return Err(OggError::TrailingBytes {
                expected,
                actual: bytes.len(),
            });
        }

        Ok(Self { header, bytes })
    }

    /// Parsed fixed header
    pub fn header(&self) -> &OggPageHeader {
        &self.header
    }

    /// Verbatim page bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the verbatim page bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Borrow as a [`PageRef`]
    pub fn as_page_ref(&self) -> PageRef<'_> {
        PageRef {
            header: &self.header,
            bytes: &self.bytes,
        }
    }
}

/// Streaming Ogg page scanner over any buffered reader
pub struct PageScanner<R> {
    reader: R,
    page: Vec<u8>,
    header: OggPageHeader,
    stats: ScanStats,
    finished: bool,
}

impl<R: BufRead> PageScanner<R> {
    /// Create a scanner reading from `reader`
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            page: Vec::with_capacity(MAX_PAGE_SIZE),
            header: OggPageHeader::new(0, 0),
            stats: ScanStats::default(),
            finished: false,
        }
    }

    /// Read the next complete page
    ///
    /// Returns `Ok(None)` when the input ends before another capture pattern
    /// is found. Once a capture pattern has matched, running out of input is
    /// an [`OggError::Truncated`] error and nothing of that page is exposed.
    pub fn read_page(&mut self) -> OggResult<Option<PageRef<'_>>> {
        if !self.sync()? {
            return Ok(None);
        }

        self.page.clear();
        self.page.extend_from_slice(&CAPTURE_PATTERN);
        self.fill(HEADER_SIZE - CAPTURE_PATTERN.len(), PageSection::Header)?;
        self.header = OggPageHeader::parse(&self.page[..HEADER_SIZE])?;

        self.fill(usize::from(self.header.segment_count), PageSection::SegmentTable)?;
        let payload_len: usize = self.page[HEADER_SIZE..]
            .iter()
            .map(|&lace| usize::from(lace))
            .sum();
        self.fill(payload_len, PageSection::Payload)?;

        self.stats.pages += 1;
        self.stats.page_bytes += self.page.len() as u64;

        Ok(Some(PageRef {
            header: &self.header,
            bytes: &self.page,
        }))
    }

    /// Read the next page and write it verbatim to `dst`
    ///
    /// Returns the number of bytes written, or `None` at end of stream.
    pub fn copy_page<W: Write + ?Sized>(&mut self, dst: &mut W) -> OggResult<Option<u64>> {
        let Some(page) = self.read_page()? else {
            return Ok(None);
        };
        dst.write_all(page.as_bytes())?;
        Ok(Some(page.len() as u64))
    }

    /// Counters so far
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Give back the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Advance past the next capture pattern, returning false at end of input
    fn sync(&mut self) -> OggResult<bool> {
        let mut matched = 0usize;
        let mut scanned = 0u64;

        loop {
            let (consumed, found) = {
                let buf = match self.reader.fill_buf() {
                    Ok(buf) => buf,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err.into()),
                };
                if buf.is_empty() {
                    self.stats.skipped_bytes += scanned;
                    return Ok(false);
                }

                let mut consumed = 0;
                let mut found = false;
                for &byte in buf {
                    consumed += 1;
                    if byte == CAPTURE_PATTERN[matched] {
                        matched += 1;
                        if matched == CAPTURE_PATTERN.len() {
                            found = true;
                            break;
                        }
                    } else {
                        // "OggS" has no repeated prefix, so only a fresh 'O' can restart a match
                        matched = usize::from(byte == CAPTURE_PATTERN[0]);
                    }
                }
                (consumed, found)
            };

            self.reader.consume(consumed);
            scanned += consumed as u64;

            if found {
                self.stats.skipped_bytes += scanned - CAPTURE_PATTERN.len() as u64;
                return Ok(true);
            }
        }
    }

    /// Append exactly `len` bytes from the reader to the page buffer
    fn fill(&mut self, len: usize, section: PageSection) -> OggResult<()> {
        let start = self.page.len();
        self.page.resize(start + len, 0);

        let mut filled = 0;
        while filled < len {
            match self.reader.read(&mut self.page[start + filled..]) {
                Ok(0) => {
                    self.page.truncate(start + filled);
                    return Err(OggError::Truncated {
                        section,
                        expected: len,
                        actual: filled,
                    });
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    self.page.truncate(start + filled);
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for PageScanner<R> {
    type Item = OggResult<OggPage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let next = match self.read_page() {
            Ok(Some(page)) => Ok(Some(page.to_owned_page())),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };

        match next {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

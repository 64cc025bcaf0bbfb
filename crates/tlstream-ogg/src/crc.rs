//! Ogg page CRC-32
//!
//! Polynomial 0x04C11DB7, zero initial value, no reflection, no final XOR.
//! Computed over the whole page with the checksum field set to zero.

const POLYNOMIAL: u32 = 0x04C1_1DB7;

const CRC_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Compute the Ogg CRC-32 of `data`
pub fn ogg_crc32(data: &[u8]) -> u32 {
    data.iter().fold(0u32, |crc, &byte| {
        (crc << 8) ^ CRC_TABLE[usize::from((crc >> 24) as u8 ^ byte)]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(ogg_crc32(&[]), 0);
    }

    #[test]
    fn test_known_vector() {
        // CRC-32/CKSUM check value 0x765E7680 without its final inversion
        assert_eq!(ogg_crc32(b"123456789"), 0x89A1_897F);
    }

    #[test]
    fn test_table_first_entries() {
        assert_eq!(CRC_TABLE[0], 0);
        assert_eq!(CRC_TABLE[1], POLYNOMIAL);
    }
}

//! PE image checksum.
//!
//! The image is summed as little-endian 16-bit words with end-around carry, skipping the
//! `CheckSum` field itself; the folded sum plus the file length is the checksum.

/// Compute the PE checksum of `data` whose `CheckSum` field is at `checksum_offset`.
pub(crate) fn pe_checksum(data: &[u8], checksum_offset: usize) -> u32 {
    let checksum_range = checksum_offset..checksum_offset + 4;
    let mut sum: u64 = 0;

    for (index, chunk) in data.chunks(2).enumerate() {
        let offset = index * 2;
        if checksum_range.contains(&offset) {
            continue;
        }

        let word = match chunk {
            [low, high] => u16::from_le_bytes([*low, *high]),
            [low] => u16::from(*low),
            _ => 0,
        };

        sum += u64::from(word);
        if sum > 0xFFFF {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
    }

    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    // the sum is folded to 16 bits, PE images stay below 4 GiB
    #[allow(clippy::cast_possible_truncation)]
    let (sum, length) = (sum as u32, data.len() as u32);
    sum.wrapping_add(length)
}

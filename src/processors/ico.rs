// pixkit/src/processors/ico.rs
//! Hand-assembled ICO container holding PNG payloads.
//!
//! Layout: a 6-byte ICONDIR (reserved = 0, type = 1, count), one 16-byte
//! ICONDIRENTRY per image, then the PNG payloads back to back. All integers
//! are little-endian. With a single entry the payload starts at offset 22.
use crate::core::{ImageToolError, Result};

pub const ICONDIR_SIZE: usize = 6;
pub const ICONDIRENTRY_SIZE: usize = 16;
pub const MAX_ICON_SIDE: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcoEntry {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Width/height byte: 256 is stored as 0.
fn side_byte(side: u32) -> u8 {
    if side == MAX_ICON_SIDE {
        0
    } else {
        side as u8
    }
}

pub fn encode_ico(entries: &[IcoEntry]) -> Result<Vec<u8>> {
    if entries.is_empty() {
        return Err(ImageToolError::InvalidParameter(
            "An icon needs at least one image".to_string(),
        ));
    }
    if entries.len() > u16::MAX as usize {
        return Err(ImageToolError::InvalidParameter(format!(
            "Too many icon images: {}",
            entries.len()
        )));
    }
    for entry in entries {
        let valid = |side: u32| (1..=MAX_ICON_SIDE).contains(&side);
        if !valid(entry.width) || !valid(entry.height) {
            return Err(ImageToolError::InvalidParameter(format!(
                "Icon size {}x{} outside 1..=256",
                entry.width, entry.height
            )));
        }
    }

    let header_len = ICONDIR_SIZE + ICONDIRENTRY_SIZE * entries.len();
    let payload_len: usize = entries.iter().map(|e| e.png.len()).sum();
    let mut out = Vec::with_capacity(header_len + payload_len);

    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());

    let mut offset = header_len;
    for entry in entries {
        let size = u32::try_from(entry.png.len()).map_err(|_| {
            ImageToolError::InvalidParameter("Icon payload larger than 4 GiB".to_string())
        })?;
        out.push(side_byte(entry.width));
        out.push(side_byte(entry.height));
        out.push(0); // palette colors
        out.push(0); // reserved
        out.extend_from_slice(&1u16.to_le_bytes()); // color planes
        out.extend_from_slice(&32u16.to_le_bytes()); // bits per pixel
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&(offset as u32).to_le_bytes());
        offset += entry.png.len();
    }

    for entry in entries {
        out.extend_from_slice(&entry.png);
    }

    log::debug!("Assembled ICO with {} image(s), {} bytes", entries.len(), out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_entry_layout_is_bit_exact() {
        for len in [0usize, 1, 67, 70_000] {
            let png: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let bytes = encode_ico(&[IcoEntry {
                width: 32,
                height: 32,
                png: png.clone(),
            }])
            .unwrap();

            let mut expected = vec![0, 0, 1, 0, 1, 0, 32, 32, 0, 0, 1, 0, 32, 0];
            expected.extend_from_slice(&(len as u32).to_le_bytes());
            expected.extend_from_slice(&22u32.to_le_bytes());
            assert_eq!(&bytes[..22], expected.as_slice());
            assert_eq!(&bytes[22..], png.as_slice());
        }
    }

    #[test]
    fn side_of_256_is_written_as_zero() {
        let bytes = encode_ico(&[IcoEntry {
            width: 256,
            height: 256,
            png: vec![1, 2, 3],
        }])
        .unwrap();
        assert_eq!(bytes[6], 0);
        assert_eq!(bytes[7], 0);
    }

    #[test]
    fn offsets_chain_across_entries() {
        let entries = vec![
            IcoEntry { width: 16, height: 16, png: vec![0xAA; 10] },
            IcoEntry { width: 32, height: 32, png: vec![0xBB; 20] },
        ];
        let bytes = encode_ico(&entries).unwrap();
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 2);

        let offset = |entry: usize| {
            let at = ICONDIR_SIZE + entry * ICONDIRENTRY_SIZE + 12;
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        assert_eq!(offset(0), 38);
        assert_eq!(offset(1), 48);
        assert_eq!(bytes.len(), 68);
        assert_eq!(bytes[48], 0xBB);
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(encode_ico(&[]).is_err());
        let big = IcoEntry { width: 512, height: 512, png: vec![] };
        assert!(encode_ico(&[big]).is_err());
        let zero = IcoEntry { width: 0, height: 16, png: vec![] };
        assert!(encode_ico(&[zero]).is_err());
    }
}

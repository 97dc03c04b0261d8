//! Animator / Animator Pro `.col` palettes
//!
//! Animator files are exactly 768 bytes: 256 RGB triplets with 6-bit
//! components. Animator Pro files start with an 8-byte header (u32 file
//! size, u16 magic, u16 version, all little endian) followed by 8-bit RGB
//! triplets. Saving always produces the Animator Pro layout.

use std::fs;
use std::path::Path;

use crate::doc::{Palette, Rgba};
use crate::error::{Result, SpriteError};

pub const PROCOL_MAGIC_NUMBER: u16 = 0xB123;

const ANIMATOR_SIZE: usize = 768;
const PRO_HEADER_SIZE: usize = 8;
const MAX_ENTRIES: usize = 256;

fn scale_6bits_to_8bits(v: u8) -> u8 {
    let v = v.min(63);
    (v << 2) | (v >> 4)
}

/// Decode palette bytes; the error string says what is wrong with them
pub fn decode_col(bytes: &[u8]) -> std::result::Result<Palette, String> {
    if bytes.is_empty() {
        return Err("empty file".to_string());
    }

    if bytes.len() == ANIMATOR_SIZE {
        let entries = bytes
            .chunks_exact(3)
            .map(|c| {
                Rgba::new(
                    scale_6bits_to_8bits(c[0]),
                    scale_6bits_to_8bits(c[1]),
                    scale_6bits_to_8bits(c[2]),
                    255,
                )
            })
            .collect();
        return Ok(Palette::from_entries(entries));
    }

    if bytes.len() < PRO_HEADER_SIZE {
        return Err(format!("{} bytes is too short for a header", bytes.len()));
    }
    let body = &bytes[PRO_HEADER_SIZE..];
    if body.len() % 3 != 0 {
        return Err(format!(
            "{} bytes of colour data is not a whole number of entries",
            body.len()
        ));
    }
    let magic = u16::from_le_bytes([bytes[4], bytes[5]]);
    let version = u16::from_le_bytes([bytes[6], bytes[7]]);
    if magic != PROCOL_MAGIC_NUMBER || version != 0 {
        return Err(format!(
            "unknown format (magic {:#06x}, version {})",
            magic, version
        ));
    }

    let entries = body
        .chunks_exact(3)
        .take(MAX_ENTRIES)
        .map(|c| Rgba::new(c[0], c[1], c[2], 255))
        .collect();
    Ok(Palette::from_entries(entries))
}

/// Encode as Animator Pro; always 256 entries, missing ones black
pub fn encode_col(palette: &Palette) -> Vec<u8> {
    let mut out = Vec::with_capacity(PRO_HEADER_SIZE + ANIMATOR_SIZE);
    out.extend_from_slice(&((PRO_HEADER_SIZE + ANIMATOR_SIZE) as u32).to_le_bytes());
    out.extend_from_slice(&PROCOL_MAGIC_NUMBER.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    for i in 0..MAX_ENTRIES {
        let c = palette.entry(i);
        out.extend_from_slice(&[c.r, c.g, c.b]);
    }
    out
}

pub fn load_col_file(path: &Path) -> Result<Palette> {
    if !path.exists() {
        return Err(SpriteError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|e| SpriteError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    decode_col(&bytes).map_err(|reason| SpriteError::InvalidPalette {
        path: path.to_path_buf(),
        reason,
    })
}

pub fn save_col_file(palette: &Palette, path: &Path) -> Result<()> {
    fs::write(path, encode_col(palette)).map_err(|e| SpriteError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

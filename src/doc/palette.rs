//! Colour palettes for indexed sprites

use serde::{Deserialize, Serialize};

/// An 8-bit per channel colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Ordered list of palette entries
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Palette {
    entries: Vec<Rgba>,
}

impl Palette {
    /// Create a palette of `size` black entries
    pub fn new(size: usize) -> Self {
        Self {
            entries: vec![Rgba::BLACK; size],
        }
    }

    pub fn from_entries(entries: Vec<Rgba>) -> Self {
        Self { entries }
    }

    /// Linear grayscale ramp from black to white
    pub fn grayscale(size: usize) -> Self {
        let max = size.saturating_sub(1).max(1);
        let entries = (0..size)
            .map(|i| {
                let v = (i * 255 / max) as u8;
                Rgba::new(v, v, v, 255)
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, or black when the index is past the end
    pub fn entry(&self, index: usize) -> Rgba {
        self.entries.get(index).copied().unwrap_or(Rgba::BLACK)
    }

    /// Set an existing entry. Returns false if `index` is out of range.
    pub fn set_entry(&mut self, index: usize, color: Rgba) -> bool {
        match self.entries.get_mut(index) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[Rgba] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grayscale_ramp() {
        let pal = Palette::grayscale(256);
        assert_eq!(pal.len(), 256);
        assert_eq!(pal.entry(0), Rgba::new(0, 0, 0, 255));
        assert_eq!(pal.entry(255), Rgba::new(255, 255, 255, 255));
    }

    #[test]
    fn test_entry_out_of_range_is_black() {
        let mut pal = Palette::new(2);
        assert_eq!(pal.entry(10), Rgba::BLACK);
        assert!(!pal.set_entry(10, Rgba::new(1, 2, 3, 255)));
        assert!(pal.set_entry(1, Rgba::new(1, 2, 3, 255)));
        assert_eq!(pal.entry(1), Rgba::new(1, 2, 3, 255));
    }
}

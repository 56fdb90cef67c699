/// A single glyph as read from a BDF file. Rows of `bitmap` are packed
/// MSB-first, `bytes_per_row()` bytes each, top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Glyph {
    pub name: String,
    pub code: u32,
    pub width: u32,
    pub height: u32,
    pub x_offset: i32,
    pub bbx_y: i32,
    pub x_advance: u32,
    pub bitmap: Vec<u8>,
    /// Offset from the baseline to the top row, downward-positive
    pub y_offset: i32,
}

impl Glyph {
    pub fn bytes_per_row(&self) -> usize {
        bytes_per_row(self.width)
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height { return false; }
        let index = y as usize * self.bytes_per_row() + (x / 8) as usize;
        (self.bitmap[index] & (0x80 >> (x & 7))) != 0
    }
}

pub fn bytes_per_row(width: u32) -> usize {
    (width as usize + 7) / 8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(width: u32, height: u32, bitmap: Vec<u8>) -> Glyph {
        Glyph{ name: "test".to_string(), code: 0, width, height, x_offset: 0, bbx_y: 0, x_advance: width, bitmap, y_offset: -(height as i32) }
    }

    #[test]
    fn bytes_per_row_rounds_up() {
        assert_eq!(bytes_per_row(0), 0);
        assert_eq!(bytes_per_row(1), 1);
        assert_eq!(bytes_per_row(8), 1);
        assert_eq!(bytes_per_row(9), 2);
        assert_eq!(bytes_per_row(16), 2);
        assert_eq!(bytes_per_row(17), 3);
    }

    #[test]
    fn pixels_are_msb_first() {
        // 10 pixels wide: 1000000001 padded to 16 bits
        let g = glyph(10, 1, vec![ 0x80, 0x40 ]);
        assert!(g.get_pixel(0, 0));
        assert!(!g.get_pixel(1, 0));
        assert!(g.get_pixel(9, 0));
        assert!(!g.get_pixel(10, 0));
        assert!(!g.get_pixel(0, 1));
    }
}

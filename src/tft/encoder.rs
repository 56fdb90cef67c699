use anyhow::{anyhow, Context, Result};

use crate::bdf::{glyph, parser::BdfFont};

/// One entry of the glyph table, laid out like `GFXglyph`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphEntry {
    pub code: u16,
    pub bitmap_offset: u16,
    pub width: u8,
    pub height: u8,
    pub x_advance: u8,
    pub x_offset: i8,
    pub y_offset: i8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSummary {
    pub first: u16,
    pub last: u16,
    pub y_advance: u8,
}

#[derive(Debug)]
pub struct FontAtlas {
    pub bitmap: Vec<u8>,
    pub glyphs: Vec<GlyphEntry>,
    pub summary: FontSummary,
}

fn field<T: TryFrom<V>, V: Copy + std::fmt::Display>(code: u32, name: &str, value: V) -> Result<T> {
    T::try_from(value).map_err(|_| anyhow!("glyph 0x{:04x}: {} {} does not fit the glyph table", code, name, value))
}

impl GlyphEntry {
    pub fn bitmap_len(&self) -> usize {
        self.height as usize * glyph::bytes_per_row(self.width.into())
    }

    /// Calls `plot` for every set pixel, relative to the top-left of the bounding box
    pub fn render(&self, bitmap: &[u8], plot: &mut dyn FnMut(u16, u16)) -> Result<()> {
        let start = self.bitmap_offset as usize;
        let pixels = bitmap.get(start..start + self.bitmap_len())
            .ok_or_else(|| anyhow!("glyph 0x{:04x}: bitmap at {} exceeds blob of {} bytes", self.code, start, bitmap.len()))?;
        let stride = glyph::bytes_per_row(self.width.into());
        for y in 0..self.height as usize {
            let row = &pixels[y * stride..(y + 1) * stride];
            for x in 0..self.width as usize {
                if (row[x / 8] & (0x80 >> (x & 7))) != 0 {
                    plot(x as u16, y as u16);
                }
            }
        }
        Ok(())
    }
}

impl FontAtlas {
    pub fn find(&self, code: u16) -> Option<&GlyphEntry> {
        self.glyphs.binary_search_by_key(&code, |g| g.code).ok().map(|n| &self.glyphs[n])
    }
}

pub fn encode(font: &BdfFont) -> Result<FontAtlas> {
    let (Some(first), Some(last)) = (font.glyphs.first(), font.glyphs.last()) else {
        return Err(anyhow!("no glyphs found in input"));
    };
    if font.glyphs.windows(2).any(|pair| pair[0].code > pair[1].code) {
        return Err(anyhow!("glyphs must be sorted by code"));
    }

    let mut bitmap: Vec<u8> = Vec::new();
    let mut glyphs = Vec::with_capacity(font.glyphs.len());
    for g in &font.glyphs {
        glyphs.push(GlyphEntry{
            code: field(g.code, "code", g.code)?,
            bitmap_offset: field(g.code, "bitmap offset", bitmap.len())?,
            width: field(g.code, "width", g.width)?,
            height: field(g.code, "height", g.height)?,
            x_advance: field(g.code, "x advance", g.x_advance)?,
            x_offset: field(g.code, "x offset", g.x_offset)?,
            y_offset: field(g.code, "y offset", g.y_offset)?,
        });
        bitmap.extend_from_slice(&g.bitmap);
    }

    let y_advance = font.ascent.checked_add(font.descent)
        .and_then(|h| u8::try_from(h).ok())
        .with_context(|| format!("line height {} + {} does not fit the font record", font.ascent, font.descent))?;
    let summary = FontSummary{
        first: field(first.code, "code", first.code)?,
        last: field(last.code, "code", last.code)?,
        y_advance,
    };

    log::info!("encoded {} glyphs (0x{:x}..0x{:x}) into {} bitmap bytes", glyphs.len(), summary.first, summary.last, bitmap.len());
    Ok(FontAtlas{ bitmap, glyphs, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdf::glyph::Glyph;

    fn glyph(code: u32, width: u32, height: u32, fill: u8) -> Glyph {
        let bitmap = vec![ fill; height as usize * glyph::bytes_per_row(width) ];
        Glyph{ name: format!("g{}", code), code, width, height, x_offset: 0, bbx_y: 0, x_advance: width, bitmap, y_offset: -(height as i32) }
    }

    fn font(glyphs: Vec<Glyph>) -> BdfFont {
        BdfFont{ ascent: 6, descent: 2, glyphs }
    }

    #[test]
    fn single_glyph_atlas() {
        let atlas = encode(&font(vec![ glyph(65, 8, 8, 0xff) ])).unwrap();
        assert_eq!(atlas.bitmap, vec![ 0xff; 8 ]);
        assert_eq!(atlas.glyphs, vec![ GlyphEntry{ code: 0x41, bitmap_offset: 0, width: 8, height: 8, x_advance: 8, x_offset: 0, y_offset: -8 } ]);
        assert_eq!(atlas.summary, FontSummary{ first: 0x41, last: 0x41, y_advance: 8 });
    }

    #[test]
    fn offsets_partition_the_blob() {
        let glyphs = vec![ glyph(32, 0, 0, 0), glyph(33, 3, 7, 1), glyph(34, 12, 5, 2), glyph(40, 9, 1, 8), glyph(41, 16, 16, 9) ];
        let lengths: Vec<usize> = glyphs.iter().map(|g| g.bitmap.len()).collect();
        let atlas = encode(&font(glyphs)).unwrap();

        assert_eq!(atlas.bitmap.len(), lengths.iter().sum::<usize>());
        assert_eq!(atlas.glyphs[0].bitmap_offset, 0);
        for (n, pair) in atlas.glyphs.windows(2).enumerate() {
            assert_eq!(pair[0].bitmap_offset as usize + lengths[n], pair[1].bitmap_offset as usize);
            assert_eq!(pair[0].bitmap_len(), lengths[n]);
        }
        for entry in &atlas.glyphs {
            let start = entry.bitmap_offset as usize;
            let fill = (entry.code - 32) as u8;
            assert!(atlas.bitmap[start..start + entry.bitmap_len()].iter().all(|b| *b == fill));
        }
        assert_eq!(atlas.summary.first, 32);
        assert_eq!(atlas.summary.last, 41);
    }

    #[test]
    fn second_offset_is_first_length() {
        let atlas = encode(&font(vec![ glyph(65, 5, 3, 0x80), glyph(66, 8, 8, 0x01) ])).unwrap();
        assert_eq!(atlas.glyphs[1].bitmap_offset, 3);
        assert_eq!(atlas.find(66).map(|g| g.bitmap_offset), Some(3));
        assert!(atlas.find(67).is_none());
    }

    #[test]
    fn empty_font_is_an_error() {
        let err = encode(&font(Vec::new())).unwrap_err();
        assert_eq!(err.to_string(), "no glyphs found in input");
    }

    #[test]
    fn unsorted_glyphs_are_rejected() {
        assert!(encode(&font(vec![ glyph(66, 8, 1, 0), glyph(65, 8, 1, 0) ])).is_err());
    }

    #[test]
    fn out_of_range_fields_are_errors() {
        let err = encode(&font(vec![ glyph(65, 300, 1, 0) ])).unwrap_err();
        assert!(err.to_string().contains("width 300"));

        let mut g = glyph(65, 8, 1, 0);
        g.x_offset = -129;
        assert!(encode(&font(vec![ g ])).unwrap_err().to_string().contains("x offset -129"));

        let err = encode(&font(vec![ glyph(0x10000, 8, 1, 0) ])).unwrap_err();
        assert!(err.to_string().contains("code 65536"));

        let err = encode(&BdfFont{ ascent: 200, descent: 100, glyphs: vec![ glyph(65, 8, 1, 0) ] }).unwrap_err();
        assert!(err.to_string().contains("line height"));
    }

    #[test]
    fn bitmap_offset_must_fit_u16() {
        // 255 pixels wide (32 bytes) x 255 rows per glyph
        let glyphs: Vec<Glyph> = (0..10).map(|n| Glyph{ y_offset: 0, ..glyph(n, 255, 255, 0) }).collect();
        let err = encode(&font(glyphs)).unwrap_err();
        assert_eq!(err.to_string(), "glyph 0x0009: bitmap offset 73440 does not fit the glyph table");
    }

    #[test]
    fn render_reads_entry_from_blob() {
        let mut g = glyph(65, 3, 2, 0);
        g.bitmap = vec![ 0xa0, 0x40 ];
        let atlas = encode(&font(vec![ glyph(64, 8, 1, 0xff), g ])).unwrap();
        let mut pixels = Vec::new();
        atlas.find(65).unwrap().render(&atlas.bitmap, &mut |x, y| pixels.push((x, y))).unwrap();
        assert_eq!(pixels, vec![ (0, 0), (2, 0), (1, 1) ]);
    }
}

use std::io::{Cursor, Write};

use anyhow::{anyhow, Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use packed_struct::prelude::*;

use crate::tft::encoder::{FontAtlas, FontSummary, GlyphEntry};

pub const MAGIC: [u8; 4] = *b"GFXF";
pub const HEADER_SIZE: usize = 16;

/// On-disk glyph: the code followed by the `GFXglyph` fields, 9 bytes
#[derive(PackedStruct, Debug, PartialEq)]
#[packed_struct(endian="lsb")]
pub struct GlyphRecord {
    pub code: u16,
    pub bitmap_offset: u16,
    pub width: u8,
    pub height: u8,
    pub x_advance: u8,
    pub x_offset: i8,
    pub y_offset: i8,
}

impl From<&GlyphEntry> for GlyphRecord {
    fn from(g: &GlyphEntry) -> Self {
        Self{ code: g.code, bitmap_offset: g.bitmap_offset, width: g.width, height: g.height, x_advance: g.x_advance, x_offset: g.x_offset, y_offset: g.y_offset }
    }
}

impl From<GlyphRecord> for GlyphEntry {
    fn from(r: GlyphRecord) -> Self {
        Self{ code: r.code, bitmap_offset: r.bitmap_offset, width: r.width, height: r.height, x_advance: r.x_advance, x_offset: r.x_offset, y_offset: r.y_offset }
    }
}

pub fn write_atlas<W: Write>(out: &mut W, atlas: &FontAtlas) -> Result<()> {
    let glyph_count = u16::try_from(atlas.glyphs.len()).context("too many glyphs for binary atlas")?;
    let bitmap_len = u32::try_from(atlas.bitmap.len()).context("bitmap too large for binary atlas")?;

    out.write_all(&MAGIC)?;
    out.write_u16::<LittleEndian>(atlas.summary.first)?;
    out.write_u16::<LittleEndian>(atlas.summary.last)?;
    out.write_u8(atlas.summary.y_advance)?;
    out.write_u8(0)?;
    out.write_u16::<LittleEndian>(glyph_count)?;
    out.write_u32::<LittleEndian>(bitmap_len)?;

    for g in &atlas.glyphs {
        let record = GlyphRecord::from(g).pack()
            .map_err(|e| anyhow!("glyph 0x{:04x}: unable to pack record: {:?}", g.code, e))?;
        out.write_all(&record)?;
    }
    out.write_all(&atlas.bitmap)?;
    Ok(())
}

pub fn read_atlas(data: &[u8]) -> Result<FontAtlas> {
    if data.len() < HEADER_SIZE || data[0..4] != MAGIC {
        return Err(anyhow!("not a binary font atlas"));
    }
    let mut rdr = Cursor::new(&data[4..HEADER_SIZE]);
    let first = rdr.read_u16::<LittleEndian>()?;
    let last = rdr.read_u16::<LittleEndian>()?;
    let y_advance = rdr.read_u8()?;
    let _reserved = rdr.read_u8()?;
    let glyph_count = rdr.read_u16::<LittleEndian>()? as usize;
    let bitmap_len = rdr.read_u32::<LittleEndian>()? as usize;

    let record_size = std::mem::size_of::<<GlyphRecord as PackedStruct>::ByteArray>();
    let table_end = HEADER_SIZE + glyph_count * record_size;
    if data.len() != table_end + bitmap_len {
        return Err(anyhow!("atlas is {} bytes, expected {}", data.len(), table_end + bitmap_len));
    }

    let mut glyphs = Vec::with_capacity(glyph_count);
    for (n, chunk) in data[HEADER_SIZE..table_end].chunks(record_size).enumerate() {
        let record = GlyphRecord::unpack_from_slice(chunk)
            .map_err(|e| anyhow!("glyph record {}: {:?}", n, e))?;
        glyphs.push(GlyphEntry::from(record));
    }
    if glyphs.windows(2).any(|pair| pair[0].code >= pair[1].code) {
        return Err(anyhow!("glyph records are not sorted by code"));
    }

    let bitmap = data[table_end..].to_vec();
    Ok(FontAtlas{ bitmap, glyphs, summary: FontSummary{ first, last, y_advance } })
}

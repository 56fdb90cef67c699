use std::io::Write;

use anyhow::{anyhow, Result};

use crate::tft::encoder::FontAtlas;

pub struct HeaderOptions {
    /// Symbol prefix: `<name>Bitmaps`, `<name>Glyphs` and `<name>`
    pub name: String,
    pub progmem: bool,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self{ name: "Font".to_string(), progmem: true }
    }
}

pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    };
    if !valid {
        return Err(anyhow!("'{}' is not a valid C identifier", name));
    }
    Ok(())
}

fn write_typedefs<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "// typedef struct {{")?;
    writeln!(out, "//   uint16_t bitmapOffset;")?;
    writeln!(out, "//   uint8_t  width;")?;
    writeln!(out, "//   uint8_t  height;")?;
    writeln!(out, "//   uint8_t  xAdvance;")?;
    writeln!(out, "//   int8_t   xOffset;")?;
    writeln!(out, "//   int8_t   yOffset;")?;
    writeln!(out, "// }} GFXglyph;")?;
    writeln!(out)?;
    writeln!(out, "// typedef struct {{")?;
    writeln!(out, "//   uint8_t  *bitmap;")?;
    writeln!(out, "//   GFXglyph *glyph;")?;
    writeln!(out, "//   uint16_t  first;")?;
    writeln!(out, "//   uint16_t  last;")?;
    writeln!(out, "//   uint8_t   yAdvance;")?;
    writeln!(out, "// }} GFXfont;")?;
    writeln!(out)?;
    Ok(())
}

pub fn write_header<W: Write>(out: &mut W, atlas: &FontAtlas, options: &HeaderOptions) -> Result<()> {
    validate_identifier(&options.name)?;
    let name = &options.name;
    let progmem = if options.progmem { " PROGMEM" } else { "" };

    write_typedefs(out)?;

    // rows are purely cosmetic, the blob is flat
    let group = atlas.summary.y_advance as usize;
    write!(out, "const uint8_t {}Bitmaps[]{} = {{\n  ", name, progmem)?;
    for (n, b) in atlas.bitmap.iter().enumerate() {
        if n > 0 && group > 0 && n % group == 0 {
            write!(out, "\n  ")?;
        }
        write!(out, "0x{:02X}, ", b)?;
    }
    write!(out, "\n}};\n\n")?;

    writeln!(out, "const GFXglyph {}Glyphs[]{} = {{", name, progmem)?;
    for g in &atlas.glyphs {
        writeln!(out, "  {{ {:5}, {:2}, {:2}, {:2}, {:3}, {:3} }}, // 0x{:04X}",
            g.bitmap_offset, g.width, g.height, g.x_advance, g.x_offset, g.y_offset, g.code)?;
    }
    write!(out, "}};\n\n")?;

    writeln!(out, "const GFXfont {}{} = {{", name, progmem)?;
    writeln!(out, "  (uint8_t*){}Bitmaps,", name)?;
    writeln!(out, "  (GFXglyph*){}Glyphs,", name)?;
    writeln!(out, "  0x{:x}, 0x{:x}, {}", atlas.summary.first, atlas.summary.last, atlas.summary.y_advance)?;
    writeln!(out, "}};")?;
    Ok(())
}

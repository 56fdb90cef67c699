extern crate bdf2tft;

use std::env;

use anyhow::{anyhow, Result};
use bdf2tft::{
    bdf::parser,
    tft::{binary, encoder},
};
use bmp::{Image, Pixel, px};

const SHEET_WIDTH: u32 = 256;

fn usage(args: &[String]) -> anyhow::Error {
    anyhow!("usage: {} font.bdf|atlas.bin out.bmp", args.first().map_or("draw-atlas", String::as_str))
}

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        return Err(usage(&args));
    }
    let font_data = std::fs::read(&args[1])?;

    let atlas = if font_data.starts_with(&binary::MAGIC) {
        binary::read_atlas(&font_data)?
    } else {
        encoder::encode(&parser::parse(font_data.as_slice())?)?
    };

    // lay out cells first so the sheet can be sized
    let line_height = atlas.glyphs.iter().map(|g| g.height as u32)
        .fold(atlas.summary.y_advance as u32, u32::max)
        .max(1);
    let mut cells = Vec::with_capacity(atlas.glyphs.len());
    let mut base_x: u32 = 0;
    let mut base_y: u32 = 0;
    for glyph in &atlas.glyphs {
        let cell_width = (glyph.width.max(glyph.x_advance) as u32).max(1);
        if base_x + cell_width > SHEET_WIDTH {
            base_x = 0;
            base_y += line_height;
        }
        cells.push((base_x, base_y));
        base_x += cell_width;
    }

    let mut img = Image::new(SHEET_WIDTH, base_y + line_height);
    for (glyph, (x0, y0)) in atlas.glyphs.iter().zip(cells) {
        glyph.render(&atlas.bitmap, &mut |x, y| {
            let (x, y) = (x0 + x as u32, y0 + y as u32);
            if x < SHEET_WIDTH {
                img.set_pixel(x, y, px!(255, 0, 0));
            }
        })?;
    }

    img.save(&args[2])?;
    log::info!("rendered {} glyphs to {}", atlas.glyphs.len(), args[2]);
    Ok(())
}

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use crate::bdf::glyph::{self, Glyph};

#[derive(Debug)]
pub struct BdfFont {
    pub ascent: i32,
    pub descent: i32,
    /// Sorted by code, codes are unique
    pub glyphs: Vec<Glyph>,
}

struct GlyphBuilder {
    name: String,
    encoding: Option<i64>,
    width: u32,
    height: u32,
    x_offset: i32,
    bbx_y: i32,
    x_advance: u32,
    bytes_per_row: Option<usize>,
    bitmap: Vec<u8>,
    rows: u32,
}

enum State {
    Idle,
    InGlyph(GlyphBuilder),
    InBitmap(GlyphBuilder),
}

struct Parser {
    state: State,
    ascent: i32,
    descent: i32,
    chars: Option<usize>,
    glyph_blocks: usize,
    glyphs: Vec<Glyph>,
}

fn parse_arg<T: FromStr>(args: &[&str], index: usize, keyword: &str) -> Result<T>
    where T::Err: std::error::Error + Send + Sync + 'static
{
    let arg = args.get(index).ok_or_else(|| anyhow!("{}: missing argument {}", keyword, index + 1))?;
    arg.parse::<T>().with_context(|| format!("{}: invalid argument {} '{}'", keyword, index + 1, arg))
}

fn decode_hex_row(row: &str) -> Result<Vec<u8>> {
    if row.len() % 2 != 0 {
        return Err(anyhow!("bitmap row '{}' has an odd number of hex digits", row));
    }
    let mut bytes = Vec::with_capacity(row.len() / 2);
    for pair in row.as_bytes().chunks(2) {
        let digits = std::str::from_utf8(pair).ok()
            .filter(|s| s.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| anyhow!("bitmap row '{}' contains a non-hex character", row))?;
        bytes.push(u8::from_str_radix(digits, 16)?);
    }
    Ok(bytes)
}

impl GlyphBuilder {
    fn new(name: String) -> Self {
        Self{ name, encoding: None, width: 0, height: 0, x_offset: 0, bbx_y: 0, x_advance: 0, bytes_per_row: None, bitmap: Vec::new(), rows: 0 }
    }

    fn push_row(&mut self, row: &str) -> Result<()> {
        let expected = self.bytes_per_row.unwrap_or(0);
        let bytes = decode_hex_row(row)?;
        if bytes.len() != expected {
            return Err(anyhow!("glyph '{}': expected {} bytes, got {}", self.name, expected, bytes.len()));
        }
        self.bitmap.extend_from_slice(&bytes);
        self.rows += 1;
        Ok(())
    }

    /// Returns None for glyphs that do not map to a code point
    fn build(self) -> Result<Option<Glyph>> {
        if self.rows != self.height {
            return Err(anyhow!("glyph '{}': BBX declares {} rows, but bitmap has {}", self.name, self.height, self.rows));
        }
        let encoding = self.encoding.ok_or_else(|| anyhow!("glyph '{}' has no ENCODING", self.name))?;
        if encoding < 0 {
            log::warn!("glyph '{}' is unencoded, skipping", self.name);
            return Ok(None);
        }
        let code = u32::try_from(encoding).with_context(|| format!("glyph '{}': encoding {} out of range", self.name, encoding))?;

        let y_offset = i32::try_from(self.height).ok()
            .and_then(|height| self.bbx_y.checked_add(height))
            .and_then(i32::checked_neg)
            .ok_or_else(|| anyhow!("glyph '{}': vertical offset overflows", self.name))?;

        log::debug!("glyph '{}': code 0x{:04x} {}x{} offset ({}, {}) advance {}",
            self.name, code, self.width, self.height, self.x_offset, y_offset, self.x_advance);
        Ok(Some(Glyph{
            name: self.name,
            code,
            width: self.width,
            height: self.height,
            x_offset: self.x_offset,
            bbx_y: self.bbx_y,
            x_advance: self.x_advance,
            bitmap: self.bitmap,
            y_offset,
        }))
    }

    fn apply(mut self, keyword: &str, args: &[&str]) -> Result<State> {
        match keyword {
            "ENCODING" => {
                let encoding: i64 = parse_arg(args, 0, keyword)?;
                self.encoding = Some(encoding);
            },
            "DWIDTH" => {
                self.x_advance = parse_arg(args, 0, keyword)?;
                // vertical advance is not part of the target format
                let _: i32 = parse_arg(args, 1, keyword)?;
            },
            "BBX" => {
                self.width = parse_arg(args, 0, keyword)?;
                self.height = parse_arg(args, 1, keyword)?;
                self.x_offset = parse_arg(args, 2, keyword)?;
                self.bbx_y = parse_arg(args, 3, keyword)?;
                self.bytes_per_row = Some(glyph::bytes_per_row(self.width));
            },
            "BITMAP" => {
                if self.bytes_per_row.is_none() {
                    return Err(anyhow!("glyph '{}': BITMAP before BBX", self.name));
                }
                self.bitmap.clear();
                self.rows = 0;
                return Ok(State::InBitmap(self));
            },
            "ENDCHAR" => {
                return Err(anyhow!("glyph '{}': ENDCHAR without BITMAP", self.name));
            },
            _ => { }
        }
        Ok(State::InGlyph(self))
    }
}

impl Parser {
    fn new() -> Self {
        Self{ state: State::Idle, ascent: 0, descent: 0, chars: None, glyph_blocks: 0, glyphs: Vec::new() }
    }

    fn feed(&mut self, line: &str) -> Result<()> {
        let state = std::mem::replace(&mut self.state, State::Idle);
        self.state = self.next_state(state, line)?;
        Ok(())
    }

    fn next_state(&mut self, state: State, line: &str) -> Result<State> {
        if let State::InBitmap(mut builder) = state {
            let row = line.trim();
            if row == "ENDCHAR" {
                self.glyph_blocks += 1;
                if let Some(glyph) = builder.build()? {
                    self.glyphs.push(glyph);
                }
                return Ok(State::Idle);
            }
            if row.starts_with("STARTCHAR") {
                return Err(anyhow!("glyph '{}' has no ENDCHAR", builder.name));
            }
            builder.push_row(row)?;
            return Ok(State::InBitmap(builder));
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some((keyword, args)) = fields.split_first() else { return Ok(state) };
        match *keyword {
            "FONT_ASCENT" => { self.ascent = parse_arg(args, 0, keyword)?; },
            "FONT_DESCENT" => { self.descent = parse_arg(args, 0, keyword)?; },
            "CHARS" => { self.chars = Some(parse_arg(args, 0, keyword)?); },
            "STARTCHAR" => {
                if let State::InGlyph(builder) = &state {
                    log::warn!("glyph '{}' has no ENDCHAR, discarding", builder.name);
                }
                return Ok(State::InGlyph(GlyphBuilder::new(args.join(" "))));
            },
            _ => { }
        }

        match state {
            State::InGlyph(builder) => builder.apply(keyword, args),
            state => Ok(state),
        }
    }

    fn finish(mut self) -> Result<BdfFont> {
        match &self.state {
            State::Idle => { },
            State::InGlyph(builder) | State::InBitmap(builder) => {
                return Err(anyhow!("unexpected end of input inside glyph '{}'", builder.name));
            }
        }
        if let Some(chars) = self.chars {
            if chars != self.glyph_blocks {
                log::warn!("CHARS declares {} glyphs, but {} were found", chars, self.glyph_blocks);
            }
        }

        self.glyphs.sort_by_key(|g| g.code);
        if let Some(pair) = self.glyphs.windows(2).find(|pair| pair[0].code == pair[1].code) {
            return Err(anyhow!("duplicate code 0x{:04x} (glyphs '{}' and '{}')", pair[0].code, pair[0].name, pair[1].name));
        }

        log::info!("parsed {} glyphs, ascent {} descent {}", self.glyphs.len(), self.ascent, self.descent);
        Ok(BdfFont{ ascent: self.ascent, descent: self.descent, glyphs: self.glyphs })
    }
}

pub fn parse<R: BufRead>(reader: R) -> Result<BdfFont> {
    let mut parser = Parser::new();
    // metadata such as COPYRIGHT may carry Latin-1 bytes
    for (n, line) in reader.split(b'\n').enumerate() {
        let line = line.context("unable to read input")?;
        let line = String::from_utf8_lossy(&line);
        parser.feed(line.trim_end_matches('\r')).with_context(|| format!("line {}", n + 1))?;
    }
    parser.finish()
}

pub fn parse_file(path: &Path) -> Result<BdfFont> {
    let file = File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
    parse(BufReader::new(file)).with_context(|| format!("unable to parse {}", path.display()))
}

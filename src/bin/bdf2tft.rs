extern crate bdf2tft;

use std::path::PathBuf;

use anyhow::{Context, Result};
use bdf2tft::{
    bdf::parser,
    tft::{binary, encoder, header},
};
use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// C header with GFXfont declarations
    Header,
    /// Packed little-endian atlas
    Binary,
}

/// Converts BDF bitmap fonts to GFXfont glyph atlases
#[derive(Parser)]
struct Cli {
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
    #[clap(long, default_value = "Font")]
    /// Symbol prefix for the generated declarations
    name: String,
    #[clap(long, value_enum, default_value_t=OutputFormat::Header)]
    /// Output format
    format: OutputFormat,
    #[clap(long, default_value_t=false)]
    /// Do not place tables in PROGMEM
    no_progmem: bool,
    /// Input BDF font
    input: PathBuf,
    /// Output file
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let options = header::HeaderOptions{ name: args.name.clone(), progmem: !args.no_progmem };
    header::validate_identifier(&options.name)?;

    let font = parser::parse_file(&args.input)?;
    let atlas = encoder::encode(&font)?;

    let mut output: Vec<u8> = Vec::new();
    match args.format {
        OutputFormat::Header => { header::write_header(&mut output, &atlas, &options)?; },
        OutputFormat::Binary => { binary::write_atlas(&mut output, &atlas)?; },
    }

    std::fs::write(&args.output, &output)
        .with_context(|| format!("unable to write {}", args.output.display()))?;
    log::info!("wrote {} bytes to {}", output.len(), args.output.display());
    Ok(())
}

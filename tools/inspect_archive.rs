use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use glyph_dataset::{
    application::{decoder::RecordDecoder, pipeline::read_archive, ports::NoLabels},
    domain::{value_objects::FormatTag, FieldKind, RecordLayout},
};

/// Print the record layout of an archive family and the metadata of
/// records decoded from one archive file.
#[derive(Parser)]
#[command(name = "inspect_archive")]
struct Cli {
    /// Archive family (8g or 9g)
    #[arg(short, long, default_value = "9g")]
    format: FormatTag,

    /// Archive file to decode
    #[arg(long)]
    file: Option<PathBuf>,

    /// Number of records to print
    #[arg(short, long, default_value_t = 5)]
    limit: usize,

    /// Print the field table of the layout
    #[arg(long)]
    layout: bool,
}

fn print_layout(layout: &RecordLayout) {
    println!(
        "Format {}: {} bytes per record, {}x{} sample ({} packed bytes)",
        layout.format(),
        layout.record_size(),
        layout.sample_width(),
        layout.sample_height(),
        layout.sample_byte_count()
    );
    for spec in layout.fields() {
        let kind = match spec.kind {
            FieldKind::Unsigned(_) => "uint-be",
            FieldKind::Text(_) => "text",
            FieldKind::Reserved => "reserved",
            FieldKind::Pixels => "pixels",
        };
        println!(
            "  {:>5} {:>5}  {:<9} {}",
            spec.offset, spec.width, kind, spec.name
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let layout = RecordLayout::for_format(cli.format)
        .with_context(|| format!("No layout for format {}", cli.format))?;
    if cli.layout || cli.file.is_none() {
        print_layout(layout);
    }

    let Some(file) = cli.file else {
        return Ok(());
    };

    let size = std::fs::metadata(&file)
        .with_context(|| format!("Failed to stat {:?}", file))?
        .len() as usize;
    let available = size / layout.record_size();
    let trailing = size % layout.record_size();
    println!(
        "{:?}: {} bytes, {} whole records, {} trailing bytes",
        file, size, available, trailing
    );

    let decoder = RecordDecoder::new(layout.clone(), Arc::new(NoLabels));
    let records = read_archive(&file, &decoder, available.min(cli.limit))
        .with_context(|| format!("Failed to decode {:?}", file))?;

    for (index, record) in records.iter().enumerate() {
        let json = serde_json::to_string(record.metadata())?;
        println!("{:>6} {}", index, json);
    }

    Ok(())
}

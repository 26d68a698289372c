//! Compress command implementation.

use super::CodecOptions;
use crate::utils::{compressed_path, create_progress_bar, ensure_distinct, savings_percent};
use std::fs::File;
use std::path::Path;

pub fn cmd_compress(
    input: &Path,
    output: Option<&Path>,
    options: &CodecOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let length = std::fs::metadata(input)?.len();
    let output = output.map_or_else(|| compressed_path(input), Path::to_path_buf);
    ensure_distinct(input, &output)?;

    let source = File::open(input)?;
    let sink = File::create(&output)?;
    let config = options.config(length);

    let pb = create_progress_bar(length, options.progress);
    pb.set_message("compressing");
    let summary = oxihuf::encode_observed(&config, pb.wrap_read(source), sink, |info| {
        tracing::trace!(?info, "chunk written");
    })?;
    pb.finish_and_clear();

    if options.verbose {
        println!("Compressed: {} -> {}", input.display(), output.display());
        println!("  Chunks: {}", summary.chunks);
        println!("  Original size: {} bytes", summary.bytes_read);
        println!("  Compressed size: {} bytes", summary.bytes_written);
        println!(
            "  Compression ratio: {:.1}%",
            savings_percent(summary.bytes_read, summary.bytes_written)
        );
    }

    Ok(())
}

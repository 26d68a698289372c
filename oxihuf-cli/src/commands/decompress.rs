//! Decompress command implementation.

use super::CodecOptions;
use crate::utils::{create_progress_bar, decompressed_path, ensure_distinct};
use std::fs::File;
use std::path::Path;

pub fn cmd_decompress(
    input: &Path,
    output: Option<&Path>,
    options: &CodecOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let length = std::fs::metadata(input)?.len();
    let output = output.map_or_else(|| decompressed_path(input), Path::to_path_buf);
    ensure_distinct(input, &output)?;

    let source = File::open(input)?;
    let sink = File::create(&output)?;
    let config = options.config(length);

    let pb = create_progress_bar(length, options.progress);
    pb.set_message("decompressing");
    let summary = oxihuf::decode(&config, pb.wrap_read(source), sink)?;
    pb.finish_and_clear();

    if options.verbose {
        println!("Decompressed: {} -> {}", input.display(), output.display());
        println!("  Chunks: {}", summary.chunks);
        println!("  Compressed size: {} bytes", summary.bytes_read);
        println!("  Original size: {} bytes", summary.bytes_written);
    }

    Ok(())
}

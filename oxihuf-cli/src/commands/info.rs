//! Info command implementation.

use crate::utils::savings_percent;
use oxihuf::{ChunkInfo, HufConfig};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// JSON serializable chunk data.
#[derive(Debug, Serialize, Deserialize)]
struct ChunkJson {
    index: usize,
    plaintext_length: u64,
    tree_elements: usize,
    packed_bytes: u64,
    compressed_length: u64,
}

impl ChunkJson {
    fn from_info(index: usize, info: &ChunkInfo) -> Self {
        Self {
            index,
            plaintext_length: info.plaintext_length,
            tree_elements: info.tree_elements,
            packed_bytes: info.packed_bytes,
            compressed_length: info.compressed_length(),
        }
    }
}

/// JSON output for a compressed file.
#[derive(Debug, Serialize, Deserialize)]
struct StreamInfoJson {
    file: String,
    compressed_size: u64,
    original_size: u64,
    savings_percent: f64,
    chunks: Vec<ChunkJson>,
}

pub fn cmd_info(input: &Path, json: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let length = std::fs::metadata(input)?.len();
    let reader = BufReader::new(File::open(input)?);

    let mut chunks = Vec::new();
    let summary = oxihuf::decode_observed(
        &HufConfig::new(length),
        reader,
        std::io::sink(),
        |info| chunks.push(ChunkJson::from_info(chunks.len(), info)),
    )?;

    if json {
        let report = StreamInfoJson {
            file: input.display().to_string(),
            compressed_size: summary.bytes_read,
            original_size: summary.bytes_written,
            savings_percent: savings_percent(summary.bytes_written, summary.bytes_read),
            chunks,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Stream Information");
    println!("==================");
    println!("File: {}", input.display());
    println!("Compressed size: {} bytes", summary.bytes_read);
    println!("Original size: {} bytes", summary.bytes_written);
    println!("Chunks: {}", summary.chunks);
    if summary.bytes_written > 0 {
        println!(
            "Compression ratio: {:.1}%",
            savings_percent(summary.bytes_written, summary.bytes_read)
        );
    }

    if verbose && !chunks.is_empty() {
        println!();
        println!(
            "{:>6} {:>12} {:>6} {:>12} {:>12}",
            "Chunk", "Original", "Tree", "Payload", "On disk"
        );
        for chunk in &chunks {
            println!(
                "{:>6} {:>12} {:>6} {:>12} {:>12}",
                chunk.index,
                chunk.plaintext_length,
                chunk.tree_elements,
                chunk.packed_bytes,
                chunk.compressed_length
            );
        }
    }

    Ok(())
}

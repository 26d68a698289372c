//! OxiHuf CLI - streaming Huffman compression
//!
//! Compresses and decompresses files chunk by chunk, and reports the chunk
//! layout of compressed files.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{CodecOptions, cmd_compress, cmd_decompress, cmd_info};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oxihuf")]
#[command(author, version, about = "Streaming Huffman compressor - Pure Rust")]
#[command(long_about = "
OxiHuf compresses files with per-chunk Huffman trees. Every chunk carries its
own tree, so memory use is bounded by the chunk size.

Examples:
  oxihuf compress data.bin
  oxihuf compress data.bin --chunk-size 65536 -o data.huf
  oxihuf decompress data.bin.huf
  oxihuf info data.bin.huf --json
")]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file
    #[command(alias = "c")]
    Compress {
        /// File to compress
        input: PathBuf,

        /// Output file (default: input with a .huf suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Plaintext bytes per chunk (0 = whole file in one chunk)
        #[arg(short, long, default_value_t = 0)]
        chunk_size: u64,

        /// Read and write buffer size in bytes (0 = 64 KiB)
        #[arg(short, long, default_value_t = 0)]
        buffer_size: usize,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Decompress a file
    #[command(alias = "d")]
    Decompress {
        /// File to decompress
        input: PathBuf,

        /// Output file (default: input without its .huf suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Read and write buffer size in bytes (0 = 64 KiB)
        #[arg(short, long, default_value_t = 0)]
        buffer_size: usize,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Show the chunk layout of a compressed file
    #[command(alias = "i")]
    Info {
        /// Compressed file to inspect
        input: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            chunk_size,
            buffer_size,
            progress,
        } => cmd_compress(
            &input,
            output.as_deref(),
            &CodecOptions {
                chunk_size,
                buffer_size,
                progress,
                verbose: cli.verbose,
            },
        ),
        Commands::Decompress {
            input,
            output,
            buffer_size,
            progress,
        } => cmd_decompress(
            &input,
            output.as_deref(),
            &CodecOptions {
                chunk_size: 0,
                buffer_size,
                progress,
                verbose: cli.verbose,
            },
        ),
        Commands::Info { input, json } => cmd_info(&input, json, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

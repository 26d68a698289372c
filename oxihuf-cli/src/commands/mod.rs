//! Command implementations for OxiHuf CLI.

pub mod compress;
pub mod decompress;
pub mod info;

pub use compress::cmd_compress;
pub use decompress::cmd_decompress;
pub use info::cmd_info;

use oxihuf::HufConfig;

/// Options shared by the compress and decompress commands.
pub struct CodecOptions {
    pub chunk_size: u64,
    pub buffer_size: usize,
    pub progress: bool,
    pub verbose: bool,
}

impl CodecOptions {
    /// Stream configuration for `length` input bytes.
    pub fn config(&self, length: u64) -> HufConfig {
        HufConfig::new(length)
            .with_chunk_size(self.chunk_size)
            .with_buffer_size(self.buffer_size)
    }
}

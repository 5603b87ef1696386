//! ZIP archive parsing and entry reading.
//!
//! - [`structures`]: fixed-layout records (EOCD, ZIP64 records, headers)
//! - [`parser`]: locates and decodes those records from a [`ReadAt`](crate::io::ReadAt) source
//! - [`archive`]: entry listing and decompression for callers
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions
//! - STORED and DEFLATE methods, CRC-32 verified
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod archive;
mod parser;
mod structures;

pub use archive::ZipArchive;
pub use parser::ZipParser;
pub use structures::*;

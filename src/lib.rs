//! # docximg
//!
//! Extract the images embedded in a Word `.docx` document.
//!
//! A `.docx` file is a zip archive; pictures live as plain members under
//! `word/media/`. This crate reads the archive directly (central directory,
//! ZIP64, STORED and DEFLATE members) and copies each picture out under a
//! sequential name.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let records = docximg::extract(Path::new("report.docx"), Path::new("images")).await?;
//!     for record in &records {
//!         println!("{} -> {}", record.original, record.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod io;
pub mod media;
pub mod zip;

pub use cli::Cli;
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use media::{ExtractionRecord, MediaExtractor, Progress, extract};
pub use zip::{ZipArchive, ZipEntry};

use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipEntry};

/// Upper bound on DEFLATE expansion (32 KiB window, 258-byte matches).
const MAX_DEFLATE_RATIO: u64 = 1032;

/// An opened zip archive with its central directory already read.
pub struct ZipArchive<R: ReadAt> {
    parser: ZipParser<R>,
    entries: Vec<ZipEntry>,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Parse the central directory of `reader`.
    ///
    /// # Errors
    ///
    /// Fails if the source is not a zip archive or its directory is
    /// truncated.
    pub async fn open(reader: Arc<R>) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let entries = parser.list_entries().await?;
        tracing::debug!(entries = entries.len(), "archive opened");
        Ok(Self { parser, entries })
    }

    /// Entries in the order they are stored in the central directory.
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Read and decompress one entry into memory.
    ///
    /// The result is checked against the recorded size and CRC-32.
    pub async fn read(&self, entry: &ZipEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            bail!("{} is encrypted, which is not supported", entry.name);
        }

        let data_offset = self.parser.data_offset(entry).await?;
        let archive_size = self.parser.reader().size();
        match data_offset.checked_add(entry.compressed_size) {
            Some(end) if end <= archive_size => {}
            _ => bail!(
                "Entry {} claims {} bytes at offset {}, past the end of the archive ({} bytes)",
                entry.name,
                entry.compressed_size,
                data_offset,
                archive_size
            ),
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await
            .with_context(|| format!("Truncated data for {}", entry.name))?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                let hint = entry
                    .uncompressed_size
                    .min(entry.compressed_size.saturating_mul(MAX_DEFLATE_RATIO));
                let mut out = Vec::with_capacity(hint as usize);
                // One byte past the declared size is enough to detect a lie.
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)
                    .with_context(|| format!("Failed to inflate {}", entry.name))?;
                out
            }
            CompressionMethod::Unknown(method) => bail!(
                "Unsupported compression method {} for {} (only STORED and DEFLATE are supported)",
                method,
                entry.name
            ),
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!(
                "Bad CRC-32 for {}: expected {:08x}, got {:08x}",
                entry.name,
                entry.crc32,
                crc.sum()
            );
        }

        Ok(data)
    }
}

use super::ReadAt;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::File;
use std::path::Path;

/// Container file on the local filesystem.
///
/// The handle is closed when the reader is dropped.
pub struct LocalFileReader {
    file: File,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open container {}", path.display()))?;
        let size = file.metadata()?.len();
        tracing::debug!(path = %path.display(), size, "opened container");
        Ok(Self { file, size })
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            Ok(self.file.read_at(buf, offset)?)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            Ok(self.file.seek_read(buf, offset)?)
        }

        #[cfg(not(any(unix, windows)))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let mut file = &self.file;
            file.seek(SeekFrom::Start(offset))?;
            Ok(file.read(buf)?)
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_file_at_offset() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blob.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let reader = LocalFileReader::new(&path).unwrap();
        assert_eq!(reader.size(), 10);

        let mut buf = [0u8; 3];
        reader.read_exact_at(7, &mut buf).await.unwrap();
        assert_eq!(&buf, b"789");
    }

    #[test]
    fn test_missing_file_names_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope.docx");
        let err = LocalFileReader::new(&path).err().unwrap();
        assert!(format!("{err}").contains("nope.docx"));
    }
}

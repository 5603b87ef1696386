//! Builds small zip containers for the integration tests.

#![allow(dead_code)]

use flate2::Compression;
use flate2::Crc;
use flate2::write::DeflateEncoder;
use std::io::Write;

struct Member {
    name: String,
    method: u16,
    crc: u32,
    payload: Vec<u8>,
    size: u64,
    declared_compressed: Option<u64>,
    lfh_offset: u64,
}

impl Member {
    fn compressed_size(&self) -> u64 {
        self.declared_compressed
            .unwrap_or(self.payload.len() as u64)
    }
}

/// In-memory zip writer supporting STORED and DEFLATE members.
///
/// In ZIP64 mode every central header saturates its 32-bit size and offset
/// slots and carries the real values in a ZIP64 extra field, and the
/// archive ends with a ZIP64 EOCD record and locator.
#[derive(Default)]
pub struct ZipBuilder {
    members: Vec<Member>,
    corrupt_crc: Option<usize>,
    zip64: bool,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    pub fn stored(mut self, name: &str, data: &[u8]) -> Self {
        self.push(name, 0, data.to_vec(), data);
        self
    }

    pub fn deflated(mut self, name: &str, data: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        let payload = encoder.finish().unwrap();
        self.push(name, 8, payload, data);
        self
    }

    pub fn directory(mut self, name: &str) -> Self {
        self.push(name, 0, Vec::new(), &[]);
        self
    }

    /// Record a wrong CRC for the most recently added member.
    pub fn with_bad_crc(mut self) -> Self {
        self.corrupt_crc = Some(self.members.len() - 1);
        self
    }

    /// Declare a compressed size for the most recently added member that
    /// differs from the bytes actually stored.
    pub fn with_compressed_size(mut self, size: u64) -> Self {
        if let Some(m) = self.members.last_mut() {
            m.declared_compressed = Some(size);
        }
        self
    }

    fn push(&mut self, name: &str, method: u16, payload: Vec<u8>, original: &[u8]) {
        let mut crc = Crc::new();
        crc.update(original);
        self.members.push(Member {
            name: name.to_string(),
            method,
            crc: crc.sum(),
            payload,
            size: original.len() as u64,
            declared_compressed: None,
            lfh_offset: 0,
        });
    }

    pub fn build(mut self) -> Vec<u8> {
        if let Some(i) = self.corrupt_crc {
            self.members[i].crc ^= 0xDEAD_BEEF;
        }

        let mut out = Vec::new();
        for m in &mut self.members {
            m.lfh_offset = out.len() as u64;
            out.extend_from_slice(b"PK\x03\x04");
            out.extend_from_slice(&20u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&m.method.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0x5821u16.to_le_bytes());
            out.extend_from_slice(&m.crc.to_le_bytes());
            out.extend_from_slice(&(m.payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&(m.size as u32).to_le_bytes());
            out.extend_from_slice(&(m.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(m.name.as_bytes());
            out.extend_from_slice(&m.payload);
        }

        let cd_offset = out.len() as u64;
        for m in &self.members {
            let (compressed, uncompressed, lfh_offset, extra) = if self.zip64 {
                let mut extra = Vec::new();
                extra.extend_from_slice(&0x0001u16.to_le_bytes());
                extra.extend_from_slice(&24u16.to_le_bytes());
                extra.extend_from_slice(&m.size.to_le_bytes());
                extra.extend_from_slice(&m.compressed_size().to_le_bytes());
                extra.extend_from_slice(&m.lfh_offset.to_le_bytes());
                (u32::MAX, u32::MAX, u32::MAX, extra)
            } else {
                (
                    m.compressed_size() as u32,
                    m.size as u32,
                    m.lfh_offset as u32,
                    Vec::new(),
                )
            };

            out.extend_from_slice(b"PK\x01\x02");
            out.extend_from_slice(&45u16.to_le_bytes());
            out.extend_from_slice(&45u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&m.method.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0x5821u16.to_le_bytes());
            out.extend_from_slice(&m.crc.to_le_bytes());
            out.extend_from_slice(&compressed.to_le_bytes());
            out.extend_from_slice(&uncompressed.to_le_bytes());
            out.extend_from_slice(&(m.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
            out.extend_from_slice(&[0u8; 10]); // comment, disk, attrs
            out.extend_from_slice(&lfh_offset.to_le_bytes());
            out.extend_from_slice(m.name.as_bytes());
            out.extend_from_slice(&extra);
        }
        let cd_size = out.len() as u64 - cd_offset;
        let count = self.members.len() as u64;

        if self.zip64 {
            let eocd64_offset = out.len() as u64;
            out.extend_from_slice(b"PK\x06\x06");
            out.extend_from_slice(&44u64.to_le_bytes()); // size of remaining record
            out.extend_from_slice(&45u16.to_le_bytes());
            out.extend_from_slice(&45u16.to_le_bytes());
            out.extend_from_slice(&[0u8; 8]); // disks
            out.extend_from_slice(&count.to_le_bytes());
            out.extend_from_slice(&count.to_le_bytes());
            out.extend_from_slice(&cd_size.to_le_bytes());
            out.extend_from_slice(&cd_offset.to_le_bytes());

            out.extend_from_slice(b"PK\x06\x07");
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&eocd64_offset.to_le_bytes());
            out.extend_from_slice(&1u32.to_le_bytes());

            out.extend_from_slice(b"PK\x05\x06");
            out.extend_from_slice(&[0u8; 4]);
            out.extend_from_slice(&u16::MAX.to_le_bytes());
            out.extend_from_slice(&u16::MAX.to_le_bytes());
            out.extend_from_slice(&u32::MAX.to_le_bytes());
            out.extend_from_slice(&u32::MAX.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
        } else {
            out.extend_from_slice(b"PK\x05\x06");
            out.extend_from_slice(&[0u8; 4]);
            out.extend_from_slice(&(count as u16).to_le_bytes());
            out.extend_from_slice(&(count as u16).to_le_bytes());
            out.extend_from_slice(&(cd_size as u32).to_le_bytes());
            out.extend_from_slice(&(cd_offset as u32).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
        }
        out
    }
}

/// A plausible document: XML parts plus two pictures.
pub fn sample_docx() -> Vec<u8> {
    ZipBuilder::new()
        .deflated("[Content_Types].xml", b"<Types/>")
        .deflated("word/document.xml", b"<w:document/>")
        .stored("word/media/image1.jpeg", b"\xFF\xD8\xFF\xE0jpeg-bytes")
        .deflated("word/media/image2.gif", b"GIF89a gif-bytes gif-bytes gif-bytes")
        .build()
}

//! Index of the packed sound archive.
//!
//! The archive starts with a little-endian u32 record count followed by
//! fixed 52-byte headers: a NUL-padded 40-byte name and three u32 fields
//! (file offset, compressed size, decompressed size).

use std::collections::BTreeMap;
use std::io::Read;
use std::mem::size_of;

use bytemuck::{Pod, Zeroable};

use crate::catalog::fixed_name;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct RawArchiveHeader {
    pub(crate) name: [u8; 40],
    pub(crate) offset: u32,
    pub(crate) compressed_size: u32,
    pub(crate) decompressed_size: u32,
}

/// On-disk size of one archive header. Any other size is a different,
/// unsupported archive revision.
pub const ARCHIVE_HEADER_SIZE: usize = 52;

const _: () = assert!(size_of::<RawArchiveHeader>() == ARCHIVE_HEADER_SIZE);

/// Location and sizes of one sound inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub offset: u32,
    pub compressed_size: u32,
    pub decompressed_size: u32,
}

impl ArchiveRecord {
    /// Whether the payload is stored without compression.
    pub fn is_raw(&self) -> bool {
        self.compressed_size >= self.decompressed_size
    }
}

/// Sound records keyed by lowercase name, iterated in name order.
#[derive(Debug, Default, Clone)]
pub struct ArchiveIndex {
    records: BTreeMap<String, ArchiveRecord>,
}

impl ArchiveIndex {
    /// Read the header block from the start of an archive.
    pub fn read_from(reader: &mut impl Read) -> std::io::Result<Self> {
        let mut count = [0u8; 4];
        reader.read_exact(&mut count)?;
        let count = u32::from_le_bytes(count);

        let mut records = BTreeMap::new();
        let mut buf = [0u8; ARCHIVE_HEADER_SIZE];
        for _ in 0..count {
            reader.read_exact(&mut buf)?;
            let raw: RawArchiveHeader = bytemuck::pod_read_unaligned(&buf);
            records.insert(
                fixed_name(&raw.name).to_lowercase(),
                ArchiveRecord {
                    offset: raw.offset,
                    compressed_size: raw.compressed_size,
                    decompressed_size: raw.decompressed_size,
                },
            );
        }

        Ok(Self { records })
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&ArchiveRecord> {
        self.records.get(&name.to_lowercase())
    }

    /// The `n`-th record in name order.
    pub fn record_at(&self, n: usize) -> Option<(&str, &ArchiveRecord)> {
        self.records
            .iter()
            .nth(n)
            .map(|(name, record)| (name.as_str(), record))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArchiveRecord)> {
        self.records.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(name: &str, offset: u32, compressed: u32, decompressed: u32) -> Vec<u8> {
        let mut raw = RawArchiveHeader::zeroed();
        raw.name[..name.len()].copy_from_slice(name.as_bytes());
        raw.offset = offset;
        raw.compressed_size = compressed;
        raw.decompressed_size = decompressed;
        bytemuck::bytes_of(&raw).to_vec()
    }

    fn index_bytes(headers: &[Vec<u8>]) -> Vec<u8> {
        let mut data = (headers.len() as u32).to_le_bytes().to_vec();
        for h in headers {
            data.extend_from_slice(h);
        }
        data
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let data = index_bytes(&[header("Door1", 100, 50, 50)]);
        let index = ArchiveIndex::read_from(&mut Cursor::new(data)).unwrap();

        let record = index.get("DOOR1").unwrap();
        assert_eq!(record.offset, 100);
        assert!(record.is_raw());
        assert!(index.get("door2").is_none());
    }

    #[test]
    fn ordinal_follows_name_order() {
        let data = index_bytes(&[
            header("zap", 10, 1, 1),
            header("alarm", 20, 1, 1),
            header("middle", 30, 1, 1),
        ]);
        let index = ArchiveIndex::read_from(&mut Cursor::new(data)).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.record_at(0).unwrap().0, "alarm");
        assert_eq!(index.record_at(2).unwrap().1.offset, 10);
        assert!(index.record_at(3).is_none());
    }

    #[test]
    fn truncated_header_block_is_an_error() {
        let mut data = index_bytes(&[header("a", 0, 1, 1)]);
        data[0] = 2;
        assert!(ArchiveIndex::read_from(&mut Cursor::new(data)).is_err());
    }

    #[test]
    fn compressed_record_is_not_raw() {
        let record = ArchiveRecord {
            offset: 0,
            compressed_size: 10,
            decompressed_size: 40,
        };
        assert!(!record.is_raw());
    }
}

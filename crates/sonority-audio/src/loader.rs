//! Reads sound payloads out of the packed archive.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use tracing::info;

use crate::archive::{ArchiveIndex, ArchiveRecord};
use crate::catalog::CatalogEntry;
use crate::error::AudioError;

/// Locates, reads and decompresses sounds from an archive.
///
/// Failures are returned, not logged.
///
/// The loader keeps no payload cache; decoded sources are memoized one
/// level up, in [`crate::SourceCache`].
pub struct SoundLoader<R = BufReader<File>> {
    path: PathBuf,
    reader: R,
    index: ArchiveIndex,
}

impl SoundLoader {
    /// Open an archive file and read its index.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| AudioError::Io(path.clone(), e))?;
        let loader = Self::with_path(BufReader::new(file), path)?;
        info!(
            "Sound archive {} opened: {} records",
            loader.path.display(),
            loader.index.len()
        );
        Ok(loader)
    }
}

impl<R: Read + Seek> SoundLoader<R> {
    /// Read the index from an already-open archive stream.
    pub fn from_reader(reader: R) -> Result<Self, AudioError> {
        Self::with_path(reader, PathBuf::from("<memory>"))
    }

    fn with_path(mut reader: R, path: PathBuf) -> Result<Self, AudioError> {
        let index = ArchiveIndex::read_from(&mut reader).map_err(|e| AudioError::Io(path.clone(), e))?;
        Ok(Self {
            path,
            reader,
            index,
        })
    }

    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }

    /// Load a sound by case-insensitive name.
    pub fn load_by_name(&mut self, name: &str) -> Result<Vec<u8>, AudioError> {
        let Some(record) = self.index.get(name).copied() else {
            return Err(AudioError::NotInArchive(name.to_string()));
        };
        self.read_record(name, record)
    }

    /// Load the `n`-th record in index order.
    pub fn load_by_ordinal(&mut self, n: usize) -> Result<Vec<u8>, AudioError> {
        let Some((name, record)) = self.index.record_at(n) else {
            return Err(AudioError::OrdinalOutOfRange(n));
        };
        let (name, record) = (name.to_string(), *record);
        self.read_record(&name, record)
    }

    /// Load the payload for a catalog entry. Unnamed entries fall back to
    /// the record whose ordinal equals the sound id.
    pub fn load_entry(&mut self, entry: &CatalogEntry) -> Result<Vec<u8>, AudioError> {
        if entry.name.is_empty() {
            self.load_by_ordinal(entry.id.0 as usize)
        } else {
            self.load_by_name(&entry.name)
        }
    }

    fn read_record(&mut self, name: &str, record: ArchiveRecord) -> Result<Vec<u8>, AudioError> {
        self.reader
            .seek(SeekFrom::Start(u64::from(record.offset)))
            .map_err(|e| AudioError::Io(self.path.clone(), e))?;

        if record.is_raw() {
            if record.decompressed_size == 0 {
                return Err(AudioError::EmptySound(name.to_string()));
            }
            let mut data = vec![0u8; record.decompressed_size as usize];
            self.reader
                .read_exact(&mut data)
                .map_err(|e| AudioError::Io(self.path.clone(), e))?;
            return Ok(data);
        }

        let mut packed = vec![0u8; record.compressed_size as usize];
        self.reader
            .read_exact(&mut packed)
            .map_err(|e| AudioError::Io(self.path.clone(), e))?;
        inflate(name, &packed, record.decompressed_size as usize)
    }
}

/// Inflate a zlib stream to exactly `expected` bytes.
fn inflate(name: &str, packed: &[u8], expected: usize) -> Result<Vec<u8>, AudioError> {
    let mut data = Vec::with_capacity(expected);
    ZlibDecoder::new(packed)
        .take(expected as u64 + 1)
        .read_to_end(&mut data)
        .map_err(|e| AudioError::Decompress {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

    if data.len() != expected {
        return Err(AudioError::Decompress {
            name: name.to_string(),
            reason: format!("expected {} bytes, got {}", expected, data.len()),
        });
    }
    Ok(data)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::archive::ARCHIVE_HEADER_SIZE;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use sonority_core::SoundId;
    use std::io::{Cursor, Write};

    /// Payload stored in an in-memory archive.
    pub(crate) enum Stored<'a> {
        Raw(&'a [u8]),
        Compressed(&'a [u8]),
        /// Header only, with the given sizes and no data.
        Header(u32, u32),
    }

    /// Build an archive image. Payloads are laid out after the header block.
    pub(crate) fn build_archive(entries: &[(&str, Stored<'_>)]) -> Vec<u8> {
        let mut payloads = Vec::new();
        let mut headers = Vec::new();
        let data_start = 4 + entries.len() * ARCHIVE_HEADER_SIZE;

        for (name, stored) in entries {
            let offset = (data_start + payloads.len()) as u32;
            let (compressed, decompressed) = match stored {
                Stored::Raw(bytes) => {
                    payloads.extend_from_slice(bytes);
                    (bytes.len() as u32, bytes.len() as u32)
                }
                Stored::Compressed(bytes) => {
                    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                    encoder.write_all(bytes).unwrap();
                    let packed = encoder.finish().unwrap();
                    payloads.extend_from_slice(&packed);
                    (packed.len() as u32, bytes.len() as u32)
                }
                Stored::Header(compressed, decompressed) => (*compressed, *decompressed),
            };

            let mut name_buf = [0u8; 40];
            name_buf[..name.len()].copy_from_slice(name.as_bytes());
            headers.extend_from_slice(&name_buf);
            headers.extend_from_slice(&offset.to_le_bytes());
            headers.extend_from_slice(&compressed.to_le_bytes());
            headers.extend_from_slice(&decompressed.to_le_bytes());
        }

        let mut image = (entries.len() as u32).to_le_bytes().to_vec();
        image.extend(headers);
        image.extend(payloads);
        image
    }

    pub(crate) fn loader_for(entries: &[(&str, Stored<'_>)]) -> SoundLoader<Cursor<Vec<u8>>> {
        SoundLoader::from_reader(Cursor::new(build_archive(entries))).unwrap()
    }

    fn entry(id: u32, name: &str) -> CatalogEntry {
        CatalogEntry {
            id: SoundId(id),
            name: name.to_string(),
            category: crate::SoundCategory::Level,
            flags: crate::SoundFlags::empty(),
        }
    }

    #[test]
    fn raw_record_round_trips_unchanged() {
        let payload: Vec<u8> = (0..50).collect();
        let mut loader = loader_for(&[("door1", Stored::Raw(&payload))]);

        let data = loader.load_by_name("Door1").unwrap();
        assert_eq!(data, payload);
    }

    #[test]
    fn compressed_record_inflates_to_declared_size() {
        let payload = vec![7u8; 4000];
        let mut loader = loader_for(&[("wind", Stored::Compressed(&payload))]);

        let record = *loader.index().get("wind").unwrap();
        assert!(record.compressed_size < record.decompressed_size);

        let data = loader.load_by_name("wind").unwrap();
        assert_eq!(data.len(), 4000);
        assert_eq!(data, payload);
    }

    #[test]
    fn missing_name_is_distinct_from_empty() {
        let mut loader = loader_for(&[("silence", Stored::Header(0, 0))]);

        assert!(matches!(
            loader.load_by_name("nothing"),
            Err(AudioError::NotInArchive(_))
        ));
        assert!(matches!(
            loader.load_by_name("silence"),
            Err(AudioError::EmptySound(_))
        ));
    }

    #[test]
    fn errors_name_the_sound() {
        let mut loader = loader_for(&[("silence", Stored::Header(0, 0))]);
        let missing = loader.load_by_name("Nothing").unwrap_err().to_string();
        let empty = loader.load_by_name("silence").unwrap_err().to_string();
        assert!(missing.contains("'Nothing'"), "{}", missing);
        assert!(empty.contains("'silence'"), "{}", empty);
    }

    #[test]
    fn corrupt_stream_fails_only_that_request() {
        let good = [1u8, 2, 3];
        let mut archive = build_archive(&[
            ("bad", Stored::Header(4, 100)),
            ("good", Stored::Raw(&good)),
        ]);
        // Give the "bad" record four bytes of garbage at the end of the image.
        let bad_offset = archive.len() as u32;
        archive.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        archive[4 + 40..4 + 44].copy_from_slice(&bad_offset.to_le_bytes());

        let mut loader = SoundLoader::from_reader(Cursor::new(archive)).unwrap();
        assert!(matches!(
            loader.load_by_name("bad"),
            Err(AudioError::Decompress { .. })
        ));
        assert_eq!(loader.load_by_name("good").unwrap(), good);
    }

    #[test]
    fn short_stream_is_a_decompress_error() {
        let payload = vec![9u8; 64];
        let mut archive = build_archive(&[("short", Stored::Compressed(&payload))]);
        // Claim more output than the stream holds.
        let sizes = 4 + 40 + 8;
        archive[sizes..sizes + 4].copy_from_slice(&200u32.to_le_bytes());

        let mut loader = SoundLoader::from_reader(Cursor::new(archive)).unwrap();
        assert!(matches!(
            loader.load_by_name("short"),
            Err(AudioError::Decompress { .. })
        ));
    }

    #[test]
    fn ordinal_lookup() {
        let mut loader = loader_for(&[("b", Stored::Raw(b"bee")), ("a", Stored::Raw(b"ay"))]);

        assert_eq!(loader.load_by_ordinal(0).unwrap(), b"ay");
        assert_eq!(loader.load_by_ordinal(1).unwrap(), b"bee");
        assert!(matches!(
            loader.load_by_ordinal(2),
            Err(AudioError::OrdinalOutOfRange(2))
        ));
    }

    #[test]
    fn unnamed_entry_loads_by_ordinal() {
        let mut loader = loader_for(&[("a", Stored::Raw(b"first")), ("b", Stored::Raw(b"second"))]);

        assert_eq!(loader.load_entry(&entry(1, "")).unwrap(), b"second");
        assert_eq!(loader.load_entry(&entry(99, "a")).unwrap(), b"first");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = SoundLoader::open("/nonexistent/sounds/audio.snd");
        assert!(matches!(result, Err(AudioError::Io(_, _))));
    }
}

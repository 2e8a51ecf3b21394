//! Sound catalog: the static mapping from sound id to name, category and
//! flags, loaded from the game's binary sound description tables.

use std::collections::BTreeMap;
use std::mem::size_of;

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use sonority_core::SoundId;
use tracing::{debug, info};

use crate::error::AudioError;

/// Category of a catalog sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCategory {
    Level,
    System,
    Swap,
    Unknown,
    Lock,
}

impl SoundCategory {
    /// Decode the on-disk category code. Codes outside the known set map to `Unknown`.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => SoundCategory::Level,
            1 => SoundCategory::System,
            2 => SoundCategory::Swap,
            4 => SoundCategory::Lock,
            _ => SoundCategory::Unknown,
        }
    }
}

bitflags! {
    /// Per-sound flags from the description tables.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SoundFlags: u32 {
        const LOCKED = 0x1;
        const POSITIONAL = 0x2;
    }
}

/// One sound known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: SoundId,
    /// Archive name of the sound. Empty for unnamed "bonus" sounds.
    pub name: String,
    pub category: SoundCategory,
    pub flags: SoundFlags,
}

impl CatalogEntry {
    pub fn is_positional(&self) -> bool {
        self.flags.contains(SoundFlags::POSITIONAL)
    }

    pub fn is_locked(&self) -> bool {
        self.flags.contains(SoundFlags::LOCKED)
    }
}

/// Record layout shared by every supported table revision.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SoundDescRecord {
    name: [u8; 32],
    sound_id: u32,
    category: u32,
    flags: u32,
    data_ids: [u32; 17],
}

/// Extended record: the shared layout plus fields this crate does not consume.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SoundDescRecordExt {
    base: SoundDescRecord,
    positional_id: u32,
    decompressed: u32,
}

const _: () = assert!(size_of::<SoundDescRecord>() == 112);
const _: () = assert!(size_of::<SoundDescRecordExt>() == 120);

/// Revision of a sound description table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// 112-byte records.
    Legacy,
    /// 120-byte records.
    Extended,
    /// A revision whose records cannot be decoded. Must be empty.
    Unsupported,
}

impl TableFormat {
    /// Size in bytes of one record, when known.
    pub fn record_size(self) -> Option<usize> {
        match self {
            TableFormat::Legacy => Some(size_of::<SoundDescRecord>()),
            TableFormat::Extended => Some(size_of::<SoundDescRecordExt>()),
            TableFormat::Unsupported => None,
        }
    }
}

/// A raw description table: a little-endian u32 element count followed by
/// fixed-size records.
#[derive(Debug, Clone, Copy)]
pub struct DescriptionTable<'a> {
    pub format: TableFormat,
    pub data: &'a [u8],
}

impl<'a> DescriptionTable<'a> {
    pub fn new(format: TableFormat, data: &'a [u8]) -> Self {
        Self { format, data }
    }

    /// Declared element count. Tables too short to hold a count are empty.
    pub fn count(&self) -> usize {
        match self.data.get(..4) {
            Some(bytes) => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
            None => 0,
        }
    }

    fn records(&self) -> Result<impl Iterator<Item = SoundDescRecord> + 'a, AudioError> {
        let count = self.count();
        let size = match self.format.record_size() {
            Some(size) => size,
            None if count == 0 => 0,
            None => return Err(AudioError::UnsupportedCatalogFormat(count)),
        };

        let body = self.data.get(4..).unwrap_or_default();
        let available = if size == 0 { 0 } else { body.len() / size };
        if count > available {
            return Err(AudioError::TruncatedTable {
                declared: count,
                available,
            });
        }

        let format = self.format;
        Ok(body.chunks(size.max(1)).take(count).map(move |chunk| match format {
            TableFormat::Extended => {
                bytemuck::pod_read_unaligned::<SoundDescRecordExt>(chunk).base
            }
            _ => bytemuck::pod_read_unaligned::<SoundDescRecord>(chunk),
        }))
    }
}

/// Decode a NUL-padded fixed-width name buffer.
pub(crate) fn fixed_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Mapping from sound id to catalog entry.
#[derive(Debug, Default, Clone)]
pub struct SoundCatalog {
    entries: BTreeMap<SoundId, CatalogEntry>,
}

impl SoundCatalog {
    /// Load the catalog from tables in order. Later tables overwrite earlier
    /// entries with the same id.
    pub fn load(tables: &[DescriptionTable<'_>]) -> Result<Self, AudioError> {
        let total: usize = tables.iter().map(DescriptionTable::count).sum();
        if total == 0 {
            return Err(AudioError::EmptyCatalog);
        }

        let mut entries = BTreeMap::new();
        for table in tables {
            for record in table.records()? {
                let entry = CatalogEntry {
                    id: SoundId(record.sound_id),
                    name: fixed_name(&record.name),
                    category: SoundCategory::from_code(record.category),
                    flags: SoundFlags::from_bits_truncate(record.flags),
                };
                if let Some(previous) = entries.insert(entry.id, entry) {
                    debug!("Sound {} ('{}') overridden", previous.id, previous.name);
                }
            }
        }

        info!("Sound catalog loaded: {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Load the three game tables with the game's precedence: the extended
    /// table first, then the legacy table on top of it. The third table is
    /// a revision with no decoder and must be empty.
    pub fn from_game_tables(
        legacy: Option<&[u8]>,
        extended: Option<&[u8]>,
        unsupported: Option<&[u8]>,
    ) -> Result<Self, AudioError> {
        let mut tables = Vec::with_capacity(3);
        if let Some(data) = unsupported {
            tables.push(DescriptionTable::new(TableFormat::Unsupported, data));
        }
        if let Some(data) = extended {
            tables.push(DescriptionTable::new(TableFormat::Extended, data));
        }
        if let Some(data) = legacy {
            tables.push(DescriptionTable::new(TableFormat::Legacy, data));
        }
        Self::load(&tables)
    }

    /// Build a catalog directly from entries.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.id, e)).collect(),
        }
    }

    pub fn get(&self, id: SoundId) -> Option<&CatalogEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }
}

//! The art database context
//!
//! [`ArtDatabase`] owns the string interner and the device registry. Data
//! blobs are decoded in full before anything is registered, so a blob that
//! fails to decode leaves the database exactly as it was.

use std::io::Read;
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, info};

use crate::config::{ArtConfig, FallbackConfig};
use crate::controls::DeviceKind;
use crate::error::ArtError;
use crate::format::{self, RawDatabase};
use crate::guid::vid_pid_key;
use crate::intern::StringInterner;
use crate::record::{ControlItem, DeviceRecord};
use crate::registry::Registry;
use crate::resolve::{self, Resolution};

/// Interned strings plus every registered device record
#[derive(Debug)]
pub struct ArtDatabase {
    interner: StringInterner,
    registry: Registry<DeviceRecord>,
    fallback: FallbackConfig,
    initialized: bool,
}

impl Default for ArtDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtDatabase {
    /// Create an empty, initialized database
    pub fn new() -> Self {
        Self {
            interner: StringInterner::new(),
            registry: Registry::new(),
            fallback: FallbackConfig::default(),
            initialized: true,
        }
    }

    /// Create a database and load every file listed in `config`
    pub fn from_config(config: &ArtConfig) -> Result<Self, ArtError> {
        let mut db = Self::new();
        db.fallback = config.fallback.clone();
        for path in &config.database.files {
            db.add_data_from_file(path)?;
        }
        Ok(db)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&self) -> Result<(), ArtError> {
        if self.initialized {
            Ok(())
        } else {
            Err(ArtError::NotInitialized)
        }
    }

    /// Release every record and string.
    ///
    /// Handles created earlier keep working since they own their text.
    /// Anything else called afterwards fails with [`ArtError::NotInitialized`].
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        debug!(
            keys = self.registry.len(),
            strings = self.interner.len(),
            "Shutting down art database"
        );
        self.registry.clear();
        self.interner.clear();
        self.initialized = false;
    }

    /// Device type used as the last resort for `kind`
    pub fn fallback_for(&self, kind: DeviceKind) -> &str {
        self.fallback.for_kind(kind)
    }

    /// Decode `buf` and register its devices.
    ///
    /// Returns the number of devices registered.
    pub fn add_data(&mut self, buf: &[u8]) -> Result<usize, ArtError> {
        self.ensure_initialized()?;
        let raw = format::decode(buf)?;
        debug!(
            version = raw.version,
            strings = raw.strings.len(),
            devices = raw.devices.len(),
            "Decoded art data"
        );
        self.commit(&raw)
    }

    pub fn add_data_from_reader(&mut self, mut reader: impl Read) -> Result<usize, ArtError> {
        self.ensure_initialized()?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.add_data(&buf)
    }

    pub fn add_data_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize, ArtError> {
        self.ensure_initialized()?;
        let path = path.as_ref();
        let buf = std::fs::read(path)?;
        let devices = self.add_data(&buf)?;
        info!(path = %path.display(), devices, "Loaded art database");
        Ok(devices)
    }

    fn commit(&mut self, raw: &RawDatabase<'_>) -> Result<usize, ArtError> {
        // Allocate everything up front: once interning starts nothing may fail.
        let mut records = Vec::new();
        records.try_reserve_exact(raw.devices.len())?;
        let mut item_lists: Vec<Vec<ControlItem>> = Vec::new();
        item_lists.try_reserve_exact(raw.devices.len())?;
        for device in &raw.devices {
            let mut items = Vec::new();
            items.try_reserve_exact(device.items.len())?;
            item_lists.push(items);
        }

        for (device, mut items) in raw.devices.iter().zip(item_lists) {
            for item in &device.items {
                items.push(ControlItem {
                    control: self.interner.intern(raw.string(item.control)),
                    svg: self.interner.intern(raw.string(item.image)),
                });
            }
            records.push(Rc::new(DeviceRecord {
                device_type: self.interner.intern(raw.string(device.devid)),
                inherits: device.inherits.map(|i| self.interner.intern(raw.string(i))),
                items,
                guids: device.guids.clone(),
            }));
        }

        let count = records.len();
        for record in records {
            self.register(record);
        }
        Ok(count)
    }

    fn register(&mut self, record: Rc<DeviceRecord>) {
        if let Some(previous) = self.registry.put(record.device_type.to_string(), &record) {
            // Keys that still reach the old definition follow the new one.
            let moved = self.registry.rebind(&previous, &record);
            debug!(
                device = %record.device_type,
                moved,
                "Replaced existing device definition"
            );
        }

        for guid in &record.guids {
            let key = guid.to_key();
            if let Some(masked) = vid_pid_key(&key) {
                self.registry.put(masked, &record);
            }
            self.registry.put(key, &record);
        }
    }

    /// Non-owning lookup by device type or GUID key
    pub fn record(&self, key: &str) -> Result<Option<&DeviceRecord>, ArtError> {
        self.ensure_initialized()?;
        Ok(self.registry.get(key).map(|record| &**record))
    }

    /// Number of keys sharing the record behind `key`, 0 if absent
    pub fn refcount(&self, key: &str) -> usize {
        self.registry.refcount(key)
    }

    /// Every registered device type, sorted
    pub fn device_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .registry
            .iter()
            .filter(|(key, record)| *key == &*record.device_type)
            .map(|(key, _)| key)
            .collect();
        types.sort_unstable();
        types
    }

    /// Every key pointing at the same record as `key`, sorted
    pub fn aliases(&self, key: &str) -> Vec<&str> {
        let mut keys = self
            .registry
            .get(key)
            .map(|record| self.registry.keys_for(record))
            .unwrap_or_default();
        keys.sort_unstable();
        keys
    }

    pub fn key_count(&self) -> usize {
        self.registry.len()
    }

    pub fn interned_len(&self) -> usize {
        self.interner.len()
    }

    /// Look up `key` and flatten it for `kind`
    pub fn resolve(&self, key: &str, kind: DeviceKind) -> Result<Resolution, ArtError> {
        let record = self
            .record(key)?
            .ok_or_else(|| ArtError::NotFound(key.to_string()))?;
        self.resolve_record(record, kind)
    }

    pub fn resolve_record(
        &self,
        record: &DeviceRecord,
        kind: DeviceKind,
    ) -> Result<Resolution, ArtError> {
        self.ensure_initialized()?;
        resolve::resolve(&self.registry, record, kind)
    }
}

impl Drop for ArtDatabase {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//! Binary database format
//!
//! Layout (all integers are big-endian `u16`):
//!
//! ```text
//! magic        8 bytes  "CTIMG\r\n\0"
//! version      u16
//! num_strings  u16
//! strings      num_strings x NUL-terminated UTF-8 (string #0 is "")
//! num_devices  u16
//! devices      num_devices x {
//!     devid      u16   string index, must be non-empty
//!     inherits   u16   0 = none, else string index, must be non-empty
//!     num_items  u16
//!     num_guids  u16   version >= 2 only
//!     items      num_items x { control u16, image u16 }
//!     guids      num_guids x 16 raw bytes
//! }
//! ```
//!
//! Decoding is split from registration: [`decode`] validates the whole blob
//! and returns a [`RawDatabase`] borrowing from the input buffer, so a
//! malformed blob never touches the registry.

use std::collections::HashMap;
use std::io::Write;

use tracing::debug;

use crate::error::ArtError;
use crate::guid::Guid;

/// File magic
pub const MAGIC: [u8; 8] = *b"CTIMG\r\n\0";

/// Newest format version this crate reads and writes.
///
/// 1: first public version
/// 2: devices carry lists of hardware GUIDs
pub const CURRENT_VERSION: u16 = 2;

/// Smallest possible blob: magic, version, string count and device count
pub const MIN_HEADER_LEN: usize = MAGIC.len() + 3 * 2;

/// One `(control, image)` pair, as string-table indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawItem {
    pub control: u16,
    pub image: u16,
}

/// A device entry as stored on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDevice {
    pub devid: u16,
    pub inherits: Option<u16>,
    pub items: Vec<RawItem>,
    pub guids: Vec<Guid>,
}

/// A fully validated blob, borrowing its strings from the input buffer
#[derive(Debug, Clone)]
pub struct RawDatabase<'a> {
    pub version: u16,
    pub strings: Vec<&'a str>,
    pub devices: Vec<RawDevice>,
}

impl<'a> RawDatabase<'a> {
    /// Resolve a string-table index. Indices were range-checked by [`decode`].
    pub fn string(&self, index: u16) -> &'a str {
        self.strings.get(usize::from(index)).copied().unwrap_or("")
    }
}

struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ArtError> {
        let end = self.pos.checked_add(len).ok_or(ArtError::UnexpectedEndOfData)?;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or(ArtError::UnexpectedEndOfData)?;
        self.pos = end;
        Ok(bytes)
    }

    fn u16(&mut self) -> Result<u16, ArtError> {
        let bytes = self.take(2)?;
        Ok((u16::from(bytes[0]) << 8) | u16::from(bytes[1]))
    }

    fn cstr(&mut self) -> Result<&'a str, ArtError> {
        let rest = self.buf.get(self.pos..).ok_or(ArtError::UnexpectedEndOfData)?;
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ArtError::UnexpectedEndOfData)?;
        let bytes = self.take(len + 1)?;
        std::str::from_utf8(&bytes[..len])
            .map_err(|e| ArtError::BogusData(format!("string is not UTF-8: {}", e)))
    }

    fn guid(&mut self) -> Result<Guid, ArtError> {
        let mut raw = [0u8; 16];
        raw.copy_from_slice(self.take(16)?);
        Ok(Guid(raw))
    }
}

/// Validate and parse a database blob
pub fn decode(buf: &[u8]) -> Result<RawDatabase<'_>, ArtError> {
    if buf.len() < MIN_HEADER_LEN {
        return Err(ArtError::BogusData(format!(
            "{} bytes is shorter than the {}-byte header",
            buf.len(),
            MIN_HEADER_LEN
        )));
    }
    if buf[..MAGIC.len()] != MAGIC {
        return Err(ArtError::BogusData("bad magic".to_string()));
    }

    let mut reader = ByteReader::new(buf, MAGIC.len());
    let version = reader.u16()?;
    if version > CURRENT_VERSION {
        return Err(ArtError::UnsupportedVersion {
            found: version,
            supported: CURRENT_VERSION,
        });
    }

    let num_strings = reader.u16()?;
    let mut strings = Vec::new();
    strings.try_reserve_exact(usize::from(num_strings))?;
    for _ in 0..num_strings {
        strings.push(reader.cstr()?);
    }

    let num_devices = reader.u16()?;
    debug!(version, num_strings, num_devices, "Decoding device database");

    let check = |index: u16, what: &str| -> Result<u16, ArtError> {
        if index >= num_strings {
            Err(ArtError::BogusData(format!(
                "{} index {} out of range ({} strings)",
                what, index, num_strings
            )))
        } else {
            Ok(index)
        }
    };
    let is_empty = |index: u16| strings.get(usize::from(index)).map_or(true, |s| s.is_empty());

    let mut devices = Vec::new();
    devices.try_reserve_exact(usize::from(num_devices))?;
    for _ in 0..num_devices {
        let devid = check(reader.u16()?, "device id")?;
        let inherits = match reader.u16()? {
            0 => None,
            index => Some(check(index, "inherits")?),
        };
        let num_items = reader.u16()?;
        // GUID lists arrived with version 2 of the format.
        let num_guids = if version >= 2 { reader.u16()? } else { 0 };

        if is_empty(devid) {
            return Err(ArtError::BogusData("empty device id".to_string()));
        }
        if inherits.is_some_and(is_empty) {
            return Err(ArtError::BogusData(format!(
                "device {:?} inherits from an empty name",
                strings[usize::from(devid)]
            )));
        }

        let mut items = Vec::new();
        items.try_reserve_exact(usize::from(num_items))?;
        for _ in 0..num_items {
            let control = check(reader.u16()?, "item type")?;
            let image = check(reader.u16()?, "item image")?;
            items.push(RawItem { control, image });
        }

        let mut guids = Vec::new();
        guids.try_reserve_exact(usize::from(num_guids))?;
        for _ in 0..num_guids {
            guids.push(reader.guid()?);
        }

        devices.push(RawDevice {
            devid,
            inherits,
            items,
            guids,
        });
    }

    Ok(RawDatabase {
        version,
        strings,
        devices,
    })
}

/// A device definition to be written by [`DatabaseWriter`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceEntry {
    pub devid: String,
    pub inherits: Option<String>,
    /// `(control name, svg text)` pairs, in order
    pub items: Vec<(String, String)>,
    pub guids: Vec<Guid>,
}

impl DeviceEntry {
    pub fn new(devid: impl Into<String>) -> Self {
        Self {
            devid: devid.into(),
            ..Self::default()
        }
    }

    pub fn inherits(mut self, parent: impl Into<String>) -> Self {
        self.inherits = Some(parent.into());
        self
    }

    pub fn item(mut self, control: impl Into<String>, svg: impl Into<String>) -> Self {
        self.items.push((control.into(), svg.into()));
        self
    }

    pub fn guid(mut self, guid: Guid) -> Self {
        self.guids.push(guid);
        self
    }
}

/// Serializes device definitions into the binary format
#[derive(Debug)]
pub struct DatabaseWriter {
    version: u16,
    strings: Vec<String>,
    index: HashMap<String, u16>,
    devices: Vec<RawDevice>,
}

impl DatabaseWriter {
    /// Start a database in the given format version
    pub fn new(version: u16) -> Result<Self, ArtError> {
        if version == 0 || version > CURRENT_VERSION {
            return Err(ArtError::UnsupportedVersion {
                found: version,
                supported: CURRENT_VERSION,
            });
        }
        let mut writer = Self {
            version,
            strings: Vec::new(),
            index: HashMap::new(),
            devices: Vec::new(),
        };
        // Index 0 doubles as "no inheritance", so it must never be a real name.
        writer.cache_string("")?;
        Ok(writer)
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn cache_string(&mut self, s: &str) -> Result<u16, ArtError> {
        if let Some(&index) = self.index.get(s) {
            return Ok(index);
        }
        let index = u16::try_from(self.strings.len())
            .map_err(|_| ArtError::InvalidArgument("too many unique strings".to_string()))?;
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), index);
        Ok(index)
    }

    /// Append a device definition
    pub fn add(&mut self, entry: &DeviceEntry) -> Result<(), ArtError> {
        if entry.devid.is_empty() {
            return Err(ArtError::InvalidArgument("empty device id".to_string()));
        }
        if entry.inherits.as_deref() == Some("") {
            return Err(ArtError::InvalidArgument(format!(
                "{}: empty inherits name",
                entry.devid
            )));
        }
        if self.version < 2 && !entry.guids.is_empty() {
            return Err(ArtError::InvalidArgument(format!(
                "{}: GUID lists need format version 2",
                entry.devid
            )));
        }
        if self.devices.len() >= usize::from(u16::MAX) {
            return Err(ArtError::InvalidArgument("too many devices".to_string()));
        }
        if entry.items.len() > usize::from(u16::MAX) || entry.guids.len() > usize::from(u16::MAX)
        {
            return Err(ArtError::InvalidArgument(format!(
                "{}: too many items or GUIDs",
                entry.devid
            )));
        }

        let devid = self.cache_string(&entry.devid)?;
        let inherits = match &entry.inherits {
            Some(parent) => Some(self.cache_string(parent)?),
            None => None,
        };
        let mut items = Vec::with_capacity(entry.items.len());
        for (control, svg) in &entry.items {
            items.push(RawItem {
                control: self.cache_string(control)?,
                image: self.cache_string(svg)?,
            });
        }

        self.devices.push(RawDevice {
            devid,
            inherits,
            items,
            guids: entry.guids.clone(),
        });
        Ok(())
    }

    /// Write the database to `out`
    pub fn write_to(&self, mut out: impl Write) -> std::io::Result<()> {
        // Counts were bounded when strings and devices were added.
        let count = |n: usize| u16::try_from(n).unwrap_or(u16::MAX).to_be_bytes();

        out.write_all(&MAGIC)?;
        out.write_all(&self.version.to_be_bytes())?;
        out.write_all(&count(self.strings.len()))?;
        for s in &self.strings {
            out.write_all(s.as_bytes())?;
            out.write_all(&[0])?;
        }
        out.write_all(&count(self.devices.len()))?;
        for device in &self.devices {
            out.write_all(&device.devid.to_be_bytes())?;
            out.write_all(&device.inherits.unwrap_or(0).to_be_bytes())?;
            out.write_all(&count(device.items.len()))?;
            if self.version >= 2 {
                out.write_all(&count(device.guids.len()))?;
            }
            for item in &device.items {
                out.write_all(&item.control.to_be_bytes())?;
                out.write_all(&item.image.to_be_bytes())?;
            }
            for guid in &device.guids {
                out.write_all(guid.as_bytes())?;
            }
        }
        Ok(())
    }

    /// Serialize to a byte vector
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing into a Vec can't fail.
        let _ = self.write_to(&mut buf);
        buf
    }
}

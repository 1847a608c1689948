//! Directory tree → binary database
//!
//! Layout: `<root>/<device type>/` holds one `<control>_<variant>.svg` per
//! item, an optional `inherits` file naming the parent type and an optional
//! `guids` file with one hex GUID per line.

use anyhow::{bail, Context, Result};
use padglyph_core::{DatabaseWriter, DeviceEntry, Guid};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const INHERITS_FILE: &str = "inherits";
const GUIDS_FILE: &str = "guids";

/// What a pack run produced
#[derive(Debug, Clone, Serialize)]
pub struct PackSummary {
    pub output: PathBuf,
    pub version: u16,
    pub devices: usize,
    pub strings: usize,
    pub bytes: usize,
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(true, |n| n.starts_with('.'));
        if !hidden {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_trimmed(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(text.trim_end().to_string())
}

fn parse_guids(path: &Path, text: &str) -> Result<Vec<Guid>> {
    let mut guids = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let guid = line
            .parse::<Guid>()
            .map_err(|e| anyhow::anyhow!("{}:{}: {}", path.display(), number + 1, e))?;
        guids.push(guid);
    }
    Ok(guids)
}

/// Read one device directory
pub fn read_device(dir: &Path) -> Result<DeviceEntry> {
    let Some(devid) = dir.file_name().and_then(|n| n.to_str()) else {
        bail!("{} is not a usable device name", dir.display());
    };
    let mut entry = DeviceEntry::new(devid);

    for path in sorted_entries(dir)? {
        if !path.is_file() {
            continue;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name == INHERITS_FILE {
            let parent = read_trimmed(&path)?;
            if !parent.is_empty() {
                entry = entry.inherits(parent);
            }
        } else if name == GUIDS_FILE {
            let text = fs::read_to_string(&path)?;
            entry.guids.extend(parse_guids(&path, &text)?);
        } else if path.extension().is_some_and(|ext| ext == "svg") {
            let Some(control) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let svg = read_trimmed(&path)?;
            entry = entry.item(control, svg);
        }
    }

    debug!(
        device = %entry.devid,
        items = entry.items.len(),
        guids = entry.guids.len(),
        "Read device directory"
    );
    Ok(entry)
}

/// Every device under `root`, sorted by name
pub fn collect_devices(root: &Path) -> Result<Vec<DeviceEntry>> {
    let mut devices = Vec::new();
    for path in sorted_entries(root)? {
        if path.is_dir() {
            devices.push(read_device(&path)?);
        }
    }
    Ok(devices)
}

/// Pack the tree at `root` into `output`
pub fn pack(root: &Path, output: &Path, version: u16) -> Result<PackSummary> {
    let devices = collect_devices(root)?;
    if devices.is_empty() {
        bail!("no device directories under {}", root.display());
    }

    let mut writer = DatabaseWriter::new(version)?;
    for device in &devices {
        writer
            .add(device)
            .with_context(|| format!("adding {}", device.devid))?;
    }

    let bytes = writer.to_bytes();
    let file = fs::File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(&bytes)?;
    out.flush()?;

    let summary = PackSummary {
        output: output.to_path_buf(),
        version,
        devices: writer.device_count(),
        strings: writer.string_count(),
        bytes: bytes.len(),
    };
    info!(
        path = %output.display(),
        devices = summary.devices,
        strings = summary.strings,
        "Wrote device-art database"
    );
    Ok(summary)
}

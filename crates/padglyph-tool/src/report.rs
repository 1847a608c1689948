//! Inspection reports printed by the tool

use anyhow::{Context, Result};
use padglyph_core::{ArtDatabase, Control, DeviceKind};
use padglyph_render::{BasicSvg, DeviceImages, Surface};
use png::{BitDepth, ColorType, Encoder};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// One registered device type
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub device_type: String,
    pub inherits: Option<String>,
    pub items: usize,
    pub guids: Vec<String>,
    pub refcount: usize,
}

/// Summarize every device type in `db`
pub fn inventory(db: &ArtDatabase) -> Result<Vec<DeviceSummary>> {
    let mut devices = Vec::new();
    for device_type in db.device_types() {
        let Some(record) = db.record(device_type)? else {
            continue;
        };
        devices.push(DeviceSummary {
            device_type: device_type.to_string(),
            inherits: record.inherits.as_deref().map(str::to_string),
            items: record.items.len(),
            guids: record.guids.iter().map(|g| g.to_key()).collect(),
            refcount: db.refcount(device_type),
        });
    }
    Ok(devices)
}

/// A control with art, and the variants it has
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlArt {
    pub control: String,
    pub variants: Vec<usize>,
}

/// A device flattened for one kind
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    pub device_type: String,
    pub kind: DeviceKind,
    pub controls: Vec<ControlArt>,
    pub issues: Vec<String>,
}

/// Resolve `id` and list which control slots ended up with art
pub fn resolve_report(db: &ArtDatabase, id: &str, kind: DeviceKind) -> Result<ResolveReport> {
    let resolution = db.resolve(id, kind)?;
    let mut controls: Vec<ControlArt> = Vec::new();
    for table in &resolution.images.tables {
        for (control, variant, _) in table.iter() {
            let name = table
                .category()
                .name_of(control)
                .map_or_else(|| format!("#{}", control), str::to_string);
            match controls.last_mut() {
                Some(last) if last.control == name => last.variants.push(variant),
                _ => controls.push(ControlArt {
                    control: name,
                    variants: vec![variant],
                }),
            }
        }
    }
    Ok(ResolveReport {
        device_type: resolution.images.device_type.to_string(),
        kind,
        controls,
        issues: resolution.issues.iter().map(ToString::to_string).collect(),
    })
}

/// Parse a control name for `kind`
pub fn parse_control(kind: DeviceKind, name: &str) -> Result<Control> {
    Control::parse(kind, name).with_context(|| format!("{:?} is not a {} control", name, kind))
}

/// SVG text for one control, with variant fallback applied
pub fn svg_text(
    images: &DeviceImages<BasicSvg>,
    kind: DeviceKind,
    control: &str,
    variant: usize,
) -> Result<String> {
    let control = parse_control(kind, control)?;
    Ok(images.svg_for(control, variant)?.to_string())
}

/// Encode `surface` as an 8-bit RGBA PNG
pub fn write_png(surface: &Surface, out: impl Write) -> Result<()> {
    let mut encoder = Encoder::new(out, surface.width(), surface.height());
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(surface.pixels())?;
    writer.finish()?;
    Ok(())
}

/// Rasterize one control to a PNG file
pub fn render_to_file(
    images: &mut DeviceImages<BasicSvg>,
    kind: DeviceKind,
    control: &str,
    size: u32,
    variant: usize,
    output: &Path,
) -> Result<()> {
    let control = parse_control(kind, control)?;
    let surface = images.surface_for(control, size, variant)?;
    let file = fs::File::create(output).with_context(|| format!("creating {}", output.display()))?;
    write_png(&surface, std::io::BufWriter::new(file))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use padglyph_core::{DatabaseWriter, DeviceEntry, Guid};
    use tempfile::TempDir;

    const SQUARE: &str = r#"<svg width="4" height="4"><rect width="4" height="4"/></svg>"#;

    fn sample_db() -> ArtDatabase {
        let mut writer = DatabaseWriter::new(2).unwrap();
        writer
            .add(
                &DeviceEntry::new("base")
                    .item("south_0", SQUARE)
                    .item("south_1", "<svg id='s1'/>")
                    .item("leftx_0", "<svg id='lx'/>"),
            )
            .unwrap();
        writer
            .add(
                &DeviceEntry::new("child")
                    .inherits("base")
                    .item("bogus_0", "<svg/>")
                    .guid("030000005e0400008e02000000007801".parse::<Guid>().unwrap()),
            )
            .unwrap();
        let mut db = ArtDatabase::new();
        db.add_data(&writer.to_bytes()).unwrap();
        db
    }

    #[test]
    fn test_inventory() {
        let db = sample_db();
        let devices = inventory(&db).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].device_type, "base");
        assert_eq!(devices[0].refcount, 1);
        assert_eq!(devices[1].inherits.as_deref(), Some("base"));
        assert_eq!(devices[1].items, 1);
        assert_eq!(devices[1].guids, vec!["030000005e0400008e02000000007801"]);
        // type key, GUID key and VID/PID key
        assert_eq!(devices[1].refcount, 3);
    }

    #[test]
    fn test_resolve_report() {
        let db = sample_db();
        let report = resolve_report(&db, "child", DeviceKind::Gamepad).unwrap();
        assert_eq!(report.device_type, "child");
        assert!(report.controls.contains(&ControlArt {
            control: "south".to_string(),
            variants: vec![0, 1],
        }));
        assert!(report.controls.iter().any(|c| c.control == "leftx"));
        assert_eq!(report.issues.len(), 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "gamepad");
    }

    #[test]
    fn test_svg_text_and_render() {
        let db = sample_db();
        let mut images =
            DeviceImages::by_id_string(&db, "child", DeviceKind::Gamepad, BasicSvg::new()).unwrap();
        assert_eq!(svg_text(&images, DeviceKind::Gamepad, "south", 5).unwrap(), SQUARE);
        assert!(svg_text(&images, DeviceKind::Gamepad, "Left Ctrl", 0).is_err());

        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("south.png");
        render_to_file(&mut images, DeviceKind::Gamepad, "south", 2, 0, &output).unwrap();

        let decoder = png::Decoder::new(fs::File::open(&output).unwrap());
        let mut reader = decoder.read_info().unwrap();
        let mut pixels = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut pixels).unwrap();
        assert_eq!((info.width, info.height), (2, 2));
        assert_eq!(info.color_type, png::ColorType::Rgba);
        assert_eq!(&pixels[12..16], &[0, 0, 0, 255]);
    }

    #[test]
    fn test_write_png_signature() {
        let mut surface = Surface::new(1, 1).unwrap();
        surface.blend(0, 0, [10, 20, 30, 255], 1.0);
        let mut out = Vec::new();
        write_png(&surface, &mut out).unwrap();
        assert!(out.starts_with(&[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']));
    }
}

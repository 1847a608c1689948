//! Walking the SVG element tree

use kurbo::{Affine, BezPath, Circle, Ellipse, Rect, RoundedRect, Shape, StrokeOpts};
use peniko::Fill;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::css::StyleSheet;
use super::style::{numbers, parse_length, parse_transform, px_per_unit, Style};
use super::{FilledPath, SvgScene};

/// Curve accuracy in scene units after the element transform
const TOLERANCE: f64 = 0.01;

/// Elements whose content is never painted directly
const NON_RENDERED: &[&[u8]] = &[
    b"defs",
    b"clipPath",
    b"mask",
    b"linearGradient",
    b"radialGradient",
    b"pattern",
    b"symbol",
    b"marker",
    b"filter",
    b"style",
    b"title",
    b"desc",
    b"metadata",
    b"text",
];

#[derive(Debug, Clone, Copy)]
struct Viewport {
    width: f64,
    height: f64,
    transform: Affine,
}

fn attributes(element: &BytesStart<'_>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for attr in element.attributes().with_checks(false).flatten() {
        let key = attr.key.local_name();
        let (Ok(key), Ok(value)) = (
            std::str::from_utf8(key.as_ref()),
            std::str::from_utf8(attr.value.as_ref()),
        ) else {
            continue;
        };
        out.push((key.to_string(), value.to_string()));
    }
    out
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn viewport(attrs: &[(String, String)], dpi: f64) -> Option<Viewport> {
    let view_box = attr(attrs, "viewBox")
        .map(numbers)
        .filter(|v| v.len() == 4 && v[2] > 0.0 && v[3] > 0.0);
    let (ref_w, ref_h) = view_box.as_ref().map_or((100.0, 100.0), |v| (v[2], v[3]));
    let width = attr(attrs, "width").and_then(|w| parse_length(w, dpi, ref_w));
    let height = attr(attrs, "height").and_then(|h| parse_length(h, dpi, ref_h));

    match (view_box, width, height) {
        (Some(vb), w, h) => {
            let width = w.unwrap_or(vb[2]);
            let height = h.unwrap_or(vb[3]);
            // preserveAspectRatio="xMidYMid meet"
            let s = (width / vb[2]).min(height / vb[3]);
            let tx = (width - vb[2] * s) / 2.0 - vb[0] * s;
            let ty = (height - vb[3] * s) / 2.0 - vb[1] * s;
            Some(Viewport {
                width,
                height,
                transform: Affine::translate((tx, ty)) * Affine::scale(s),
            })
        }
        (None, Some(width), Some(height)) => Some(Viewport {
            width,
            height,
            transform: Affine::IDENTITY,
        }),
        _ => None,
    }
}

/// Collect the text of every `<style>` element.
///
/// Runs ahead of the main walk so rules apply to elements that precede
/// the sheet.
fn collect_stylesheet(source: &str) -> StyleSheet {
    let mut reader = Reader::from_str(source);
    let mut buf = Vec::new();
    let mut sheet = StyleSheet::default();
    let mut in_style = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"style" => in_style = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"style" => in_style = false,
            Ok(Event::Text(text)) if in_style => {
                if let Ok(text) = std::str::from_utf8(&text) {
                    sheet.extend(StyleSheet::parse(text));
                }
            }
            Ok(Event::CData(data)) if in_style => {
                if let Ok(text) = std::str::from_utf8(&data) {
                    sheet.extend(StyleSheet::parse(text));
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
        buf.clear();
    }
    sheet
}

fn number(attrs: &[(String, String)], name: &str, dpi: f64, reference: f64) -> f64 {
    attr(attrs, name)
        .and_then(|v| parse_length(v, dpi, reference))
        .unwrap_or(0.0)
}

/// Outline of a basic shape or path in its own coordinates
fn shape_path(
    name: &[u8],
    attrs: &[(String, String)],
    dpi: f64,
    size: (f64, f64),
) -> Option<BezPath> {
    let (w, h) = size;
    let n = |key: &str, reference: f64| number(attrs, key, dpi, reference);
    let path = match name {
        b"rect" => {
            let (width, height) = (n("width", w), n("height", h));
            if width <= 0.0 || height <= 0.0 {
                return Some(BezPath::new());
            }
            let rx = attr(attrs, "rx").and_then(|v| parse_length(v, dpi, w));
            let ry = attr(attrs, "ry").and_then(|v| parse_length(v, dpi, h));
            // A lone rx or ry applies to both.
            let radius = match (rx, ry) {
                (Some(rx), Some(ry)) => rx.min(ry),
                (Some(r), None) | (None, Some(r)) => r,
                (None, None) => 0.0,
            };
            let rect = Rect::from_origin_size((n("x", w), n("y", h)), (width, height));
            if radius > 0.0 {
                let radius = radius.min(width / 2.0).min(height / 2.0);
                RoundedRect::from_rect(rect, radius).to_path(TOLERANCE)
            } else {
                rect.to_path(TOLERANCE)
            }
        }
        b"circle" => {
            let r = n("r", (w * w + h * h).sqrt() / std::f64::consts::SQRT_2);
            if r <= 0.0 {
                return Some(BezPath::new());
            }
            Circle::new((n("cx", w), n("cy", h)), r).to_path(TOLERANCE)
        }
        b"ellipse" => {
            let (rx, ry) = (n("rx", w), n("ry", h));
            if rx <= 0.0 || ry <= 0.0 {
                return Some(BezPath::new());
            }
            Ellipse::new((n("cx", w), n("cy", h)), (rx, ry), 0.0).to_path(TOLERANCE)
        }
        b"line" => {
            let mut path = BezPath::new();
            path.move_to((n("x1", w), n("y1", h)));
            path.line_to((n("x2", w), n("y2", h)));
            path
        }
        b"polygon" | b"polyline" => {
            let points = numbers(attr(attrs, "points").unwrap_or(""));
            let mut path = BezPath::new();
            for (i, pair) in points.chunks_exact(2).enumerate() {
                if i == 0 {
                    path.move_to((pair[0], pair[1]));
                } else {
                    path.line_to((pair[0], pair[1]));
                }
            }
            if name == b"polygon" && !path.elements().is_empty() {
                path.close_path();
            }
            path
        }
        b"path" => {
            let d = attr(attrs, "d").unwrap_or("");
            BezPath::from_svg(d).unwrap_or_else(|e| {
                debug!(error = %e, "Unusable path data");
                BezPath::new()
            })
        }
        _ => return None,
    };
    Some(path)
}

/// Fill and stroke geometry for one shape, in scene coordinates
fn paint_shape(path: &BezPath, style: &Style, fillable: bool, shapes: &mut Vec<FilledPath>) {
    if let Some(color) = style.fill_paint().filter(|_| fillable) {
        let mut fill = path.clone();
        fill.apply_affine(style.transform);
        shapes.push(FilledPath {
            path: fill,
            color,
            rule: style.fill_rule,
        });
    }

    if let Some(color) = style.stroke_paint() {
        // Outline in local units so the stroke scales with the transform
        let scale = style.transform.determinant().abs().sqrt().max(f64::EPSILON);
        let mut outline = kurbo::stroke(
            path.iter(),
            &style.stroke_style(),
            &StrokeOpts::default(),
            TOLERANCE / scale,
        );
        outline.apply_affine(style.transform);
        shapes.push(FilledPath {
            path: outline,
            color,
            rule: Fill::NonZero,
        });
    }
}

/// Parse an SVG document into a scene in `units`.
///
/// Returns `None` for malformed XML or a document without an `<svg>` root.
pub fn parse_document(source: &str, units: &str, dpi: f32) -> Option<SvgScene> {
    let dpi = f64::from(dpi);
    let sheet = collect_stylesheet(source);

    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let unit_scale = 1.0 / px_per_unit(units, dpi).unwrap_or(1.0);
    let mut root: Option<Viewport> = None;
    let mut styles: Vec<Style> = Vec::new();
    let mut skip_depth = 0usize;
    let mut shapes = Vec::new();

    loop {
        let (element, container) = match reader.read_event_into(&mut buf) {
            Err(e) => {
                debug!(error = %e, "Malformed SVG");
                return None;
            }
            Ok(Event::Start(e)) => (e.into_owned(), true),
            Ok(Event::Empty(e)) => (e.into_owned(), false),
            Ok(Event::End(_)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                } else {
                    styles.pop();
                }
                buf.clear();
                continue;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {
                buf.clear();
                continue;
            }
        };
        buf.clear();

        let local = element.local_name();
        let name = local.as_ref();
        if skip_depth > 0 || NON_RENDERED.contains(&name) {
            if container {
                skip_depth += 1;
            }
            continue;
        }

        let attrs = attributes(&element);
        let mut style = match styles.last() {
            Some(parent) => parent.clone(),
            None if root.is_none() && name == b"svg" => {
                let scale = Affine::scale(unit_scale);
                let viewport = viewport(&attrs, dpi).map_or(
                    Viewport {
                        width: 0.0,
                        height: 0.0,
                        transform: scale,
                    },
                    |v| Viewport {
                        width: v.width * unit_scale,
                        height: v.height * unit_scale,
                        transform: scale * v.transform,
                    },
                );
                root = Some(viewport);
                Style {
                    transform: viewport.transform,
                    ..Style::default()
                }
            }
            None => {
                debug!("SVG document has no <svg> root");
                return None;
            }
        };

        // Presentation attributes, then the stylesheet, then `style="..."`
        for (key, value) in &attrs {
            match key.as_str() {
                "transform" => style.transform = style.transform * parse_transform(value),
                "style" | "class" | "id" => {}
                _ => style.set(key, value),
            }
        }
        if !sheet.is_empty() {
            let tag = std::str::from_utf8(name).unwrap_or_default();
            for block in sheet.matching(tag, attr(&attrs, "id"), attr(&attrs, "class")) {
                style.apply_declarations(block);
            }
        }
        if let Some(inline) = attr(&attrs, "style") {
            style.apply_declarations(inline);
        }

        let size = root.map_or((0.0, 0.0), |r| (r.width, r.height));
        if let Some(path) = shape_path(name, &attrs, dpi, size) {
            if !path.elements().is_empty() {
                paint_shape(&path, &style, name != b"line", &mut shapes);
            }
        }

        if container {
            styles.push(style);
        }
    }

    let root = root?;
    let (width, height) = if root.width > 0.0 && root.height > 0.0 {
        (root.width, root.height)
    } else {
        // No usable size declared: fall back to the drawing's extent.
        shapes
            .iter()
            .map(|s: &FilledPath| s.path.bounding_box())
            .fold((0.0f64, 0.0f64), |(w, h), b| (w.max(b.x1), h.max(b.y1)))
    };
    if width <= 0.0 || height <= 0.0 {
        debug!("SVG document has no size");
        return None;
    }

    Some(SvgScene {
        width,
        height,
        shapes,
    })
}

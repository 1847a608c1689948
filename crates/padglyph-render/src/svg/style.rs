//! Presentation attributes: colours, lengths, transforms and paint state

use kurbo::{Affine, Cap, Join, Point, Stroke};
use peniko::Fill;

/// Straight-alpha RGBA colour
pub type Rgba = [u8; 4];

/// Parse a colour value: named, `#rgb`, `#rrggbb` or `rgb()`/`rgba()`
pub fn parse_color(value: &str) -> Option<Rgba> {
    let value = value.trim();
    let named = match value.to_ascii_lowercase().as_str() {
        "black" => Some([0, 0, 0, 255]),
        "white" => Some([255, 255, 255, 255]),
        "red" => Some([255, 0, 0, 255]),
        "green" => Some([0, 128, 0, 255]),
        "lime" => Some([0, 255, 0, 255]),
        "blue" => Some([0, 0, 255, 255]),
        "yellow" => Some([255, 255, 0, 255]),
        "cyan" | "aqua" => Some([0, 255, 255, 255]),
        "magenta" | "fuchsia" => Some([255, 0, 255, 255]),
        "gray" | "grey" => Some([128, 128, 128, 255]),
        "silver" => Some([192, 192, 192, 255]),
        "darkgray" | "darkgrey" => Some([169, 169, 169, 255]),
        "lightgray" | "lightgrey" => Some([211, 211, 211, 255]),
        "orange" => Some([255, 165, 0, 255]),
        "purple" => Some([128, 0, 128, 255]),
        "pink" => Some([255, 192, 203, 255]),
        "transparent" => Some([0, 0, 0, 0]),
        _ => None,
    };
    if named.is_some() {
        return named;
    }

    if let Some(hex) = value.strip_prefix('#') {
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            3 => Some([
                channel(hex.get(0..1)?)? * 17,
                channel(hex.get(1..2)?)? * 17,
                channel(hex.get(2..3)?)? * 17,
                255,
            ]),
            6 => Some([
                channel(hex.get(0..2)?)?,
                channel(hex.get(2..4)?)?,
                channel(hex.get(4..6)?)?,
                255,
            ]),
            8 => Some([
                channel(hex.get(0..2)?)?,
                channel(hex.get(2..4)?)?,
                channel(hex.get(4..6)?)?,
                channel(hex.get(6..8)?)?,
            ]),
            _ => None,
        };
    }

    let inner = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }
    let component = |s: &str| -> Option<u8> {
        let v = match s.strip_suffix('%') {
            Some(pct) => pct.trim().parse::<f32>().ok()? * 2.55,
            None => s.parse::<f32>().ok()?,
        };
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(a) => (a.parse::<f32>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
        None => 255,
    };
    Some([
        component(parts[0])?,
        component(parts[1])?,
        component(parts[2])?,
        alpha,
    ])
}

/// Every number in an attribute such as `viewBox` or `points`.
///
/// Separators are whitespace, commas, or nothing at all before a sign
/// (`"10-5"` is two numbers).
pub fn numbers(text: &str) -> Vec<f64> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        if matches!(bytes[i], b'+' | b'-') {
            i += 1;
        }
        let mut digits = false;
        let mut dot = false;
        while let Some(&b) = bytes.get(i) {
            match b {
                b'0'..=b'9' => digits = true,
                b'.' if !dot => dot = true,
                b'e' | b'E' if digits => {
                    let sign = usize::from(matches!(bytes.get(i + 1), Some(b'+' | b'-')));
                    if !bytes.get(i + 1 + sign).is_some_and(u8::is_ascii_digit) {
                        break;
                    }
                    i += 1 + sign;
                    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                        i += 1;
                    }
                    break;
                }
                _ => break,
            }
            i += 1;
        }
        match text.get(start..i).map(str::parse::<f64>) {
            Some(Ok(n)) if digits => out.push(n),
            _ => i = start + 1,
        }
    }
    out
}

/// Convert a length attribute to pixels.
///
/// Percentages resolve against `reference`.
pub fn parse_length(value: &str, dpi: f64, reference: f64) -> Option<f64> {
    let value = value.trim();
    let number = value.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%');
    let unit = &value[number.len()..];
    let number: f64 = number.trim().parse().ok()?;
    let px = match unit.trim() {
        "" | "px" => number,
        "%" => number / 100.0 * reference,
        unit => number * px_per_unit(unit, dpi)?,
    };
    px.is_finite().then_some(px)
}

/// How many pixels one `unit` spans at `dpi`
pub fn px_per_unit(unit: &str, dpi: f64) -> Option<f64> {
    match unit {
        "px" => Some(1.0),
        "pt" => Some(dpi / 72.0),
        "pc" => Some(dpi / 6.0),
        "mm" => Some(dpi / 25.4),
        "cm" => Some(dpi / 2.54),
        "in" => Some(dpi),
        "em" => Some(16.0),
        "ex" => Some(8.0),
        _ => None,
    }
}

/// Parse an SVG `transform` list; malformed entries are skipped
pub fn parse_transform(list: &str) -> Affine {
    let mut result = Affine::IDENTITY;
    let mut rest = list;
    while let Some(open) = rest.find('(') {
        let name = rest[..open].trim_matches(|c: char| c.is_whitespace() || c == ',');
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        let args = numbers(&rest[open + 1..open + close]);
        rest = &rest[open + close + 1..];

        let step = match (name, args.as_slice()) {
            ("matrix", &[a, b, c, d, e, f]) => Affine::new([a, b, c, d, e, f]),
            ("translate", &[tx]) => Affine::translate((tx, 0.0)),
            ("translate", &[tx, ty]) => Affine::translate((tx, ty)),
            ("scale", &[s]) => Affine::scale(s),
            ("scale", &[sx, sy]) => Affine::scale_non_uniform(sx, sy),
            ("rotate", &[angle]) => Affine::rotate(angle.to_radians()),
            ("rotate", &[angle, cx, cy]) => {
                Affine::rotate_about(angle.to_radians(), Point::new(cx, cy))
            }
            ("skewX", &[angle]) => Affine::skew(angle.to_radians().tan(), 0.0),
            ("skewY", &[angle]) => Affine::skew(0.0, angle.to_radians().tan()),
            _ => continue,
        };
        result = result * step;
    }
    result
}

/// Paint state inherited down the element tree
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// `None` means `none` or an unsupported paint server
    pub fill: Option<Rgba>,
    pub fill_opacity: f32,
    pub fill_rule: Fill,
    pub stroke: Option<Rgba>,
    pub stroke_opacity: f32,
    pub stroke_width: f64,
    pub line_cap: Cap,
    pub line_join: Join,
    pub miter_limit: f64,
    pub opacity: f32,
    pub transform: Affine,
    pub visible: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some([0, 0, 0, 255]),
            fill_opacity: 1.0,
            fill_rule: Fill::NonZero,
            stroke: None,
            stroke_opacity: 1.0,
            stroke_width: 1.0,
            line_cap: Cap::Butt,
            line_join: Join::Miter,
            miter_limit: 4.0,
            opacity: 1.0,
            transform: Affine::IDENTITY,
            visible: true,
        }
    }
}

impl Style {
    /// Apply one presentation attribute or CSS declaration.
    ///
    /// `opacity` isn't inherited in SVG, but for flat paint multiplying it
    /// down the tree gives the same pixels.
    pub fn set(&mut self, name: &str, value: &str) {
        let value = value.trim().trim_end_matches("!important").trim();
        match name.trim() {
            "fill" => self.fill = paint_value(value, self.fill),
            "stroke" => self.stroke = paint_value(value, self.stroke),
            "fill-opacity" => {
                if let Some(v) = parse_opacity(value) {
                    self.fill_opacity = v;
                }
            }
            "stroke-opacity" => {
                if let Some(v) = parse_opacity(value) {
                    self.stroke_opacity = v;
                }
            }
            "opacity" => {
                if let Some(v) = parse_opacity(value) {
                    self.opacity *= v;
                }
            }
            "fill-rule" => {
                self.fill_rule = match value {
                    "evenodd" => Fill::EvenOdd,
                    _ => Fill::NonZero,
                }
            }
            "stroke-width" => {
                if let Some(w) = parse_length(value, 96.0, 100.0).filter(|w| *w >= 0.0) {
                    self.stroke_width = w;
                }
            }
            "stroke-linecap" => {
                self.line_cap = match value {
                    "round" => Cap::Round,
                    "square" => Cap::Square,
                    _ => Cap::Butt,
                }
            }
            "stroke-linejoin" => {
                self.line_join = match value {
                    "round" => Join::Round,
                    "bevel" => Join::Bevel,
                    _ => Join::Miter,
                }
            }
            "stroke-miterlimit" => {
                if let Ok(limit) = value.parse::<f64>() {
                    if limit >= 1.0 {
                        self.miter_limit = limit;
                    }
                }
            }
            "display" if value == "none" => self.visible = false,
            "visibility" => self.visible = value != "hidden" && value != "collapse",
            "style" => self.apply_declarations(value),
            _ => {}
        }
    }

    /// Apply a `name: value; ...` declaration block
    pub fn apply_declarations(&mut self, block: &str) {
        for declaration in block.split(';') {
            if let Some((name, value)) = declaration.split_once(':') {
                if name.trim() != "style" {
                    self.set(name, value);
                }
            }
        }
    }

    /// Fill colour with opacities folded into alpha
    pub fn fill_paint(&self) -> Option<Rgba> {
        self.resolve(self.fill, self.fill_opacity)
    }

    /// Stroke colour with opacities folded into alpha, if anything is stroked
    pub fn stroke_paint(&self) -> Option<Rgba> {
        if self.stroke_width <= 0.0 {
            return None;
        }
        self.resolve(self.stroke, self.stroke_opacity)
    }

    pub fn stroke_style(&self) -> Stroke {
        Stroke::new(self.stroke_width)
            .with_caps(self.line_cap)
            .with_join(self.line_join)
            .with_miter_limit(self.miter_limit)
    }

    fn resolve(&self, color: Option<Rgba>, opacity: f32) -> Option<Rgba> {
        let [r, g, b, a] = color?;
        let alpha = (f32::from(a) * opacity * self.opacity).round().clamp(0.0, 255.0) as u8;
        (alpha > 0 && self.visible).then_some([r, g, b, alpha])
    }
}

fn paint_value(value: &str, current: Option<Rgba>) -> Option<Rgba> {
    match value {
        "none" => None,
        "currentColor" | "inherit" => current,
        v if v.starts_with("url(") => None,
        v => parse_color(v).or(current),
    }
}

fn parse_opacity(value: &str) -> Option<f32> {
    let v = match value.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f32>().ok()? / 100.0,
        None => value.parse::<f32>().ok()?,
    };
    v.is_finite().then(|| v.clamp(0.0, 1.0))
}

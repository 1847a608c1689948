//! Flattening a device's inheritance chain into per-control SVG tables
//!
//! Parents are applied first and every record's own items then overwrite
//! whatever the chain contributed, so the most derived definition wins.
//! Within one record items apply in stored order, with two exceptions that
//! only fill empty slots: the `leftxy`/`rightxy` stick fallbacks (applied
//! after the record's full item list) and the right-hand copies of keyboard
//! modifiers.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::controls::{Category, DeviceKind, GamepadAxis, Scancode};
use crate::error::{ArtError, ItemIssue};
use crate::record::DeviceRecord;
use crate::registry::Registry;

/// SVG text for every `[control][variant]` slot of one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgTable {
    category: Category,
    variants: usize,
    slots: Vec<Option<Rc<str>>>,
}

impl SvgTable {
    pub fn new(category: Category) -> Self {
        let variants = category.max_variants();
        Self {
            category,
            variants,
            slots: vec![None; category.count() * variants],
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    fn index(&self, control: usize, variant: usize) -> Option<usize> {
        (control < self.category.count() && variant < self.variants)
            .then(|| control * self.variants + variant)
    }

    /// Exact slot lookup, no fallback
    pub fn get(&self, control: usize, variant: usize) -> Option<&Rc<str>> {
        self.index(control, variant)
            .and_then(|i| self.slots.get(i))
            .and_then(Option::as_ref)
    }

    /// Store `svg`, replacing any previous text
    pub fn set(&mut self, control: usize, variant: usize, svg: Rc<str>) {
        if let Some(slot) = self.index(control, variant).and_then(|i| self.slots.get_mut(i)) {
            *slot = Some(svg);
        }
    }

    /// Store `svg` only if the slot is empty
    pub fn fill(&mut self, control: usize, variant: usize, svg: &Rc<str>) -> bool {
        match self.index(control, variant).and_then(|i| self.slots.get_mut(i)) {
            Some(slot @ None) => {
                *slot = Some(Rc::clone(svg));
                true
            }
            _ => false,
        }
    }

    /// Filled slots as `(control, variant, svg)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Rc<str>)> + '_ {
        let variants = self.variants;
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(i, slot)| slot.as_ref().map(|svg| (i / variants, i % variants, svg)))
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

/// A device flattened for one device kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImages {
    pub device_type: Rc<str>,
    pub kind: DeviceKind,
    pub tables: Vec<SvgTable>,
}

impl ResolvedImages {
    pub fn table(&self, category: Category) -> Option<&SvgTable> {
        self.tables.iter().find(|t| t.category == category)
    }

    pub fn get(&self, category: Category, control: usize, variant: usize) -> Option<&Rc<str>> {
        self.table(category).and_then(|t| t.get(control, variant))
    }
}

/// Flattened images plus every item that had to be skipped
#[derive(Debug, Clone)]
pub struct Resolution {
    pub images: ResolvedImages,
    pub issues: Vec<ItemIssue>,
}

/// Split `root_variant` at the last underscore.
///
/// The `device` argument only labels the returned issue.
pub fn split_control_name<'a>(
    device: &str,
    name: &'a str,
    max_variants: usize,
) -> Result<(&'a str, usize), ItemIssue> {
    let (root, suffix) = name.rsplit_once('_').ok_or_else(|| ItemIssue::MissingSeparator {
        device: device.to_string(),
        item: name.to_string(),
    })?;
    let bad_variant = || ItemIssue::BadVariant {
        device: device.to_string(),
        item: name.to_string(),
    };
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad_variant());
    }
    let variant: u32 = suffix.parse().map_err(|_| bad_variant())?;
    match usize::try_from(variant) {
        Ok(v) if v < max_variants => Ok((root, v)),
        _ => Err(ItemIssue::VariantOutOfRange {
            device: device.to_string(),
            item: name.to_string(),
            variant,
            limit: max_variants,
        }),
    }
}

/// Older art used compass letters for the face buttons.
fn legacy_gamepad_alias(root: &str) -> &str {
    match root {
        "n" => "north",
        "s" => "south",
        "w" => "west",
        "e" => "east",
        other => other,
    }
}

/// Flatten `record` and its inheritance chain for `kind`.
///
/// A parent that isn't registered contributes nothing. An inheritance cycle
/// is reported as [`ArtError::BogusData`].
pub fn resolve(
    registry: &Registry<DeviceRecord>,
    record: &DeviceRecord,
    kind: DeviceKind,
) -> Result<Resolution, ArtError> {
    let mut resolver = Resolver {
        registry,
        kind,
        tables: kind.categories().iter().map(|&c| SvgTable::new(c)).collect(),
        issues: Vec::new(),
        chain: Vec::new(),
    };
    resolver.collect(record)?;

    Ok(Resolution {
        images: ResolvedImages {
            device_type: Rc::clone(&record.device_type),
            kind,
            tables: resolver.tables,
        },
        issues: resolver.issues,
    })
}

struct Resolver<'r> {
    registry: &'r Registry<DeviceRecord>,
    kind: DeviceKind,
    tables: Vec<SvgTable>,
    issues: Vec<ItemIssue>,
    /// Device types currently being collected, base-most last
    chain: Vec<Rc<str>>,
}

impl<'r> Resolver<'r> {
    fn collect(&mut self, record: &DeviceRecord) -> Result<(), ArtError> {
        if self.chain.iter().any(|seen| *seen == record.device_type) {
            return Err(ArtError::BogusData(format!(
                "inheritance cycle: {} -> {}",
                self.chain
                    .iter()
                    .map(|s| &**s)
                    .collect::<Vec<_>>()
                    .join(" -> "),
                record.device_type
            )));
        }
        self.chain.push(Rc::clone(&record.device_type));

        if let Some(parent_name) = &record.inherits {
            let registry = self.registry;
            match registry.get(parent_name) {
                Some(parent) => self.collect(parent)?,
                None => debug!(
                    device = %record.device_type,
                    parent = %parent_name,
                    "Parent device not registered; ignoring"
                ),
            }
        }

        self.apply_items(record);
        self.chain.pop();
        Ok(())
    }

    fn table_mut(&mut self, category: Category) -> Option<&mut SvgTable> {
        self.tables.iter_mut().find(|t| t.category == category)
    }

    fn report(&mut self, issue: ItemIssue) {
        warn!(%issue, "Skipping control item");
        self.issues.push(issue);
    }

    fn apply_items(&mut self, record: &DeviceRecord) {
        let device = &*record.device_type;
        let mut leftxy: Option<&Rc<str>> = None;
        let mut rightxy: Option<&Rc<str>> = None;

        for item in &record.items {
            let (root, variant) =
                match split_control_name(device, &item.control, self.kind.max_variants()) {
                    Ok(parts) => parts,
                    Err(issue) => {
                        self.report(issue);
                        continue;
                    }
                };

            let root = if self.kind == DeviceKind::Gamepad {
                // Whole-stick art is only a fallback for the separate axes.
                if root.eq_ignore_ascii_case("leftxy") || root.eq_ignore_ascii_case("rightxy") {
                    if variant == 0 {
                        if root.eq_ignore_ascii_case("leftxy") {
                            leftxy = Some(&item.svg);
                        } else {
                            rightxy = Some(&item.svg);
                        }
                    } else {
                        debug!(
                            device,
                            item = %item.control,
                            "Stick fallback only applies to variant 0"
                        );
                    }
                    continue;
                }
                legacy_gamepad_alias(root)
            } else {
                root
            };

            let Some((category, control)) = self.kind.lookup(root) else {
                self.report(ItemIssue::UnknownControl {
                    device: device.to_string(),
                    item: item.control.to_string(),
                });
                continue;
            };

            let Some(table) = self.table_mut(category) else {
                continue;
            };
            table.set(control, variant, Rc::clone(&item.svg));

            if category == Category::Scancode {
                let twin = u16::try_from(control)
                    .ok()
                    .and_then(|code| Scancode(code).duplicate());
                if let Some(twin) = twin {
                    table.fill(usize::from(twin.0), variant, &item.svg);
                }
            }
        }

        let sticks = [
            (leftxy, [GamepadAxis::LeftX, GamepadAxis::LeftY]),
            (rightxy, [GamepadAxis::RightX, GamepadAxis::RightY]),
        ];
        for (fallback, axes) in sticks {
            let Some(svg) = fallback else { continue };
            if let Some(table) = self.table_mut(Category::GamepadAxis) {
                for axis in axes {
                    table.fill(axis as usize, 0, svg);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{GamepadButton, MouseIcon};
    use crate::record::ControlItem;

    fn record(name: &str, inherits: Option<&str>, items: &[(&str, &str)]) -> Rc<DeviceRecord> {
        Rc::new(DeviceRecord {
            device_type: Rc::from(name),
            inherits: inherits.map(Rc::from),
            items: items
                .iter()
                .map(|(control, svg)| ControlItem {
                    control: Rc::from(*control),
                    svg: Rc::from(*svg),
                })
                .collect(),
            guids: Vec::new(),
        })
    }

    fn registry_of(records: &[Rc<DeviceRecord>]) -> Registry<DeviceRecord> {
        let mut registry = Registry::new();
        for r in records {
            registry.put(r.device_type.to_string(), r);
        }
        registry
    }

    fn button(images: &ResolvedImages, b: GamepadButton, v: usize) -> Option<&str> {
        images.get(Category::GamepadButton, b as usize, v).map(|s| &**s)
    }

    fn axis(images: &ResolvedImages, a: GamepadAxis, v: usize) -> Option<&str> {
        images.get(Category::GamepadAxis, a as usize, v).map(|s| &**s)
    }

    #[test]
    fn test_split_control_name() {
        assert_eq!(split_control_name("d", "south_0", 8), Ok(("south", 0)));
        assert_eq!(
            split_control_name("d", "right_paddle1_3", 8),
            Ok(("right_paddle1", 3))
        );
        assert!(matches!(
            split_control_name("d", "south", 8),
            Err(ItemIssue::MissingSeparator { .. })
        ));
        assert!(matches!(
            split_control_name("d", "south_", 8),
            Err(ItemIssue::BadVariant { .. })
        ));
        assert!(matches!(
            split_control_name("d", "south_-1", 8),
            Err(ItemIssue::BadVariant { .. })
        ));
        assert!(matches!(
            split_control_name("d", "south_x", 8),
            Err(ItemIssue::BadVariant { .. })
        ));
        assert!(matches!(
            split_control_name("d", "south_8", 8),
            Err(ItemIssue::VariantOutOfRange { variant: 8, limit: 8, .. })
        ));
    }

    #[test]
    fn test_south_and_unrecognized_letter() {
        let pad = record("pad", None, &[("south_0", "<svg s/>"), ("a_0", "<svg a/>")]);
        let registry = registry_of(&[Rc::clone(&pad)]);
        let resolution = resolve(&registry, &pad, DeviceKind::Gamepad).unwrap();

        assert_eq!(button(&resolution.images, GamepadButton::South, 0), Some("<svg s/>"));
        assert_eq!(resolution.issues.len(), 1);
        assert!(matches!(resolution.issues[0], ItemIssue::UnknownControl { .. }));
    }

    #[test]
    fn test_legacy_compass_names() {
        let pad = record(
            "pad",
            None,
            &[("n_0", "<n/>"), ("s_1", "<s/>"), ("w_0", "<w/>"), ("e_0", "<e/>")],
        );
        let registry = registry_of(&[Rc::clone(&pad)]);
        let images = resolve(&registry, &pad, DeviceKind::Gamepad).unwrap().images;

        assert_eq!(button(&images, GamepadButton::North, 0), Some("<n/>"));
        assert_eq!(button(&images, GamepadButton::South, 1), Some("<s/>"));
        assert_eq!(button(&images, GamepadButton::West, 0), Some("<w/>"));
        assert_eq!(button(&images, GamepadButton::East, 0), Some("<e/>"));

        let explicit = record("explicit", None, &[("north_0", "<n/>")]);
        let registry = registry_of(&[Rc::clone(&explicit)]);
        let other = resolve(&registry, &explicit, DeviceKind::Gamepad).unwrap().images;
        let north = images
            .table(Category::GamepadButton)
            .unwrap()
            .iter()
            .find(|(_, _, s)| &***s == "<n/>")
            .map(|(c, v, _)| (c, v));
        let first = other
            .table(Category::GamepadButton)
            .unwrap()
            .iter()
            .next()
            .map(|(c, v, _)| (c, v));
        assert_eq!(north, first);
    }

    #[test]
    fn test_stick_fallback_never_beats_explicit_axis() {
        // The fallback comes first in the list but is applied after it.
        let pad = record(
            "pad",
            None,
            &[("leftxy_0", "<stick/>"), ("leftx_0", "<x/>"), ("rightxy_0", "<rstick/>")],
        );
        let registry = registry_of(&[Rc::clone(&pad)]);
        let images = resolve(&registry, &pad, DeviceKind::Gamepad).unwrap().images;

        assert_eq!(axis(&images, GamepadAxis::LeftX, 0), Some("<x/>"));
        assert_eq!(axis(&images, GamepadAxis::LeftY, 0), Some("<stick/>"));
        assert_eq!(axis(&images, GamepadAxis::RightX, 0), Some("<rstick/>"));
        assert_eq!(axis(&images, GamepadAxis::RightY, 0), Some("<rstick/>"));
        assert_eq!(axis(&images, GamepadAxis::LeftY, 1), None);
    }

    #[test]
    fn test_stick_fallback_respects_parent_axis() {
        let base = record("base", None, &[("lefty_0", "<base-y/>")]);
        let child = record("child", Some("base"), &[("leftxy_0", "<stick/>")]);
        let registry = registry_of(&[Rc::clone(&base), Rc::clone(&child)]);
        let images = resolve(&registry, &child, DeviceKind::Gamepad).unwrap().images;

        assert_eq!(axis(&images, GamepadAxis::LeftX, 0), Some("<stick/>"));
        assert_eq!(axis(&images, GamepadAxis::LeftY, 0), Some("<base-y/>"));
    }

    #[test]
    fn test_child_overrides_parent() {
        let base = record(
            "xbox360",
            None,
            &[("south_0", "<base-s/>"), ("east_0", "<base-e/>"), ("east_1", "<base-e1/>")],
        );
        let mid = record("theme", Some("xbox360"), &[("east_0", "<theme-e/>")]);
        let leaf = record("pad", Some("theme"), &[("south_0", "<pad-s/>")]);
        let registry = registry_of(&[Rc::clone(&base), Rc::clone(&mid), Rc::clone(&leaf)]);

        let images = resolve(&registry, &leaf, DeviceKind::Gamepad).unwrap().images;
        assert_eq!(button(&images, GamepadButton::South, 0), Some("<pad-s/>"));
        assert_eq!(button(&images, GamepadButton::East, 0), Some("<theme-e/>"));
        assert_eq!(button(&images, GamepadButton::East, 1), Some("<base-e1/>"));
        assert_eq!(button(&images, GamepadButton::North, 0), None);
        assert_eq!(&*images.device_type, "pad");
    }

    #[test]
    fn test_later_item_wins_within_record() {
        let pad = record("pad", None, &[("south_0", "<first/>"), ("south_0", "<second/>")]);
        let registry = registry_of(&[Rc::clone(&pad)]);
        let images = resolve(&registry, &pad, DeviceKind::Gamepad).unwrap().images;
        assert_eq!(button(&images, GamepadButton::South, 0), Some("<second/>"));
    }

    #[test]
    fn test_missing_parent_contributes_nothing() {
        let pad = record("pad", Some("ghost"), &[("south_0", "<s/>")]);
        let registry = registry_of(&[Rc::clone(&pad)]);
        let resolution = resolve(&registry, &pad, DeviceKind::Gamepad).unwrap();
        assert_eq!(resolution.images.table(Category::GamepadButton).unwrap().filled(), 1);
        assert!(resolution.issues.is_empty());
    }

    #[test]
    fn test_inheritance_cycle_is_rejected() {
        let a = record("a", Some("b"), &[("south_0", "<a/>")]);
        let b = record("b", Some("a"), &[("south_0", "<b/>")]);
        let registry = registry_of(&[Rc::clone(&a), Rc::clone(&b)]);
        assert!(matches!(
            resolve(&registry, &a, DeviceKind::Gamepad),
            Err(ArtError::BogusData(_))
        ));

        let selfish = record("self", Some("self"), &[]);
        let registry = registry_of(&[Rc::clone(&selfish)]);
        assert!(matches!(
            resolve(&registry, &selfish, DeviceKind::Gamepad),
            Err(ArtError::BogusData(_))
        ));
    }

    #[test]
    fn test_bad_items_are_skipped_not_fatal() {
        let pad = record(
            "pad",
            None,
            &[
                ("south", "<no-variant/>"),
                ("south_9", "<too-high/>"),
                ("south_zz", "<bad/>"),
                ("jump_0", "<unknown/>"),
                ("east_0", "<ok/>"),
            ],
        );
        let registry = registry_of(&[Rc::clone(&pad)]);
        let resolution = resolve(&registry, &pad, DeviceKind::Gamepad).unwrap();
        assert_eq!(resolution.issues.len(), 4);
        assert_eq!(button(&resolution.images, GamepadButton::East, 0), Some("<ok/>"));
        assert_eq!(button(&resolution.images, GamepadButton::South, 0), None);
    }

    #[test]
    fn test_keyboard_modifier_twins() {
        let keyboard = record(
            "keyboard",
            None,
            &[
                ("Right Shift_0", "<rshift/>"),
                ("Left Shift_0", "<shift/>"),
                ("Left Ctrl_1", "<ctrl1/>"),
                ("apostrophe_0", "<quote/>"),
                ("unknown_0", "<key/>"),
            ],
        );
        let registry = registry_of(&[Rc::clone(&keyboard)]);
        let images = resolve(&registry, &keyboard, DeviceKind::Keyboard).unwrap().images;
        let key = |code: Scancode, v| {
            images
                .get(Category::Scancode, usize::from(code.0), v)
                .map(|s| &**s)
        };

        assert_eq!(key(Scancode::LEFT_SHIFT, 0), Some("<shift/>"));
        assert_eq!(key(Scancode::RIGHT_SHIFT, 0), Some("<rshift/>"));
        assert_eq!(key(Scancode::LEFT_CTRL, 1), Some("<ctrl1/>"));
        assert_eq!(key(Scancode::RIGHT_CTRL, 1), Some("<ctrl1/>"));
        assert_eq!(key(Scancode::RIGHT_CTRL, 0), None);
        assert_eq!(key(Scancode::APOSTROPHE, 0), Some("<quote/>"));
        assert_eq!(key(Scancode::UNKNOWN, 0), Some("<key/>"));
    }

    #[test]
    fn test_keyboard_ignores_gamepad_rules() {
        // Single letters are keys here, not compass directions.
        let keyboard = record("keyboard", None, &[("n_0", "<n/>"), ("leftxy_0", "<stick/>")]);
        let registry = registry_of(&[Rc::clone(&keyboard)]);
        let resolution = resolve(&registry, &keyboard, DeviceKind::Keyboard).unwrap();
        assert_eq!(
            resolution.images.get(Category::Scancode, 17, 0).map(|s| &**s),
            Some("<n/>")
        );
        assert_eq!(resolution.issues.len(), 1);
    }

    #[test]
    fn test_mouse_icons() {
        let mouse = record("mouse", None, &[("none_0", "<none/>"), ("scroll_3", "<scroll/>")]);
        let registry = registry_of(&[Rc::clone(&mouse)]);
        let images = resolve(&registry, &mouse, DeviceKind::Mouse).unwrap().images;
        assert_eq!(
            images.get(Category::MouseIcon, MouseIcon::Scroll as usize, 3).map(|s| &**s),
            Some("<scroll/>")
        );
        assert_eq!(images.tables.len(), 1);
        assert!(images.table(Category::GamepadButton).is_none());
    }

    #[test]
    fn test_resolved_text_shares_record_storage() {
        let pad = record("pad", None, &[("south_0", "<s/>")]);
        let registry = registry_of(&[Rc::clone(&pad)]);
        let images = resolve(&registry, &pad, DeviceKind::Gamepad).unwrap().images;
        let stored = images.get(Category::GamepadButton, 0, 0).unwrap();
        assert!(Rc::ptr_eq(stored, &pad.items[0].svg));
    }
}

//! Device image handles
//!
//! A [`DeviceImages`] is built from one resolved device and owns everything
//! it needs afterwards: the flattened SVG text, one parsed scene per filled
//! slot and a rasterizer. It stays usable after the database is shut down.

use padglyph_core::{
    ArtDatabase, ArtError, Category, Control, DeviceKind, ItemIssue, Resolution, ResolvedImages,
};
use tracing::{debug, info, warn};

use crate::backend::VectorBackend;
use crate::error::RenderError;
use crate::hardware::{HardwareDescriptor, HardwareSource};
use crate::surface::Surface;

/// Parsed scenes laid out like [`padglyph_core::SvgTable`]
struct SceneTable<S> {
    category: Category,
    variants: usize,
    slots: Vec<Option<S>>,
}

impl<S> SceneTable<S> {
    fn new(category: Category) -> Self {
        let variants = category.max_variants();
        Self {
            category,
            variants,
            slots: (0..category.count() * variants).map(|_| None).collect(),
        }
    }

    fn get(&self, control: usize, variant: usize) -> Option<&S> {
        if control >= self.category.count() || variant >= self.variants {
            return None;
        }
        self.slots.get(control * self.variants + variant)?.as_ref()
    }

    fn set(&mut self, control: usize, variant: usize, scene: S) {
        if control < self.category.count() && variant < self.variants {
            if let Some(slot) = self.slots.get_mut(control * self.variants + variant) {
                *slot = Some(scene);
            }
        }
    }
}

/// Artwork for one device, ready to query
pub struct DeviceImages<B: VectorBackend> {
    images: ResolvedImages,
    issues: Vec<ItemIssue>,
    scenes: Vec<SceneTable<B::Scene>>,
    backend: B,
    rasterizer: B::Rasterizer,
}

impl<B: VectorBackend> std::fmt::Debug for DeviceImages<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceImages")
            .field("device_type", &self.images.device_type)
            .field("kind", &self.images.kind)
            .field("issues", &self.issues.len())
            .finish_non_exhaustive()
    }
}

impl<B: VectorBackend> DeviceImages<B> {
    /// Build from an explicit device type or GUID key
    pub fn by_id_string(
        db: &ArtDatabase,
        id: &str,
        kind: DeviceKind,
        backend: B,
    ) -> Result<Self, RenderError> {
        let resolution = db.resolve(id, kind)?;
        Self::from_resolution(resolution, backend)
    }

    /// Build from a hardware description, trying the exact GUID, the GUID
    /// with its CRC zeroed, the VID/PID pair, the family name and finally
    /// the configured fallback for `kind`.
    pub fn by_descriptor(
        db: &ArtDatabase,
        descriptor: &HardwareDescriptor,
        kind: DeviceKind,
        backend: B,
    ) -> Result<Self, RenderError> {
        for key in descriptor.lookup_keys(db.fallback_for(kind)) {
            if let Some(record) = db.record(&key)? {
                debug!(key = %key, device = %record.device_type, "Matched device art");
                let resolution = db.resolve_record(record, kind)?;
                return Self::from_resolution(resolution, backend);
            }
        }
        Err(ArtError::NotFound(descriptor.guid.to_key()).into())
    }

    /// Build for a live device instance known to `source`
    pub fn by_instance(
        db: &ArtDatabase,
        source: &impl HardwareSource,
        instance: u32,
        kind: DeviceKind,
        backend: B,
    ) -> Result<Self, RenderError> {
        let descriptor = source
            .descriptor(instance)
            .ok_or_else(|| ArtError::NotFound(format!("device instance {}", instance)))?;
        if descriptor.guid.is_zero() {
            return Err(ArtError::NotFound(format!(
                "device instance {} has no GUID",
                instance
            ))
            .into());
        }
        Self::by_descriptor(db, &descriptor, kind, backend)
    }

    fn from_resolution(resolution: Resolution, backend: B) -> Result<Self, RenderError> {
        let Resolution { images, issues } = resolution;
        let rasterizer = backend.create_rasterizer()?;
        let hints = backend.parse_hints();

        let mut scenes = Vec::with_capacity(images.tables.len());
        let mut parsed = 0usize;
        for table in &images.tables {
            let mut scene_table = SceneTable::new(table.category());
            for (control, variant, svg) in table.iter() {
                // The parser may consume its input, so it gets a copy.
                match backend.parse(svg.to_string(), &hints.units, hints.dpi) {
                    Some(scene) => {
                        scene_table.set(control, variant, scene);
                        parsed += 1;
                    }
                    None => warn!(
                        device = %images.device_type,
                        control = table.category().name_of(control).unwrap_or("?"),
                        variant,
                        "Failed to parse SVG"
                    ),
                }
            }
            scenes.push(scene_table);
        }

        info!(
            device = %images.device_type,
            kind = %images.kind,
            scenes = parsed,
            issues = issues.len(),
            "Created device images"
        );
        Ok(Self {
            images,
            issues,
            scenes,
            backend,
            rasterizer,
        })
    }

    pub fn device_type(&self) -> &str {
        &self.images.device_type
    }

    pub fn kind(&self) -> DeviceKind {
        self.images.kind
    }

    /// Items skipped while flattening this device
    pub fn issues(&self) -> &[ItemIssue] {
        &self.issues
    }

    pub fn images(&self) -> &ResolvedImages {
        &self.images
    }

    /// Range-check a query and return the table index and control id
    fn locate(&self, control: Control, variant: usize) -> Result<(usize, usize), ArtError> {
        let category = control.category();
        let table = self
            .images
            .tables
            .iter()
            .position(|t| t.category() == category)
            .ok_or_else(|| {
                ArtError::InvalidArgument(format!(
                    "{} is not a {} control",
                    control,
                    self.images.kind
                ))
            })?;
        let id = control.id();
        if id >= category.count() {
            return Err(ArtError::InvalidArgument(format!("{} is out of range", control)));
        }
        if variant >= category.max_variants() {
            return Err(ArtError::InvalidArgument(format!(
                "variant {} is out of range (limit {})",
                variant,
                category.max_variants()
            )));
        }
        Ok((table, id))
    }

    /// Slots to try, in order: requested, variant 0, then the category's
    /// catch-all control at the requested variant and at variant 0.
    fn candidates(category: Category, id: usize, variant: usize) -> Vec<(usize, usize)> {
        let mut slots = vec![(id, variant), (id, 0)];
        if let Some(sentinel) = category.sentinel() {
            slots.push((sentinel, variant));
            slots.push((sentinel, 0));
        }
        slots.dedup();
        slots
    }

    /// SVG text for `control`, following the variant and catch-all fallbacks
    pub fn svg_for(&self, control: impl Into<Control>, variant: usize) -> Result<&str, ArtError> {
        let control = control.into();
        let (table, id) = self.locate(control, variant)?;
        let table = &self.images.tables[table];
        Self::candidates(control.category(), id, variant)
            .into_iter()
            .find_map(|(c, v)| table.get(c, v))
            .map(|svg| &**svg)
            .ok_or(ArtError::NoImageAvailable)
    }

    pub fn has_svg_for(
        &self,
        control: impl Into<Control>,
        variant: usize,
    ) -> Result<bool, ArtError> {
        match self.svg_for(control, variant) {
            Ok(_) => Ok(true),
            Err(ArtError::NoImageAvailable) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Rasterize `control` into a `size` x `size` surface
    pub fn surface_for(
        &mut self,
        control: impl Into<Control>,
        size: u32,
        variant: usize,
    ) -> Result<Surface, RenderError> {
        let control = control.into();
        if size == 0 {
            let err = ArtError::InvalidArgument("surface size must be positive".to_string());
            return Err(err.into());
        }
        let (table, id) = self.locate(control, variant)?;
        let scenes = &self.scenes[table];
        let scene = Self::candidates(control.category(), id, variant)
            .into_iter()
            .find_map(|(c, v)| scenes.get(c, v))
            .ok_or(ArtError::NoImageAvailable)?;

        let width = self.backend.natural_width(scene);
        if !(width.is_finite() && width > 0.0) {
            return Err(RenderError::Rasterizer(format!(
                "{} has no usable width",
                control
            )));
        }
        let mut surface = Surface::new(size, size)?;
        let scale = size as f32 / width;
        self.backend
            .rasterize(&mut self.rasterizer, scene, 0.0, 0.0, scale, &mut surface)?;
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::BasicSvg;
    use padglyph_core::{
        DatabaseWriter, DeviceEntry, GamepadAxis, GamepadButton, Guid, MouseIcon, Scancode,
    };
    use std::cell::RefCell;
    use std::rc::Rc;

    const XBOX_ONE: &str = "0300a7d75e040000e002000003096800";
    const RED_SQUARE: &str =
        r##"<svg width="10" height="10"><rect width="10" height="10" fill="#f00"/></svg>"##;
    const HALF_BLUE: &str =
        r#"<svg width="10" height="10"><rect width="5" height="10" fill="blue"/></svg>"#;

    /// Backend that keeps the text as the scene and records every parse
    #[derive(Clone, Default)]
    struct Recording {
        parsed: Rc<RefCell<Vec<String>>>,
    }

    impl VectorBackend for Recording {
        type Scene = String;
        type Rasterizer = usize;

        fn create_rasterizer(&self) -> Result<usize, RenderError> {
            Ok(0)
        }

        fn parse(&self, mut source: String, _units: &str, _dpi: f32) -> Option<String> {
            let scene = source.clone();
            self.parsed.borrow_mut().push(scene.clone());
            // Scribble over the input the way a destructive parser would.
            source.clear();
            (!scene.contains("broken")).then_some(scene)
        }

        fn natural_width(&self, _scene: &String) -> f32 {
            10.0
        }

        fn rasterize(
            &self,
            calls: &mut usize,
            _scene: &String,
            _tx: f32,
            _ty: f32,
            _scale: f32,
            surface: &mut Surface,
        ) -> Result<(), RenderError> {
            *calls += 1;
            surface.blend(0, 0, [1, 2, 3, 255], 1.0);
            Ok(())
        }
    }

    fn open(db: &ArtDatabase, id: &str, kind: DeviceKind) -> DeviceImages<BasicSvg> {
        DeviceImages::by_id_string(db, id, kind, BasicSvg::new()).unwrap()
    }

    fn database(entries: &[DeviceEntry]) -> ArtDatabase {
        let mut writer = DatabaseWriter::new(2).unwrap();
        for entry in entries {
            writer.add(entry).unwrap();
        }
        let mut db = ArtDatabase::new();
        db.add_data(&writer.to_bytes()).unwrap();
        db
    }

    fn standard() -> ArtDatabase {
        database(&[
            DeviceEntry::new("xbox360")
                .item("south_0", RED_SQUARE)
                .item("east_0", HALF_BLUE)
                .item("leftx_0", "<svg id='lx'/>"),
            DeviceEntry::new("xboxone")
                .inherits("xbox360")
                .item("south_1", "<svg id='south-1'/>")
                .item("north_0", "<svg id='broken'/>")
                .guid(XBOX_ONE.parse().unwrap()),
            DeviceEntry::new("ps4").item("south_0", "<svg id='cross'/>"),
            DeviceEntry::new("keyboard")
                .item("unknown_0", "<svg id='key'/>")
                .item("a_0", "<svg id='a'/>")
                .item("a_2", "<svg id='a2'/>"),
            DeviceEntry::new("mouse")
                .item("none_0", "<svg id='none'/>")
                .item("left_0", "<svg id='left'/>"),
        ])
    }

    #[test]
    fn test_by_id_string() {
        let db = standard();
        let pad = open(&db, "xboxone", DeviceKind::Gamepad);
        assert_eq!(pad.device_type(), "xboxone");
        assert_eq!(pad.kind(), DeviceKind::Gamepad);
        assert_eq!(pad.svg_for(GamepadButton::South, 0).unwrap(), RED_SQUARE);

        let by_guid = open(&db, XBOX_ONE, DeviceKind::Gamepad);
        assert_eq!(by_guid.device_type(), "xboxone");

        let missing = DeviceImages::by_id_string(&db, "nes", DeviceKind::Gamepad, BasicSvg::new());
        assert!(matches!(missing, Err(RenderError::Art(ArtError::NotFound(_)))));
    }

    #[test]
    fn test_variant_fallback() {
        let db = standard();
        let pad = open(&db, "xboxone", DeviceKind::Gamepad);
        assert_eq!(pad.svg_for(GamepadButton::South, 1).unwrap(), "<svg id='south-1'/>");
        assert_eq!(pad.svg_for(GamepadButton::South, 3).unwrap(), RED_SQUARE);
        assert!(pad.has_svg_for(GamepadAxis::LeftX, 7).unwrap());
        // Gamepads have no catch-all control.
        assert!(!pad.has_svg_for(GamepadButton::Guide, 0).unwrap());
        assert!(matches!(
            pad.svg_for(GamepadButton::Guide, 0),
            Err(ArtError::NoImageAvailable)
        ));
    }

    #[test]
    fn test_catch_all_controls() {
        let db = standard();
        let keyboard = open(&db, "keyboard", DeviceKind::Keyboard);
        assert_eq!(keyboard.svg_for(Scancode::A, 2).unwrap(), "<svg id='a2'/>");
        assert_eq!(keyboard.svg_for(Scancode::A, 3).unwrap(), "<svg id='a'/>");
        assert_eq!(keyboard.svg_for(Scancode::ESCAPE, 1).unwrap(), "<svg id='key'/>");

        let mouse = open(&db, "mouse", DeviceKind::Mouse);
        assert_eq!(mouse.svg_for(MouseIcon::Left, 0).unwrap(), "<svg id='left'/>");
        assert_eq!(mouse.svg_for(MouseIcon::Scroll, 2).unwrap(), "<svg id='none'/>");
    }

    #[test]
    fn test_query_validation() {
        let db = standard();
        let pad = open(&db, "xbox360", DeviceKind::Gamepad);
        assert!(matches!(
            pad.svg_for(GamepadButton::South, 8),
            Err(ArtError::InvalidArgument(_))
        ));
        assert!(matches!(
            pad.has_svg_for(Scancode::A, 0),
            Err(ArtError::InvalidArgument(_))
        ));
        assert!(matches!(
            pad.svg_for(Scancode(999), 0),
            Err(ArtError::InvalidArgument(_))
        ));

        let keyboard = open(&db, "keyboard", DeviceKind::Keyboard);
        assert!(matches!(
            keyboard.svg_for(Scancode(999), 0),
            Err(ArtError::InvalidArgument(_))
        ));
        assert!(matches!(
            keyboard.svg_for(Scancode::A, 4),
            Err(ArtError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_surface_for() {
        let db = standard();
        let mut pad = open(&db, "xbox360", DeviceKind::Gamepad);

        let red = pad.surface_for(GamepadButton::South, 20, 0).unwrap();
        assert_eq!((red.width(), red.height()), (20, 20));
        assert_eq!(red.pixel(19, 19), Some([255, 0, 0, 255]));

        let blue = pad.surface_for(GamepadButton::East, 20, 5).unwrap();
        assert_eq!(blue.pixel(2, 10), Some([0, 0, 255, 255]));
        assert_eq!(blue.pixel(15, 10).map(|p| p[3]), Some(0));

        assert!(matches!(
            pad.surface_for(GamepadButton::South, 0, 0),
            Err(RenderError::Art(ArtError::InvalidArgument(_)))
        ));
        assert!(matches!(
            pad.surface_for(GamepadButton::North, 16, 0),
            Err(RenderError::Art(ArtError::NoImageAvailable))
        ));
    }

    #[test]
    fn test_failed_parse_keeps_text() {
        let db = standard();
        let backend = Recording::default();
        let mut pad =
            DeviceImages::by_id_string(&db, "xboxone", DeviceKind::Gamepad, backend.clone())
                .unwrap();

        assert_eq!(pad.svg_for(GamepadButton::North, 0).unwrap(), "<svg id='broken'/>");
        assert!(matches!(
            pad.surface_for(GamepadButton::North, 8, 0),
            Err(RenderError::Art(ArtError::NoImageAvailable))
        ));
        let surface = pad.surface_for(GamepadButton::South, 8, 0).unwrap();
        assert_eq!(surface.pixel(0, 0), Some([1, 2, 3, 255]));
        assert_eq!(pad.rasterizer, 1);

        // The stored text survives the parser clearing its copy.
        assert_eq!(backend.parsed.borrow().len(), 5);
        assert_eq!(pad.svg_for(GamepadButton::South, 1).unwrap(), "<svg id='south-1'/>");
    }

    #[test]
    fn test_lookup_chain() {
        let db = standard();
        let xbox_one: Guid = XBOX_ONE.parse().unwrap();
        let lookup = |descriptor: &HardwareDescriptor| {
            DeviceImages::by_descriptor(&db, descriptor, DeviceKind::Gamepad, BasicSvg::new())
                .map(|d| d.device_type().to_string())
                .unwrap()
        };

        // Exact GUID
        assert_eq!(lookup(&HardwareDescriptor::new(xbox_one)), "xboxone");

        // Same device over a transport that reports a different CRC
        let mut other_crc = xbox_one;
        other_crc.0[2] = 0x12;
        other_crc.0[3] = 0x34;
        let mut crc_db = database(&[DeviceEntry::new("crcless")
            .item("south_0", "<svg/>")
            .guid("030000005e040000e002000003096800".parse().unwrap())]);
        let descriptor = HardwareDescriptor::new(other_crc);
        let found =
            DeviceImages::by_descriptor(&crc_db, &descriptor, DeviceKind::Gamepad, BasicSvg::new())
                .unwrap();
        assert_eq!(found.device_type(), "crcless");
        crc_db.shutdown();

        // VID/PID only: different driver bytes, same vendor and product
        let mut revised = xbox_one;
        revised.0[12] = 0xff;
        let revised = HardwareDescriptor::new(revised).with_vid_pid(0x045e, 0x02e0);
        assert_eq!(lookup(&revised), "xboxone");

        // Family name, then the configured fallback
        let unknown = Guid([7; 16]);
        assert_eq!(lookup(&HardwareDescriptor::new(unknown).with_family("ps4")), "ps4");
        assert_eq!(lookup(&HardwareDescriptor::new(unknown).with_family("switchpro")), "xbox360");
    }

    #[test]
    fn test_lookup_chain_exhausted() {
        let db = database(&[DeviceEntry::new("ps4").item("south_0", "<svg/>")]);
        let result = DeviceImages::by_descriptor(
            &db,
            &HardwareDescriptor::new(Guid([7; 16])),
            DeviceKind::Gamepad,
            BasicSvg::new(),
        );
        assert!(matches!(result, Err(RenderError::Art(ArtError::NotFound(_)))));
    }

    #[test]
    fn test_by_instance() {
        let db = standard();
        let source = |instance: u32| match instance {
            1 => Some(HardwareDescriptor::new(XBOX_ONE.parse().unwrap())),
            2 => Some(HardwareDescriptor::default().with_family("ps4")),
            _ => None,
        };

        let pad =
            DeviceImages::by_instance(&db, &source, 1, DeviceKind::Gamepad, BasicSvg::new())
                .unwrap();
        assert_eq!(pad.device_type(), "xboxone");
        assert!(matches!(
            DeviceImages::by_instance(&db, &source, 2, DeviceKind::Gamepad, BasicSvg::new()),
            Err(RenderError::Art(ArtError::NotFound(_)))
        ));
        assert!(matches!(
            DeviceImages::by_instance(&db, &source, 3, DeviceKind::Gamepad, BasicSvg::new()),
            Err(RenderError::Art(ArtError::NotFound(_)))
        ));
    }

    #[test]
    fn test_handles_outlive_shutdown() {
        let mut db = standard();
        let mut pad = open(&db, "xbox360", DeviceKind::Gamepad);
        db.shutdown();

        assert_eq!(pad.svg_for(GamepadButton::South, 0).unwrap(), RED_SQUARE);
        assert!(pad.surface_for(GamepadButton::South, 4, 0).is_ok());
        assert!(matches!(
            DeviceImages::by_id_string(&db, "xbox360", DeviceKind::Gamepad, BasicSvg::new()),
            Err(RenderError::Art(ArtError::NotInitialized))
        ));
    }

    #[test]
    fn test_record_refcount_unaffected_by_handles() {
        let db = standard();
        let before = db.refcount("xboxone");
        let pad = open(&db, "xboxone", DeviceKind::Gamepad);
        assert_eq!(db.refcount("xboxone"), before);
        drop(pad);
        assert_eq!(db.refcount("xboxone"), 3);
    }
}

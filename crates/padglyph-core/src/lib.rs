//! Padglyph Core - Device-art database
//!
//! This crate maps input-device controls to SVG artwork:
//! - Binary database decoding and encoding
//! - String interning and a refcounted device registry keyed by type name and GUID
//! - Inheritance resolution into per-control, per-variant SVG tables
//! - Control name spaces for gamepads, keyboards and mice

pub mod config;
pub mod controls;
pub mod database;
pub mod error;
pub mod format;
pub mod guid;
pub mod intern;
pub mod record;
pub mod registry;
pub mod resolve;

pub use config::{ArtConfig, ConfigError, FallbackConfig, RenderConfig};
pub use controls::{Category, Control, DeviceKind, GamepadAxis, GamepadButton, MouseIcon, Scancode};
pub use database::ArtDatabase;
pub use error::{ArtError, ItemIssue};
pub use format::{DatabaseWriter, DeviceEntry, CURRENT_VERSION};
pub use guid::Guid;
pub use record::{ControlItem, DeviceRecord};
pub use resolve::{Resolution, ResolvedImages, SvgTable};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

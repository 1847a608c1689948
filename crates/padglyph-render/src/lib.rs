//! Padglyph Render - Device image handles and SVG rasterization
//!
//! Builds per-device image handles on top of `padglyph-core`: hardware
//! lookup, variant fallbacks, and rendering through a pluggable
//! [`VectorBackend`]. [`BasicSvg`] is the built-in backend.

pub mod backend;
pub mod device;
pub mod error;
pub mod hardware;
pub mod surface;
pub mod svg;

pub use backend::{ParseHints, VectorBackend};
pub use device::DeviceImages;
pub use error::RenderError;
pub use hardware::{HardwareDescriptor, HardwareSource};
pub use surface::Surface;
pub use svg::{BasicSvg, SvgScene};

//! Device records as loaded from a database

use std::rc::Rc;

use crate::guid::Guid;

/// One named image: `south_0` → `<svg ...>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlItem {
    pub control: Rc<str>,
    pub svg: Rc<str>,
}

/// A device definition, possibly inheriting from another one.
///
/// All strings point into the database's interner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub device_type: Rc<str>,
    pub inherits: Option<Rc<str>>,
    pub items: Vec<ControlItem>,
    pub guids: Vec<Guid>,
}

//! String interning for device names, control names and SVG markup
//!
//! A database easily repeats the same SVG document across dozens of devices
//! (every theme that inherits the standard face buttons, for example), so each
//! distinct string is stored exactly once. Interned strings are handed out as
//! `Rc<str>`; two requests for equal text always return pointers to the same
//! allocation.

use std::collections::HashSet;
use std::rc::Rc;

/// Deduplicating store of immutable strings
#[derive(Debug, Default)]
pub struct StringInterner {
    table: HashSet<Rc<str>>,
    /// Total bytes of distinct text held
    bytes: usize,
}

impl StringInterner {
    /// Create an empty interner
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, reusing the stored copy if byte-identical text exists
    pub fn intern(&mut self, text: &str) -> Rc<str> {
        if let Some(existing) = self.table.get(text) {
            return Rc::clone(existing);
        }
        let stored: Rc<str> = Rc::from(text);
        self.bytes += stored.len();
        self.table.insert(Rc::clone(&stored));
        stored
    }

    /// Look up already-interned text without inserting it
    pub fn get(&self, text: &str) -> Option<Rc<str>> {
        self.table.get(text).cloned()
    }

    /// Number of distinct strings
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Total size in bytes of all distinct strings
    pub fn total_bytes(&self) -> usize {
        self.bytes
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.table.clear();
        self.bytes = 0;
    }
}

//! Describing connected hardware for image lookup

use padglyph_core::guid::crc_masked_key;
use padglyph_core::Guid;

/// What the input layer knows about one connected device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HardwareDescriptor {
    pub guid: Guid,
    /// Coarse type string such as `"ps4"` or `"switchpro"`
    pub family: Option<String>,
    pub vendor_id: u16,
    pub product_id: u16,
}

impl HardwareDescriptor {
    pub fn new(guid: Guid) -> Self {
        Self {
            guid,
            ..Self::default()
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn with_vid_pid(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self.product_id = product_id;
        self
    }

    /// Registry keys to try, most specific first:
    /// exact GUID, GUID with its CRC zeroed, VID/PID-only GUID, family,
    /// then `fallback`.
    pub fn lookup_keys(&self, fallback: &str) -> Vec<String> {
        let mut keys = Vec::with_capacity(5);
        if !self.guid.is_zero() {
            let exact = self.guid.to_key();
            if let Some(masked) = crc_masked_key(&exact) {
                keys.push(exact);
                keys.push(masked);
            }
        }
        if self.vendor_id != 0 || self.product_id != 0 {
            keys.push(Guid::from_vid_pid(self.vendor_id, self.product_id).to_key());
        }
        if let Some(family) = self.family.as_deref().filter(|f| !f.is_empty()) {
            keys.push(family.to_string());
        }
        if !fallback.is_empty() {
            keys.push(fallback.to_string());
        }
        keys.dedup();
        keys
    }
}

/// Source of descriptors for live device instances
pub trait HardwareSource {
    fn descriptor(&self, instance: u32) -> Option<HardwareDescriptor>;
}

impl<F> HardwareSource for F
where
    F: Fn(u32) -> Option<HardwareDescriptor>,
{
    fn descriptor(&self, instance: u32) -> Option<HardwareDescriptor> {
        self(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XBOX_ONE: &str = "0300a7d75e040000e002000003096800";

    #[test]
    fn test_lookup_key_order() {
        let descriptor = HardwareDescriptor::new(XBOX_ONE.parse().unwrap())
            .with_vid_pid(0x045e, 0x02e0)
            .with_family("xboxone");
        assert_eq!(
            descriptor.lookup_keys("xbox360"),
            vec![
                XBOX_ONE.to_string(),
                "030000005e040000e002000003096800".to_string(),
                "000000005e040000e002000000000000".to_string(),
                "xboxone".to_string(),
                "xbox360".to_string(),
            ]
        );
    }

    #[test]
    fn test_zero_guid_skips_guid_keys() {
        let descriptor = HardwareDescriptor::default().with_family("ps4");
        assert_eq!(descriptor.lookup_keys("xbox360"), vec!["ps4", "xbox360"]);
    }

    #[test]
    fn test_closure_source() {
        let source = |instance: u32| {
            (instance == 7).then(|| HardwareDescriptor::default().with_family("ps5"))
        };
        assert!(source.descriptor(7).is_some());
        assert!(source.descriptor(8).is_none());
    }
}

//! Hardware GUIDs and the registry keys derived from them
//!
//! A GUID is 16 raw bytes as reported by the input layer. Registry keys use
//! its canonical form: 32 lowercase hex characters, byte order preserved.
//! Within that string the CRC lives at `[4, 8)`, the USB vendor id at
//! `[8, 12)` and the product id at `[16, 20)` (both little-endian).

use std::fmt;
use std::str::FromStr;

use crate::error::ArtError;

/// Length of a GUID key string
pub const GUID_KEY_LEN: usize = 32;

const CRC_FIELD: std::ops::Range<usize> = 4..8;
const VENDOR_FIELD: std::ops::Range<usize> = 8..12;
const PRODUCT_FIELD: std::ops::Range<usize> = 16..20;

/// Raw 16-byte hardware identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// The all-zero GUID, reported for devices the input layer can't identify
    pub const ZERO: Guid = Guid([0; 16]);

    /// Build a synthetic GUID carrying only a USB vendor/product pair
    pub fn from_vid_pid(vendor_id: u16, product_id: u16) -> Self {
        let mut bytes = [0u8; 16];
        bytes[4..6].copy_from_slice(&vendor_id.to_le_bytes());
        bytes[8..10].copy_from_slice(&product_id.to_le_bytes());
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 16]
    }

    /// Canonical registry key: 32 lowercase hex characters
    pub fn to_key(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

impl FromStr for Guid {
    type Err = ArtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != GUID_KEY_LEN {
            return Err(ArtError::InvalidArgument(format!(
                "GUID must be {} hex characters, got {:?}",
                GUID_KEY_LEN, s
            )));
        }
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| ArtError::InvalidArgument(format!("GUID {:?}: {}", s, e)))?;
        Ok(Self(bytes))
    }
}

/// Derive the VID/PID-only key from a GUID key.
///
/// Everything but the vendor and product fields is zeroed, which catches
/// revisions of the same device that differ in driver or version bytes.
/// Returns `None` if `key` is not a well-formed GUID key.
pub fn vid_pid_key(key: &str) -> Option<String> {
    if !is_guid_key(key) {
        return None;
    }
    let mut masked = "0".repeat(GUID_KEY_LEN);
    masked.replace_range(VENDOR_FIELD, key.get(VENDOR_FIELD)?);
    masked.replace_range(PRODUCT_FIELD, key.get(PRODUCT_FIELD)?);
    Some(masked)
}

/// Derive the key with the CRC field zeroed.
///
/// Some transports report a different CRC for the same physical device.
pub fn crc_masked_key(key: &str) -> Option<String> {
    if !is_guid_key(key) {
        return None;
    }
    let mut masked = key.to_string();
    masked.replace_range(CRC_FIELD, "0000");
    Some(masked)
}

fn is_guid_key(key: &str) -> bool {
    key.len() == GUID_KEY_LEN && key.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const XBOX_ONE: &str = "0300a7d75e040000e002000003096800";

    #[test]
    fn test_key_is_lowercase_hex() {
        let guid = Guid([
            0x03, 0x00, 0xA7, 0xD7, 0x5E, 0x04, 0x00, 0x00, 0xE0, 0x02, 0x00, 0x00, 0x03, 0x09,
            0x68, 0x00,
        ]);
        assert_eq!(guid.to_key(), XBOX_ONE);
        assert_eq!(guid.to_string(), XBOX_ONE);
    }

    #[test]
    fn test_parse_round_trips() {
        let guid: Guid = XBOX_ONE.parse().unwrap();
        assert_eq!(guid.to_key(), XBOX_ONE);
        let upper: Guid = XBOX_ONE.to_uppercase().parse().unwrap();
        assert_eq!(upper, guid);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("0300".parse::<Guid>().is_err());
        assert!("zz00a7d75e040000e002000003096800".parse::<Guid>().is_err());
    }

    #[test]
    fn test_vid_pid_key() {
        assert_eq!(
            vid_pid_key(XBOX_ONE).as_deref(),
            Some("000000005e040000e002000000000000")
        );
        assert_eq!(vid_pid_key("short"), None);
    }

    #[test]
    fn test_vid_pid_guid_matches_masked_key() {
        let synthetic = Guid::from_vid_pid(0x045e, 0x02e0);
        assert_eq!(Some(synthetic.to_key()), vid_pid_key(XBOX_ONE));
    }

    #[test]
    fn test_crc_masked_key() {
        assert_eq!(
            crc_masked_key(XBOX_ONE).as_deref(),
            Some("030000005e040000e002000003096800")
        );
    }

    #[test]
    fn test_zero_guid() {
        assert!(Guid::ZERO.is_zero());
        assert!(!Guid::from_vid_pid(1, 2).is_zero());
    }
}

//! Device identity configuration.
//!
//! Every value has a build-time default read from the environment of the
//! compiler invocation. A [`DeviceIdentity`] can also be loaded at runtime
//! from a JSON blob; fields missing from the blob keep the build-time value.

use heapless::String;
use serde::Deserialize;

use crate::util::{ConfigError, UtilError};

/// Length of the hash the serial number is derived from.
pub const MD5_HASH_LEN: usize = 16;

/// Hash the serial number is rendered from.
pub const HASH_VALUE: [u8; MD5_HASH_LEN] = [
    0x3c, 0x7a, 0x15, 0xd2, 0x8e, 0x41, 0x09, 0xbf, 0x62, 0xa4, 0x5d, 0xe0, 0x17, 0x93, 0xc8, 0x2b,
];

pub const MANUFACTURER: &str = match option_env!("MTP_MANUFACTURER") {
    Some(v) => v,
    None => "Generic",
};

pub const MODEL: &str = match option_env!("MTP_MODEL") {
    Some(v) => v,
    None => "Generic MTP Device",
};

pub const DEVICE_VERSION: &str = match option_env!("MTP_DEVICE_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

pub const BUILD_INFO: &str = match option_env!("MTP_BUILD_INFO") {
    Some(v) => v,
    None => "release",
};

pub const VENDOR_EXTENSION_DESC: &str = match option_env!("MTP_VENDOR_EXTENSION_DESC") {
    Some(v) => v,
    None => "microsoft.com: 1.0; android.com: 1.0;",
};

pub const EXTERNAL_PATH: &str = match option_env!("MTP_EXTERNAL_PATH") {
    Some(v) => v,
    None => "/media/card",
};

/// Capacity of every identity string held by [`DeviceIdentity`].
pub const IDENTITY_STR_LEN: usize = 128;

pub type IdentityString = String<IDENTITY_STR_LEN>;

/// Runtime identity of the device, as advertised in DeviceInfo.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeviceIdentity {
    pub manufacturer: IdentityString,
    pub model: IdentityString,
    pub device_version: IdentityString,
    pub build_info: IdentityString,
    pub vendor_extension_desc: IdentityString,
    pub external_path: IdentityString,
    #[serde(skip, default = "default_hash")]
    pub hash: [u8; MD5_HASH_LEN],
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        DeviceIdentity {
            manufacturer: truncated(MANUFACTURER),
            model: truncated(MODEL),
            device_version: truncated(DEVICE_VERSION),
            build_info: truncated(BUILD_INFO),
            vendor_extension_desc: truncated(VENDOR_EXTENSION_DESC),
            external_path: truncated(EXTERNAL_PATH),
            hash: HASH_VALUE,
        }
    }
}

impl DeviceIdentity {
    /// Parses an identity from JSON, e.g. `{"model":"Tab 7","manufacturer":"Acme"}`.
    pub fn from_json(json: &[u8]) -> Result<Self, UtilError> {
        match serde_json_core::from_slice::<DeviceIdentity>(json) {
            Ok((identity, consumed)) => {
                if json[consumed..].iter().any(|b| !b.is_ascii_whitespace()) {
                    log::error!("Trailing characters after device identity at byte {}", consumed);
                    return Err(UtilError::Config(ConfigError::TrailingCharacters));
                }
                Ok(identity)
            }
            Err(e) => {
                log::error!("Invalid device identity: {}", e);
                Err(UtilError::Config(ConfigError::Syntax))
            }
        }
    }
}

fn default_hash() -> [u8; MD5_HASH_LEN] {
    HASH_VALUE
}

// Build-time values longer than the identity capacity are cut at a char boundary.
fn truncated(s: &str) -> IdentityString {
    let mut out = IdentityString::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_identity_uses_build_constants() {
        let identity = DeviceIdentity::default();
        assert_eq!(identity.model.as_str(), MODEL);
        assert_eq!(identity.external_path.as_str(), EXTERNAL_PATH);
        assert_eq!(identity.hash, HASH_VALUE);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let identity = DeviceIdentity::from_json(br#"{"model":"Tab 7","manufacturer":"Acme"}"#).unwrap();
        assert_eq!(identity.model.as_str(), "Tab 7");
        assert_eq!(identity.manufacturer.as_str(), "Acme");
        assert_eq!(identity.device_version.as_str(), DEVICE_VERSION);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert_eq!(
            DeviceIdentity::from_json(b"{\"model\":"),
            Err(UtilError::Config(ConfigError::Syntax))
        );
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        assert_eq!(
            DeviceIdentity::from_json(br#"{"model":"x"}garbage"#),
            Err(UtilError::Config(ConfigError::TrailingCharacters))
        );
    }

    #[test]
    fn test_trailing_whitespace_is_accepted() {
        let identity = DeviceIdentity::from_json(b"{\"model\":\"x\"}\n  \t").unwrap();
        assert_eq!(identity.model.as_str(), "x");
    }

    #[test]
    fn test_truncated_respects_capacity() {
        let long = "x".repeat(IDENTITY_STR_LEN + 10);
        assert_eq!(truncated(&long).len(), IDENTITY_STR_LEN);
    }
}

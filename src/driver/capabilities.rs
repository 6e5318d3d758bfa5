//! Driver capability descriptor.
//!
//! The descriptor is published once by the native module and carries the
//! numeric vocabulary for every convertible configuration field.

use super::Platform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from a symbolic value (`"back"`, `"torch"`) to its native code.
pub type CodeTable = BTreeMap<String, i64>;

/// Barcode detector constants exposed alongside the camera constants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BarcodeDetectionConstants {
    /// Barcode format bit flags, keyed by format name.
    #[serde(default)]
    pub barcode_type: CodeTable,
}

/// Capability constants of the native capture driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverCapabilities {
    /// Capture-facing selection codes.
    #[serde(rename = "Type")]
    pub facing: CodeTable,
    /// Flash behavior codes.
    #[serde(rename = "FlashMode")]
    pub flash_mode: CodeTable,
    /// Focus behavior codes.
    #[serde(rename = "AutoFocus")]
    pub auto_focus: CodeTable,
    /// Detector-mode constants.
    #[serde(rename = "GoogleVisionBarcodeDetection", default)]
    pub barcode_detection: BarcodeDetectionConstants,
    /// Set when no native module was found and the stub descriptor is in use.
    #[serde(default)]
    pub stubbed: bool,
}

fn table<const N: usize>(entries: [(&str, i64); N]) -> CodeTable {
    entries
        .into_iter()
        .map(|(name, code)| (name.to_string(), code))
        .collect()
}

fn barcode_formats() -> BarcodeDetectionConstants {
    BarcodeDetectionConstants {
        barcode_type: table([
            ("ALL_FORMATS", 0),
            ("CODE_128", 1),
            ("CODE_39", 2),
            ("CODE_93", 4),
            ("CODABAR", 8),
            ("DATA_MATRIX", 16),
            ("EAN_13", 32),
            ("EAN_8", 64),
            ("ITF", 128),
            ("QR_CODE", 256),
            ("UPC_A", 512),
            ("UPC_E", 1024),
            ("PDF417", 2048),
            ("AZTEC", 4096),
        ]),
    }
}

impl DriverCapabilities {
    /// Minimal descriptor used when the native module is unavailable.
    pub fn stub() -> Self {
        Self {
            facing: table([("back", 1)]),
            flash_mode: table([("off", 1)]),
            auto_focus: table([("on", 1)]),
            barcode_detection: BarcodeDetectionConstants::default(),
            stubbed: true,
        }
    }

    /// Descriptor published by the Android driver.
    pub fn android() -> Self {
        Self {
            facing: table([("back", 0), ("front", 1)]),
            flash_mode: table([("off", 0), ("on", 1), ("torch", 2), ("auto", 3)]),
            auto_focus: table([("off", 0), ("on", 1)]),
            barcode_detection: barcode_formats(),
            stubbed: false,
        }
    }

    /// Descriptor published by the iOS driver.
    ///
    /// Codes follow the AVFoundation enumerations the driver wraps.
    pub fn ios() -> Self {
        Self {
            facing: table([("front", 2), ("back", 1)]),
            flash_mode: table([("off", 0), ("on", 1), ("auto", 2), ("torch", 3)]),
            auto_focus: table([("off", 0), ("on", 2)]),
            barcode_detection: barcode_formats(),
            stubbed: false,
        }
    }

    /// Returns the descriptor the given platform's driver publishes.
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Android => Self::android(),
            Platform::Ios => Self::ios(),
        }
    }

    /// Returns true if this is the stub descriptor.
    #[inline]
    pub fn is_stubbed(&self) -> bool {
        self.stubbed
    }
}

impl Default for DriverCapabilities {
    fn default() -> Self {
        Self::stub()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_matches_fallback_table() {
        let caps = DriverCapabilities::stub();
        assert!(caps.is_stubbed());
        assert_eq!(caps.facing.get("back"), Some(&1));
        assert_eq!(caps.flash_mode.get("off"), Some(&1));
        assert_eq!(caps.auto_focus.get("on"), Some(&1));
        assert!(caps.facing.get("front").is_none());
    }

    #[test]
    fn test_platform_tables_differ() {
        let android = DriverCapabilities::for_platform(Platform::Android);
        let ios = DriverCapabilities::for_platform(Platform::Ios);
        assert_eq!(android.facing.get("back"), Some(&0));
        assert_eq!(ios.facing.get("back"), Some(&1));
        assert_eq!(ios.flash_mode.get("torch"), Some(&3));
        assert!(!android.is_stubbed());
    }

    #[test]
    fn test_descriptor_deserializes_native_keys() {
        let json = r#"{
            "Type": {"back": 0, "front": 1},
            "FlashMode": {"off": 0, "on": 1, "torch": 2, "auto": 3},
            "AutoFocus": {"off": 0, "on": 1},
            "GoogleVisionBarcodeDetection": {"BarcodeType": {"QR_CODE": 256, "EAN_13": 32}}
        }"#;
        let caps: DriverCapabilities = serde_json::from_str(json).unwrap();
        assert_eq!(caps.barcode_detection.barcode_type.get("QR_CODE"), Some(&256));
        assert_eq!(caps.barcode_detection.barcode_type.len(), 2);
        assert_eq!(caps.flash_mode.get("torch"), Some(&2));
        assert!(!caps.stubbed);
    }

    #[test]
    fn test_descriptor_serializes_native_keys() {
        let value = serde_json::to_value(DriverCapabilities::android()).unwrap();
        let formats = &value["GoogleVisionBarcodeDetection"]["BarcodeType"];
        assert_eq!(formats["QR_CODE"], 256);
        assert!(value.get("BarcodeDetection").is_none());
    }
}

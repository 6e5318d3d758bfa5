//! Symbolic-to-native prop translation.

use super::CameraConfig;
use crate::driver::{CodeTable, DriverCapabilities, Platform};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Native prop that switches the surface into detector mode.
pub const DETECTOR_ENABLED_KEY: &str = "googleVisionBarcodeDetectorEnabled";

/// Configuration fields whose symbolic values have a native code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConvertibleField {
    Type,
    FlashMode,
    AutoFocus,
}

impl ConvertibleField {
    /// All convertible fields.
    pub const ALL: [ConvertibleField; 3] = [
        ConvertibleField::Type,
        ConvertibleField::FlashMode,
        ConvertibleField::AutoFocus,
    ];

    /// Prop key of the field.
    pub fn key(self) -> &'static str {
        match self {
            ConvertibleField::Type => "type",
            ConvertibleField::FlashMode => "flashMode",
            ConvertibleField::AutoFocus => "autoFocus",
        }
    }

    /// Resolves a prop key to its field, if convertible.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl fmt::Display for ConvertibleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Translation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("unknown {field} value \"{value}\"")]
    UnknownValue {
        field: ConvertibleField,
        value: String,
    },
}

/// Per-field lookup tables built from the driver descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTable {
    tables: BTreeMap<ConvertibleField, CodeTable>,
}

impl ConversionTable {
    /// Builds the table from the driver's capability descriptor.
    pub fn from_capabilities(capabilities: &DriverCapabilities) -> Self {
        let tables = BTreeMap::from([
            (ConvertibleField::Type, capabilities.facing.clone()),
            (ConvertibleField::FlashMode, capabilities.flash_mode.clone()),
            (ConvertibleField::AutoFocus, capabilities.auto_focus.clone()),
        ]);
        Self { tables }
    }

    /// Looks up the native code of a symbolic value.
    pub fn lookup(&self, field: ConvertibleField, symbol: &str) -> Option<i64> {
        self.tables.get(&field)?.get(symbol).copied()
    }

    /// Symbolic values accepted for `field`, in sorted order.
    pub fn symbols(&self, field: ConvertibleField) -> impl Iterator<Item = &str> + '_ {
        self.tables
            .get(&field)
            .into_iter()
            .flat_map(|table| table.keys().map(String::as_str))
    }
}

/// Props in the driver's vocabulary, ready for the capture surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeProps(Map<String, Value>);

impl NativeProps {
    /// Returns the value of a prop.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true if the prop is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns true if detector mode is enabled.
    pub fn detector_enabled(&self) -> bool {
        self.0
            .get(DETECTOR_ENABLED_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Borrows the underlying mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the props, returning the underlying mapping.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Fields the given platform cannot accept.
fn unsupported_fields(platform: Platform) -> &'static [&'static str] {
    if platform.supports_ratio() {
        &[]
    } else {
        &["ratio"]
    }
}

/// Translates configuration into native props for one platform.
///
/// Translation is pure: the table is fixed at construction.
#[derive(Debug, Clone)]
pub struct PropTranslator {
    table: ConversionTable,
    platform: Platform,
}

impl PropTranslator {
    /// Creates a translator over an existing table.
    pub fn new(table: ConversionTable, platform: Platform) -> Self {
        Self { table, platform }
    }

    /// Creates a translator from a driver descriptor.
    pub fn from_capabilities(capabilities: &DriverCapabilities, platform: Platform) -> Self {
        Self::new(ConversionTable::from_capabilities(capabilities), platform)
    }

    /// Returns the conversion table.
    pub fn table(&self) -> &ConversionTable {
        &self.table
    }

    /// Returns the target platform.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Translates a prop mapping.
    ///
    /// String values of convertible fields are replaced by their native
    /// code; everything else passes through. `detection_enabled` adds the
    /// detector-mode flag. Fields unsupported on the platform are removed.
    pub fn translate(
        &self,
        config: &Map<String, Value>,
        detection_enabled: bool,
    ) -> Result<NativeProps, TranslateError> {
        let mut props = Map::new();

        for (key, value) in config {
            let converted = match (ConvertibleField::from_key(key), value) {
                (Some(field), Value::String(symbol)) => {
                    let code = self.table.lookup(field, symbol).ok_or_else(|| {
                        TranslateError::UnknownValue {
                            field,
                            value: symbol.clone(),
                        }
                    })?;
                    Value::from(code)
                }
                _ => value.clone(),
            };
            props.insert(key.clone(), converted);
        }

        if detection_enabled {
            props.insert(DETECTOR_ENABLED_KEY.to_string(), Value::Bool(true));
        }

        for field in unsupported_fields(self.platform) {
            if props.remove(*field).is_some() {
                tracing::trace!(field, platform = %self.platform, "Dropped unsupported prop");
            }
        }

        Ok(NativeProps(props))
    }

    /// Translates a typed configuration.
    pub fn translate_config(
        &self,
        config: &CameraConfig,
        detection_enabled: bool,
    ) -> Result<NativeProps, TranslateError> {
        self.translate(&config.to_props(), detection_enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn stub_translator(platform: Platform) -> PropTranslator {
        PropTranslator::from_capabilities(&DriverCapabilities::stub(), platform)
    }

    #[test]
    fn test_translates_symbols_to_codes() {
        let translator = stub_translator(Platform::Android);
        let props = translator
            .translate(&object(json!({"flashMode": "off", "type": "back"})), false)
            .unwrap();
        assert_eq!(props.as_map(), &object(json!({"flashMode": 1, "type": 1})));
    }

    #[test]
    fn test_native_codes_pass_through() {
        let translator = stub_translator(Platform::Android);
        let props = translator
            .translate(&object(json!({"type": 9, "autoFocus": false, "zoom": 0.5})), false)
            .unwrap();
        assert_eq!(props.get("type"), Some(&json!(9)));
        assert_eq!(props.get("autoFocus"), Some(&json!(false)));
        assert_eq!(props.get("zoom"), Some(&json!(0.5)));
    }

    #[test]
    fn test_unknown_symbol_is_misconfiguration() {
        let translator = stub_translator(Platform::Android);
        let err = translator
            .translate(&object(json!({"flashMode": "torch"})), false)
            .unwrap_err();
        assert_eq!(
            err,
            TranslateError::UnknownValue {
                field: ConvertibleField::FlashMode,
                value: "torch".into(),
            }
        );
    }

    #[test]
    fn test_detector_flag_added() {
        let translator = stub_translator(Platform::Android);
        let props = translator.translate(&Map::new(), true).unwrap();
        assert!(props.detector_enabled());
        assert_eq!(props.get("googleVisionBarcodeDetectorEnabled"), Some(&Value::Bool(true)));

        let props = translator.translate(&Map::new(), false).unwrap();
        assert!(!props.contains(DETECTOR_ENABLED_KEY));
    }

    #[test]
    fn test_ratio_stripped_on_ios() {
        let config = object(json!({"ratio": "16:9", "zoom": 0}));

        let ios = stub_translator(Platform::Ios).translate(&config, false).unwrap();
        assert!(!ios.contains("ratio"));
        assert!(ios.contains("zoom"));

        let android = stub_translator(Platform::Android).translate(&config, false).unwrap();
        assert_eq!(android.get("ratio"), Some(&json!("16:9")));
    }

    #[test]
    fn test_default_config_translates_on_every_descriptor() {
        let config = CameraConfig::default();
        for caps in [
            DriverCapabilities::stub(),
            DriverCapabilities::android(),
            DriverCapabilities::ios(),
        ] {
            let translator = PropTranslator::from_capabilities(&caps, Platform::Android);
            assert!(translator.translate_config(&config, false).is_ok());
        }
    }

    #[test]
    fn test_symbols_listed() {
        let table = ConversionTable::from_capabilities(&DriverCapabilities::android());
        let symbols: Vec<_> = table.symbols(ConvertibleField::FlashMode).collect();
        assert_eq!(symbols, vec!["auto", "off", "on", "torch"]);
    }

    proptest! {
        #[test]
        fn prop_translation_is_pure(key in "[a-z]{1,8}", text in "[a-z]{0,8}", n in any::<i64>()) {
            let translator = stub_translator(Platform::Android);
            let config = object(json!({ key.clone(): text, "focusDepth": n }));
            let first = translator.translate(&config, false);
            let second = translator.translate(&config, false);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_unconvertible_fields_unchanged(key in "x[a-z]{0,8}", text in ".{0,12}") {
            let translator = stub_translator(Platform::Android);
            let config = object(json!({ key.clone(): text.clone() }));
            let props = translator.translate(&config, false).unwrap();
            prop_assert_eq!(props.get(&key), Some(&Value::String(text)));
        }

        #[test]
        fn prop_ratio_never_reaches_ios(ratio in "[0-9]{1,2}:[0-9]{1,2}") {
            let translator = stub_translator(Platform::Ios);
            let config = object(json!({ "ratio": ratio }));
            prop_assert!(!translator.translate(&config, true).unwrap().contains("ratio"));
        }
    }
}

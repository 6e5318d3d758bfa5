//! Declarative camera configuration and its translation to native props.
//!
//! Applications describe the camera in symbolic terms (`"back"`, `"torch"`).
//! The translator rewrites those into the driver's numeric vocabulary and
//! strips fields the current platform cannot accept.

mod config;
mod translate;

pub use config::{CameraConfig, ConfigError, PropValue};
pub use translate::{
    ConversionTable, ConvertibleField, NativeProps, PropTranslator, TranslateError,
    DETECTOR_ENABLED_KEY,
};

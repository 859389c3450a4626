//! WASM bindings for core-runtime
//!
//! Exposes logging configuration to JavaScript/TypeScript.

use crate::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use wasm_bindgen::prelude::*;

fn to_js_error<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// JavaScript-accessible logging configuration
#[wasm_bindgen]
#[derive(Clone)]
pub struct JsLoggingConfig {
    inner: LoggingConfig,
}

#[wasm_bindgen]
impl JsLoggingConfig {
    /// Create a new logging configuration with defaults
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: LoggingConfig::default(),
        }
    }

    /// Set log format (0 = Pretty, 1 = Json, 2 = Compact)
    #[wasm_bindgen(js_name = setFormat)]
    pub fn set_format(&mut self, format: u8) {
        self.inner.format = match format {
            1 => LogFormat::Json,
            2 => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
    }

    /// Set minimum log level (0 = Trace, 1 = Debug, 2 = Info, 3 = Warn, 4 = Error)
    #[wasm_bindgen(js_name = setLevel)]
    pub fn set_level(&mut self, level: u8) {
        self.inner.level = match level {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Info,
        };
    }

    /// Set custom filter string (e.g., "core_vorbis=trace")
    #[wasm_bindgen(js_name = setFilter)]
    pub fn set_filter(&mut self, filter: String) {
        self.inner.filter = Some(filter);
    }
}

impl Default for JsLoggingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize logging system
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging_js(config: JsLoggingConfig) -> Result<(), JsValue> {
    init_logging(config.inner).map_err(to_js_error)
}

/// Enable Rust logging to browser console at debug level.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
#[wasm_bindgen(js_name = enableConsoleLogging)]
pub fn enable_console_logging() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    if init_logging(config).is_ok() {
        web_sys::console::log_1(&"Rust console logging enabled (tracing-wasm)".into());
    }
}

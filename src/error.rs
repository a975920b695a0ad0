//! Error type for the fallible edges of the pad: settings and host setup.
//!
//! The stepper and the draw pass never fail.

use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Settings out of their physical range (e.g. friction above 1).
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings JSON could not be parsed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The host environment is missing something the pad needs
    /// (no window, no canvas, no 2D context).
    #[error("host setup failed: {0}")]
    Host(String),
}

#[cfg(target_arch = "wasm32")]
impl From<Error> for wasm_bindgen::JsValue {
    fn from(err: Error) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::InvalidSettings("friction must be in (0, 1]".to_string());
        let msg = e.to_string();
        assert!(msg.contains("invalid settings"));
        assert!(msg.contains("friction"));
    }

    #[test]
    fn test_json_error_converts() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let e: Error = err.into();
        assert!(matches!(e, Error::Json(_)));
    }
}

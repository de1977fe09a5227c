//! Embedded prompts
//!
//! Compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Structured preference extraction prompt
pub const EXTRACT: &str = include_str!("../../prompts/extract.pmt");

/// Assistant persona; `{{preferences}}` receives the rendered preference text
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "extract" => Some(EXTRACT),
        "system" => Some(SYSTEM),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_extract() {
        let extract = get_embedded("extract").unwrap();
        assert!(extract.contains("group_size"));
        assert!(extract.contains("JSON"));
    }

    #[test]
    fn test_get_embedded_system() {
        let system = get_embedded("system").unwrap();
        assert!(system.contains("GlobeGuide"));
        assert!(system.contains("{{preferences}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("nonexistent").is_none());
    }
}

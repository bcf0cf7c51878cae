//! Inspector configuration.

use serde::{Deserialize, Serialize};

/// Options accepted by `Inspector::create`.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorOptions {
    /// Open every tree node on the first mirror rebuild. Default: **true**.
    pub auto_expand: bool,

    /// Let the host hide the inspector panel while idle. Default: **true**.
    pub auto_hide: bool,

    /// Restore a snapshot on pause and take one on play. Only effective with
    /// a serializer. Default: **true**.
    pub auto_rewind: bool,

    /// Indent width for exported JSON; 0 writes compact output.
    pub export_indent: usize,

    /// Added to every reported pointer position.
    pub pointer_offset: (f64, f64),

    /// Coalescing delay for tree selection changes, in ms.
    pub tree_debounce_ms: u64,

    /// Delay before selecting pasted clones, in ms.
    pub paste_settle_ms: u64,

    /// Debounce for tree search input, in ms.
    pub search_debounce_ms: u64,
}

impl Default for InspectorOptions {
    fn default() -> Self {
        Self {
            auto_expand: true,
            auto_hide: true,
            auto_rewind: true,
            export_indent: 0,
            pointer_offset: (0.0, 0.0),
            tree_debounce_ms: 1,
            paste_settle_ms: 200,
            search_debounce_ms: 250,
        }
    }
}

impl InspectorOptions {
    /// Load options from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("Invalid inspector options: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_fills_defaults() {
        let opts = InspectorOptions::from_json(r#"{ "auto_rewind": false, "export_indent": 2 }"#)
            .unwrap();
        assert!(!opts.auto_rewind);
        assert_eq!(opts.export_indent, 2);
        assert!(opts.auto_expand);
        assert_eq!(opts.paste_settle_ms, 200);
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(
            InspectorOptions::from_json("{}").unwrap(),
            InspectorOptions::default()
        );
        assert!(InspectorOptions::from_json("[]").is_err());
    }
}

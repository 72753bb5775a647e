//! buckle_options: compiler options and `buckle.json` parsing.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Name of the options file looked up next to the sources.
pub const OPTIONS_FILE_NAME: &str = "buckle.json";

pub const DEFAULT_CFG_PATH: &str = "cfg.dot";

/// Compiler options, matching the `buckle.json` schema. Every field is
/// optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CompilerOptions {
    /// Evaluate as a script and report the value of the last expression.
    pub script: bool,
    /// Print the lowered bound program before evaluating.
    pub show_tree: bool,
    /// Write the control flow graph of the entry point as DOT.
    pub show_cfg: bool,
    pub cfg_path: String,
    /// Treat warnings as errors; evaluation is skipped when any are reported.
    pub warnings_as_errors: bool,
    /// Color diagnostics and results on the terminal.
    pub color: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            script: false,
            show_tree: false,
            show_cfg: false,
            cfg_path: DEFAULT_CFG_PATH.to_string(),
            warnings_as_errors: false,
            color: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse compiler options from JSON text.
pub fn parse_options(content: &str) -> Result<CompilerOptions, serde_json::Error> {
    serde_json::from_str(content)
}

/// Parse compiler options from a file.
pub fn parse_options_file(path: impl AsRef<Path>) -> Result<CompilerOptions, OptionsError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_options(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = parse_options("{}").unwrap();
        assert_eq!(options, CompilerOptions::default());
        assert_eq!(options.cfg_path, "cfg.dot");
        assert!(options.color);
        assert!(!options.script);
    }

    #[test]
    fn test_camel_case_fields() {
        let options = parse_options(
            r#"{ "script": true, "showTree": true, "cfgPath": "out/graph.dot", "warningsAsErrors": true }"#,
        )
        .unwrap();
        assert!(options.script);
        assert!(options.show_tree);
        assert!(!options.show_cfg);
        assert_eq!(options.cfg_path, "out/graph.dot");
        assert!(options.warnings_as_errors);
    }

    #[test]
    fn test_unknown_field() {
        let error = parse_options(r#"{ "showtree": true }"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn test_wrong_type() {
        assert!(parse_options(r#"{ "color": "yes" }"#).is_err());
    }

    #[test]
    fn test_missing_file() {
        let error = parse_options_file("does/not/exist/buckle.json").unwrap_err();
        assert!(matches!(error, OptionsError::Io { .. }));
        assert!(error.to_string().contains("does/not/exist/buckle.json"));
    }

    #[test]
    fn test_serialize_round_trip_names() {
        let json = serde_json::to_string(&CompilerOptions::default()).unwrap();
        assert!(json.contains("\"warningsAsErrors\":false"));
        assert!(json.contains("\"cfgPath\":\"cfg.dot\""));
    }
}

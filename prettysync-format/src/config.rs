//! Linter formatter configuration.
//!
//! ```yaml
//! command: abapfmt
//! args: ["--stdin", "--name", "{name}", "--type", "{type}"]
//! ```
//!
//! JSON is accepted as well, since it parses as YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use prettysync_core::Include;

use crate::error::FormatError;

/// External linter invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinterConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl LinterConfig {
    /// Load the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, FormatError> {
        let contents = std::fs::read_to_string(path).map_err(|source| FormatError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| FormatError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Arguments with `{name}` and `{type}` replaced by the include's.
    pub fn args_for(&self, include: &Include) -> Vec<String> {
        self.args
            .iter()
            .map(|a| {
                a.replace("{name}", &include.name)
                    .replace("{type}", &include.include_type)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn include() -> Include {
        Include {
            include_type: "PROG/P".into(),
            name: "ZREPORT".into(),
            part: None,
            source_url: "/p/zreport/source/main".into(),
            meta_url: "/p/zreport".into(),
        }
    }

    #[test]
    fn placeholders_are_substituted() {
        let config = LinterConfig {
            command: "fmt".into(),
            args: vec!["--name={name}".into(), "{type}".into(), "-".into()],
        };
        assert_eq!(
            config.args_for(&include()),
            vec!["--name=ZREPORT", "PROG/P", "-"]
        );
    }

    #[test]
    fn json_config_loads() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lint.json");
        std::fs::write(&path, r#"{"command": "abapfmt", "args": ["--stdin"]}"#).unwrap();
        let config = LinterConfig::load(&path).unwrap();
        assert_eq!(config.command, "abapfmt");
        assert_eq!(config.args, vec!["--stdin"]);
    }

    #[test]
    fn missing_command_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lint.yaml");
        std::fs::write(&path, "args: []\n").unwrap();
        let err = LinterConfig::load(&path).unwrap_err();
        assert!(matches!(err, FormatError::Parse { .. }), "got: {err}");
    }
}

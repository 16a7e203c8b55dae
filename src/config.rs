//! Project configuration (`isuprof.toml`).

use crate::error::{IsuprofError, Result};
use crate::frontend::stubs::PackageStub;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the optional configuration file in the processed directory.
pub const CONFIG_FILE: &str = "isuprof.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Package to instrument when the directory holds more than one.
    #[serde(default)]
    pub package: Option<String>,
    /// Output directory, relative to the working directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_build_tag")]
    pub build_tag: String,
    /// File name of the consolidated wrapper unit.
    #[serde(default = "default_generated_file")]
    pub generated_file: String,
    /// Stubs for packages the embedded standard library table lacks.
    #[serde(default)]
    pub packages: BTreeMap<String, PackageStub>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_build_tag() -> String {
    "profiling".to_string()
}

fn default_generated_file() -> String {
    "isuprof_generated.go".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package: None,
            output_dir: default_output_dir(),
            build_tag: default_build_tag(),
            generated_file: default_generated_file(),
            packages: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load `isuprof.toml` from `dir`, falling back to defaults when the
    /// file does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| IsuprofError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
            .map_err(|e| IsuprofError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let tag_ok = !self.build_tag.is_empty()
            && self
                .build_tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !tag_ok {
            return Err(format!("invalid build_tag '{}'", self.build_tag));
        }
        if !self.generated_file.ends_with(".go")
            || self.generated_file.contains(['/', '\\'])
            || self.generated_file.ends_with("_test.go")
        {
            return Err(format!(
                "generated_file must be a plain .go file name, got '{}'",
                self.generated_file
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.package, None);
        assert_eq!(config.output_dir, PathBuf::from("build"));
        assert_eq!(config.build_tag, "profiling");
        assert_eq!(config.generated_file, "isuprof_generated.go");
        assert!(config.packages.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
package = "app"
output_dir = "out/prof"
build_tag = "isuprof"
generated_file = "wrappers.go"

[packages."example.com/kv".funcs]
Get = "func(key string) (string, bool)"
"#,
        )
        .unwrap();
        assert_eq!(config.package.as_deref(), Some("app"));
        assert_eq!(config.output_dir, PathBuf::from("out/prof"));
        assert_eq!(config.build_tag, "isuprof");
        assert_eq!(config.generated_file, "wrappers.go");
        assert!(config.packages["example.com/kv"].funcs.contains_key("Get"));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = Config::parse("outdir = \"x\"").unwrap_err();
        assert!(err.contains("outdir"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::parse("build_tag = \"a b\"").is_err());
        assert!(Config::parse("generated_file = \"gen/x.go\"").is_err());
        assert!(Config::parse("generated_file = \"x_test.go\"").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.build_tag, "profiling");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "build_tag = 3").unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, IsuprofError::Config(_)));
    }
}

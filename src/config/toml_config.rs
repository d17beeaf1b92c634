use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_list, validate_non_empty_string, validate_path,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub scan: ScanSection,
    pub output: OutputSection,
    pub rules: Option<RulesSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSection {
    pub name: String,
    pub description: Option<String>,
    /// Directory all scanned paths are resolved against; defaults to `.`.
    pub root: Option<String>,
    pub headers: Vec<String>,
    pub include_paths: Option<Vec<String>>,
    pub defines: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: String,
    pub manifest: Option<String>,
    pub pretty: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesSection {
    pub platform_time_type: Option<String>,
    pub strict: Option<bool>,
    pub suppress_errors: Option<bool>,
    pub init_exempt_fields: Option<Vec<String>>,
}

const NO_STRINGS: &[String] = &[];

impl TomlConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn scan_root(&self) -> &str {
        self.scan.root.as_deref().unwrap_or(".")
    }
}

impl ConfigProvider for TomlConfig {
    fn headers(&self) -> &[String] {
        &self.scan.headers
    }

    fn include_paths(&self) -> &[String] {
        self.scan.include_paths.as_deref().unwrap_or(NO_STRINGS)
    }

    fn defines(&self) -> &[String] {
        self.scan.defines.as_deref().unwrap_or(NO_STRINGS)
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn manifest_name(&self) -> &str {
        self.output.manifest.as_deref().unwrap_or("manifest.json")
    }

    fn pretty(&self) -> bool {
        self.output.pretty.unwrap_or(true)
    }

    fn platform_time_type(&self) -> &str {
        self.rules
            .as_ref()
            .and_then(|r| r.platform_time_type.as_deref())
            .unwrap_or("time_t")
    }

    fn warnings_allowed(&self) -> bool {
        !self
            .rules
            .as_ref()
            .and_then(|r| r.strict)
            .unwrap_or(false)
    }

    fn suppress_errors(&self) -> bool {
        self.rules
            .as_ref()
            .and_then(|r| r.suppress_errors)
            .unwrap_or(false)
    }

    fn init_exempt_fields(&self) -> &[String] {
        self.rules
            .as_ref()
            .and_then(|r| r.init_exempt_fields.as_deref())
            .unwrap_or(NO_STRINGS)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("scan.name", &self.scan.name)?;
        validate_non_empty_list("scan.headers", &self.scan.headers)?;
        validate_file_extensions("scan.headers", &self.scan.headers, &["h", "hpp", "hh"])?;
        validate_path("scan.root", self.scan_root())?;
        validate_path("output.path", &self.output.path)?;
        validate_non_empty_string("output.manifest", self.manifest_name())?;
        validate_non_empty_string("rules.platform_time_type", self.platform_time_type())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[scan]
name = "client-headers"
description = "Weekly scan of the client interface headers"
root = "."
headers = ["src/service/Service.h", "src/viewmodel/RosterViewModel.h"]
include_paths = ["src/service", "src/viewmodel"]
defines = ["SPARK_CODEGEN=1"]

[output]
path = "./output"
manifest = "client-manifest.json"
pretty = true

[rules]
platform_time_type = "int64_t"
strict = false
init_exempt_fields = ["legacyCounter"]
"#;

    #[test]
    fn parses_a_full_configuration() {
        let config: TomlConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.scan.name, "client-headers");
        assert_eq!(config.headers().len(), 2);
        assert_eq!(config.manifest_name(), "client-manifest.json");
        assert_eq!(config.platform_time_type(), "int64_t");
        assert!(config.warnings_allowed());
        assert_eq!(config.init_exempt_fields(), ["legacyCounter".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
[scan]
name = "minimal"
headers = ["a.h"]

[output]
path = "./output"
"#,
        )
        .unwrap();
        assert_eq!(config.scan_root(), ".");
        assert_eq!(config.manifest_name(), "manifest.json");
        assert_eq!(config.platform_time_type(), "time_t");
        assert!(config.pretty());
        assert!(config.include_paths().is_empty());
    }

    #[test]
    fn rejects_non_header_inputs() {
        let config: TomlConfig = toml::from_str(
            r#"
[scan]
name = "bad"
headers = ["src/main.cpp"]

[output]
path = "./output"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}

use crate::core::estimator::{ReportMode, DEFAULT_SIGNIFICANT_DIGITS};
use crate::core::ConfigProvider;
use crate::domain::model::{GroupErrorPolicy, OutputFormat, ReportFormat};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_run_options, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub run: RunConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub estimate: EstimateConfig,
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
    pub error_handling: Option<ErrorHandlingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    #[serde(default)]
    pub format: ReportFormat,
    pub plate_type: Option<String>,
    #[serde(default)]
    pub weighed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// `0` or absent groups by sample id, or pairs rows of a manual sheet.
    pub size: Option<usize>,
    #[serde(default)]
    pub dilutions: Vec<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstimateConfig {
    pub significant_digits: Option<usize>,
    #[serde(default)]
    pub mode: ReportMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    pub on_group_error: Option<GroupErrorPolicy>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PLATE_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn verbose(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.verbose)
            .unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn report_format(&self) -> ReportFormat {
        self.input.format
    }

    fn weighed(&self) -> bool {
        self.input.weighed
    }

    fn group_size(&self) -> usize {
        self.grouping.size.unwrap_or(0)
    }

    fn plate_type(&self) -> Option<&str> {
        self.input.plate_type.as_deref()
    }

    fn dilutions(&self) -> &[i32] {
        &self.grouping.dilutions
    }

    fn significant_digits(&self) -> usize {
        self.estimate
            .significant_digits
            .unwrap_or(DEFAULT_SIGNIFICANT_DIGITS)
    }

    fn report_mode(&self) -> ReportMode {
        self.estimate.mode
    }

    fn output_format(&self) -> OutputFormat {
        self.output.format
    }

    fn on_group_error(&self) -> GroupErrorPolicy {
        self.error_handling
            .as_ref()
            .and_then(|e| e.on_group_error)
            .unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_run_options(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[run]
name = "june-pac"

[input]
path = "data/3m_export.csv"
plate_type = "PAC"
weighed = true

[grouping]
size = 2
dilutions = [-2, -3]

[estimate]
significant_digits = 3
mode = "numeric"

[output]
path = "./results.tsv"
format = "tsv"

[error_handling]
on_group_error = "abort"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.run.name, "june-pac");
        assert_eq!(config.input_path(), "data/3m_export.csv");
        assert_eq!(config.report_format(), ReportFormat::Reader);
        assert!(config.weighed());
        assert_eq!(config.group_size(), 2);
        assert_eq!(config.dilutions(), &[-2, -3]);
        assert_eq!(config.significant_digits(), 3);
        assert_eq!(config.report_mode(), ReportMode::Numeric);
        assert_eq!(config.output_format(), OutputFormat::Tsv);
        assert_eq!(config.on_group_error(), GroupErrorPolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let toml_content = r#"
[run]
name = "minimal"

[input]
path = "plates.csv"

[output]
path = "results.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.group_size(), 0);
        assert!(config.dilutions().is_empty());
        assert_eq!(config.significant_digits(), 2);
        assert_eq!(config.report_mode(), ReportMode::Text);
        assert_eq!(config.on_group_error(), GroupErrorPolicy::Skip);
        assert!(!config.verbose());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CALCFU_TEST_PLATE_DIR", "/data/plates");

        let toml_content = r#"
[run]
name = "env"

[input]
path = "${CALCFU_TEST_PLATE_DIR}/export.csv"

[output]
path = "results.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.input.path, "/data/plates/export.csv");

        std::env::remove_var("CALCFU_TEST_PLATE_DIR");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[run]
name = "bad"

[input]
path = "plates.csv"
format = "reader"
plate_type = "SPC"

[grouping]
dilutions = [-9]

[output]
path = "results.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let toml_content = r#"
[run]
name = "bad"

[input]
path = "plates.csv"
format = "xlsx"

[output]
path = "results.csv"
"#;

        assert!(matches!(
            TomlConfig::from_toml_str(toml_content),
            Err(EtlError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[run]
name = "file-test"

[input]
path = "plates.csv"
format = "manual"

[output]
path = "results.json"
format = "json"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.run.name, "file-test");
        assert_eq!(config.report_format(), ReportFormat::Manual);
        assert_eq!(config.output_format(), OutputFormat::Json);
    }
}

//! # Configuration File
//!
//! YAML configuration for a simulation run:
//!
//! - Logging (level, format, output)
//! - Quantizer settings for every filter role (`QCB`, `QCA`, `QACC`, `QI`, `QO`)
//! - Floating-point filter coefficients
//! - Named quantizer profiles for comparing word lengths
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `FXSIM_CONFIG` environment variable
//! 2. `./fxsim.yaml` (current directory)
//! 3. `~/.config/fxsim/config.yaml` (user config)
//! 4. `/etc/fxsim/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! logging:
//!   level: warn
//!   format: compact
//!
//! quantizers:
//!   QCB: { WI: 0, WF: 7, quant: round, ovfl: sat }
//!   QCA: { WI: 1, WF: 6, quant: round, ovfl: sat }
//!   QI:  { WI: 0, WF: 7 }
//!   QACC: { WI: 3, WF: 12, quant: fix, ovfl: wrap }
//!   QO:  { WI: 0, WF: 7, quant: round, ovfl: sat }
//!
//! coefficients:
//!   b: [0.25, 0.5, 0.25]
//!   a: [1.0, -0.5, 0.125]
//!
//! profiles:
//!   wide_acc:
//!     QACC: { WI: 5, WF: 20 }
//! ```

use crate::error::{FxError, FxResult};
use crate::filters::{Coefficients, FilterQuantParams, QuantizedIirFilter};
use crate::observe::LogConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "FXSIM_CONFIG";

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxsimConfig {
    /// Configuration version
    pub version: String,
    pub logging: LogConfig,
    /// Quantizer settings per filter role
    pub quantizers: FilterQuantParams,
    pub coefficients: Coefficients,
    /// Alternative quantizer settings (name -> params)
    pub profiles: BTreeMap<String, FilterQuantParams>,
}

impl Default for FxsimConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            logging: LogConfig::default(),
            quantizers: FilterQuantParams::default(),
            coefficients: Coefficients::new(vec![1.0], vec![1.0]),
            profiles: BTreeMap::new(),
        }
    }
}

impl FxsimConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the default config if no file is found.
    pub fn load() -> FxResult<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&path);
            if !path.exists() {
                return Err(FxError::ConfigNotFound(path.display().to_string()));
            }
            return Self::load_from(path);
        }

        for path in &Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Self::default())
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: &Path) -> FxResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FxError::ConfigIo(format!("{}: {}", path.display(), e)))?;

        let config = Self::parse(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Unknown mode names fail here; word lengths and coefficient lengths
    /// are checked by [`validate`](Self::validate).
    pub fn parse(yaml: &str) -> FxResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| FxError::ConfigParse(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> FxResult<()> {
        let content = serde_yaml::to_string(self).map_err(|e| FxError::ConfigParse(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| FxError::ConfigIo(format!("{}: {}", path.display(), e)))
    }

    /// Copy of this config with the quantizers replaced by a named profile.
    pub fn with_profile(&self, name: &str) -> FxResult<Self> {
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| FxError::ConfigNotFound(format!("profile '{}'", name)))?;

        let mut config = self.clone();
        config.quantizers = profile.clone();
        Ok(config)
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./fxsim.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "fxsim") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/fxsim/config.yaml"));

        paths
    }

    /// Validate coefficients and every quantizer word.
    pub fn validate(&self) -> FxResult<()> {
        self.coefficients.validate()?;
        validate_params("quantizers", &self.quantizers)?;
        for (name, params) in &self.profiles {
            validate_params(&format!("profiles.{}", name), params)?;
        }
        Ok(())
    }

    /// Build the configured filter.
    pub fn build_filter(&self) -> FxResult<QuantizedIirFilter> {
        QuantizedIirFilter::new(&self.coefficients, self.quantizers.clone())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        use crate::format::{OverflowMode, QuantMode};
        use crate::qconfig::QuantizationConfig;

        let quantizers = FilterQuantParams {
            qcb: QuantizationConfig::new(0, 7),
            qca: QuantizationConfig::new(1, 6),
            qi: QuantizationConfig::new(0, 7),
            qacc: QuantizationConfig::new(3, 12)
                .with_quant(QuantMode::Fix)
                .with_ovfl(OverflowMode::Wrap),
            qo: QuantizationConfig::new(0, 7),
        };
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "wide_acc".to_string(),
            FilterQuantParams {
                qacc: QuantizationConfig::new(5, 20).with_quant(QuantMode::Fix),
                ..quantizers.clone()
            },
        );

        let config = Self {
            quantizers,
            coefficients: Coefficients::new(vec![0.25, 0.5, 0.25], vec![1.0, -0.5, 0.125]),
            profiles,
            ..Default::default()
        };

        serde_yaml::to_string(&config).unwrap_or_default()
    }
}

fn validate_params(scope: &str, params: &FilterQuantParams) -> FxResult<()> {
    let roles = [
        ("QCB", &params.qcb),
        ("QCA", &params.qca),
        ("QACC", &params.qacc),
        ("QI", &params.qi),
        ("QO", &params.qo),
    ];
    for (role, cfg) in roles {
        cfg.validate()
            .map_err(|e| FxError::Validation(format!("{}.{}: {}", scope, role, e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{OverflowMode, QuantMode};
    use crate::observe::LogLevel;

    #[test]
    fn test_default_config() {
        let config = FxsimConfig::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.quantizers.qacc.wf, 15);
        assert!(config.validate().is_ok());
        assert!(config.build_filter().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
logging:
  level: debug
quantizers:
  QCB: { WI: 0, WF: 7 }
  QACC: { WI: 3, WF: 12, quant: fix, ovfl: wrap }
coefficients:
  b: [0.5, 0.25]
  a: [1.0, -0.75]
"#;
        let config = FxsimConfig::parse(yaml).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.quantizers.qcb.wf, 7);
        assert_eq!(config.quantizers.qacc.quant, QuantMode::Fix);
        assert_eq!(config.quantizers.qacc.ovfl, OverflowMode::Wrap);
        assert_eq!(config.coefficients.a, vec![1.0, -0.75]);

        let filter = config.build_filter().unwrap();
        assert_eq!(filter.num_taps(), 2);
    }

    #[test]
    fn test_parse_unknown_mode_fails() {
        let err = FxsimConfig::parse("quantizers:\n  QO: { quant: banker }\n").unwrap_err();
        assert!(matches!(err, FxError::ConfigParse(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = FxsimConfig::default();
        config.coefficients = Coefficients::new(vec![1.0, 0.5], vec![1.0]);
        assert!(matches!(
            config.validate(),
            Err(FxError::CoefficientLengthMismatch { b: 2, a: 1 })
        ));

        config.coefficients = Coefficients::fir(vec![0.5, 0.5]);
        config.quantizers.qo.wi = 40;
        config.quantizers.qo.wf = 40;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, FxError::Validation(ref msg) if msg.starts_with("quantizers.QO")));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_profiles() {
        let config = FxsimConfig::parse(&FxsimConfig::example_yaml()).unwrap();
        let wide = config.with_profile("wide_acc").unwrap();
        assert_eq!(wide.quantizers.qacc.wi, 5);
        assert_eq!(wide.quantizers.qcb, config.quantizers.qcb);
        assert!(matches!(config.with_profile("missing"), Err(FxError::ConfigNotFound(_))));
    }

    #[test]
    fn test_example_yaml() {
        let yaml = FxsimConfig::example_yaml();
        assert!(yaml.contains("quantizers:"));
        assert!(yaml.contains("QACC:"));
        let parsed = FxsimConfig::parse(&yaml).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.coefficients.b, vec![0.25, 0.5, 0.25]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fxsim.yaml");
        let config = FxsimConfig::parse(&FxsimConfig::example_yaml()).unwrap();
        config.save(&path).unwrap();
        let loaded = FxsimConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = FxsimConfig::load_from(Path::new("/nonexistent/fxsim.yaml")).unwrap_err();
        assert!(matches!(err, FxError::ConfigIo(_)));
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_config_search_paths() {
        let paths = FxsimConfig::config_search_paths();
        assert!(paths[0].ends_with("fxsim.yaml"));
        assert!(paths.last().unwrap().ends_with("config.yaml"));
    }
}

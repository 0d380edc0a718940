//! Configuration model for the tenantbox service.
//!
//! Values come from defaults, an optional JSON file, and finally command-line
//! flags or environment variables applied by the binary.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_IMAGE, DEFAULT_LISTEN, DEFAULT_RUNTIME_GLOBAL_ARGS, DEFAULT_RUNTIME_PROGRAM,
};
use crate::error::{Result, TenantboxError};

/// Root configuration for the tenantbox service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantboxConfig {
    /// Image reference every user container is created from.
    pub image: String,
    /// Socket address the HTTP server listens on.
    pub listen: String,
    /// Container runtime settings.
    pub runtime: RuntimeConfig,
}

impl Default for TenantboxConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            listen: DEFAULT_LISTEN.to_string(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl TenantboxConfig {
    /// Loads a configuration file, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TenantboxError::ConfigIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Checks that every required value is present.
    ///
    /// # Errors
    ///
    /// Returns [`TenantboxError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.image.trim().is_empty() {
            return Err(TenantboxError::Config {
                message: "image must not be empty".into(),
            });
        }
        if self.listen.trim().is_empty() {
            return Err(TenantboxError::Config {
                message: "listen address must not be empty".into(),
            });
        }
        if self.runtime.kind == RuntimeKind::Cli && self.runtime.program.trim().is_empty() {
            return Err(TenantboxError::Config {
                message: "runtime program must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Which runtime adapter backs the coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// Shell out to a container CLI such as `udocker`.
    #[default]
    Cli,
    /// In-process simulated runtime for local development.
    Memory,
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for RuntimeKind {
    type Err = TenantboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cli" => Ok(Self::Cli),
            "memory" => Ok(Self::Memory),
            other => Err(TenantboxError::Config {
                message: format!("unknown runtime kind {other:?} (expected cli or memory)"),
            }),
        }
    }
}

/// Container runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Adapter selection.
    pub kind: RuntimeKind,
    /// Program invoked by the CLI adapter.
    pub program: String,
    /// Arguments placed before every verb.
    pub global_args: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            kind: RuntimeKind::Cli,
            program: DEFAULT_RUNTIME_PROGRAM.to_string(),
            global_args: DEFAULT_RUNTIME_GLOBAL_ARGS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_point_at_udocker() {
        let cfg = TenantboxConfig::default();
        assert_eq!(cfg.runtime.program, "udocker");
        assert_eq!(cfg.runtime.global_args, vec!["--allow-root"]);
        assert_eq!(cfg.listen, "0.0.0.0:8000");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"image": "alpine:3.20", "runtime": {{"kind": "memory"}}}}"#)
            .expect("write");

        let cfg = TenantboxConfig::from_file(file.path()).expect("load");
        assert_eq!(cfg.image, "alpine:3.20");
        assert_eq!(cfg.runtime.kind, RuntimeKind::Memory);
        assert_eq!(cfg.runtime.program, "udocker");
        assert_eq!(cfg.listen, "0.0.0.0:8000");
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let err = TenantboxConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, TenantboxError::ConfigIo { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn empty_image_is_rejected() {
        let cfg = TenantboxConfig {
            image: "  ".into(),
            ..TenantboxConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(TenantboxError::Config { .. })));
    }

    #[test]
    fn runtime_kind_parses_case_insensitively() {
        assert_eq!("Memory".parse::<RuntimeKind>().unwrap(), RuntimeKind::Memory);
        assert_eq!("cli".parse::<RuntimeKind>().unwrap(), RuntimeKind::Cli);
        assert!("docker".parse::<RuntimeKind>().is_err());
    }

    #[test]
    fn memory_runtime_needs_no_program() {
        let cfg = TenantboxConfig {
            runtime: RuntimeConfig {
                kind: RuntimeKind::Memory,
                program: String::new(),
                global_args: Vec::new(),
            },
            ..TenantboxConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }
}

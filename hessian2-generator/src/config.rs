//! Generator configuration.
//!
//! Accepts the protoc plugin parameter string
//! (`paths=source_relative,module=example.com/m,Mfoo.proto=example.com/foo`)
//! or an equivalent TOML document.

use std::collections::BTreeMap;
use std::path::PathBuf;

use parser::FileDescriptor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ident::GoImportPath;

const OUTPUT_SUFFIX: &str = ".hessian2.go";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid parameter `{0}`: expected key=value")]
    MalformedParameter(String),
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },
    #[error("output path of {file} does not start with module prefix {module}")]
    ModulePrefix { file: String, module: String },
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// How output filenames are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathsMode {
    /// `<go import path>/<proto basename>.hessian2.go`
    #[default]
    Import,
    /// `<proto path without extension>.hessian2.go`
    SourceRelative,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub paths: PathsMode,
    /// Prefix removed from output paths in `import` mode.
    pub module: Option<String>,
    /// Proto file name -> Go import path, overriding `go_package`.
    pub import_mappings: BTreeMap<String, String>,
    /// Directories searched for proto files and their imports.
    pub include_paths: Vec<PathBuf>,
}

impl GeneratorConfig {
    pub fn from_parameter(param: &str) -> Result<Self, ConfigError> {
        let mut config = GeneratorConfig::default();
        for part in param.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedParameter(part.to_string()))?;
            match key {
                "paths" => {
                    config.paths = match value {
                        "import" => PathsMode::Import,
                        "source_relative" => PathsMode::SourceRelative,
                        _ => {
                            return Err(ConfigError::InvalidValue {
                                key: key.to_string(),
                                value: value.to_string(),
                            });
                        }
                    }
                }
                "module" => config.module = Some(value.to_string()),
                "include" => config.include_paths.push(PathBuf::from(value)),
                _ if key.len() > 1 && key.starts_with('M') => {
                    config
                        .import_mappings
                        .insert(key[1..].to_string(), value.to_string());
                }
                _ => return Err(ConfigError::UnknownParameter(key.to_string())),
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Name of the Go file generated for `file`.
    pub fn output_filename(
        &self,
        file: &FileDescriptor,
        import_path: &GoImportPath,
    ) -> Result<String, ConfigError> {
        let stem = file.name.strip_suffix(".proto").unwrap_or(&file.name);
        let prefix = match self.paths {
            PathsMode::SourceRelative => {
                if let Some(module) = &self.module {
                    return Err(ConfigError::InvalidValue {
                        key: "module".to_string(),
                        value: module.clone(),
                    });
                }
                stem.to_string()
            }
            PathsMode::Import => {
                let base = stem.rsplit('/').next().unwrap_or(stem);
                let joined = if import_path.path().is_empty() {
                    base.to_string()
                } else {
                    format!("{}/{base}", import_path.path())
                };
                match &self.module {
                    Some(module) => joined
                        .strip_prefix(module.as_str())
                        .and_then(|rest| rest.strip_prefix('/'))
                        .map(str::to_string)
                        .ok_or_else(|| ConfigError::ModulePrefix {
                            file: file.name.clone(),
                            module: module.clone(),
                        })?,
                    None => joined,
                }
            }
        };
        Ok(format!("{prefix}{OUTPUT_SUFFIX}"))
    }
}

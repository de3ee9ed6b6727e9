mod env_overrides;
pub mod execution;
pub mod graphiql;
pub mod log;

use config::{Config, File, FileFormat, FileSourceFile};
use envconfig::Envconfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::{
    env_overrides::{EnvVarOverrides, EnvVarOverridesError},
    execution::ExecutionOptions,
    graphiql::ExplorerOptions,
    log::LoggingConfig,
};

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct FunctionsConfig {
    /// The logger configuration of the function handlers.
    #[serde(default)]
    pub log: LoggingConfig,

    /// Options handed to the GraphQL engine on every query invocation.
    #[serde(default)]
    pub graphql: ExecutionOptions,

    /// Options of the GraphiQL exploration page.
    #[serde(default)]
    pub graphiql: ExplorerOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum FunctionsConfigError {
    #[error("Failed to load configuration: {0}")]
    ConfigLoadError(#[from] config::ConfigError),
    #[error("Failed to apply configuration overrides: {0}")]
    EnvVarOverridesError(#[from] EnvVarOverridesError),
    #[error("Failed to load the environment variables: {0}")]
    EnvVarLoadError(#[from] envconfig::Error),
    #[error("Failed to parse the configuration file path: {0}")]
    ConfigPathParseError(Infallible),
}

static DEFAULT_FILE_NAMES: &[&str] = &[
    "functions.config.yaml",
    "functions.config.yml",
    "functions.config.json",
    "functions.config.json5",
];

/// Loads the configuration from `config_path`, or from the first default file name found in
/// the working directory. Missing default files are not an error.
pub fn load_config(config_path: Option<String>) -> Result<FunctionsConfig, FunctionsConfigError> {
    let env_overrides = EnvVarOverrides::init_from_env()?;
    let mut config = Config::builder();

    if let Some(path_str) = config_path {
        let path_buf = path_str
            .parse::<std::path::PathBuf>()
            .map_err(FunctionsConfigError::ConfigPathParseError)?;
        let as_file: File<FileSourceFile, _> = path_buf.into();

        config = config.add_source(as_file.required(true));
    } else {
        for name in DEFAULT_FILE_NAMES {
            config = config.add_source(File::with_name(name).required(false));
        }
    }

    config = env_overrides.apply_overrides(config)?;

    Ok(config.build()?.try_deserialize::<FunctionsConfig>()?)
}

pub fn parse_yaml_config(config_raw: &str) -> Result<FunctionsConfig, FunctionsConfigError> {
    Config::builder()
        .add_source(File::from_str(config_raw, FileFormat::Yaml))
        .build()?
        .try_deserialize::<FunctionsConfig>()
        .map_err(FunctionsConfigError::ConfigLoadError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{LogFormat, LogLevel};

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_yaml_config("{}").expect("empty config should parse");

        assert!(config.graphql.introspection);
        assert!(config.graphql.batching);
        assert_eq!(config.graphql.max_batch_size, None);
        assert_eq!(config.graphiql.endpoint_url, "/graphql");
        assert!(config.graphiql.rewrite_url);
        assert_eq!(config.log.filter, None);
    }

    #[test]
    fn parses_all_sections() {
        let raw = r#"
log:
  level: warn
  format: json
graphql:
  introspection: false
  batching: true
  max_batch_size: 5
graphiql:
  endpoint_url: /api/graphql
  query: "{ me { id } }"
  editor_theme: solarized
  variables:
    id: "1"
"#;
        let config = parse_yaml_config(raw).expect("config should parse");

        assert_eq!(config.log.level, LogLevel::Warn);
        assert_eq!(config.log.format, LogFormat::Json);
        assert!(!config.graphql.introspection);
        assert_eq!(config.graphql.max_batch_size, Some(5));
        assert_eq!(config.graphiql.endpoint_url, "/api/graphql");
        assert_eq!(config.graphiql.query.as_deref(), Some("{ me { id } }"));
        assert_eq!(config.graphiql.editor_theme.as_deref(), Some("solarized"));
        assert_eq!(
            config.graphiql.variables,
            Some(serde_json::json!({ "id": "1" }))
        );
    }

    #[test]
    fn json_schema_describes_every_section() {
        let schema = serde_json::to_value(schemars::schema_for!(FunctionsConfig))
            .expect("schema serializes");
        let properties = schema["properties"]
            .as_object()
            .expect("schema has properties");

        let mut keys: Vec<&str> = properties.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["graphiql", "graphql", "log"]);
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = parse_yaml_config("graphiql:\n  endpoint: /graphql\n");

        assert!(matches!(
            result,
            Err(FunctionsConfigError::ConfigLoadError(_))
        ));
    }
}

use crate::cli::Cli;
use crate::config::VitrineConfig;
use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the component directory.
pub const CONFIG_FILE: &str = "vitrine.config.json";

/// Options given on the command line. Unset options don't override.
#[derive(Debug, Default, Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    open: Option<bool>,
}

impl CliOverrides {
    fn from_args(args: &Cli) -> Self {
        Self {
            port: args.port,
            host: args.host.clone(),
            open: args.open.then_some(true),
        }
    }
}

impl VitrineConfig {
    /// Load configuration from multiple sources.
    /// Priority: CLI args > environment variables > config file > defaults
    pub fn load(args: &Cli) -> Result<Self> {
        let config_file = config_file(&args.dir, args.config.as_deref())?;
        Self::load_from(config_file.as_deref(), &CliOverrides::from_args(args))
    }

    fn load_from(config_file: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Json::file(path));
        }

        // VITRINE_PORT, VITRINE_RENDER_TIMEOUT_MS, VITRINE_STYLE_TARGETS_CHROME, ...
        figment = figment.merge(
            Env::prefixed("VITRINE_")
                .map(|key| env_key_path(key.as_str()).into())
                .lowercase(false),
        );

        figment = figment.merge(Serialized::defaults(overrides));

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Config sections, longest first so nested sections win.
const ENV_SECTIONS: &[&str] = &["style_targets", "style", "render", "watch"];

/// Key path for an environment variable name without its prefix:
/// `RENDER_TIMEOUT_MS` is `render.timeoutMs`, `DESCRIPTOR_KEY` is
/// `descriptorKey`.
fn env_key_path(name: &str) -> String {
    let name = name.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(field) = name
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{}.{}", section.replace('_', "."), camel_case(field));
        }
    }
    camel_case(&name)
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    for (index, word) in snake.split('_').filter(|w| !w.is_empty()).enumerate() {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) if index > 0 => {
                out.push(first.to_ascii_uppercase());
                out.extend(chars);
            }
            _ => out.push_str(word),
        }
    }
    out
}

/// The explicit `--config` file, or `vitrine.config.json` in `dir` if present.
fn config_file(dir: &Path, explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) if path.is_file() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(ConfigError::NotFound(path.to_path_buf()).into()),
        None => {
            let default_path = dir.join(CONFIG_FILE);
            Ok(default_path.is_file().then_some(default_path))
        }
    }
}

#[cfg(test)]
pub(super) fn env_key_path_for_test(name: &str) -> String {
    env_key_path(name)
}

#[cfg(test)]
pub(super) fn load_for_test(
    config_file: Option<&Path>,
    port: Option<u16>,
    host: Option<&str>,
) -> Result<VitrineConfig> {
    VitrineConfig::load_from(
        config_file,
        &CliOverrides {
            port,
            host: host.map(str::to_string),
            open: None,
        },
    )
}

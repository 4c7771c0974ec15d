//! Layered runtime settings.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. The `--config` file (YAML or TOML, by extension)
//! 3. `SRCOMP_*` environment variables (`SRCOMP_PORT=8080`)
//! 4. Command-line flags

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use srcomp_core::ManagerOptions;
use srcomp_http::ServerConfig;
use srcomp_http::server::DEFAULT_PORT;

use crate::cli::{Cli, Command, LogFormat};

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "SRCOMP";

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Compstate directory.
    pub compstate: PathBuf,
    /// Address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to reload the compstate when the sentinel changes.
    pub reload: bool,
    /// Seconds between sentinel checks.
    pub staleness_secs: u64,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Settings {
    /// Assemble settings from every layer for this invocation.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::from_layers(cli, Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn from_layers(cli: &Cli, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("reload", true)?
            .set_default("staleness_secs", 5_i64)?
            .set_default("log_format", LogFormat::default().as_str())?;

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }
        builder = builder.add_source(env);

        builder = builder.set_override_option("log_format", cli.log_format.map(LogFormat::as_str))?;
        match &cli.command {
            Command::Serve(args) => {
                builder = builder
                    .set_override_option("compstate", args.compstate.as_deref().map(path_value))?
                    .set_override_option("host", args.host.clone())?
                    .set_override_option("port", args.port.map(i64::from))?
                    .set_override_option("staleness_secs", args.staleness_secs.map(i64_saturating))?;
                if args.no_reload {
                    builder = builder.set_override("reload", false)?;
                }
            }
            Command::Update(args) => {
                builder = builder.set_override("compstate", path_value(&args.compstate))?;
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Options for the state manager.
    pub const fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            staleness: if self.reload {
                Some(Duration::from_secs(self.staleness_secs))
            } else {
                None
            },
        }
    }

    /// Options for the HTTP server.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

fn path_value(path: &std::path::Path) -> String {
    path.display().to_string()
}

fn i64_saturating(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use clap::Parser;

    use super::*;

    fn no_env() -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::new()))
    }

    fn env(pairs: &[(&str, &str)]) -> Environment {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(vars))
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("srcomp-http").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_apply() {
        let settings = Settings::from_layers(&cli(&["serve", "comp"]), no_env()).unwrap();
        assert_eq!(settings.compstate, PathBuf::from("comp"));
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 5112);
        assert!(settings.reload);
        assert_eq!(settings.log_format, LogFormat::Text);
        assert_eq!(
            settings.manager_options().staleness,
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn compstate_is_required() {
        assert!(Settings::from_layers(&cli(&["serve"]), no_env()).is_err());
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_layers(
            &cli(&["serve"]),
            env(&[("SRCOMP_COMPSTATE", "/srv/comp"), ("SRCOMP_PORT", "9000")]),
        )
        .unwrap();
        assert_eq!(settings.compstate, PathBuf::from("/srv/comp"));
        assert_eq!(settings.port, 9000);
    }

    #[test]
    fn flags_override_environment() {
        let settings = Settings::from_layers(
            &cli(&["serve", "comp", "--port", "7000", "--no-reload"]),
            env(&[("SRCOMP_PORT", "9000")]),
        )
        .unwrap();
        assert_eq!(settings.port, 7000);
        assert!(!settings.reload);
        assert_eq!(settings.manager_options().staleness, None);
    }

    #[test]
    fn settings_file_layers_under_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("srcomp.yaml");
        std::fs::write(
            &path,
            "compstate: /from/file\nport: 6000\nlog_format: json\nstaleness_secs: 30\n",
        )
        .unwrap();

        let args = ["--config", path.to_str().unwrap(), "serve", "--host", "127.0.0.1"];
        let settings = Settings::from_layers(&cli(&args), no_env()).unwrap();
        assert_eq!(settings.compstate, PathBuf::from("/from/file"));
        assert_eq!(settings.port, 6000);
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(
            settings.manager_options().staleness,
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn update_takes_compstate_from_arguments() {
        let settings =
            Settings::from_layers(&cli(&["update", "/srv/comp", "v2"]), no_env()).unwrap();
        assert_eq!(settings.compstate, PathBuf::from("/srv/comp"));
    }
}

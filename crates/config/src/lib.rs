use std::fmt::{Debug, Display};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Arg, ArgMatches, Command};
use serde::Deserialize;

pub use hookgate_core::SharedSecret;
use hookgate_core::{DEFAULT_SIGNATURE_HEADER, DEFAULT_TOKEN_HEADER};

pub enum Error {
    Read(PathBuf, std::io::Error),
    Parse(PathBuf),
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Read(path, error) => write!(f, "Failed to read config {path:?}: {error}"),
            Error::Parse(path) => write!(f, "Config {path:?} is not valid TOML, YAML or JSON"),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub path: String,
    pub signing_secret: Option<SharedSecret>,
    pub signature_header: String,
    pub token_headers: Vec<String>,
    /// Send the handshake token back in the response body.
    pub echo_token: bool,
    pub body_limit: usize,
    pub read_timeout_secs: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            path: "/api/webhooks/notion".to_string(),
            signing_secret: None,
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
            token_headers: vec![DEFAULT_TOKEN_HEADER.to_string()],
            echo_token: false,
            body_limit: 1024 * 1024,
            read_timeout_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_manifest_str(content: &str) -> Option<Self> {
        toml::from_str(content)
            .ok()
            .or_else(|| serde_yaml::from_str(content).ok())
            .or_else(|| serde_json::from_str(content).ok())
    }

    pub fn from_manifest(path: &Path) -> Result<Self, Error> {
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::Read(path.to_path_buf(), e))?;
        Self::from_manifest_str(&content).ok_or_else(|| Error::Parse(path.to_path_buf()))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    fn apply_overrides(mut self, args: &ArgMatches) -> Self {
        if let Some(port) = args.get_one::<u16>("port") {
            self.port = *port;
        }
        if let Some(secret) = args.get_one::<String>("secret") {
            self.signing_secret = Some(SharedSecret::new(secret.clone()));
        }
        if let Some(level) = args.get_one::<String>("log-level") {
            self.log_level = level.clone();
        }
        // Blank secrets from an empty env var or manifest count as unset.
        self.signing_secret = self.signing_secret.filter(|s| !s.is_empty());
        self
    }
}

fn command() -> Command {
    Command::new("hookgate")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("config")
                .long("config")
                .alias("manifest")
                .env("HOOKGATE_CONFIG")
                .num_args(1)
                .help("Path to an optional TOML, YAML or JSON configuration file")
                .value_parser(clap::builder::PathBufValueParser::new()),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .env("PORT")
                .num_args(1)
                .help("Port to listen on")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("secret")
                .long("secret")
                .env("NOTION_SIGNING_SECRET")
                .hide_env_values(true)
                .num_args(1)
                .help("Shared secret used to verify event signatures"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .env("HOOKGATE_LOG")
                .num_args(1)
                .help("Maximum log level (error, warn, info, debug, trace)"),
        )
        .color(clap::ColorChoice::Always)
}

pub fn get_config() -> Result<Config, Error> {
    config_from(command().get_matches())
}

fn config_from(args: ArgMatches) -> Result<Config, Error> {
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => {
            println!("Reading configs from path: {path:?}");
            Config::from_manifest(path)?
        }
        None => Config::default(),
    };

    Ok(config.apply_overrides(&args))
}

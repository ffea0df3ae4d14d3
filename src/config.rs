//! Application configuration management.
//!
//! This module decides which environment the process runs in, reads the
//! matching environment file, and assembles the [`ConnectionSettings`] handed
//! to the database layer.
//!
//! # Precedence
//!
//! For every variable: process environment > environment file > fallback
//! literal. Empty values count as unset at every level. The environment file is
//! merged into a private map; the process environment itself is never mutated.
//!
//! # Environment file values
//!
//! Values are taken literally: `$NAME` and `${NAME}` are not expanded, so a
//! password such as `pa$word` survives and nothing is looked up in the process
//! environment while the file is read.

use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, ErrorKind};
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::{EntityDescriptor, managed_entities};

/// Variable selecting the runtime environment.
pub const MODE_VAR: &str = "APP_ENV";

/// Driver identifier handed to the database runtime.
pub const DRIVER: &str = "postgres";

/// Location of the versioned schema-change scripts.
pub const MIGRATIONS_GLOB: &str = "migrations/*.sql";

/// Variables read into [`ConnectionSettings`]. Matched exactly, case included.
pub const DATABASE_VARS: [&str; 5] = ["DB_HOST", "DB_PORT", "DB_USERNAME", "DB_PASSWORD", "DB_NAME"];

const SERVER_VARS: [&str; 1] = ["SERVER_PORT"];

/// Runtime environment of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Map the value of [`MODE_VAR`] to an environment.
    ///
    /// Only the exact literal `production` selects [`Environment::Production`];
    /// everything else, including an unset variable, is development.
    pub fn from_mode(mode: Option<&str>) -> Self {
        match mode {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// Name of the environment file loaded for this environment.
    pub fn env_file(self) -> &'static str {
        match self {
            Environment::Development => ".env.dev",
            Environment::Production => ".env.prod",
        }
    }

    /// Lowercase name, as accepted by [`MODE_VAR`].
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw `DB_*` variables, deserialized by `envy` with the `DB_` prefix stripped.
#[derive(Debug, Deserialize)]
struct DatabaseVars {
    #[serde(default = "default_host")]
    host: String,

    /// Kept as text so a bad value can be reported verbatim.
    #[serde(default = "default_port")]
    port: String,

    #[serde(default = "default_username")]
    username: String,

    #[serde(default = "default_password")]
    password: String,

    #[serde(default = "default_database")]
    name: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> String {
    "5432".to_string()
}

fn default_username() -> String {
    "postgres".to_string()
}

fn default_password() -> String {
    "root".to_string()
}

fn default_database() -> String {
    "quotes_db".to_string()
}

/// Connection settings consumed by the database layer.
///
/// # Environment Variables
///
/// - `DB_HOST` (optional): defaults to `localhost`
/// - `DB_PORT` (optional): defaults to `5432`, must parse as `u16`
/// - `DB_USERNAME` (optional): defaults to `postgres`
/// - `DB_PASSWORD` (optional): defaults to `root`
/// - `DB_NAME` (optional): defaults to `quotes_db`
///
/// Built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct ConnectionSettings {
    /// Environment the settings were resolved for
    pub environment: Environment,

    /// Driver identifier, always [`DRIVER`]
    pub driver: &'static str,

    pub host: String,
    pub port: u16,
    pub username: String,
    password: String,

    /// Database name
    pub database: String,

    /// Bring the schema in line with the entities at startup.
    ///
    /// Always on in this configuration. Not safe for production databases.
    pub synchronize: bool,

    /// Log every executed statement
    pub logging: bool,

    /// Entity types mapped to tables, in registration order
    pub entities: Vec<EntityDescriptor>,

    /// Glob matching the migration scripts
    pub migrations: &'static str,

    /// Event subscribers, currently none
    pub subscribers: Vec<String>,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("environment", &self.environment)
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .field("synchronize", &self.synchronize)
            .field("logging", &self.logging)
            .field("entities", &self.entities)
            .field("migrations", &self.migrations)
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

impl ConnectionSettings {
    /// Build settings from an already merged variable map.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] if `DB_PORT` is not a valid port.
    pub fn from_vars(
        environment: Environment,
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let vars: DatabaseVars = envy::prefixed("DB_")
            .from_iter(non_empty(vars, &DATABASE_VARS))
            .map_err(ConfigError::Database)?;

        let port = vars
            .port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort {
                value: vars.port.clone(),
            })?;

        Ok(Self {
            environment,
            driver: DRIVER,
            host: vars.host,
            port,
            username: vars.username,
            password: vars.password,
            database: vars.name,
            synchronize: true, // unsafe against production data
            logging: true,
            entities: managed_entities(),
            migrations: MIGRATIONS_GLOB,
            subscribers: Vec::new(),
        })
    }

    /// Database password. Not part of the `Debug` output.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Name of the environment file these settings were resolved against.
    pub fn env_file(&self) -> &'static str {
        self.environment.env_file()
    }
}

/// Raw server variables.
#[derive(Debug, Deserialize)]
struct ServerVars {
    #[serde(default = "default_server_port")]
    server_port: u16,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_server_port() -> u16 {
    3000
}

/// Application configuration.
///
/// # Environment Variables
///
/// - `APP_ENV` (optional): `production` selects `.env.prod`, anything else `.env.dev`
/// - `DB_*`: see [`ConnectionSettings`]
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
#[derive(Debug, Clone)]
pub struct Config {
    pub database: ConnectionSettings,
    pub server_port: u16,
}

impl Config {
    /// Load configuration from the process environment and the environment
    /// file in the current directory.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Path::new("."), std::env::vars().collect())
    }

    /// Load configuration from an explicit variable map, looking for the
    /// environment file in `dir`.
    ///
    /// A missing environment file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The environment file exists but cannot be read or parsed
    /// - `DB_PORT` or `SERVER_PORT` is not a valid port number
    pub fn load(dir: &Path, process: HashMap<String, String>) -> Result<Self, ConfigError> {
        let environment = Environment::from_mode(process.get(MODE_VAR).map(String::as_str));
        let file = read_env_file(&dir.join(environment.env_file()))?;
        let vars = merge_vars(process, file);

        Self::from_vars(environment, &vars)
    }

    /// Build configuration from an already merged variable map.
    pub fn from_vars(
        environment: Environment,
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let database = ConnectionSettings::from_vars(environment, vars)?;
        let server: ServerVars =
            envy::from_iter(non_empty(vars, &SERVER_VARS)).map_err(ConfigError::Server)?;

        Ok(Self {
            database,
            server_port: server.server_port,
        })
    }

    /// Environment the configuration was loaded for.
    pub fn environment(&self) -> Environment {
        self.database.environment
    }
}

/// Read the `KEY=VALUE` pairs of an environment file.
///
/// Returns an empty map if the file does not exist. Values are kept literal;
/// `$` references are not expanded.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let env_file_error = |source: dotenvy::Error| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Environment file not found, skipping");
            return Ok(HashMap::new());
        }
        Err(err) => return Err(env_file_error(dotenvy::Error::Io(err))),
    };

    let vars = dotenvy::from_read_iter(Cursor::new(escape_substitutions(&contents)))
        .map(|item| item.map_err(&env_file_error))
        .collect::<Result<HashMap<_, _>, _>>()?;

    tracing::debug!(path = %path.display(), count = vars.len(), "Environment file loaded");
    Ok(vars)
}

/// Escape every `$` that dotenvy would treat as a substitution.
///
/// dotenvy expands `$NAME` in unquoted and double-quoted values, falling back
/// to the process environment. Single-quoted values, comments and characters
/// that are already escaped are copied unchanged.
fn escape_substitutions(contents: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum Quote {
        None,
        Single,
        Double,
    }

    let mut out = String::with_capacity(contents.len());
    let mut quote = Quote::None;

    for line in contents.split_inclusive('\n') {
        if quote == Quote::None && line.trim_start().starts_with('#') {
            out.push_str(line);
            continue;
        }

        let mut chars = line.char_indices();
        let mut prev_is_space = true;
        while let Some((idx, c)) = chars.next() {
            match (quote, c) {
                (Quote::None, '#') if prev_is_space => {
                    out.push_str(&line[idx..]);
                    break;
                }
                (Quote::Single, '\'') => quote = Quote::None,
                (Quote::Single, _) => {}
                (Quote::None | Quote::Double, '\\') => {
                    out.push(c);
                    if let Some((_, next)) = chars.next() {
                        out.push(next);
                    }
                    prev_is_space = false;
                    continue;
                }
                (Quote::None | Quote::Double, '$') => out.push('\\'),
                (Quote::None, '\'') => quote = Quote::Single,
                (Quote::None, '"') => quote = Quote::Double,
                (Quote::Double, '"') => quote = Quote::None,
                _ => {}
            }
            out.push(c);
            prev_is_space = c.is_whitespace();
        }
    }

    out
}

/// Layer process variables over file variables. Empty process values do not
/// shadow the file.
pub fn merge_vars(
    process: HashMap<String, String>,
    file: HashMap<String, String>,
) -> HashMap<String, String> {
    let mut merged = file;
    merged.extend(process.into_iter().filter(|(_, value)| !value.is_empty()));
    merged
}

/// Entries whose key is one of `keys` and whose value is not empty.
fn non_empty<'a>(
    vars: &'a HashMap<String, String>,
    keys: &'a [&str],
) -> impl Iterator<Item = (String, String)> + 'a {
    vars.iter()
        .filter(|(key, value)| keys.contains(&key.as_str()) && !value.is_empty())
        .map(|(key, value)| (key.clone(), value.clone()))
}

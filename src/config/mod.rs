//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    num::{NonZeroU32, NonZeroUsize},
    str::FromStr,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use time::Duration;
use tracing::level_filters::LevelFilter;

use crate::{
    application::{
        codec::{CodecSettings, DEFAULT_CODE_LANGUAGE, FALLBACK_LANGUAGE},
        verification::VerificationCodes,
    },
    domain::{
        access::{AccessPolicy, DEFAULT_ADMIN_PREFIXES, DEFAULT_PROTECTED_PREFIXES},
        posts::DEFAULT_WORDS_PER_MINUTE,
    },
};

pub use cli::{
    CliArgs, CodecArgs, Command, EditorOverrides, GuardArgs, LoggingOverrides, MetaArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const ENV_PREFIX: &str = "FOLIO";
const DEFAULT_CODE_TTL_SECS: u64 = 600;
const MAX_CODE_TTL_SECS: u64 = 86_400;
const DEFAULT_VERIFICATION_CAPACITY: usize = 1024;
const MAX_LANGUAGE_LEN: usize = 64;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub editor: EditorSettings,
    pub posts: PostSettings,
    pub verification: VerificationSettings,
    pub access: AccessSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSettings {
    pub default_code_language: String,
    pub fallback_language: String,
}

impl From<&EditorSettings> for CodecSettings {
    fn from(settings: &EditorSettings) -> Self {
        CodecSettings {
            default_code_language: settings.default_code_language.clone(),
            fallback_language: settings.fallback_language.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostSettings {
    pub words_per_minute: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct VerificationSettings {
    pub code_ttl: Duration,
    pub capacity: NonZeroUsize,
}

impl From<&VerificationSettings> for VerificationCodes {
    fn from(settings: &VerificationSettings) -> Self {
        VerificationCodes::new(settings.code_ttl, settings.capacity)
    }
}

#[derive(Debug, Clone)]
pub struct AccessSettings {
    pub protected_prefixes: Vec<String>,
    pub admin_prefixes: Vec<String>,
}

impl From<&AccessSettings> for AccessPolicy {
    fn from(settings: &AccessSettings) -> Self {
        AccessPolicy::new(
            settings.protected_prefixes.iter().cloned(),
            settings.admin_prefixes.iter().cloned(),
        )
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("access.protected_prefixes")
            .with_list_parse_key("access.admin_prefixes")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_logging_overrides(&cli.logging);
    match &cli.command {
        Command::Decode(args)
        | Command::Encode(args)
        | Command::Check(args)
        | Command::Render(args) => raw.apply_editor_overrides(&args.editor),
        Command::Meta(args) => raw.apply_meta_overrides(args),
        Command::Guard(_) => {}
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    editor: RawEditorSettings,
    posts: RawPostSettings,
    verification: RawVerificationSettings,
    access: RawAccessSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEditorSettings {
    default_code_language: Option<String>,
    fallback_language: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPostSettings {
    words_per_minute: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawVerificationSettings {
    code_ttl_seconds: Option<u64>,
    capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAccessSettings {
    protected_prefixes: Option<Vec<String>>,
    admin_prefixes: Option<Vec<String>>,
}

impl RawSettings {
    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_editor_overrides(&mut self, overrides: &EditorOverrides) {
        if let Some(language) = overrides.default_code_language.as_ref() {
            self.editor.default_code_language = Some(language.clone());
        }
        if let Some(language) = overrides.fallback_language.as_ref() {
            self.editor.fallback_language = Some(language.clone());
        }
    }

    fn apply_meta_overrides(&mut self, args: &MetaArgs) {
        if let Some(wpm) = args.words_per_minute {
            self.posts.words_per_minute = Some(wpm.into());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            editor,
            posts,
            verification,
            access,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            editor: build_editor_settings(editor)?,
            posts: build_post_settings(posts)?,
            verification: build_verification_settings(verification)?,
            access: build_access_settings(access)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::WARN,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_editor_settings(editor: RawEditorSettings) -> Result<EditorSettings, LoadError> {
    let default_code_language = language_setting(
        editor.default_code_language,
        DEFAULT_CODE_LANGUAGE,
        "editor.default_code_language",
    )?;
    let fallback_language = language_setting(
        editor.fallback_language,
        FALLBACK_LANGUAGE,
        "editor.fallback_language",
    )?;

    Ok(EditorSettings {
        default_code_language,
        fallback_language,
    })
}

fn language_setting(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    let Some(value) = value else {
        return Ok(default.to_string());
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LoadError::invalid(key, "language must not be empty"));
    }
    if trimmed.len() > MAX_LANGUAGE_LEN {
        return Err(LoadError::invalid(
            key,
            format!("language must be at most {MAX_LANGUAGE_LEN} bytes"),
        ));
    }
    if trimmed.contains(['"', '<', '>']) {
        return Err(LoadError::invalid(key, "language must not contain markup"));
    }
    Ok(trimmed.to_string())
}

fn build_post_settings(posts: RawPostSettings) -> Result<PostSettings, LoadError> {
    let words_per_minute = non_zero_u32(
        posts
            .words_per_minute
            .unwrap_or(DEFAULT_WORDS_PER_MINUTE.into()),
        "posts.words_per_minute",
    )?;
    Ok(PostSettings { words_per_minute })
}

fn build_verification_settings(
    verification: RawVerificationSettings,
) -> Result<VerificationSettings, LoadError> {
    let ttl_secs = verification
        .code_ttl_seconds
        .unwrap_or(DEFAULT_CODE_TTL_SECS);
    if ttl_secs == 0 || ttl_secs > MAX_CODE_TTL_SECS {
        return Err(LoadError::invalid(
            "verification.code_ttl_seconds",
            format!("must be between 1 and {MAX_CODE_TTL_SECS}"),
        ));
    }

    let capacity = NonZeroUsize::new(
        verification
            .capacity
            .unwrap_or(DEFAULT_VERIFICATION_CAPACITY),
    )
    .ok_or_else(|| LoadError::invalid("verification.capacity", "must be greater than zero"))?;

    Ok(VerificationSettings {
        code_ttl: Duration::seconds(ttl_secs as i64),
        capacity,
    })
}

fn build_access_settings(access: RawAccessSettings) -> Result<AccessSettings, LoadError> {
    let protected_prefixes = prefix_list(
        access.protected_prefixes,
        DEFAULT_PROTECTED_PREFIXES,
        "access.protected_prefixes",
    )?;
    let admin_prefixes = prefix_list(
        access.admin_prefixes,
        DEFAULT_ADMIN_PREFIXES,
        "access.admin_prefixes",
    )?;

    Ok(AccessSettings {
        protected_prefixes,
        admin_prefixes,
    })
}

fn prefix_list(
    value: Option<Vec<String>>,
    default: &[&str],
    key: &'static str,
) -> Result<Vec<String>, LoadError> {
    let Some(prefixes) = value else {
        return Ok(default.iter().map(|prefix| prefix.to_string()).collect());
    };

    prefixes
        .into_iter()
        .map(|prefix| {
            let trimmed = prefix.trim();
            if trimmed.starts_with('/') {
                Ok(trimmed.to_string())
            } else {
                Err(LoadError::invalid(
                    key,
                    format!("prefix `{trimmed}` must start with `/`"),
                ))
            }
        })
        .collect()
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

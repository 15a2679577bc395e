use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the folio binary.
#[derive(Debug, Parser)]
#[command(
    name = "folio",
    version,
    about = "Section codec and content tooling for folio posts"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "FOLIO_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Decode stored HTML into sections, printed as JSON.
    Decode(CodecArgs),
    /// Encode a JSON section list into stored HTML.
    Encode(CodecArgs),
    /// Verify that stored HTML survives a decode/encode round trip.
    Check(CodecArgs),
    /// Render stored HTML for readers with highlighted code blocks.
    Render(CodecArgs),
    /// Derive slug, reading time and outline for a post body.
    Meta(MetaArgs),
    /// Evaluate the route access guard for a request.
    Guard(GuardArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct EditorOverrides {
    /// Override the language given to new code sections.
    #[arg(long = "default-code-language", value_name = "LANG")]
    pub default_code_language: Option<String>,

    /// Override the language recorded for code blocks without one.
    #[arg(long = "fallback-language", value_name = "LANG")]
    pub fallback_language: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CodecArgs {
    #[command(flatten)]
    pub editor: EditorOverrides,

    /// Input file; `-` reads standard input.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct MetaArgs {
    /// Post title the slug is derived from.
    #[arg(long, value_name = "TITLE")]
    pub title: String,

    /// Also print the body with anchors added to unlabelled headings.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub anchor: bool,

    /// Override the reading speed used for reading time.
    #[arg(long = "words-per-minute", value_name = "COUNT")]
    pub words_per_minute: Option<u32>,

    /// Slugs already in use; the derived slug avoids them.
    #[arg(long = "taken-slug", value_name = "SLUG")]
    pub taken_slugs: Vec<String>,

    /// Input file; `-` reads standard input.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct GuardArgs {
    /// HTTP method of the request.
    #[arg(long, value_name = "METHOD", default_value = "GET")]
    pub method: String,

    /// Request path, without query string.
    #[arg(long, value_name = "PATH")]
    pub path: String,

    /// Role of the authenticated principal; omit for anonymous requests.
    #[arg(long, value_name = "ROLE", conflicts_with = "invalid_token")]
    pub role: Option<String>,

    /// Treat the request as carrying an invalid or expired token.
    #[arg(long = "invalid-token", action = clap::ArgAction::SetTrue)]
    pub invalid_token: bool,
}

use std::{
    collections::HashSet,
    fs,
    io::{self, Read, Write},
    path::Path,
    process,
};

use folio::{
    application::{
        codec::SectionCodec,
        error::AppError,
        metadata::{MetadataService, anchor_headings},
        render::DisplayRenderer,
    },
    config::{self, CodecArgs, Command, GuardArgs, MetaArgs, Settings},
    domain::{
        access::{AccessDecision, AccessPolicy, Credentials, Principal},
        posts::PostMetadata,
        sections::{ContentSection, equivalent},
    },
    infra::{error::InfraError, telemetry},
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

const STDIN_PATH: &str = "-";
const CLI_PRINCIPAL_ID: &str = "cli";

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(error = %report.summary(), exit_code = report.exit_code, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %report.summary(), exit_code = report.exit_code, "application error");
    });
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| InfraError::configuration(err.to_string()))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        Command::Decode(args) => run_decode(&settings, &args),
        Command::Encode(args) => run_encode(&settings, &args),
        Command::Check(args) => run_check(&settings, &args),
        Command::Render(args) => run_render(&settings, &args),
        Command::Meta(args) => run_meta(&settings, &args),
        Command::Guard(args) => run_guard(&settings, &args),
    }
}

fn run_decode(settings: &Settings, args: &CodecArgs) -> Result<(), AppError> {
    let html = read_input(&args.file)?;
    let codec = SectionCodec::new((&settings.editor).into());
    let sections = codec.decode(&html);
    write_json(&sections)
}

fn run_encode(settings: &Settings, args: &CodecArgs) -> Result<(), AppError> {
    let input = read_input(&args.file)?;
    let sections: Vec<ContentSection> = serde_json::from_str(&input).map_err(InfraError::from)?;
    if sections.is_empty() {
        return Err(AppError::validation("section list must not be empty"));
    }

    let codec = SectionCodec::new((&settings.editor).into());
    write_text(&codec.encode(&sections))
}

fn run_check(settings: &Settings, args: &CodecArgs) -> Result<(), AppError> {
    let html = read_input(&args.file)?;
    let codec = SectionCodec::new((&settings.editor).into());

    let first = codec.decode(&html);
    let encoded = codec.encode(&first);
    let second = codec.decode(&encoded);

    if !equivalent(&first, &second) {
        let index = first
            .iter()
            .zip(second.iter())
            .position(|(a, b)| !a.same_content(b))
            .unwrap_or(first.len().min(second.len()));
        return Err(AppError::validation(format!(
            "round trip changed section {index} ({} sections before, {} after)",
            first.len(),
            second.len()
        )));
    }

    info!(
        target = "folio::check",
        sections = first.len(),
        code_sections = first.iter().filter(|s| s.is_code()).count(),
        "round trip is stable"
    );
    write_text(&format!("ok: {} sections", first.len()))
}

fn run_render(settings: &Settings, args: &CodecArgs) -> Result<(), AppError> {
    let html = read_input(&args.file)?;
    let renderer = DisplayRenderer::new(settings.editor.fallback_language.clone());
    write_text(&renderer.render(&html)?)
}

#[derive(Serialize)]
struct MetaOutput {
    #[serde(flatten)]
    metadata: PostMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    anchored_html: Option<String>,
}

fn run_meta(settings: &Settings, args: &MetaArgs) -> Result<(), AppError> {
    let mut html = read_input(&args.file)?;
    let anchored_html = if args.anchor {
        html = anchor_headings(&html)?;
        Some(html.clone())
    } else {
        None
    };

    let taken: HashSet<&str> = args.taken_slugs.iter().map(String::as_str).collect();
    let service = MetadataService::new(settings.posts.words_per_minute);
    let metadata = service.derive(&args.title, &html, |candidate| !taken.contains(candidate))?;

    write_json(&MetaOutput {
        metadata,
        anchored_html,
    })
}

#[derive(Serialize)]
struct GuardOutput {
    #[serde(flatten)]
    decision: AccessDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<String>,
}

fn run_guard(settings: &Settings, args: &GuardArgs) -> Result<(), AppError> {
    let policy = AccessPolicy::from(&settings.access);
    let principal = args.role.as_ref().map(|role| Principal {
        id: CLI_PRINCIPAL_ID.to_string(),
        email: String::new(),
        role: role.clone(),
    });

    let credentials = match (&principal, args.invalid_token) {
        (_, true) => Credentials::Invalid,
        (Some(principal), false) => Credentials::Valid(principal),
        (None, false) => Credentials::Missing,
    };

    let decision = policy.decide(&args.method, &args.path, credentials);
    info!(
        target = "folio::guard",
        method = %args.method,
        path = %args.path,
        decision = ?decision,
        "access evaluated"
    );

    write_json(&GuardOutput {
        decision,
        status: decision.api_status(),
        message: decision.api_message(),
        redirect: decision.page_redirect(&args.path),
    })
}

fn read_input(path: &Path) -> Result<String, AppError> {
    let contents = if path == Path::new(STDIN_PATH) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(InfraError::from)?;
        buffer
    } else {
        fs::read_to_string(path).map_err(InfraError::from)?
    };
    Ok(contents)
}

fn write_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(InfraError::from)?;
    write_text(&rendered)
}

fn write_text(text: &str) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}").map_err(InfraError::from)?;
    stdout.flush().map_err(InfraError::from)?;
    Ok(())
}

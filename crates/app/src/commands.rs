//! Subcommand implementations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use courier_application::{
    ApplicationError, ExportCollection, FileIo, FileIoError, ImportCollection, Repository,
    SaveRequestToCollection, SendOutcome, SendReport, SendRequest, TabHandle, TransportError,
    TransportSet,
};
use courier_domain::collection::Collection;
use courier_domain::environment::{Environment, ResolutionContext};
use courier_domain::request::{Protocol, Request};
use courier_domain::scripting::ScriptExecutionResult;
use courier_domain::settings::ImportLimits;
use courier_domain::tab::Tab;
use courier_infrastructure::codegen::{CodeGeneratorRegistry, GenerationError};
use courier_infrastructure::{
    CollectionFormat, CourierConfig, DslSandbox, FileHistoryLog, JsonFileStore, NativeCodec,
    PostmanCodec, ReqwestTransport, SettingsError, SystemClock, TokioFileIo, from_json_bytes,
    load_settings,
};
use tracing::{info, warn};

use crate::cli::{Cli, CodegenArgs, Command, ExportArgs, ImportArgs, SendArgs};
use crate::history::NotifyingHistory;

/// How long `send` waits for its history entry to be written.
const HISTORY_WAIT: Duration = Duration::from_secs(5);

/// Errors reported by the command line front end.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// A use case failed.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// The transport could not be set up.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Code generation failed.
    #[error(transparent)]
    Codegen(#[from] GenerationError),

    /// An input file could not be read.
    #[error(transparent)]
    File(#[from] FileIoError),

    /// An input file is not what the command expects.
    #[error("{}: {message}", path.display())]
    Parse {
        /// The offending file
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// `import` could not tell which format a file is in.
    #[error("could not detect the format of {}; pass --format", .0.display())]
    UnknownFormat(PathBuf),

    /// Writing to stdout failed.
    #[error(transparent)]
    Output(#[from] io::Error),
}

/// Runs one invocation.
///
/// # Errors
///
/// Returns an error when the command could not do its work. A send that
/// reached the transport is reported through the exit code instead.
pub async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = Some(dir);
    }

    match cli.command {
        Command::Send(args) => send(&settings, &args).await,
        Command::Codegen(args) => codegen(&args).await,
        Command::Languages => languages(),
        Command::Import(args) => import(&settings, &args).await,
        Command::Export(args) => export(&settings, &args).await,
    }
}

async fn send(settings: &CourierConfig, args: &SendArgs) -> Result<ExitCode, CliError> {
    let files = TokioFileIo::new();
    let limits = settings.engine.import;
    let request = read_request(&files, &args.request).await?;

    let mut context = ResolutionContext::new();
    if let Some(path) = &args.env {
        context = context.with_environment(&read_environment(&files, path, limits).await?);
    }
    if let Some(path) = &args.globals {
        context = context.with_globals(&read_environment(&files, path, limits).await?);
    }
    let store = JsonFileStore::<Collection>::new(settings.collections_dir()?);
    if let Some(id) = &args.collection {
        let collection = store.get(id).await.map_err(ApplicationError::from)?;
        context = context.with_collection(&collection.variables);
    }

    let transport =
        TransportSet::new().with(Protocol::Http, Arc::new(ReqwestTransport::new(&settings.engine)?));
    let history = FileHistoryLog::new(settings.history_path()?, settings.engine.history_limit);
    let (history, mut writes) = NotifyingHistory::new(history);
    let use_case = SendRequest::new(
        Arc::new(transport),
        Arc::new(DslSandbox::new()),
        Arc::new(SystemClock::new()),
        settings.engine.clone(),
    )
    .with_history(Arc::new(history));

    let tab = TabHandle::new(Tab::new(request));
    let report = use_case.execute(&tab, context).await;
    if report.response().is_some() && !writes.wait(HISTORY_WAIT).await {
        warn!("history entry was not written in time");
    }
    render_report(&report, &mut io::stdout().lock())?;

    if args.save
        && let Some(id) = &args.collection
    {
        let saved = SaveRequestToCollection::new(store).execute(&tab, id).await?;
        info!(collection = %id, request = %saved.request_id, "saved");
    }

    Ok(exit_code(&report))
}

async fn codegen(args: &CodegenArgs) -> Result<ExitCode, CliError> {
    let request = read_request(&TokioFileIo::new(), &args.request).await?;
    let code =
        CodeGeneratorRegistry::with_builtins().generate(&request, &args.lang, args.comments)?;
    let mut out = io::stdout().lock();
    out.write_all(code.as_bytes())?;
    if !code.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn languages() -> Result<ExitCode, CliError> {
    let mut out = io::stdout().lock();
    for (id, label) in CodeGeneratorRegistry::with_builtins().languages() {
        writeln!(out, "{id:<12} {label}")?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn import(settings: &CourierConfig, args: &ImportArgs) -> Result<ExitCode, CliError> {
    let files = TokioFileIo::new();
    let limits = settings.engine.import;
    let format = match args.format {
        Some(format) => format.into(),
        None => {
            let bytes = files.read(&args.file).await?;
            CollectionFormat::detect(&bytes)
                .ok_or_else(|| CliError::UnknownFormat(args.file.clone()))?
        }
    };

    let store = JsonFileStore::<Collection>::new(settings.collections_dir()?);
    let codec = format.codec(limits);
    let output = ImportCollection::new(store.clone(), files)
        .execute(&args.file, codec.as_ref())
        .await?;
    if let Some(path) = &args.out {
        ExportCollection::new(store, files)
            .execute(&output.collection.id, path, &NativeCodec::new(limits))
            .await?;
    }

    let mut out = io::stdout().lock();
    writeln!(
        out,
        "imported '{}' as {} ({} requests)",
        output.collection.name,
        output.collection.id,
        output.collection.request_count()
    )?;
    for warning in &output.warnings {
        writeln!(out, "{warning}")?;
    }
    if let Some(path) = &args.out {
        writeln!(out, "wrote {}", path.display())?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn export(settings: &CourierConfig, args: &ExportArgs) -> Result<ExitCode, CliError> {
    let store = JsonFileStore::<Collection>::new(settings.collections_dir()?);
    let codec = CollectionFormat::from(args.format).codec(settings.engine.import);
    let written = ExportCollection::new(store, TokioFileIo::new())
        .execute(&args.collection, &args.out, codec.as_ref())
        .await?;
    writeln!(
        io::stdout().lock(),
        "wrote {} ({written} bytes)",
        args.out.display()
    )?;
    Ok(ExitCode::SUCCESS)
}

async fn read_request(files: &TokioFileIo, path: &Path) -> Result<Request, CliError> {
    let bytes = files.read(path).await?;
    from_json_bytes(&bytes).map_err(|e| CliError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Reads a native environment file or a Postman environment export.
async fn read_environment(
    files: &TokioFileIo,
    path: &Path,
    limits: ImportLimits,
) -> Result<Environment, CliError> {
    let bytes = files.read(path).await?;
    parse_environment(path, &bytes, limits)
}

fn parse_environment(
    path: &Path,
    bytes: &[u8],
    limits: ImportLimits,
) -> Result<Environment, CliError> {
    let parse_error = |message: String| CliError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let document: serde_json::Value =
        from_json_bytes(bytes).map_err(|e| parse_error(e.to_string()))?;
    if document.get("values").is_none() {
        return serde_json::from_value(document).map_err(|e| parse_error(e.to_string()));
    }

    let imported = PostmanCodec::new(limits)
        .decode_environment(bytes)
        .map_err(|e| parse_error(e.to_string()))?;
    for warning in &imported.warnings {
        warn!(%warning, "environment import");
    }
    Ok(imported.environment)
}

/// Success only for a completed send whose tests all passed.
fn exit_code(report: &SendReport) -> ExitCode {
    let tests_failed = report
        .response()
        .and_then(|r| r.test_script_result())
        .is_some_and(|r| r.failed_count() > 0);
    if report.response().is_some() && !tests_failed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Prints a send report.
pub fn render_report(report: &SendReport, out: &mut impl Write) -> io::Result<()> {
    for warning in &report.warnings {
        writeln!(out, "warning: {warning}")?;
    }
    if let Some(result) = &report.pre_request_script_result {
        render_script(out, "pre-request", result)?;
    }

    match &report.outcome {
        SendOutcome::Completed(response) => {
            writeln!(
                out,
                "{} {} ({} ms, {} bytes)",
                response.status(),
                response.status_text(),
                response.time_ms(),
                response.size()
            )?;
            for (name, value) in response.headers() {
                writeln!(out, "{name}: {value}")?;
            }
            writeln!(out)?;
            writeln!(out, "{}", response.body())?;
            if let Some(result) = response.test_script_result() {
                render_script(out, "test", result)?;
                render_tests(out, result)?;
            }
        }
        SendOutcome::Failed(failure) => writeln!(out, "error: {failure}")?,
        SendOutcome::Rejected => writeln!(out, "error: send rejected")?,
    }
    Ok(())
}

fn render_script(out: &mut impl Write, phase: &str, result: &ScriptExecutionResult) -> io::Result<()> {
    for line in &result.console_logs {
        writeln!(out, "[{phase}] {line}")?;
    }
    if let Some(error) = &result.error {
        writeln!(out, "[{phase}] script error: {error}")?;
    }
    Ok(())
}

fn render_tests(out: &mut impl Write, result: &ScriptExecutionResult) -> io::Result<()> {
    let Some(tests) = &result.test_results else {
        return Ok(());
    };
    for test in tests {
        match &test.error {
            None if test.passed => writeln!(out, "PASS {}", test.name)?,
            Some(error) => writeln!(out, "FAIL {}: {error}", test.name)?,
            None => writeln!(out, "FAIL {}", test.name)?,
        }
    }
    writeln!(
        out,
        "{} passed, {} failed",
        result.passed_count(),
        result.failed_count()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use courier_domain::response::{RawResponse, Response};
    use courier_domain::scripting::{ConsoleLog, LogLevel, TestResult};
    use courier_domain::state::{SendFailure, SendState};
    use pretty_assertions::assert_eq;

    fn report(outcome: SendOutcome) -> SendReport {
        SendReport {
            outcome,
            states: vec![SendState::Idle],
            warnings: Vec::new(),
            pre_request_script_result: None,
            sent: None,
            delivered: true,
        }
    }

    fn rendered(report: &SendReport) -> String {
        let mut out = Vec::new();
        render_report(report, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_render_completed_send() {
        let raw = RawResponse::new(200, "{\"ok\":true}")
            .with_header("content-type", "application/json")
            .with_time(12);
        let tests = ScriptExecutionResult {
            console_logs: vec![ConsoleLog::new(LogLevel::Info, "checked")],
            ..ScriptExecutionResult::default()
        }
        .with_test_results(vec![
            TestResult::pass("status is 200"),
            TestResult::fail("has id", "missing 'id'"),
        ]);
        let response = Response::new(raw, None, Some(tests));
        let report = report(SendOutcome::Completed(Arc::new(response)));

        let text = rendered(&report);

        assert!(text.starts_with("200 OK (12 ms, 11 bytes)\ncontent-type: application/json\n\n"));
        assert!(text.contains("[test] [INFO] checked\n"));
        assert!(text.contains("PASS status is 200\n"));
        assert!(text.contains("FAIL has id: missing 'id'\n"));
        assert!(text.ends_with("1 passed, 1 failed\n"));
        assert_eq!(exit_code(&report), ExitCode::FAILURE);
    }

    #[test]
    fn test_render_failed_send_keeps_pre_request_logs() {
        let mut report = report(SendOutcome::Failed(SendFailure::cancelled()));
        report.pre_request_script_result = Some(ScriptExecutionResult {
            console_logs: vec![ConsoleLog::new(LogLevel::Log, "preparing")],
            ..ScriptExecutionResult::default()
        });

        let text = rendered(&report);

        assert_eq!(
            text,
            format!("[pre-request] preparing\nerror: {}\n", SendFailure::cancelled())
        );
        assert_eq!(exit_code(&report), ExitCode::FAILURE);
    }

    #[test]
    fn test_parse_native_and_postman_environments() {
        let path = Path::new("env.json");
        let native = serde_json::to_vec(&Environment::new("dev").with("base", "http://dev")).unwrap();
        let postman = br#"{"id": "e-1", "name": "staging", "values": [{"key": "base", "value": "http://stg"}]}"#;

        let dev = parse_environment(path, &native, ImportLimits::default()).unwrap();
        let staging = parse_environment(path, postman, ImportLimits::default()).unwrap();

        assert_eq!(dev.get("base"), Some("http://dev"));
        assert_eq!(staging.name, "staging");
        assert_eq!(staging.get("base"), Some("http://stg"));
        assert!(matches!(
            parse_environment(path, b"[1, 2]", ImportLimits::default()),
            Err(CliError::Parse { .. })
        ));
    }
}

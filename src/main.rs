//! Command-line front end: translates one key using a project's translation files.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use reactive_translate::config::{
    ConfigError,
    ConfigManager,
};
use reactive_translate::{
    LanguageId,
    LoaderError,
    TranslateError,
    params,
};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "reactive-translate", version, about = "Translate a key using the project's translation files")]
struct Cli {
    /// Project root holding `.translate.json` and the translation directory
    #[arg(long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Language to translate into
    #[arg(long, value_name = "LANG")]
    lang: Option<LanguageId>,

    /// Fallback language; overrides `defaultLanguage` from the config file
    #[arg(long, value_name = "LANG")]
    default_lang: Option<LanguageId>,

    /// Print the languages that have a translation file and exit
    #[arg(long)]
    list_langs: bool,

    /// Translation key, e.g. `common.hello`
    key: Option<String>,

    /// Parameters as an object literal, e.g. `{name: 'World'}`
    params: Option<String>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Nothing to translate: pass a KEY or --list-langs")]
    MissingKey,
}

/// Logs go to stderr so stdout carries only the translation.
fn init_tracing() -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(writer)
        .init();
    guard
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ConfigManager::load(&cli.root)?;

    if cli.list_langs {
        let mut stdout = std::io::stdout().lock();
        for lang in config.file_loader().discover_languages()? {
            writeln!(stdout, "{lang}")?;
        }
        return Ok(());
    }

    let key = cli.key.ok_or(CliError::MissingKey)?;
    let params = params::coerce(cli.params.into())?;
    let default_lang = cli.default_lang.or_else(|| config.settings().default_language_id());

    let service = config.build_service();
    if let Some(lang) = default_lang {
        service.set_default_lang(lang).await?;
    }
    if let Some(lang) = cli.lang {
        service.use_language(lang).await?;
    }

    writeln!(std::io::stdout().lock(), "{}", service.get(&key, &params))?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _guard = init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(?err, "Command failed");
            let _ = writeln!(std::io::stderr(), "error: {err}");
            ExitCode::FAILURE
        }
    }
}

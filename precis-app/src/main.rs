use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use precis_app::wiring::{self, Target, Wiring};
use precis_common::observability::{LogConfig, init_logging};
use precis_common::protocol::RelayResponse;
use precis_common::{ContentSource, Credential, RequestKind};
use precis_config::{PrecisConfig, PrecisConfigLoader};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "precis", version, about = "Summarize web pages and YouTube videos with Gemini")]
struct Cli {
    /// YAML configuration file; skipped when missing.
    #[arg(long, global = true, default_value = "precis.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Open the terminal popup (default).
    Popup {
        /// Summarize this page instead of the browser's focused tab.
        #[arg(long)]
        url: Option<String>,
    },
    /// Summarize one page and print the result.
    Summarize {
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        url: String,
        #[arg(long, value_enum)]
        source: Option<SourceArg>,
        /// Print the summary as an escaped HTML fragment.
        #[arg(long)]
        html: bool,
    },
    /// Manage the stored Gemini API key.
    Key {
        #[command(subcommand)]
        action: KeyCmd,
    },
}

#[derive(Subcommand)]
enum KeyCmd {
    Set { key: String },
    Clear,
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Page,
    Video,
}

impl From<KindArg> for RequestKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Page => RequestKind::PageContent,
            KindArg::Video => RequestKind::VideoTranscript,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    DomText,
    CaptionFetch,
    DirectUrl,
}

impl From<SourceArg> for ContentSource {
    fn from(source: SourceArg) -> Self {
        match source {
            SourceArg::DomText => ContentSource::DomText,
            SourceArg::CaptionFetch => ContentSource::CaptionFetch,
            SourceArg::DirectUrl => ContentSource::DirectUrl,
        }
    }
}

fn start_logging(cfg: &PrecisConfig, allow_stderr: bool) -> Result<()> {
    init_logging(LogConfig {
        app_name: "precis",
        log_dir: cfg.logging.resolved_dir(),
        emit_stderr: allow_stderr && cfg.logging.emit_stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Env wins over the file.
    let mut cfg: PrecisConfig = PrecisConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()?;

    match cli.command.unwrap_or(Cmd::Popup { url: None }) {
        Cmd::Popup { url } => {
            start_logging(&cfg, false)?;
            let target = url.map_or(Target::Browser, Target::Static);
            let keys = wiring::open_key_store(&cfg).await?;
            let host = wiring::build_host(&cfg, &target).await?;
            let relay = wiring::build_relay(&cfg, keys.clone(), host.tabs.clone())?;

            let mut w = Wiring::new();
            wiring::build_popup(&mut w, relay, keys, &host.label)?;
            let outcome = w.run().await;
            host.close().await;
            outcome?;
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Summarize {
            kind,
            url,
            source,
            html,
        } => {
            start_logging(&cfg, true)?;
            if let Some(source) = source {
                cfg.pipeline.source = source.into();
            }
            let keys = wiring::open_key_store(&cfg).await?;
            let host = wiring::build_host(&cfg, &Target::Static(url)).await?;
            let relay = wiring::build_relay(&cfg, keys, host.tabs.clone())?;
            match relay.run(kind.into()).await {
                RelayResponse::Summary(summary) => {
                    println!("{}", wiring::render_summary(&summary, html));
                    Ok(ExitCode::SUCCESS)
                }
                RelayResponse::Error(message) => {
                    eprintln!("{message}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Cmd::Key { action } => {
            start_logging(&cfg, true)?;
            let keys = wiring::open_key_store(&cfg).await?;
            match action {
                KeyCmd::Set { key } => {
                    keys.set(Credential::new(key)).await?;
                    println!("API key saved.");
                }
                KeyCmd::Clear => {
                    keys.clear().await?;
                    println!("API key cleared.");
                }
                KeyCmd::Status => match keys.get().await {
                    Some(_) => println!("API key is configured."),
                    None => println!("API key is not configured."),
                },
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use voice_qa::voice::stt;
use voice_qa::{
    CommandSynthesizer, CommandTranscriber, Config, Controller, HttpDispatcher,
    RecognitionSettings, SilentSynthesizer, Synthesizer, TerminalDisplay,
};

/// voice-qa - ask questions by voice or text and hear the answers
#[derive(Parser)]
#[command(name = "voice-qa", version, about)]
struct Cli {
    /// Origin of the answer service (answers come from <url>/api/gemini)
    #[arg(long)]
    base_url: Option<String>,

    /// Speech recognition locale
    #[arg(long)]
    locale: Option<String>,

    /// Don't speak answers
    #[arg(long, env = "VOICE_QA_MUTE")]
    mute: bool,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a single question and exit
    Ask {
        /// The question
        text: String,
    },
    /// Print the resolved configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,voice_qa=info",
        1 => "info,voice_qa=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(base_url) = &cli.base_url {
        config.set_base_url(base_url)?;
    }
    if let Some(locale) = cli.locale {
        config.recognition.locale = locale;
    }
    if cli.mute {
        config.synthesis.enabled = false;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Some(Command::Config) => {
            println!("{config}");
            Ok(())
        }
        Some(Command::Ask { text }) => ask_once(&config, &text).await,
        None => interactive(config).await,
    }
}

/// Speech command to use, if answers should be spoken
fn speech_command(config: &Config) -> Option<String> {
    if !config.synthesis.enabled {
        return None;
    }
    if config.synthesis.command.is_none() {
        tracing::info!("no speech command configured, answers will not be spoken");
    }
    config.synthesis.command.clone()
}

/// Interactive session on the terminal
async fn interactive(config: Config) -> anyhow::Result<()> {
    let voice_available = stt::probe(config.recognition.command.as_deref());
    if !voice_available {
        notify_voice_unavailable();
    }

    let (tx, rx) = mpsc::unbounded_channel();

    let transcriber = CommandTranscriber::new(
        config.recognition.command.clone(),
        RecognitionSettings {
            locale: config.recognition.locale.clone(),
        },
        tx.clone(),
    );
    let synthesizer: Box<dyn Synthesizer> = match speech_command(&config) {
        Some(command) => Box::new(CommandSynthesizer::new(command)),
        None => Box::new(SilentSynthesizer),
    };
    let dispatcher = HttpDispatcher::new(config.endpoint.clone());
    let display = TerminalDisplay::new(std::io::stdout());

    tracing::info!(endpoint = %config.endpoint, "voice-qa ready");
    println!("Type a question and press Enter. /listen to ask by voice, /quit to exit.");

    let controller = Controller::new(
        transcriber,
        synthesizer,
        dispatcher,
        display,
        tx.clone(),
        voice_available,
    );

    let _stdin = voice_qa::input::spawn_stdin(tx);
    controller.run(rx).await;

    Ok(())
}

/// One question, one answer, then exit once speech has finished
async fn ask_once(config: &Config, text: &str) -> anyhow::Result<()> {
    let (tx, _rx) = mpsc::unbounded_channel();
    let transcriber = CommandTranscriber::new(None, RecognitionSettings::default(), tx.clone());
    let dispatcher = HttpDispatcher::new(config.endpoint.clone());
    let display = TerminalDisplay::new(std::io::stdout()).without_controls();

    let answer = if let Some(command) = speech_command(config) {
        let mut synthesizer = CommandSynthesizer::new(command);
        let answer = Controller::new(transcriber, &mut synthesizer, dispatcher, display, tx, false)
            .ask(text)
            .await;
        synthesizer.wait().await?;
        answer
    } else {
        Controller::new(transcriber, SilentSynthesizer, dispatcher, display, tx, false)
            .ask(text)
            .await
    };

    match answer {
        Some(answer) if answer.is_fallback() => anyhow::bail!("the answer service request failed"),
        Some(_) => Ok(()),
        None => anyhow::bail!("question must not be empty"),
    }
}

/// One-time blocking notice that voice input can't be used this session
fn notify_voice_unavailable() {
    let notice = "Sorry, speech recognition is not available. \
                  Set VOICE_QA_STT_COMMAND to a recognizer to ask by voice.";

    let acknowledged = dialoguer::Input::<String>::new()
        .with_prompt(format!("{notice} Press Enter to continue"))
        .allow_empty(true)
        .interact_text();

    if let Err(e) = acknowledged {
        tracing::debug!(error = %e, "notice not shown interactively");
        eprintln!("{notice}");
    }
}

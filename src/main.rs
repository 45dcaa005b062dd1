use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use companion_gateway::client::{
    AudioSink, CaptureCommand, CaptureEvent, ChatApi, ChatClient, ExchangeOutcome, FileSink,
    InteractionState, Speaker, SpeakerSink,
};
use companion_gateway::session::MemorySessionStore;
use companion_gateway::voice::{self, GoogleTts, SpeechSynthesizer};
use companion_gateway::{ApiServerBuilder, Config, OpenAiCompletion};

/// Companion - Voice-enabled wellness chat gateway
#[derive(Parser)]
#[command(name = "companion", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Directory with landing.html and index.html
    #[arg(long, env = "COMPANION_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway (default)
    Serve,
    /// Chat with a running gateway from the terminal
    Chat {
        /// Gateway base URL
        #[arg(long, default_value = "http://localhost:5000")]
        server: String,
        /// Directory for reply audio when no output device is available
        #[arg(long, default_value = "companion-audio")]
        audio_dir: PathBuf,
        /// Language code for speech synthesis
        #[arg(short, long, default_value = voice::DEFAULT_LANGUAGE)]
        language: String,
    },
    /// Synthesize text and write the MP3 to a file
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
        /// Language code
        #[arg(short, long, default_value = voice::DEFAULT_LANGUAGE)]
        language: String,
        /// Output file
        #[arg(short, long, default_value = "tts-test.mp3")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("warning: failed to read .env: {e}");
    }

    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,companion_gateway=info",
        1 => "info,companion_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
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
    match cli.command {
        Some(Command::Chat {
            server,
            audio_dir,
            language,
        }) => chat(&server, audio_dir, language).await,
        Some(Command::TestTts {
            text,
            language,
            output,
        }) => test_tts(&text, &language, &output).await,
        Some(Command::Serve) | None => serve(cli.port, cli.static_dir).await,
    }
}

/// Run the HTTP gateway until interrupted
async fn serve(port: Option<u16>, static_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = static_dir {
        config.server.static_dir = dir;
    }

    let (openai_key, tts_key) = config.require_keys()?;

    tracing::info!(
        port = config.server.port,
        model = %config.llm.model,
        persona = %config.persona.name,
        "starting companion gateway"
    );

    let completion = OpenAiCompletion::new(openai_key)?
        .with_base_url(&config.llm.base_url)
        .with_model(&config.llm.model)
        .with_retry_policy(config.llm.retry.clone());
    let tts = GoogleTts::new(tts_key)?.with_base_url(&config.tts_base_url);
    let store = MemorySessionStore::new(config.server.session_ttl, config.server.max_sessions);

    let server = ApiServerBuilder::new(Arc::new(completion), Arc::new(tts), config.server.port)
        .session_store(Arc::new(store))
        .persona(config.persona)
        .static_dir(config.server.static_dir)
        .build();

    server.run().await?;

    tracing::info!("companion gateway stopped");
    Ok(())
}

/// Terminal chat client
///
/// Typed lines are sent as messages. `/talk` toggles the microphone: while
/// listening, the next line stands in for the recognised speech and an
/// empty line ends capture without a result. `/type <text>` while
/// listening stops capture and sends the text. `/name <name>` introduces
/// the user, `/lang <code>` switches language, `/stop` cuts playback and
/// `/quit` exits.
async fn chat(server: &str, audio_dir: PathBuf, language: String) -> anyhow::Result<()> {
    let api = ChatApi::new(server)?;
    let sink: Box<dyn AudioSink> = match SpeakerSink::new() {
        Ok(speaker) => Box::new(speaker),
        Err(e) => {
            tracing::warn!(error = %e, dir = %audio_dir.display(), "no audio output, saving replies to files");
            Box::new(FileSink::new(&audio_dir)?)
        }
    };
    let mut client = ChatClient::new(api, sink);
    client.set_language(language);

    println!("Connected to {server}");
    println!("Commands: /talk, /type <text>, /name <name>, /lang <code>, /stop, /quit\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    loop {
        let line = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
            _ = ticker.tick() => {
                if client.refresh_playback() {
                    tracing::debug!("reply playback finished");
                }
                continue;
            }
        };
        let line = line.trim();

        let outcome = if line == "/quit" {
            break;
        } else if line == "/talk" {
            match client.toggle_capture() {
                CaptureCommand::Start {
                    interrupted_playback,
                } => {
                    if interrupted_playback {
                        println!("(interrupted)");
                    }
                    println!("listening...");
                }
                CaptureCommand::Stop => println!("stopped listening"),
            }
            continue;
        } else if line == "/stop" {
            client.playback_finished();
            continue;
        } else if let Some(code) = line.strip_prefix("/lang ") {
            client.set_language(code.trim());
            println!("language: {}", client.language());
            continue;
        } else if let Some(name) = line.strip_prefix("/name ") {
            client.introduce(name).await
        } else if let Some(text) = line.strip_prefix("/type ") {
            if client.typing_started().is_some() {
                println!("stopped listening");
            }
            client.submit(text).await
        } else if client.state() == InteractionState::Listening {
            let event = if line.is_empty() {
                CaptureEvent::SpeechEnd
            } else {
                CaptureEvent::Transcript(line.to_string())
            };
            client.on_capture(event).await
        } else {
            client.submit(line).await
        };

        if matches!(outcome, ExchangeOutcome::Skipped) {
            continue;
        }

        // Print assistant bubbles added by this exchange
        for bubble in client
            .transcript()
            .iter()
            .rev()
            .take_while(|b| b.speaker == Speaker::Assistant)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
        {
            println!("{}\n", bubble.text);
        }
    }

    client.playback_finished();
    Ok(())
}

/// Synthesize a phrase directly against the TTS API
async fn test_tts(text: &str, language: &str, output: &Path) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\" ({language})\n");

    let mut config = Config::load()?;
    let key = config
        .api_keys
        .google_tts
        .take()
        .ok_or_else(|| anyhow::anyhow!("GOOGLE_TTS_API_KEY is not set"))?;

    let profile = voice::VoiceProfile::for_language(language);
    println!("Voice: {} ({:?})", profile.voice_name, profile.gender);

    let tts = GoogleTts::new(key)?.with_base_url(&config.tts_base_url);
    let encoded = tts.synthesize(text, language).await?;
    let mp3 = STANDARD.decode(encoded.as_bytes())?;
    println!("Got {} bytes of audio data", mp3.len());

    tokio::fs::write(output, &mp3).await?;
    println!("Wrote {}", output.display());

    Ok(())
}

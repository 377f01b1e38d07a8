use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chat_narrator::speech::{CpalSink, TextToSpeech, voices};
use chat_narrator::{Config, Daemon};

/// Narrator - chat-triggered speech playback for live streams
#[derive(Parser)]
#[command(name = "narrator", version, about)]
struct Cli {
    /// Config file path (defaults to ~/.config/chat-narrator/config.toml)
    #[arg(short, long, env = "NARRATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Twitch channel to join (overrides config)
    #[arg(long, env = "NARRATOR_TWITCH_CHANNEL")]
    channel: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List voices supported by the configured provider
    ListVoices,
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,

        /// Voice to use (defaults to the provider's first voice)
        #[arg(short, long)]
        voice: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,chat_narrator=info",
        1 => "info,chat_narrator=debug",
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
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(channel) = cli.channel {
        config.twitch.channel = channel.trim_start_matches('#').to_lowercase();
    }

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::ListVoices => list_voices(&config).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text, voice } => test_tts(&config, &text, voice.as_deref()).await,
        };
    }

    tracing::info!(
        channel = %config.twitch.channel,
        provider = config.provider.key(),
        "starting narrator"
    );

    Daemon::new(config).run().await?;
    Ok(())
}

/// List voices supported by the configured provider
async fn list_voices(config: &Config) -> anyhow::Result<()> {
    let tts = TextToSpeech::from_config(config)?;
    let voices = tts.list_voices().await?;

    println!("Voices:");
    for voice in voices {
        if voice.id == voice.name {
            println!("  {}", voice.name);
        } else {
            println!("  {} ({})", voice.name, voice.id);
        }
    }

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sink = CpalSink::new()?;

    // Generate 2 seconds of 440Hz sine wave at 24kHz sample rate
    let sample_rate = 24000_f32;
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (sample_rate * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    sink.play_samples(samples).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}

/// Test TTS synthesis and playback
async fn test_tts(config: &Config, text: &str, voice: Option<&str>) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TextToSpeech::from_config(config)?;

    let catalog = voices::provider_voices(config.provider);
    let voice = voice
        .map(ToString::to_string)
        .or_else(|| catalog.first().cloned())
        .ok_or_else(|| anyhow::anyhow!("no voice available"))?;

    println!("Synthesizing with voice {voice}...");
    let mp3_data = tts.synthesize(text, &voice).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    let sink = CpalSink::new()?;
    sink.play_mp3(mp3_data).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}

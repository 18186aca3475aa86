//! # Mood DJ
//!
//! Watches your facial expression through an external emotion classifier and
//! plays a Spotify playlist that fits the mood you settle into.
//!
//! ## Usage
//!
//! ```bash
//! # Live: classifier prints one JSON sample per line
//! mood-dj run --classifier-cmd "python3 classify.py --camera 0"
//!
//! # Replay a recorded session
//! mood-dj run --scores-file session.jsonl
//!
//! # Inspect single stages
//! mood-dj detect '{"happy": 82.1, "neutral": 10.4}'
//! mood-dj params angry
//! mood-dj curate sad --limit 10
//! ```

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info, warn};
use mood_dj::cli::{Args, Command};
use mood_dj::completion;
use mood_dj::config::Settings;
use mood_dj::curator::{Curation, TrackCurator};
use mood_dj::mailbox::mailbox;
use mood_dj::mood::{EmotionScores, Mood};
use mood_dj::pipeline::{self, HaltReason, MoodPipeline};
use mood_dj::services::{FrameEmotionSource, Services};
use mood_dj::session::PlaylistSessionManager;
use mood_dj::source::{CommandSource, LinesSource};
use mood_dj::spotify::SpotifyClient;
use mood_dj::stabilizer::MoodStabilizer;
use mood_dj::{normalizer, resolver};
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Main entry point.
///
/// Loads `.env`, initializes logging and routes the parsed command.
///
/// # Logging
///
/// Controlled via `RUST_LOG`:
/// - `RUST_LOG=info mood-dj run ...` - Mood changes and playlist activity
/// - `RUST_LOG=mood_dj::stabilizer=debug mood-dj run ...` - Module-specific logging
fn main() -> Result<()> {
    if let Ok(path) = dotenvy::dotenv() {
        // logger is not up yet
        eprintln!("Loaded environment from {}", path.display());
    }
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Run {
            classifier_cmd,
            scores_file,
            provider,
        } => {
            let settings = Settings::load(args.config.as_deref())?;
            match (classifier_cmd, scores_file) {
                (Some(cmd), _) => run(CommandSource::spawn(&cmd)?, &settings, &provider.token)?,
                (None, Some(path)) => run(LinesSource::open(&path)?, &settings, &provider.token)?,
                (None, None) => bail!("Either --classifier-cmd or --scores-file is required"),
            }
        }
        Command::Detect { sample } => {
            detect(sample)?;
        }
        Command::Params { mood } => {
            let params = resolver::resolve(mood);
            println!("{}", serde_json::to_string_pretty(&params)?);
        }
        Command::Curate {
            mood,
            limit,
            provider,
        } => {
            let settings = Settings::load(args.config.as_deref())?;
            curate(mood, limit, &settings, &provider.token)?;
        }
        Command::Completion { shell } => {
            let mut cmd = Args::command();
            let shell = completion::shell_to_completion_shell(shell);
            completion::generate_completions(shell, &mut cmd);
        }
    }

    Ok(())
}

fn spotify_services(settings: &Settings, token: &str) -> Result<Services> {
    let client = Arc::new(SpotifyClient::with_base_url(
        &settings.api_base_url,
        token,
        settings.request_timeout(),
    )?);
    Ok(Services::new(client.clone(), client.clone(), client))
}

/// Drive the full pipeline until the source ends, Ctrl+C, or a permanent
/// provider error.
fn run<S>(source: S, settings: &Settings, token: &str) -> Result<()>
where
    S: FrameEmotionSource + 'static,
{
    let services = spotify_services(settings, token)?;
    let sessions = Arc::new(PlaylistSessionManager::new(services, settings.session()));
    let mut pipeline = MoodPipeline::new(MoodStabilizer::new(settings.stabilizer()), sessions);

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    let (outbox, inbox) = mailbox();
    let capture = pipeline::spawn_capture(
        source,
        outbox,
        settings.capture_interval(),
        Arc::clone(&shutdown),
    );

    let halt = pipeline.run(&inbox, &shutdown);
    // unblocks the capture thread if it is still posting
    shutdown.store(true, Ordering::SeqCst);
    drop(inbox);
    if capture.join().is_err() {
        warn!("Capture thread panicked");
    }

    let stable = pipeline.stable();
    info!("Final mood: {} (epoch {})", stable.label, stable.epoch);
    if let Some(session) = pipeline.sessions().active_session() {
        println!(
            "Last playlist: {} ({} tracks)",
            session.mood.capitalized(),
            session.tracks.len()
        );
    }

    match halt {
        HaltReason::Shutdown | HaltReason::SourceClosed => Ok(()),
        HaltReason::Rejected(error) => {
            Err(error).context(
                "Spotify rejected a playlist operation; check the access token and its scopes",
            )
        }
    }
}

fn detect(sample: Option<String>) -> Result<()> {
    let raw = match sample {
        Some(raw) => raw,
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read sample from stdin")?;
            raw
        }
    };

    let raw = raw.trim();
    let scores = if raw.is_empty() {
        debug!("Empty sample");
        None
    } else {
        Some(EmotionScores::from_json(raw).context("Invalid emotion sample")?)
    };

    println!("{}", normalizer::normalize(scores.as_ref()));
    Ok(())
}

fn curate(mood: Mood, limit: usize, settings: &Settings, token: &str) -> Result<()> {
    let client =
        SpotifyClient::with_base_url(&settings.api_base_url, token, settings.request_timeout())?;
    let params = resolver::resolve(mood);

    match TrackCurator::new(&client).curate(&params, limit) {
        Curation::Tracks(tracks) => {
            if tracks.is_empty() {
                eprintln!("No tracks found for {mood} mood");
            }
            for track in tracks {
                println!("{track}");
            }
            Ok(())
        }
        Curation::CatalogUnavailable(e) => Err(e).context("Track search failed"),
    }
}

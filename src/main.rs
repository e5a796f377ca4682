// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError};

use anyhow::{anyhow, Result};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scoreplay::config::{PlaybackSettings, ScoreFile, ScoreFileEvent, ScoreWatcher};
use scoreplay::{
    changes_channel, shared_score, PlaybackEvent, PlaybackEventsMap, PlaybackModel, ScoreChangesRange, TrackKey,
    TrackLifecycleEvent,
};

fn print_usage() {
    println!("scoreplay - Score playback event renderer");
    println!();
    println!("Usage: scoreplay [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --render <FILE>      Render a YAML score and print every track timeline");
    println!("  --watch <FILE>       Render a YAML score, then print changes as the file is edited");
    println!("  --settings <FILE>    Load playback settings from a TOML file");
    println!("  --help               Show this help message");
}

enum Mode {
    Render(PathBuf),
    Watch(PathBuf),
    Help,
}

struct Options {
    mode: Mode,
    settings: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut mode = None;
    let mut settings = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--render" | "--watch" => {
                let file = iter
                    .next()
                    .ok_or_else(|| anyhow!("{} requires a score file", arg))?;
                mode = Some(if arg == "--render" {
                    Mode::Render(PathBuf::from(file))
                } else {
                    Mode::Watch(PathBuf::from(file))
                });
            }
            "--settings" => {
                let file = iter
                    .next()
                    .ok_or_else(|| anyhow!("--settings requires a TOML file"))?;
                settings = Some(PathBuf::from(file));
            }
            "--help" | "-h" => mode = Some(Mode::Help),
            other => return Err(anyhow!("Unknown option: {}", other)),
        }
    }

    Ok(Options {
        mode: mode.unwrap_or(Mode::Help),
        settings,
    })
}

fn describe(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::Note(note) => format!(
            "note pitch={} dynamic={} expression={} duration={}us articulation={:?}",
            note.pitch_level.0, note.nominal_dynamic_level.0, note.expression_level.0, note.duration, note.articulation
        ),
        PlaybackEvent::Rest(rest) => format!("rest duration={}us", rest.duration),
        PlaybackEvent::Metronome(click) => format!(
            "click duration={}us{}",
            click.duration,
            if click.accented { " accented" } else { "" }
        ),
    }
}

fn print_slice(key: &TrackKey, slice: &PlaybackEventsMap) {
    for (timestamp, events) in slice {
        if events.is_empty() {
            println!("{:>12}  {:<24} (cleared)", timestamp, key.to_string());
        }
        for event in events {
            println!("{:>12}  {:<24} {}", timestamp, key.to_string(), describe(event));
        }
    }
}

fn print_track(model: &PlaybackModel, key: &TrackKey) {
    if let Ok(data) = model.track_playback_data(key.part_id, &key.instrument_id) {
        let slice: PlaybackEventsMap = data
            .origin_events()
            .iter()
            .map(|(timestamp, events)| (*timestamp, events.clone()))
            .collect();
        print_slice(key, &slice);
    }
}

fn load_model(path: &Path, settings: &PlaybackSettings) -> Result<(PlaybackModel, scoreplay::SharedScore, scoreplay::ChangesSender)> {
    let file = ScoreFile::load(path)?;
    let score = file.to_score()?;
    info!(title = %score.title(), parts = score.parts().len(), measures = score.measures().len(), "score loaded");

    let shared = shared_score(score);
    let (tx, rx) = changes_channel();
    let mut model = PlaybackModel::new().with_settings(settings.clone());
    model.load(Arc::clone(&shared), rx);
    Ok((model, shared, tx))
}

fn render_score(path: &Path, settings: &PlaybackSettings) -> Result<()> {
    let (model, _, _) = load_model(path, settings)?;
    for key in model.track_keys() {
        print_track(&model, &key);
    }
    Ok(())
}

async fn watch_score(path: &Path, settings: &PlaybackSettings) -> Result<()> {
    let (mut model, shared, tx) = load_model(path, settings)?;

    let mut streams: HashMap<TrackKey, broadcast::Receiver<PlaybackEventsMap>> = HashMap::new();
    for key in model.track_keys() {
        print_track(&model, &key);
        if let Ok(data) = model.track_playback_data(key.part_id, &key.instrument_id) {
            streams.insert(key, data.subscribe_main());
        }
    }
    let mut lifecycle = model.track_events();

    let watcher = ScoreWatcher::new(path, settings.watch_debounce_ms)?;
    info!(path = ?watcher.watched_path(), "watching score file (press Ctrl+C to stop)");

    // Apply reloaded scores and report them as a whole-score change
    std::thread::spawn(move || {
        while let Some(event) = watcher.recv() {
            match event {
                ScoreFileEvent::Reloaded(file) => match file.to_score() {
                    Ok(score) => {
                        let range = ScoreChangesRange::full(&score);
                        *shared.write().unwrap_or_else(PoisonError::into_inner) = score;
                        if !tx.send(range) {
                            break;
                        }
                    }
                    Err(e) => warn!("Score rejected: {:#}", e),
                },
                ScoreFileEvent::Error(message) => warn!("{}", message),
                ScoreFileEvent::Removed(path) => warn!(?path, "score file removed"),
            }
        }
    });

    loop {
        let processed = tokio::select! {
            processed = model.next_change() => processed,
            _ = tokio::signal::ctrl_c() => false,
        };
        if !processed {
            break;
        }

        loop {
            match lifecycle.try_recv() {
                Ok(TrackLifecycleEvent::Added(key)) => {
                    print_track(&model, &key);
                    if let Ok(data) = model.track_playback_data(key.part_id, &key.instrument_id) {
                        streams.insert(key, data.subscribe_main());
                    }
                }
                Ok(TrackLifecycleEvent::Removed(key)) => {
                    println!("{:>12}  {:<24} (removed)", "-", key.to_string());
                    streams.remove(&key);
                }
                Err(TryRecvError::Lagged(missed)) => warn!(missed, "track events lagged"),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        for (key, stream) in streams.iter_mut() {
            loop {
                match stream.try_recv() {
                    Ok(slice) => print_slice(key, &slice),
                    Err(TryRecvError::Lagged(missed)) => warn!(track = %key, missed, "stream lagged"),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }
        }
    }

    info!("stopped watching");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    let settings = match &options.settings {
        Some(path) => PlaybackSettings::load(path)?,
        None => PlaybackSettings::default(),
    };

    match options.mode {
        Mode::Render(path) => render_score(&path, &settings)?,
        Mode::Watch(path) => watch_score(&path, &settings).await?,
        Mode::Help => print_usage(),
    }

    Ok(())
}

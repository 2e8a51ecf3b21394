//! Sonority - Command-line host for the audio subsystem
//!
//! Inspects the sound archive and catalog of a game data directory and plays
//! single sounds through the configured backend.

mod settings;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sonority_audio::{
    AudioBackend, AudioConfig, AudioPlayer, DispatchTarget, PlayOutcome, SoundCatalog,
    SoundLoader,
};
use sonority_core::{SoundId, Vec3};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use settings::Settings;

/// Catalog tables under `<data_dir>/sounds`, oldest format first.
const LEGACY_TABLE: &str = "sounds.dat";
const EXTENDED_TABLE: &str = "sounds2.dat";
const REVISION_TABLE: &str = "sounds3.dat";

/// Upper bound on waiting for a sound to finish.
const PLAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Sonority - inspect and play game sound data
#[derive(Parser)]
#[command(name = "sonority")]
#[command(about = "Inspect and play sounds from a game data directory")]
#[command(version)]
struct Args {
    /// Game data root (defaults to the configured one)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Remember --data-dir in the settings file
    #[arg(long, requires = "data_dir")]
    save: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the records of the sound archive
    List,

    /// Dump the sound catalog
    Catalog,

    /// Play one sound and wait for it to finish
    Play {
        /// Catalog sound id
        sound: u32,

        /// Legacy originator: 0 generic, -1..-5 channels, or a packed object
        #[arg(allow_negative_numbers = true)]
        pid: Option<i32>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let args = Args::parse();

    let mut settings = Settings::load();
    if let Some(dir) = args.data_dir {
        settings.audio = settings.audio.with_data_dir(dir);
        if args.save {
            settings.save()?;
        }
    }
    let config = settings.audio;
    info!("Using data directory {:?}", config.data_dir);

    match args.command {
        Command::List => list_archive(&config),
        Command::Catalog => dump_catalog(&config),
        Command::Play { sound, pid } => play(config, SoundId(sound), pid.unwrap_or(0)),
    }
}

fn list_archive(config: &AudioConfig) -> Result<()> {
    let loader = SoundLoader::open(config.archive_path())?;
    for (ordinal, (name, record)) in loader.index().iter().enumerate() {
        println!(
            "{:5} {:40} offset={:<10} size={:<8} {}",
            ordinal,
            name,
            record.offset,
            record.decompressed_size,
            if record.is_raw() { "raw" } else { "zlib" },
        );
    }
    println!("{} records", loader.index().len());
    Ok(())
}

fn read_table(dir: &Path, name: &str) -> Result<Option<Vec<u8>>> {
    let path = dir.join(name);
    if !path.is_file() {
        return Ok(None);
    }
    let data = fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
    Ok(Some(data))
}

fn load_catalog(config: &AudioConfig) -> Result<SoundCatalog> {
    let dir = config.data_dir.join("sounds");
    let legacy = read_table(&dir, LEGACY_TABLE)?;
    let extended = read_table(&dir, EXTENDED_TABLE)?;
    let revision = read_table(&dir, REVISION_TABLE)?;
    if legacy.is_none() && extended.is_none() && revision.is_none() {
        bail!("No sound tables found in {:?}", dir);
    }

    let catalog = SoundCatalog::from_game_tables(
        legacy.as_deref(),
        extended.as_deref(),
        revision.as_deref(),
    )?;
    Ok(catalog)
}

fn dump_catalog(config: &AudioConfig) -> Result<()> {
    let catalog = load_catalog(config)?;
    for entry in catalog.iter() {
        println!(
            "{:5} {:32} {:?} {:?}",
            entry.id, entry.name, entry.category, entry.flags
        );
    }
    println!("{} sounds", catalog.len());
    Ok(())
}

fn play(config: AudioConfig, sound: SoundId, pid: i32) -> Result<()> {
    let catalog = load_catalog(&config)?;

    #[cfg(feature = "kira_backend")]
    {
        let backend = sonority_audio::KiraBackend::new()?;
        let mut player = AudioPlayer::new(backend, config, catalog)?;
        dispatch_one(&mut player, sound, pid)?;
        player.drain(PLAY_TIMEOUT)?;
    }

    #[cfg(not(feature = "kira_backend"))]
    {
        let backend = sonority_audio::HeadlessBackend::new();
        let mut player = AudioPlayer::new(backend, config, catalog)?;
        dispatch_one(&mut player, sound, pid)?;
        for voice in player.backend().voices() {
            println!(
                "{} bytes, gain {:.2}, looping={} positional={}",
                voice.source_len, voice.gain, voice.looping, voice.positional
            );
        }
        // Headless samples never finish on their own.
        player.stop_sounds();
        player.drain(PLAY_TIMEOUT)?;
    }

    Ok(())
}

fn dispatch_one<B: AudioBackend>(player: &mut AudioPlayer<B>, sound: SoundId, pid: i32) -> Result<()> {
    let target = DispatchTarget::from_raw_pid(pid);

    // Objects from the command line stand at the listener's position.
    let mut world = HashMap::new();
    if let DispatchTarget::Object(object) = target {
        world.insert(object, Vec3::ZERO);
    }

    match player.play_sound(sound, target, &world) {
        PlayOutcome::Played => {
            info!("Sound {} dispatched as {:?}", sound, target);
            Ok(())
        }
        PlayOutcome::Skipped => {
            warn!("Sound {} skipped: sound is disabled or muted", sound);
            Ok(())
        }
        PlayOutcome::Failed => bail!("Sound {} could not be played", sound),
    }
}

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

use crate::catalog::{CatalogEntry, PAGE_COUNT};
use crate::config;
use crate::domain::slot::{LETTERS, SlotCode};
use crate::jukebox::Jukebox;
use crate::playback::MpvOutput;
use crate::storage::{RecordStore, SlotStore};

mod session;

#[derive(Parser)]
#[command(name = "rolodex")]
#[command(version = "0.1")]
#[command(about = "Rotary card-file jukebox for local audio files")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "rolodex.toml")]
    pub config: PathBuf,

    /// More log output, repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assign an audio file to a slot
    Assign {
        slot: SlotCode,
        file: PathBuf,
        /// Title shown on the card, derived from the file name when omitted
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Change the title of an assigned slot
    Retitle { slot: SlotCode, title: String },
    /// Remove the file assigned to a slot
    Clear { slot: SlotCode },
    /// Remove every assignment
    ClearAll,
    /// Fill slots A1, A2, ... with the given files in order
    Autofill {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show the rolodex cards
    Pages {
        /// Only this page (0-7)
        #[arg(short, long)]
        page: Option<usize>,
    },
    /// Show which slots hold files
    Status,
    /// Open an interactive jukebox session, queueing the given slots
    Play { slots: Vec<SlotCode> },
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

pub(crate) fn print_page(page: usize, entries: &[CatalogEntry]) {
    println!("Page {} ({}):", page, LETTERS[page]);
    for entry in entries {
        let marker = if entry.has_file { "♪" } else { " " };
        println!("  {marker} {}  {}", entry.slot, entry.display_title);
    }
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let cfg = config::Config::load(&cli.config.to_string_lossy())?;
    let store = SlotStore::new(&cfg.database).with_context(|| {
        format!(
            "Failed to open slot database {}",
            cfg.database.file_path().to_string_lossy()
        )
    })?;
    let output = MpvOutput::new(cfg.player.clone());
    let mut jukebox = Jukebox::new(store, output, cfg.player.release_grace())?;

    match cli.command {
        Commands::Assign { slot, file, title } => {
            let record = jukebox
                .assign_file(slot, &file, title.as_deref())
                .with_context(|| format!("Failed to assign {}", file.to_string_lossy()))?;
            println!("{slot}: {} ({})", record.display_title(), record.file_name);
        }

        Commands::Retitle { slot, title } => {
            if jukebox.set_title(slot, &title)? {
                println!("{slot}: {}", jukebox.catalog().entry(slot).display_title);
            } else {
                println!("{slot} has no file assigned");
            }
        }

        Commands::Clear { slot } => {
            if jukebox.clear_slot(slot)? {
                println!("{slot} cleared");
            } else {
                println!("{slot} was already empty");
            }
        }

        Commands::ClearAll => {
            let removed = jukebox.clear_all()?;
            println!("Cleared {removed} slot(s)");
        }

        Commands::Autofill { files } => {
            let filled = jukebox.autofill(&files)?;
            println!("Filled {} slot(s):", filled.len());
            for slot in filled {
                println!("    - {slot}: {}", jukebox.catalog().entry(slot).display_title);
            }
        }

        Commands::Pages { page } => match page {
            Some(page) => {
                let entries = jukebox
                    .page_view(page)
                    .with_context(|| format!("Page {page} does not exist (0-{})", PAGE_COUNT - 1))?;
                print_page(page, entries);
            }
            None => {
                for page in 0..PAGE_COUNT {
                    if let Some(entries) = jukebox.page_view(page) {
                        print_page(page, entries);
                    }
                }
            }
        },

        Commands::Status => {
            let records = jukebox.store_mut().get_all()?;
            println!(
                "{} of 64 slots hold files (database: {})",
                records.len(),
                if cfg.database.in_memory {
                    "in memory".to_string()
                } else {
                    cfg.database.file_path().to_string_lossy().into_owned()
                }
            );
            for record in &records {
                println!(
                    "    - {}: {} [{}, {}, {} bytes]",
                    record.slot,
                    record.display_title(),
                    record.file_name,
                    record.mime,
                    record.audio.len()
                );
            }
        }

        Commands::Play { slots } => {
            session::run(&mut jukebox, &slots)?;
        }
    }

    Ok(())
}

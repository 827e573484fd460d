use crate::cli::run;

mod catalog;
pub mod cli;
mod config;
pub mod domain;
mod jukebox;
pub mod playback;
pub mod storage;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

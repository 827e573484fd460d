//! Interactive jukebox session on the terminal.
//!
//! Stdin is read on its own thread; the main loop owns the jukebox and
//! wakes up regularly to pick up player events and release audio handles.

use std::{
    io::{BufRead, Write},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use crate::{
    cli::print_page,
    domain::{Direction, slot::SlotCode},
    jukebox::Jukebox,
    playback::{AudioOutput, QueueEngine},
    storage::RecordStore,
};

const TICK: Duration = Duration::from_millis(200);

const HELP: &str = "\
commands:
  <slot>        queue a slot, e.g. b3
  <letter>      select a row key A-H, then
  <digit>       press a number key 1-8
  next | n      skip forward          prev | p     skip back
  play          play / resume         pause        pause
  stop          stop and rewind
  > | <         browse the up next preview
  ] | [         flip the rolodex      page         show the open page
  queue         list the play queue
  status | s    now playing and up next
  quit | q      leave";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Select(SlotCode),
    Letter(char),
    Number(u8),
    Advance(Direction),
    Browse(Direction),
    Flip(Direction),
    Play,
    Pause,
    Stop,
    ShowPage,
    ShowQueue,
    Status,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Option<SessionCommand> {
    let input = line.trim().to_lowercase();
    let command = match input.as_str() {
        "next" | "n" => SessionCommand::Advance(Direction::Next),
        "prev" | "p" => SessionCommand::Advance(Direction::Prev),
        ">" | "browse-next" => SessionCommand::Browse(Direction::Next),
        "<" | "browse-prev" => SessionCommand::Browse(Direction::Prev),
        "]" | "page-next" => SessionCommand::Flip(Direction::Next),
        "[" | "page-prev" => SessionCommand::Flip(Direction::Prev),
        "play" => SessionCommand::Play,
        "pause" => SessionCommand::Pause,
        "stop" => SessionCommand::Stop,
        "page" => SessionCommand::ShowPage,
        "queue" | "list" => SessionCommand::ShowQueue,
        "status" | "s" => SessionCommand::Status,
        "help" | "?" => SessionCommand::Help,
        "quit" | "q" | "exit" => SessionCommand::Quit,
        other => {
            if let Ok(slot) = other.parse::<SlotCode>() {
                return Some(SessionCommand::Select(slot));
            }
            let mut chars = other.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_digit() => {
                    Some(SessionCommand::Number(c.to_digit(10)? as u8))
                }
                (Some(c), None) if c.is_ascii_alphabetic() => Some(SessionCommand::Letter(c)),
                _ => None,
            };
        }
    };
    Some(command)
}

fn print_status<S: RecordStore, O: AudioOutput>(jukebox: &Jukebox<S, O>) {
    println!(
        "Now playing: {}   |   Up next: {}",
        jukebox.now_playing_title(),
        jukebox.up_next_title()
    );
}

fn print_queue(queue: &QueueEngine) {
    if queue.is_empty() {
        println!("Queue is empty");
        return;
    }
    for (index, entry) in queue.entries().iter().enumerate() {
        let marker = if queue.cursor() == Some(index) {
            "▶"
        } else if queue.browse_cursor() == Some(index) {
            "·"
        } else {
            " "
        };
        println!("  {marker} {:>2}. {}  {}", index + 1, entry.slot, entry.display_text());
    }
}

fn prompt() {
    print!("> ");
    if let Err(e) = std::io::stdout().flush() {
        log::debug!("could not flush prompt: {e}");
    }
}

/// Applies one command. Returns false when the session should end.
fn execute<S: RecordStore, O: AudioOutput>(
    jukebox: &mut Jukebox<S, O>,
    command: SessionCommand,
) -> anyhow::Result<bool> {
    match command {
        SessionCommand::Select(slot) => jukebox.select_slot(slot)?,
        SessionCommand::Letter(letter) => {
            if !jukebox.press_letter(letter) {
                println!("no row {}", letter.to_ascii_uppercase());
            }
        }
        SessionCommand::Number(number) => {
            if jukebox.selected_letter().is_none() {
                println!("pick a letter A-H first");
            } else {
                jukebox.press_number(number)?;
            }
        }
        SessionCommand::Advance(direction) => jukebox.advance(direction)?,
        SessionCommand::Browse(direction) => {
            println!("Up next: {}", jukebox.browse(direction));
            return Ok(true);
        }
        SessionCommand::Flip(direction) => {
            let page = jukebox.flip_page(direction);
            print_page(page, jukebox.catalog().current_page());
            return Ok(true);
        }
        SessionCommand::Play => jukebox.play()?,
        SessionCommand::Pause => jukebox.pause(),
        SessionCommand::Stop => jukebox.stop(),
        SessionCommand::ShowPage => {
            let catalog = jukebox.catalog();
            print_page(catalog.page_index(), catalog.current_page());
            return Ok(true);
        }
        SessionCommand::ShowQueue => {
            print_queue(jukebox.queue());
            return Ok(true);
        }
        SessionCommand::Status => {}
        SessionCommand::Help => {
            println!("{HELP}");
            return Ok(true);
        }
        SessionCommand::Quit => return Ok(false),
    }
    print_status(jukebox);
    Ok(true)
}

pub fn run<S: RecordStore, O: AudioOutput>(
    jukebox: &mut Jukebox<S, O>,
    initial: &[SlotCode],
) -> anyhow::Result<()> {
    for slot in initial {
        if let Err(e) = jukebox.select_slot(*slot) {
            println!("error: {e}");
        }
    }

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    println!("Rolodex jukebox, type 'help' for commands");
    print_status(jukebox);
    prompt();

    let mut shown = (jukebox.now_playing_title(), jukebox.up_next_title());
    loop {
        match rx.recv_timeout(TICK) {
            Ok(line) => {
                if line.trim().is_empty() {
                    prompt();
                    continue;
                }
                match parse_command(&line) {
                    Some(command) => match execute(jukebox, command) {
                        Ok(true) => {}
                        Ok(false) => break,
                        // a failed command never ends the session
                        Err(e) => println!("error: {e:#}"),
                    },
                    None => println!("unknown command '{}', try 'help'", line.trim()),
                }
                shown = (jukebox.now_playing_title(), jukebox.up_next_title());
                prompt();
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if let Err(e) = jukebox.tick(Instant::now()) {
            println!("error: {e}");
        }

        // player events can change the display between commands
        let current = (jukebox.now_playing_title(), jukebox.up_next_title());
        if current != shown {
            println!();
            print_status(jukebox);
            prompt();
            shown = current;
        }
    }

    jukebox.stop();
    Ok(())
}

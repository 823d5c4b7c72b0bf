use anyhow::{Context, Result};
use crossterm::style::Stylize;
use sketchloop::api::ApiClient;
use sketchloop::config::Config;
use sketchloop::playground::{Playground, PlaygroundUpdate, SendOutcome, UpdateReceiver};
use sketchloop::sandbox::ProcessFrame;
use sketchloop::state::{Phase, Role, Turn};
use std::collections::HashMap;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const HELP: &str = "/code  /edit <path>  /reload  /play  /stop  /reset  /improve  /quit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Send(String),
    Code,
    Edit(String),
    Reload,
    Play,
    Stop,
    Reset,
    Improve,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Send(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let command = match (name, arg) {
        ("code", "") => Command::Code,
        ("edit", path) if !path.is_empty() => Command::Edit(path.to_string()),
        ("reload", "") => Command::Reload,
        ("play", "") => Command::Play,
        ("stop", "") => Command::Stop,
        ("reset", "") => Command::Reset,
        ("improve", "") => Command::Improve,
        ("help", "") => Command::Help,
        ("quit" | "exit", "") => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(command)
}

fn log_filter() -> tracing_subscriber::EnvFilter {
    let level = if let Ok(v) = std::env::var("RUST_LOG") {
        v
    } else if let Ok(v) = std::env::var("SKETCH_LOG_LEVEL") {
        match v.as_str() {
            "silent" => "off".to_string(),
            other => other.to_string(),
        }
    } else {
        "warn".to_string()
    };

    tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

/// Turns playground updates into terminal text. Streamed regions are printed
/// as suffixes of what is already on screen.
#[derive(Default)]
struct Printer {
    bodies: HashMap<usize, String>,
    thinking: HashMap<usize, String>,
}

impl Printer {
    fn render(&mut self, update: PlaygroundUpdate) -> String {
        match update {
            PlaygroundUpdate::PhaseChanged(Phase::Idle) => "\n".to_string(),
            PlaygroundUpdate::PhaseChanged(phase) => {
                format!("\n{}\n", format!("[{}]", phase.label()).dark_yellow())
            }
            PlaygroundUpdate::TurnAppended(turn) => {
                self.bodies.insert(turn.id, turn.body.clone());
                render_turn(&turn)
            }
            PlaygroundUpdate::ThinkingChanged { id, thinking } => {
                let previous = self.thinking.insert(id, thinking.clone()).unwrap_or_default();
                streamed_suffix(&previous, &thinking).dark_grey().to_string()
            }
            PlaygroundUpdate::BodyChanged { id, body } => {
                let previous = self.bodies.insert(id, body.clone()).unwrap_or_default();
                streamed_suffix(&previous, &body)
            }
            PlaygroundUpdate::ThinkingCollapsed { .. } | PlaygroundUpdate::ImproveConsumed { .. } => {
                String::new()
            }
            PlaygroundUpdate::TurnsCleared => {
                self.bodies.clear();
                self.thinking.clear();
                format!("{}\n", "-- playground reset --".dark_grey())
            }
            PlaygroundUpdate::CodeChanged(code) => format!(
                "{}\n",
                format!("code updated ({} lines)", code.lines().count()).dark_cyan()
            ),
            PlaygroundUpdate::RunningChanged(true) => format!("{}\n", "sketch running".green()),
            PlaygroundUpdate::RunningChanged(false) => format!("{}\n", "sketch stopped".yellow()),
            PlaygroundUpdate::ScrollToEnd => String::new(),
        }
    }
}

fn render_turn(turn: &Turn) -> String {
    let tag = match turn.role {
        Role::User => "you>".bold().cyan(),
        Role::Assistant => "sketch>".bold().magenta(),
        Role::System => "info>".bold().dark_grey(),
        Role::SystemAsk => "runtime error>".bold().yellow(),
        Role::Error => "error>".bold().red(),
    };
    let mut text = format!("{tag} {}", turn.body);
    if turn.role == Role::SystemAsk {
        text.push_str(&format!(" {}", "(/improve asks for a fix)".dark_grey()));
    }
    text.push('\n');
    text
}

/// Text to append so the screen shows `current` after showing `previous`.
fn streamed_suffix(previous: &str, current: &str) -> String {
    match current.strip_prefix(previous) {
        Some(suffix) => suffix.to_string(),
        None => format!("\n{current}"),
    }
}

async fn print_updates(mut updates: UpdateReceiver) {
    let mut printer = Printer::default();
    let mut stdout = std::io::stdout();
    while let Some(update) = updates.recv().await {
        let text = printer.render(update);
        if text.is_empty() {
            continue;
        }
        let _ = write!(stdout, "{text}");
        let _ = stdout.flush();
    }
}

async fn run_command(playground: &mut Playground, command: Command) -> Result<bool> {
    match command {
        Command::Send(text) => {
            if playground.send(&text, Role::User).await == SendOutcome::Rejected {
                println!("{}", "still generating, wait for the reply".yellow());
            }
        }
        Command::Code => println!("{}", playground.code()),
        Command::Edit(path) => {
            let code = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {path}"))?;
            if !playground.edit_code(&code) {
                println!("{}", "code is locked while generating".yellow());
            } else {
                println!("{}", "code edited; /reload or /play to run it".dark_grey());
            }
        }
        Command::Reload => playground.reload(),
        Command::Play => playground.play(),
        Command::Stop => playground.stop(),
        Command::Reset => playground.reset(),
        Command::Improve => match playground.pending_improve() {
            Some(id) => {
                playground.improve(id).await;
            }
            None => println!("{}", "no runtime error to improve".dark_grey()),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
        Command::Unknown(line) => println!("{} {line}\n{HELP}", "unknown command:".red()),
    }
    Ok(true)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    config.validate()?;

    let client = ApiClient::new(&config)?;
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
    let frame = ProcessFrame::new(config.preview_path.clone(), config.runner.as_deref(), frame_tx)?;
    let preview_path = frame.preview_path().to_path_buf();

    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_updates(update_rx));
    let mut playground = Playground::new(client, Box::new(frame), Some(update_tx));

    println!(
        "{} {}",
        "preview:".dark_grey(),
        preview_path.display().to_string().underlined()
    );
    println!("{} {}", "try:".dark_grey(), playground.suggestion().italic());
    println!("{}", HELP.dark_grey());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(command) = parse_command(&line) else { continue };
                match run_command(&mut playground, command).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(error) => eprintln!("{} {error:#}", "error:".red()),
                }
            }
            Some(raw) = frame_rx.recv() => playground.on_frame_message(&raw),
        }
    }

    drop(playground);
    let _ = printer.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_sent() {
        assert_eq!(
            parse_command("  draw a red circle "),
            Some(Command::Send("draw a red circle".to_string()))
        );
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn slash_commands_parse() {
        assert_eq!(parse_command("/play"), Some(Command::Play));
        assert_eq!(
            parse_command("/edit sketch.js"),
            Some(Command::Edit("sketch.js".to_string()))
        );
        assert_eq!(
            parse_command("/edit"),
            Some(Command::Unknown("/edit".to_string()))
        );
        assert_eq!(
            parse_command("/play now"),
            Some(Command::Unknown("/play now".to_string()))
        );
        assert_eq!(parse_command("/exit"), Some(Command::Quit));
    }

    #[test]
    fn streamed_body_prints_only_new_text() {
        assert_eq!(streamed_suffix("Here ", "Here is"), "is");
        assert_eq!(streamed_suffix("```javascript\nx", "Done."), "\nDone.");
    }

    #[test]
    fn printer_tracks_bodies_per_turn() {
        let mut printer = Printer::default();
        printer.bodies.insert(3, "⏳ Preparing...".to_string());
        assert_eq!(
            printer.render(PlaygroundUpdate::BodyChanged {
                id: 3,
                body: "A red".to_string()
            }),
            "\nA red"
        );
        assert_eq!(
            printer.render(PlaygroundUpdate::BodyChanged {
                id: 3,
                body: "A red circle.".to_string()
            }),
            " circle."
        );
        assert!(printer.render(PlaygroundUpdate::ScrollToEnd).is_empty());
    }
}

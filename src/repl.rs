//! Line-oriented client front end
//!
//! Reads commands from stdin, turns them into gestures for the [`Session`],
//! and applies whatever the server sends back between commands. Questions
//! that need an answer are asked on the same input stream through
//! [`LinePrompter`].

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use floorplan_core::ClientMsg;
use floorplan_geometry::Scale;
use floorplan_session::{
    format_meters, parse_meters, BoxForm, Gesture, PromptOutcome, Prompter, ProposalSink, Session,
};
use floorplan_sync::{SyncCommand, SyncEvent, SyncHandle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

/// How often the network thread's events are drained while idle
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Typed in answer to a question to back out of it
const CANCEL: &str = "!";

pub const HELP: &str = "\
Commands:
  areas                              list areas
  boxes                              list boxes
  add-area                           create an area (asks for a name)
  modify-area NAME                   resize an area (asks for meters)
  delete-area NAME                   delete an area (asks to confirm)
  add-box NAME W H COLOR [circle]    create a box, sizes in meters
  move NAME X Y                      drop a box at canvas pixels
  rotate NAME                        set rotation (asks for degrees)
  comment NAME                       set the comment (asks for text)
  lock NAME                          toggle the lock
  duplicate NAME                     copy a box (asks for a name)
  delete-box NAME                    delete a box
  help                               show this text
  quit                               leave
Quote names that contain spaces. Answer a question with ! to cancel it.";

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Areas,
    Boxes,
    AddArea,
    ModifyArea(String),
    DeleteArea(String),
    AddBox(BoxForm),
    Move { name: String, x: f64, y: f64 },
    Rotate(String),
    Comment(String),
    Lock(String),
    Duplicate(String),
    DeleteBox(String),
    Help,
    Quit,
}

/// What the front end should do after a command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Say(String),
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let tokens = tokenize(line)?;
    let Some((head, rest)) = tokens.split_first() else {
        return Ok(None);
    };

    let cmd = match (head.as_str(), rest) {
        ("areas", []) => Command::Areas,
        ("boxes", []) => Command::Boxes,
        ("add-area", []) => Command::AddArea,
        ("modify-area", [name]) => Command::ModifyArea(name.clone()),
        ("delete-area", [name]) => Command::DeleteArea(name.clone()),
        ("add-box", [name, width, height, color]) => {
            Command::AddBox(box_form(name, width, height, color, false)?)
        }
        ("add-box", [name, width, height, color, shape]) if shape == "circle" => {
            Command::AddBox(box_form(name, width, height, color, true)?)
        }
        ("move", [name, x, y]) => Command::Move {
            name: name.clone(),
            x: coordinate(x)?,
            y: coordinate(y)?,
        },
        ("rotate", [name]) => Command::Rotate(name.clone()),
        ("comment", [name]) => Command::Comment(name.clone()),
        ("lock", [name]) => Command::Lock(name.clone()),
        ("duplicate", [name]) => Command::Duplicate(name.clone()),
        ("delete-box", [name]) => Command::DeleteBox(name.clone()),
        ("help", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        (
            "areas" | "boxes" | "add-area" | "modify-area" | "delete-area" | "add-box" | "move"
            | "rotate" | "comment" | "lock" | "duplicate" | "delete-box" | "help" | "quit",
            _,
        ) => return Err(format!("wrong arguments for `{head}`, try `help`")),
        (other, _) => return Err(format!("unknown command `{other}`, try `help`")),
    };
    Ok(Some(cmd))
}

fn box_form(
    name: &str,
    width: &str,
    height: &str,
    color: &str,
    is_circle: bool,
) -> Result<BoxForm, String> {
    Ok(BoxForm {
        name: name.to_string(),
        width_m: parse_meters(width).map_err(|e| e.to_string())?,
        height_m: parse_meters(height).map_err(|e| e.to_string())?,
        color: color.to_string(),
        is_circle,
    })
}

fn coordinate(text: &str) -> Result<f64, String> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("`{text}` is not a coordinate"))
}

/// Split on whitespace, keeping double-quoted runs together
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if started {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Run one command against the session
pub async fn execute<S: ProposalSink>(
    session: &mut Session<S>,
    prompter: &mut dyn Prompter,
    cmd: Command,
) -> Reply {
    let sent = match cmd {
        Command::Areas => return Reply::Say(render_areas(session)),
        Command::Boxes => return Reply::Say(render_boxes(session)),
        Command::Help => return Reply::Say(HELP.to_string()),
        Command::Quit => return Reply::Quit,
        Command::AddArea => session.prompt_create_area(prompter).await,
        Command::ModifyArea(name) => session.prompt_modify_area(prompter, &name).await,
        Command::DeleteArea(name) => session.prompt_delete_area(prompter, &name).await,
        Command::Rotate(name) => session.prompt_rotate_box(prompter, &name).await,
        Command::Comment(name) => session.prompt_comment_box(prompter, &name).await,
        Command::Duplicate(name) => session.prompt_duplicate_box(prompter, &name).await,
        Command::AddBox(form) => session.handle(Gesture::CreateBox(form)).map(Some),
        Command::Move { name, x, y } => session.handle(Gesture::DragBox { name, x, y }).map(Some),
        Command::Lock(name) => session.handle(Gesture::ToggleLock { name }).map(Some),
        Command::DeleteBox(name) => session.handle(Gesture::DeleteBox { name }).map(Some),
    };

    Reply::Say(match sent {
        Ok(Some(msg)) => format!("sent {} for {}", msg.event_name(), msg.target()),
        Ok(None) => "cancelled".to_string(),
        Err(e) => format!("error: {e}"),
    })
}

pub fn render_areas<S: ProposalSink>(session: &Session<S>) -> String {
    let scale = session.scale();
    let areas = session.store().areas();
    if areas.is_empty() {
        return "no areas".to_string();
    }
    areas
        .iter()
        .map(|a| {
            format!(
                "{}  {} x {} m  at ({}, {})",
                a.name,
                format_meters(scale.to_meters(a.width)),
                format_meters(scale.to_meters(a.height)),
                a.x,
                a.y
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_boxes<S: ProposalSink>(session: &Session<S>) -> String {
    let scale = session.scale();
    let store = session.store();
    if store.boxes().is_empty() {
        return "no boxes".to_string();
    }
    store
        .boxes()
        .iter()
        .map(|b| {
            let mut line = format!(
                "{}  {} x {} m  at ({}, {})  {} deg  {}",
                b.name,
                format_meters(scale.to_meters(b.width)),
                format_meters(scale.to_meters(b.height)),
                b.x,
                b.y,
                b.rotation,
                b.color
            );
            if b.is_circle {
                line.push_str("  circle");
            }
            if store.effective_lock(&b.name) {
                line.push_str("  locked");
            }
            if b.has_comment() {
                line.push_str(&format!("  \"{}\"", b.comment));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Asks questions on stdout and reads answers from a shared line reader
pub struct LinePrompter<'a, R> {
    lines: &'a mut Lines<R>,
}

impl<'a, R: AsyncBufRead + Unpin + Send> LinePrompter<'a, R> {
    pub fn new(lines: &'a mut Lines<R>) -> Self {
        Self { lines }
    }

    /// `None` when input ended or failed
    async fn read_answer(&mut self, question: &str) -> Option<String> {
        print!("{question} ");
        let _ = std::io::stdout().flush();
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read answer");
                None
            }
        }
    }
}

#[async_trait]
impl<'a, R: AsyncBufRead + Unpin + Send> Prompter for LinePrompter<'a, R> {
    async fn ask(&mut self, question: &str, default: Option<&str>) -> PromptOutcome<String> {
        let question = match default {
            Some(d) => format!("{question} [{d}]"),
            None => question.to_string(),
        };
        let Some(answer) = self.read_answer(&question).await else {
            return PromptOutcome::Cancelled;
        };
        match (answer.trim(), default) {
            (CANCEL, _) => PromptOutcome::Cancelled,
            ("", Some(d)) => PromptOutcome::Value(d.to_string()),
            (text, _) => PromptOutcome::Value(text.to_string()),
        }
    }

    async fn confirm(&mut self, question: &str) -> bool {
        self.read_answer(&format!("{question} [y/N]"))
            .await
            .is_some_and(|a| matches!(a.trim(), "y" | "Y" | "yes"))
    }
}

/// Sends proposals through the network thread
pub struct Outbox(SyncHandle);

impl ProposalSink for Outbox {
    fn send(&mut self, msg: ClientMsg) -> Result<()> {
        self.0.propose(msg)
    }
}

/// Drive an interactive session until the user quits or the server goes away
pub async fn run(handle: SyncHandle, scale: Scale) -> Result<()> {
    let mut session = Session::new(scale, Outbox(handle));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(EVENT_POLL_INTERVAL);
    println!("{HELP}");

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if !drain_events(&mut session) {
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let cmd = match parse_command(&line) {
                    Ok(Some(cmd)) => cmd,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                let mut prompter = LinePrompter::new(&mut lines);
                match execute(&mut session, &mut prompter, cmd).await {
                    Reply::Say(text) => println!("{text}"),
                    Reply::Quit => break,
                }
            }
        }
    }

    let Outbox(handle) = session.disconnect();
    // The thread may already be gone
    let _ = handle.send_command(SyncCommand::Shutdown);
    Ok(())
}

/// Apply everything the network thread has queued. `false` once the
/// connection is over.
fn drain_events(session: &mut Session<Outbox>) -> bool {
    while let Some(event) = session.sink().0.poll_event() {
        match event {
            SyncEvent::Connected { server } => println!("connected to {server}"),
            SyncEvent::Inbound(msg) => {
                let change = session.receive(msg);
                tracing::debug!(?change, "store updated");
            }
            SyncEvent::Disconnected => {
                println!("server went away");
                return false;
            }
            SyncEvent::Error(e) => {
                tracing::error!(error = %e, "connection failed");
                return false;
            }
        }
    }
    true
}

//! JSON-lines backend
//!
//! The device bridge, the application registry and the frame host sit on the
//! other end of stdin/stdout. A reader thread timestamps each line and hands
//! it to the calloop loop over a channel; the loop sleeps until the next
//! shell timer or command.
//!
//! Frame operations are written to stdout, one JSON object per line:
//!
//! ```text
//! {"generation":3,"op":"load","url":"http://127.0.0.1:3000/apps/music/"}
//! {"generation":3,"op":"post","message":{"kind":"ZoneFocus","active":true}}
//! {"generation":3,"op":"clear"}
//! {"generation":3,"op":"blank"}
//! ```

use std::cell::RefCell;
use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use anyhow::Result;
use calloop::channel::{self, Channel, Sender};
use calloop::EventLoop;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ShellConfig;
use crate::error::FrameError;
use crate::host::bridge::OutboundMessage;
use crate::host::{AppFrame, FrameFactory};
use crate::input::RawInput;
use crate::shell::apps::{LauncherEntry, LauncherState};
use crate::shell::Shell;

/// One line of stdin
#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum BackendCommand {
    /// Raw input from the device bridge or a simulator
    Input { input: RawInput },
    /// Message posted by the embedded application of session `generation`
    App {
        generation: u64,
        origin: String,
        message: serde_json::Value,
    },
    /// Frame host lifecycle notification
    Frame { generation: u64, status: FrameStatus },
    /// Application registry update
    Registry { entries: Vec<LauncherEntry> },
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStatus {
    Loaded,
    Failed,
    /// The frame crashed or was unloaded by the host
    Gone,
}

#[derive(Serialize)]
struct FrameOp<'a> {
    generation: u64,
    #[serde(flatten)]
    op: Op<'a>,
}

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Op<'a> {
    Load { url: &'a str },
    Post { message: &'a OutboundMessage },
    Clear,
    Blank,
}

fn write_op(generation: u64, op: Op<'_>) -> Result<(), FrameError> {
    let line = serde_json::to_string(&FrameOp { generation, op })
        .map_err(|e| FrameError::Post(e.to_string()))?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line)
        .and_then(|_| stdout.flush())
        .map_err(|e| FrameError::Post(e.to_string()))
}

/// A frame living in the external frame host
struct StdioFrame {
    generation: u64,
    gone: Rc<RefCell<HashSet<u64>>>,
}

impl AppFrame for StdioFrame {
    fn load(&mut self, url: &str) -> Result<(), FrameError> {
        write_op(self.generation, Op::Load { url })
    }

    fn post(&mut self, message: &OutboundMessage) -> Result<(), FrameError> {
        write_op(self.generation, Op::Post { message })
    }

    fn clear_document(&mut self) -> Result<(), FrameError> {
        if !self.is_alive() {
            return Err(FrameError::Gone);
        }
        write_op(self.generation, Op::Clear)
    }

    fn navigate_blank(&mut self) {
        if let Err(e) = write_op(self.generation, Op::Blank) {
            debug!(generation = self.generation, %e, "Failed to blank frame");
        }
        self.gone.borrow_mut().remove(&self.generation);
    }

    fn is_alive(&self) -> bool {
        !self.gone.borrow().contains(&self.generation)
    }
}

#[derive(Clone, Default)]
pub struct StdioFrames {
    gone: Rc<RefCell<HashSet<u64>>>,
}

impl StdioFrames {
    pub fn mark_gone(&self, generation: u64) {
        self.gone.borrow_mut().insert(generation);
    }
}

impl FrameFactory for StdioFrames {
    fn create(&mut self, _app_id: &str, generation: u64) -> Box<dyn AppFrame> {
        Box::new(StdioFrame {
            generation,
            gone: self.gone.clone(),
        })
    }
}

/// Event loop state
pub struct Runtime {
    pub shell: Shell,
    frames: StdioFrames,
    running: bool,
}

impl Runtime {
    pub fn new(config: ShellConfig, state_path: Option<PathBuf>) -> Self {
        let launcher_state = state_path
            .as_deref()
            .map(LauncherState::load)
            .unwrap_or_default();
        let frames = StdioFrames::default();
        let shell = Shell::new(config, Box::new(frames.clone()), launcher_state, state_path);
        Self {
            shell,
            frames,
            running: true,
        }
    }

    pub fn apply(&mut self, at: Instant, command: BackendCommand) {
        match command {
            BackendCommand::Input { input } => self.shell.handle_raw(&input, at),
            BackendCommand::App {
                generation,
                origin,
                message,
            } => self
                .shell
                .handle_app_message(generation, &message.to_string(), &origin),
            BackendCommand::Frame { generation, status } => match status {
                FrameStatus::Loaded => self.shell.frame_loaded(generation),
                FrameStatus::Failed => self.shell.frame_failed(generation),
                FrameStatus::Gone => {
                    warn!(generation, "Frame host reports frame gone");
                    self.frames.mark_gone(generation);
                }
            },
            BackendCommand::Registry { entries } => self.shell.set_entries(&entries),
            BackendCommand::Quit => {
                info!("Quit requested");
                self.running = false;
            }
        }
    }
}

/// A command with the time its line arrived
type Stamped = (Instant, BackendCommand);

fn spawn_stdin_reader(sender: Sender<Stamped>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("stdin read error: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<BackendCommand>(&line) {
                Ok(command) => {
                    if sender.send((Instant::now(), command)).is_err() {
                        break;
                    }
                }
                Err(e) => debug!("Ignoring unparseable command: {}", e),
            }
        }
        debug!("stdin closed");
    });
}

/// Run the shell until stdin closes or a quit command arrives
pub fn run(config: ShellConfig, state_path: Option<PathBuf>) -> Result<()> {
    let mut event_loop: EventLoop<Runtime> = EventLoop::try_new()?;

    let (sender, commands): (Sender<Stamped>, Channel<Stamped>) = channel::channel();
    event_loop
        .handle()
        .insert_source(commands, |event, _, runtime: &mut Runtime| match event {
            channel::Event::Msg((at, command)) => runtime.apply(at, command),
            channel::Event::Closed => runtime.running = false,
        })
        .map_err(|e| anyhow::anyhow!("Failed to insert command source: {:?}", e))?;

    spawn_stdin_reader(sender);

    let mut runtime = Runtime::new(config, state_path);
    runtime.shell.start(Instant::now());

    info!("Entering event loop");
    while runtime.running {
        let timeout = runtime
            .shell
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()));

        event_loop
            .dispatch(timeout, &mut runtime)
            .map_err(|e| anyhow::anyhow!("Event loop error: {:?}", e))?;

        runtime.shell.fire_timers(Instant::now());
    }

    info!("Shell stopped");
    Ok(())
}

//! A UCI engine running as a child process.
//!
//! One reader thread forwards stdout lines over a channel; every wait on
//! that channel is bounded by a [`Deadline`], so a silent engine can stall a
//! request but never the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::time_control::{Deadline, MoveBudget};

/// How to launch an engine. Paths are used verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl EngineSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Short label for logs: the program's file name.
    pub fn label(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.clone())
    }
}

/// Waits that do not depend on the move budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolTimeouts {
    /// Bound on `uciok` and every `readyok`.
    pub handshake: Duration,
    /// How long `quit` may take before the process is killed.
    pub quit_grace: Duration,
}

impl Default for ProtocolTimeouts {
    fn default() -> Self {
        Self {
            handshake: Duration::from_secs(10),
            quit_grace: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Handshaking,
    Idle,
    Thinking,
    Stopped,
}

/// One `option` line from the engine's handshake.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UciOption {
    pub name: String,
    pub kind: Option<String>,
    pub default: Option<String>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub vars: Vec<String>,
}

const OPTION_KEYWORDS: [&str; 5] = ["type", "default", "min", "max", "var"];

/// Parses `option name <words...> type <t> [default <d>] [min <n>] [max <n>] [var <v>]...`.
///
/// Returns `None` for lines that do not follow that shape.
pub fn parse_option_line(line: &str) -> Option<UciOption> {
    let mut tokens = line.split_whitespace().peekable();
    if tokens.next()? != "option" || tokens.next()? != "name" {
        return None;
    }

    let mut name = Vec::new();
    while let Some(tok) = tokens.next_if(|t| !OPTION_KEYWORDS.contains(t)) {
        name.push(tok);
    }
    if name.is_empty() {
        return None;
    }

    let mut opt = UciOption {
        name: name.join(" "),
        ..UciOption::default()
    };
    while let Some(key) = tokens.next() {
        let value = tokens.next()?;
        match key {
            "type" => opt.kind = Some(value.to_string()),
            "default" => opt.default = Some(value.to_string()),
            "min" => opt.min = Some(value.parse().ok()?),
            "max" => opt.max = Some(value.parse().ok()?),
            "var" => opt.vars.push(value.to_string()),
            _ => return None,
        }
    }
    Some(opt)
}

/// Last evaluation reported in an `info` line, from the engine's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    Mate(i32),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Cp(cp) => write!(f, "cp {cp}"),
            Score::Mate(n) => write!(f, "mate {n}"),
        }
    }
}

fn parse_score(line: &str) -> Option<Score> {
    let mut tokens = line.split_whitespace().skip_while(|&t| t != "score").skip(1);
    let kind = tokens.next()?;
    let value = tokens.next()?.parse().ok()?;
    match kind {
        "cp" => Some(Score::Cp(value)),
        "mate" => Some(Score::Mate(value)),
        _ => None,
    }
}

/// A UCI engine process driven through an explicit state machine.
///
/// Dropping the value stops the process.
pub struct UciProcess {
    spec: EngineSpec,
    label: String,
    timeouts: ProtocolTimeouts,
    state: EngineState,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    lines: Option<Receiver<String>>,
    id_name: Option<String>,
    options: BTreeMap<String, UciOption>,
    configured: Vec<(String, String)>,
    last_score: Option<Score>,
}

impl UciProcess {
    pub fn new(spec: EngineSpec, timeouts: ProtocolTimeouts) -> Self {
        Self {
            label: spec.label(),
            spec,
            timeouts,
            state: EngineState::Uninitialized,
            child: None,
            stdin: None,
            lines: None,
            id_name: None,
            options: BTreeMap::new(),
            configured: Vec::new(),
            last_score: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn spec(&self) -> &EngineSpec {
        &self.spec
    }

    /// `id name` from the handshake, falling back to the program name.
    pub fn name(&self) -> &str {
        self.id_name.as_deref().unwrap_or(&self.label)
    }

    pub fn option(&self, name: &str) -> Option<&UciOption> {
        self.options.get(name)
    }

    pub fn options(&self) -> impl Iterator<Item = &UciOption> {
        self.options.values()
    }

    pub fn last_score(&self) -> Option<Score> {
        self.last_score
    }

    /// Spawns the process and runs the `uci` / `isready` handshake.
    ///
    /// Also used to restart a stopped process; options set through
    /// [`configure`](Self::configure) are sent again.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.expect_state("start", &[EngineState::Uninitialized, EngineState::Stopped])?;

        let mut child = Command::new(&self.spec.program)
            .args(&self.spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.spec.program.clone(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(self.protocol("child process has no pipes"));
        };

        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(format!("{}-stdout", self.label))
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line.trim().to_string()).is_err() {
                        break;
                    }
                }
            });
        if let Err(source) = spawned {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EngineError::Spawn {
                program: self.spec.program.clone(),
                source,
            });
        }

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.lines = Some(rx);
        self.state = EngineState::Handshaking;

        self.handshake().map_err(|e| self.handshake_failure(e))?;
        self.state = EngineState::Idle;
        info!(engine = %self.label, name = %self.name(), options = self.options.len(), "engine ready");
        Ok(())
    }

    fn handshake(&mut self) -> Result<(), EngineError> {
        self.options.clear();
        self.send("uci")?;
        let deadline = Deadline::after(self.timeouts.handshake);
        loop {
            let line = self.read_line("uciok", &deadline)?;
            if line == "uciok" {
                break;
            }
            if let Some(name) = line.strip_prefix("id name ") {
                self.id_name = Some(name.trim().to_string());
            } else if line.starts_with("option ") {
                match parse_option_line(&line) {
                    Some(opt) => {
                        self.options.insert(opt.name.clone(), opt);
                    }
                    None => debug!(engine = %self.label, "skipping malformed option: {line}"),
                }
            }
        }
        self.sync()?;

        if !self.configured.is_empty() {
            let configured = self.configured.clone();
            for (name, value) in &configured {
                self.send(&format!("setoption name {name} value {value}"))?;
            }
            self.sync()?;
        }
        Ok(())
    }

    /// Sends `setoption` for each pair and waits for the engine to settle.
    pub fn configure(&mut self, options: &[(String, String)]) -> Result<(), EngineError> {
        self.expect_state("configure", &[EngineState::Idle])?;
        for (name, value) in options {
            self.send(&format!("setoption name {name} value {value}"))
                .map_err(|e| self.handshake_failure(e))?;
            match self.configured.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = value.clone(),
                None => self.configured.push((name.clone(), value.clone())),
            }
        }
        self.sync().map_err(|e| self.handshake_failure(e))
    }

    /// `ucinewgame` plus a readiness check, restarting a stopped process first.
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        if self.state == EngineState::Stopped {
            info!(engine = %self.label, "restarting stopped engine");
            self.start()?;
        }
        self.expect_state("new_game", &[EngineState::Idle])?;
        self.last_score = None;
        let result = self.send("ucinewgame").and_then(|_| self.sync());
        if result.is_err() {
            self.kill();
        }
        result
    }

    /// Sends the game so far and waits for `bestmove` within the budget.
    ///
    /// Returns the move text exactly as the engine printed it; validating it
    /// is the caller's job. On timeout or crash the process is stopped.
    pub fn request_move(
        &mut self,
        moves: &[String],
        budget: &MoveBudget,
    ) -> Result<String, EngineError> {
        self.expect_state("request_move", &[EngineState::Idle])?;
        self.state = EngineState::Thinking;

        let result = self.think(moves, budget);
        match &result {
            Ok(_) => self.state = EngineState::Idle,
            Err(e) => {
                warn!(engine = %self.label, "{e}");
                self.kill();
            }
        }
        result
    }

    fn think(&mut self, moves: &[String], budget: &MoveBudget) -> Result<String, EngineError> {
        if moves.is_empty() {
            self.send("position startpos")?;
        } else {
            self.send(&format!("position startpos moves {}", moves.join(" ")))?;
        }
        self.send(&format!("go movetime {}", budget.movetime_ms()))?;

        let deadline = budget.start();
        loop {
            let line = self.read_line("bestmove", &deadline)?;
            if let Some(rest) = line.strip_prefix("bestmove") {
                let mv = rest.split_whitespace().next().unwrap_or_default();
                return Ok(mv.to_string());
            }
            if line.starts_with("info") {
                if let Some(score) = parse_score(&line) {
                    self.last_score = Some(score);
                }
            }
        }
    }

    /// Asks the engine to quit, then kills it after the grace period.
    ///
    /// Safe to call any number of times.
    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Some(mut stdin) = self.stdin.take() {
                let _ = writeln!(stdin, "quit").and_then(|_| stdin.flush());
            }
            let deadline = Deadline::after(self.timeouts.quit_grace);
            loop {
                match child.try_wait() {
                    Ok(Some(status)) => {
                        debug!(engine = %self.label, %status, "engine exited");
                        break;
                    }
                    Ok(None) if !deadline.expired() => thread::sleep(Duration::from_millis(10)),
                    _ => {
                        warn!(engine = %self.label, "engine ignored quit, killing");
                        let _ = child.kill();
                        let _ = child.wait();
                        break;
                    }
                }
            }
        }
        self.release();
    }

    /// Kills the process without asking.
    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.release();
    }

    fn release(&mut self) {
        self.stdin = None;
        self.lines = None;
        self.state = EngineState::Stopped;
    }

    fn sync(&mut self) -> Result<(), EngineError> {
        self.send("isready")?;
        let deadline = Deadline::after(self.timeouts.handshake);
        while self.read_line("readyok", &deadline)? != "readyok" {}
        Ok(())
    }

    fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(engine = %self.label, ">> {cmd}");
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(EngineError::Crashed {
                engine: self.label.clone(),
            });
        };
        writeln!(stdin, "{cmd}")
            .and_then(|_| stdin.flush())
            .map_err(|_| EngineError::Crashed {
                engine: self.label.clone(),
            })
    }

    fn read_line(&self, expected: &'static str, deadline: &Deadline) -> Result<String, EngineError> {
        let Some(lines) = self.lines.as_ref() else {
            return Err(EngineError::Crashed {
                engine: self.label.clone(),
            });
        };
        match lines.recv_timeout(deadline.remaining()) {
            Ok(line) => {
                debug!(engine = %self.label, "<< {line}");
                Ok(line)
            }
            Err(RecvTimeoutError::Timeout) => Err(EngineError::Timeout {
                engine: self.label.clone(),
                expected,
                waited: deadline.limit(),
            }),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Crashed {
                engine: self.label.clone(),
            }),
        }
    }

    fn expect_state(&self, op: &str, allowed: &[EngineState]) -> Result<(), EngineError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.protocol(format!("`{op}` not allowed while {:?}", self.state)))
        }
    }

    fn protocol(&self, message: impl Into<String>) -> EngineError {
        EngineError::Protocol {
            engine: self.label.clone(),
            message: message.into(),
        }
    }

    /// Setup failures make the engine unusable: stop it and report them as
    /// protocol errors.
    fn handshake_failure(&mut self, err: EngineError) -> EngineError {
        self.kill();
        match err {
            EngineError::Timeout {
                expected, waited, ..
            } => self.protocol(format!("no `{expected}` within {waited:?} during setup")),
            EngineError::Crashed { .. } => self.protocol("exited during setup"),
            other => other,
        }
    }
}

impl fmt::Debug for UciProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UciProcess")
            .field("engine", &self.label)
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for UciProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "uci_process_tests.rs"]
mod uci_process_tests;

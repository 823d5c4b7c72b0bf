use super::document::{RESUME_SIGNAL, STOP_SIGNAL};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Host to frame signal; fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSignal {
    Stop,
    Resume,
}

impl FrameSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameSignal::Stop => STOP_SIGNAL,
            FrameSignal::Resume => RESUME_SIGNAL,
        }
    }
}

/// Sender half of the frame to host channel. Payloads are raw strings, decoded
/// by the host.
pub type FrameMessageSender = mpsc::UnboundedSender<String>;
pub type FrameMessageReceiver = mpsc::UnboundedReceiver<String>;

/// An isolated rendering context. Code inside it can only reach the host
/// through the message channel handed over at construction.
pub trait Frame: Send {
    /// Tear down whatever runs and start over with `document`.
    fn load(&mut self, document: &str) -> Result<()>;

    /// Deliver a signal to the running document.
    fn post(&mut self, signal: FrameSignal) -> Result<()>;
}

/// Frame backed by a preview file and an optional runner process.
///
/// The runner is spawned as `<runner...> <preview-path>`, receives signals as
/// stdin lines and reports errors as stdout lines.
pub struct ProcessFrame {
    preview_path: PathBuf,
    runner: Option<Vec<String>>,
    messages: FrameMessageSender,
    child: Option<Child>,
    signals: Option<mpsc::UnboundedSender<FrameSignal>>,
    // Stdout reader and stdin writer of the current runner.
    tasks: Vec<JoinHandle<()>>,
}

impl ProcessFrame {
    pub fn new(
        preview_path: PathBuf,
        runner: Option<&str>,
        messages: FrameMessageSender,
    ) -> Result<Self> {
        let runner = match runner {
            Some(command) => {
                let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
                if parts.is_empty() {
                    bail!("SKETCH_RUNNER must name a command");
                }
                Some(parts)
            }
            None => None,
        };

        Ok(Self {
            preview_path,
            runner,
            messages,
            child: None,
            signals: None,
            tasks: Vec::new(),
        })
    }

    pub fn preview_path(&self) -> &Path {
        &self.preview_path
    }

    fn write_preview(&self, document: &str) -> Result<()> {
        if let Some(parent) = self.preview_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.preview_path, document).with_context(|| {
            format!(
                "Failed to write sketch preview {}",
                self.preview_path.display()
            )
        })
    }

    /// Kill the runner and its io tasks. Output the old runner already wrote
    /// is never forwarded after this returns.
    fn stop_runner(&mut self) {
        self.signals = None;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if let Some(mut child) = self.child.take() {
            if let Err(error) = child.start_kill() {
                tracing::warn!(%error, "failed to kill sketch runner");
            }
        }
    }

    fn spawn_runner(&mut self, runner: &[String]) -> Result<()> {
        let (program, args) = runner
            .split_first()
            .context("SKETCH_RUNNER must name a command")?;

        let mut child = Command::new(program)
            .args(args)
            .arg(&self.preview_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start sketch runner '{program}'"))?;

        let stdout = child
            .stdout
            .take()
            .context("Failed to capture sketch runner stdout")?;
        let messages = self.messages.clone();
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        if messages.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(error) => {
                        tracing::debug!(%error, "sketch runner stdout closed");
                        break;
                    }
                }
            }
        });

        let mut stdin = child
            .stdin
            .take()
            .context("Failed to capture sketch runner stdin")?;
        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel::<FrameSignal>();
        let writer = tokio::spawn(async move {
            while let Some(signal) = signal_rx.recv().await {
                let line = format!("{}\n", signal.as_str());
                if let Err(error) = stdin.write_all(line.as_bytes()).await {
                    tracing::warn!(%error, "failed to signal sketch runner");
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
            }
        });

        self.tasks = vec![reader, writer];
        self.signals = Some(signal_tx);
        self.child = Some(child);
        tracing::debug!(runner = %program, "sketch runner started");
        Ok(())
    }
}

impl Frame for ProcessFrame {
    fn load(&mut self, document: &str) -> Result<()> {
        self.stop_runner();
        self.write_preview(document)?;

        if let Some(runner) = self.runner.clone() {
            self.spawn_runner(&runner)?;
        }
        Ok(())
    }

    fn post(&mut self, signal: FrameSignal) -> Result<()> {
        let Some(signals) = &self.signals else {
            tracing::debug!(signal = signal.as_str(), "no sketch runner attached; signal dropped");
            return Ok(());
        };
        if signals.send(signal).is_err() {
            bail!("sketch runner is no longer accepting signals");
        }
        Ok(())
    }
}

impl Drop for ProcessFrame {
    fn drop(&mut self) {
        self.stop_runner();
    }
}

//! Scripted shell used by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::channel::{Shell, ShellConnector};
use crate::error::{Result, TransportError};
use crate::model::SwitchDescriptor;

/// Commands received by a [`MockShell`], shared with the test.
#[derive(Debug, Clone, Default)]
pub struct CommandLog(Arc<Mutex<Vec<String>>>);

impl CommandLog {
    fn push(&self, command: &str) {
        self.0.lock().unwrap().push(command.to_string());
    }

    pub fn commands(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Shell answering from a script.
///
/// Each command has a queue of replies; the last one repeats. Commands with
/// no script get an empty reply, which is what the device prints on success.
#[derive(Debug, Clone)]
pub struct MockShell {
    replies: HashMap<String, VecDeque<Vec<String>>>,
    prompts: HashMap<String, String>,
    prompt: String,
    log: CommandLog,
}

impl MockShell {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            prompts: HashMap::new(),
            prompt: "SSH@switch#".to_string(),
            log: CommandLog::default(),
        }
    }

    pub fn reply(&mut self, command: &str, lines: &[&str]) -> &mut Self {
        self.replies
            .entry(command.to_string())
            .or_default()
            .push_back(lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Reply with a block of text, one line per `\n`.
    pub fn reply_text(&mut self, command: &str, text: &str) -> &mut Self {
        let lines: Vec<&str> = text.lines().collect();
        self.reply(command, &lines)
    }

    pub fn set_prompt(&mut self, prompt: &str) -> &mut Self {
        self.prompt = prompt.to_string();
        self
    }

    /// Switch to `prompt` once `command` has been answered.
    pub fn prompt_after(&mut self, command: &str, prompt: &str) -> &mut Self {
        self.prompts.insert(command.to_string(), prompt.to_string());
        self
    }

    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }

    fn answer(&mut self, command: &str) -> Vec<String> {
        self.log.push(command);
        if let Some(prompt) = self.prompts.get(command) {
            self.prompt = prompt.clone();
        }
        match self.replies.get_mut(command) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl Shell for MockShell {
    async fn execute(&mut self, command: &str) -> Result<Vec<String>> {
        Ok(self.answer(command))
    }

    async fn execute_until(&mut self, command: &str, _wait_for: &str) -> Result<Vec<String>> {
        Ok(self.answer(command))
    }

    async fn continue_paged(&mut self, key: &str, _stop_patterns: &[&str]) -> Result<Vec<String>> {
        Ok(self.answer(key))
    }

    fn current_prompt(&self) -> &str {
        &self.prompt
    }

    async fn terminate(&mut self, exit_command: &str) -> Result<()> {
        self.log.push(exit_command);
        Ok(())
    }
}

/// Connector handing out copies of one scripted shell.
pub struct MockConnector {
    shell: MockShell,
    fail: bool,
    connects: AtomicUsize,
}

impl MockConnector {
    pub fn new(shell: MockShell) -> Self {
        Self {
            shell,
            fail: false,
            connects: AtomicUsize::new(0),
        }
    }

    /// A connector whose every attempt fails authentication.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(MockShell::new())
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShellConnector for MockConnector {
    async fn connect(&self, descriptor: &SwitchDescriptor) -> Result<Box<dyn Shell>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TransportError::AuthenticationFailed {
                user: descriptor.username.clone(),
            }
            .into());
        }
        Ok(Box::new(self.shell.clone()))
    }
}

/// Descriptor for a test switch.
pub fn descriptor(hostname: &str, model: &str) -> SwitchDescriptor {
    SwitchDescriptor::new(hostname, model, "admin", "secret")
}

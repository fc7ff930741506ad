//! Shell session layer.
//!
//! A [`Shell`] is a line-oriented request/response channel to one device:
//! send a command, get back the lines the device printed before its next
//! prompt. [`SshShell`] is the production implementation; drivers only ever
//! see the trait, which keeps them testable against scripted shells.

mod buffer;
mod ssh_shell;

pub use buffer::PatternBuffer;
pub use ssh_shell::{SshConnector, SshShell};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::SwitchDescriptor;

/// Interactive command channel to a device.
#[async_trait]
pub trait Shell: Send {
    /// Send a command and return the reply lines, without the command echo
    /// and the trailing prompt.
    async fn execute(&mut self, command: &str) -> Result<Vec<String>>;

    /// Send a command and read until `wait_for` (a regex) instead of the
    /// prompt. Used for interactive questions such as password prompts.
    async fn execute_until(&mut self, command: &str, wait_for: &str) -> Result<Vec<String>>;

    /// Send a secret (such as the enable password) and return the reply.
    /// Implementations must not log the input.
    async fn send_secret(&mut self, secret: &str) -> Result<Vec<String>> {
        self.execute(secret).await
    }

    /// Send a raw key to continue a paged reply and read until one of
    /// `stop_patterns` or the prompt shows up.
    async fn continue_paged(&mut self, key: &str, stop_patterns: &[&str]) -> Result<Vec<String>>;

    /// The last prompt seen.
    fn current_prompt(&self) -> &str;

    /// Leave the device with `exit_command` and close the session.
    async fn terminate(&mut self, exit_command: &str) -> Result<()>;
}

/// Opens shells for descriptors.
#[async_trait]
pub trait ShellConnector: Send + Sync {
    async fn connect(&self, descriptor: &SwitchDescriptor) -> Result<Box<dyn Shell>>;
}

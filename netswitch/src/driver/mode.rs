//! Nested configuration modes.
//!
//! A [`ModeStack`] borrows the shell for the duration of one write and keeps
//! track of every mode entered on the way. [`ModeStack::finish`] leaves them
//! in reverse order whatever the outcome of the write, then hands the outcome
//! back:
//!
//! ```rust,ignore
//! let mut modes = ModeStack::new(shell);
//! let outcome: Result<()> = async {
//!     modes.enter(Mode::new("configure terminal")).await?;
//!     modes.enter(Mode::new("vlan 10")).await?;
//!     modes.set("untagged ethernet 1/1", Classifier::new()).await?;
//!     Ok(())
//! }
//! .await;
//! modes.finish(outcome).await // "exit", "exit"
//! ```

use log::{debug, warn};

use super::classify::Classifier;
use crate::channel::Shell;
use crate::error::Result;

/// A configuration mode: the command that enters it, the one that leaves
/// it and an optional check on the entry command's reply.
pub struct Mode {
    enter: String,
    exit: String,
    validator: Option<Classifier>,
}

impl Mode {
    pub fn new(enter: impl Into<String>) -> Self {
        Self {
            enter: enter.into(),
            exit: "exit".to_string(),
            validator: None,
        }
    }

    pub fn with_exit(mut self, exit: impl Into<String>) -> Self {
        self.exit = exit.into();
        self
    }

    /// Check the entry reply; the mode only counts as entered when it passes.
    pub fn validated_by(mut self, classifier: Classifier) -> Self {
        self.validator = Some(classifier);
        self
    }
}

/// LIFO stack of entered modes over a borrowed shell.
pub struct ModeStack<'a> {
    shell: &'a mut dyn Shell,
    exits: Vec<String>,
}

impl<'a> ModeStack<'a> {
    pub fn new(shell: &'a mut dyn Shell) -> Self {
        Self {
            shell,
            exits: Vec::new(),
        }
    }

    /// Number of modes currently entered.
    pub fn depth(&self) -> usize {
        self.exits.len()
    }

    pub async fn enter(&mut self, mode: Mode) -> Result<()> {
        debug!("entering mode '{}'", mode.enter);
        let lines = self.shell.execute(&mode.enter).await?;
        if let Some(validator) = mode.validator {
            validator.check(&lines)?;
        }
        self.exits.push(mode.exit);
        Ok(())
    }

    /// Run a command in the current mode without checking its reply.
    pub async fn execute(&mut self, command: &str) -> Result<Vec<String>> {
        self.shell.execute(command).await
    }

    /// Run a command in the current mode and classify its reply.
    pub async fn set(&mut self, command: &str, classifier: Classifier) -> Result<Vec<String>> {
        let lines = self.shell.execute(command).await?;
        classifier.check(&lines)?;
        Ok(lines)
    }

    /// Leave the innermost mode.
    pub async fn leave(&mut self) -> Result<()> {
        if let Some(exit) = self.exits.pop() {
            debug!("leaving mode with '{exit}'");
            self.shell.execute(&exit).await?;
        }
        Ok(())
    }

    /// Leave the innermost mode with `command` instead of its usual exit.
    pub async fn leave_with(&mut self, command: &str) -> Result<()> {
        if self.exits.pop().is_some() {
            debug!("leaving mode with '{command}'");
            self.shell.execute(command).await?;
        }
        Ok(())
    }

    /// Leave every entered mode, innermost first, and return `outcome`.
    ///
    /// All exits are sent even if one fails. When `outcome` is an error it
    /// wins and exit failures are only logged.
    pub async fn finish<T>(mut self, outcome: Result<T>) -> Result<T> {
        let mut unwind_error = None;

        while let Some(exit) = self.exits.pop() {
            debug!("leaving mode with '{exit}'");
            if let Err(e) = self.shell.execute(&exit).await {
                warn!("'{exit}' failed while leaving configuration modes: {e}");
                unwind_error.get_or_insert(e);
            }
        }

        match (outcome, unwind_error) {
            (Ok(_), Some(e)) => Err(e),
            (outcome, _) => outcome,
        }
    }
}

impl Drop for ModeStack<'_> {
    fn drop(&mut self) {
        if !self.exits.is_empty() {
            warn!(
                "ModeStack dropped with {} configuration mode(s) still open",
                self.exits.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::classify::Matcher;
    use crate::error::{Error, SwitchError};
    use crate::testing::MockShell;

    #[tokio::test]
    async fn test_finish_exits_in_reverse_order() {
        let mut shell = MockShell::new();
        let log = shell.log();

        let mut modes = ModeStack::new(&mut shell);
        let outcome: Result<()> = async {
            modes.enter(Mode::new("configure terminal")).await?;
            modes.enter(Mode::new("interface ve 10").with_exit("quit")).await?;
            assert_eq!(modes.depth(), 2);
            modes.execute("ip address 10.0.0.1/24").await?;
            Ok(())
        }
        .await;
        modes.finish(outcome).await.unwrap();

        assert_eq!(
            log.commands(),
            vec![
                "configure terminal",
                "interface ve 10",
                "ip address 10.0.0.1/24",
                "quit",
                "exit"
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_step_still_unwinds_every_mode() {
        let mut shell = MockShell::new();
        shell.reply("backup priority 300", &["Invalid input -> 300"]);
        let log = shell.log();

        let mut modes = ModeStack::new(&mut shell);
        let outcome: Result<()> = async {
            modes.enter(Mode::new("configure terminal")).await?;
            modes.enter(Mode::new("interface ve 10")).await?;
            modes.enter(Mode::new("ip vrrp-extended vrid 1")).await?;
            modes
                .set(
                    "backup priority 300",
                    Classifier::new().on_any_result(|_| {
                        SwitchError::BadVrrpPriorityNumber { min: 1, max: 255 }.into()
                    }),
                )
                .await?;
            modes.execute("never sent").await?;
            Ok(())
        }
        .await;
        let err = modes.finish(outcome).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Switch(SwitchError::BadVrrpPriorityNumber { .. })
        ));
        assert_eq!(
            log.commands(),
            vec![
                "configure terminal",
                "interface ve 10",
                "ip vrrp-extended vrid 1",
                "backup priority 300",
                "exit",
                "exit",
                "exit"
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_entry_is_not_exited() {
        let mut shell = MockShell::new();
        shell.reply("interface ethernet 9/99", &["Invalid input -> 9/99"]);
        let log = shell.log();

        let mut modes = ModeStack::new(&mut shell);
        let outcome: Result<()> = async {
            modes.enter(Mode::new("configure terminal")).await?;
            modes
                .enter(
                    Mode::new("interface ethernet 9/99").validated_by(
                        Classifier::new().on_any_result(|_| {
                            SwitchError::UnknownInterface {
                                interface: "ethernet 9/99".to_string(),
                            }
                            .into()
                        }),
                    ),
                )
                .await?;
            Ok(())
        }
        .await;
        assert!(modes.finish(outcome).await.is_err());

        assert_eq!(
            log.commands(),
            vec!["configure terminal", "interface ethernet 9/99", "exit"]
        );
    }

    #[tokio::test]
    async fn test_leave_with_replaces_exit() {
        let mut shell = MockShell::new();
        let log = shell.log();

        let mut modes = ModeStack::new(&mut shell);
        let outcome: Result<()> = async {
            modes.enter(Mode::new("interface ve 10")).await?;
            modes.enter(Mode::new("ip vrrp-extended vrid 1")).await?;
            modes.leave_with("activate").await?;
            Ok(())
        }
        .await;
        modes.finish(outcome).await.unwrap();

        assert_eq!(
            log.commands(),
            vec!["interface ve 10", "ip vrrp-extended vrid 1", "activate", "exit"]
        );
    }

    #[tokio::test]
    async fn test_validator_accepts_known_marker() {
        let mut shell = MockShell::new();
        shell.reply("vlan 10 name users", &["Warning: name truncated"]);

        let mut modes = ModeStack::new(&mut shell);
        let entered = modes
            .enter(
                Mode::new("vlan 10 name users").validated_by(
                    Classifier::new()
                        .accept(Matcher::prefix("Warning:"))
                        .on_any_result(|_| {
                            SwitchError::BadVlanName {
                                name: "users".to_string(),
                            }
                            .into()
                        }),
                ),
            )
            .await;
        assert!(entered.is_ok());
        assert_eq!(modes.depth(), 1);
        modes.finish(Ok(())).await.unwrap();
    }
}

//! Interactive shell over an SSH PTY channel.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};

use super::buffer::PatternBuffer;
use super::{Shell, ShellConnector};
use crate::error::{ChannelError, Result};
use crate::model::SwitchDescriptor;
use crate::transport::{SshConfig, SshOptions, SshTransport};

/// [`Shell`] backed by a russh PTY channel.
///
/// Pager markers are answered with the continue key as they arrive, so
/// callers always get complete replies.
pub struct SshShell {
    transport: Option<SshTransport>,
    channel: Channel<Msg>,
    buffer: PatternBuffer,
    prompt_pattern: Regex,
    pager_pattern: Regex,
    continue_key: String,
    timeout: Duration,
    prompt: String,
}

impl SshShell {
    /// Connect, open a shell and wait for the first prompt.
    pub async fn open(descriptor: &SwitchDescriptor, options: &SshOptions) -> Result<Self> {
        let prompt_pattern = Regex::new(&options.prompt_pattern).map_err(ChannelError::from)?;
        let pager_pattern = Regex::new(&options.pager_pattern).map_err(ChannelError::from)?;

        let transport = SshTransport::connect(SshConfig::new(descriptor, options)).await?;
        let channel = transport.open_channel().await?;

        let mut shell = Self {
            transport: Some(transport),
            channel,
            buffer: PatternBuffer::new(options.search_depth),
            prompt_pattern,
            pager_pattern,
            continue_key: options.continue_key.clone(),
            timeout: options.timeout,
            prompt: String::new(),
        };

        let prompt = shell.prompt_pattern.clone();
        let banner = shell.read_until(&prompt).await?;
        let (_, prompt) = split_response(&banner, "");
        debug!("shell open on {}, prompt '{}'", descriptor.hostname, prompt);
        shell.prompt = prompt;

        Ok(shell)
    }

    async fn send_raw(&mut self, input: &str) -> Result<()> {
        self.channel
            .data(input.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    async fn send_line(&mut self, input: &str) -> Result<()> {
        self.buffer.clear();
        self.send_raw(&format!("{input}\n")).await
    }

    /// Read until `pattern` matches the buffer tail, paging as needed.
    async fn read_until(&mut self, pattern: &Regex) -> Result<String> {
        let deadline = tokio::time::Instant::now() + self.timeout;

        loop {
            if self.buffer.tail_contains(pattern) {
                let data = self.buffer.take();
                return Ok(String::from_utf8_lossy(&data).into_owned());
            }

            if self.buffer.strip_tail_match(&self.pager_pattern) {
                trace!("pager marker, sending continue key");
                let key = self.continue_key.clone();
                self.send_raw(&key).await?;
            }

            let message = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| ChannelError::PatternTimeout(self.timeout))?;

            match message {
                Some(ChannelMsg::Data { ref data }) => {
                    trace!("received {} bytes", data.len());
                    self.buffer.extend(&data[..]);
                }
                Some(ChannelMsg::ExtendedData { ref data, .. }) => self.buffer.extend(&data[..]),
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                    return Err(ChannelError::Closed.into());
                }
                Some(_) => {}
            }
        }
    }
}

#[async_trait]
impl Shell for SshShell {
    async fn execute(&mut self, command: &str) -> Result<Vec<String>> {
        trace!("> {command}");
        self.send_line(command).await?;

        let prompt = self.prompt_pattern.clone();
        let raw = self.read_until(&prompt).await?;
        let (lines, prompt) = split_response(&raw, command);
        self.prompt = prompt;

        Ok(lines)
    }

    async fn execute_until(&mut self, command: &str, wait_for: &str) -> Result<Vec<String>> {
        let pattern = Regex::new(wait_for).map_err(ChannelError::from)?;
        trace!("> {command} (waiting for '{wait_for}')");
        self.send_line(command).await?;

        let raw = self.read_until(&pattern).await?;
        Ok(split_response(&raw, command).0)
    }

    async fn send_secret(&mut self, secret: &str) -> Result<Vec<String>> {
        trace!("> ********");
        self.send_line(secret).await?;

        let prompt = self.prompt_pattern.clone();
        let raw = self.read_until(&prompt).await?;
        let (lines, prompt) = split_response(&raw, "");
        self.prompt = prompt;

        Ok(lines)
    }

    async fn continue_paged(&mut self, key: &str, stop_patterns: &[&str]) -> Result<Vec<String>> {
        let mut alternatives: Vec<String> = stop_patterns.iter().map(|p| format!("(?:{p})")).collect();
        alternatives.push(format!("(?:{})", self.prompt_pattern.as_str()));
        let pattern = Regex::new(&alternatives.join("|")).map_err(ChannelError::from)?;

        self.buffer.clear();
        self.send_raw(key).await?;

        let raw = self.read_until(&pattern).await?;
        Ok(split_response(&raw, "").0)
    }

    fn current_prompt(&self) -> &str {
        &self.prompt
    }

    async fn terminate(&mut self, exit_command: &str) -> Result<()> {
        // The device usually drops the channel on exit, errors are expected
        let _ = self.send_line(exit_command).await;
        let _ = self.channel.eof().await;

        if let Some(transport) = self.transport.take() {
            debug!("closing ssh session to {}", transport.host());
            transport.close().await?;
        }
        Ok(())
    }
}

/// Split a raw reply into its lines and the trailing prompt.
///
/// The first line is dropped when it echoes `command`; leading and trailing
/// blank lines are dropped; carriage-return overwrites keep the last segment.
pub(crate) fn split_response(raw: &str, command: &str) -> (Vec<String>, String) {
    let mut lines: Vec<String> = raw
        .split('\n')
        .map(|line| {
            let line = line.trim_end_matches('\r');
            line.rsplit('\r').next().unwrap_or(line).trim_end().to_string()
        })
        .collect();

    let prompt = lines.pop().unwrap_or_default();

    if !command.is_empty() && lines.first().is_some_and(|l| l.trim() == command.trim()) {
        lines.remove(0);
    }

    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    (lines, prompt)
}

/// Opens [`SshShell`]s with shared options.
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    options: SshOptions,
}

impl SshConnector {
    pub fn new(options: SshOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SshOptions {
        &self.options
    }
}

#[async_trait]
impl ShellConnector for SshConnector {
    async fn connect(&self, descriptor: &SwitchDescriptor) -> Result<Box<dyn Shell>> {
        let shell = SshShell::open(descriptor, &self.options).await?;
        Ok(Box::new(shell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_strips_echo_and_prompt() {
        let raw = "show vlan 10\r\nPORT-VLAN 10, Name [None], Priority level0\r\n Untagged Ports: None\r\nSSH@switch#";
        let (lines, prompt) = split_response(raw, "show vlan 10");

        assert_eq!(
            lines,
            vec![
                "PORT-VLAN 10, Name [None], Priority level0".to_string(),
                " Untagged Ports: None".to_string(),
            ]
        );
        assert_eq!(prompt, "SSH@switch#");
    }

    #[test]
    fn test_split_empty_reply() {
        let (lines, prompt) = split_response("vlan 10\r\nSSH@switch(config-vlan-10)#", "vlan 10");
        assert!(lines.is_empty());
        assert_eq!(prompt, "SSH@switch(config-vlan-10)#");
    }

    #[test]
    fn test_split_keeps_indentation_and_drops_blank_edges() {
        let raw = "\r\n ip vrrp-extended vrid 1\r\n  activate\r\n\r\nSSH@switch#";
        let (lines, _) = split_response(raw, "");
        assert_eq!(
            lines,
            vec![" ip vrrp-extended vrid 1".to_string(), "  activate".to_string()]
        );
    }

    #[test]
    fn test_split_carriage_return_overwrite() {
        let raw = "show interfaces\r\nxxxxxxxx\rGigabitEthernet1/1 is up\r\nSSH@switch#";
        let (lines, _) = split_response(raw, "show interfaces");
        assert_eq!(lines, vec!["GigabitEthernet1/1 is up".to_string()]);
    }
}

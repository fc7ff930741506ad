//! SSH connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::model::SwitchDescriptor;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For lab use only.
    Disabled,
}

/// Tunables for SSH shells, shared by every switch a connector opens.
#[derive(Debug, Clone)]
pub struct SshOptions {
    /// Port used when the descriptor has no override.
    pub default_port: u16,

    /// Connection and per-reply timeout.
    pub timeout: Duration,

    /// Regex matching the device prompt at the very end of the output.
    pub prompt_pattern: String,

    /// Regex matching a pager marker at the end of the output.
    pub pager_pattern: String,

    /// Key sent to get the next page.
    pub continue_key: String,

    /// How many trailing bytes are searched for prompt and pager patterns.
    pub search_depth: usize,

    /// Terminal width for the PTY.
    pub terminal_width: u32,

    /// Terminal height for the PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            default_port: 22,
            timeout: Duration::from_secs(30),
            prompt_pattern: r"(?m)^[\w.\-@()/: ]{1,63}[>#] ?\z".to_string(),
            pager_pattern: r"--More--[^\n]*\z".to_string(),
            continue_key: " ".to_string(),
            search_depth: 1000,
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}

/// Everything needed to open one SSH connection.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port.
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Password for authentication.
    pub password: SecretString,

    /// Connection timeout.
    pub timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Combine a descriptor with connector-wide options.
    pub fn new(descriptor: &SwitchDescriptor, options: &SshOptions) -> Self {
        let descriptor = descriptor.clone();
        Self {
            host: descriptor.hostname,
            port: descriptor.port.unwrap_or(options.default_port),
            username: descriptor.username,
            password: descriptor.password,
            timeout: options.timeout,
            terminal_width: options.terminal_width,
            terminal_height: options.terminal_height,
            host_key_verification: options.host_key_verification.clone(),
            known_hosts_path: options.known_hosts_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_falls_back_to_default() {
        let options = SshOptions::default();
        let descriptor = SwitchDescriptor::new("my.switch", "brocade", "root", "pw");
        assert_eq!(SshConfig::new(&descriptor, &options).port, 22);

        let descriptor = descriptor.with_port(2222);
        let config = SshConfig::new(&descriptor, &options);
        assert_eq!(config.port, 2222);
        assert_eq!(config.host, "my.switch");
        assert_eq!(config.username, "root");
    }

    #[test]
    fn test_default_prompt_pattern() {
        let prompt = regex::bytes::Regex::new(&SshOptions::default().prompt_pattern).unwrap();
        assert!(prompt.is_match(b"output\nSSH@switch#"));
        assert!(prompt.is_match(b"SSH@switch(config)# "));
        assert!(prompt.is_match(b"SSH@switch(config-vif-1234)#"));
        assert!(prompt.is_match(b"SSH@switch>"));
        assert!(!prompt.is_match(b"SSH@switch#\nmore output"));
    }
}

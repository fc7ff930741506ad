//! Error types for netswitch.
//!
//! Errors are grouped per layer and folded into [`Error`]. Callers that only
//! care about the broad category (for example an HTTP layer choosing a status
//! code) use [`Error::kind`].

use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

use ipnetwork::Ipv4Network;
use thiserror::Error;

use crate::model::Direction;

/// Main error type for netswitch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Shell channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/model errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// The device rejected or could not satisfy an operation
    #[error(transparent)]
    Switch(#[from] SwitchError),

    /// Session manager errors
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The referenced object does not exist.
    NotFound,
    /// The object already exists or is already set.
    Conflict,
    /// A value was rejected as malformed or out of range.
    InvalidInput,
    /// The device is not in a state that allows the operation.
    Precondition,
    /// The driver does not implement the operation.
    Unsupported,
    /// Transport, channel or unexpected device failure.
    Fatal,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Switch(e) => e.kind(),
            Error::Session(SessionError::UnknownSession { .. }) => ErrorKind::NotFound,
            Error::Session(SessionError::SessionAlreadyExists { .. }) => ErrorKind::Conflict,
            Error::Session(SessionError::UnknownSwitch { .. }) => ErrorKind::NotFound,
            Error::Platform(PlatformError::UnknownPlatform { .. }) => ErrorKind::NotFound,
            Error::Platform(PlatformError::InvalidDefinition { .. }) => ErrorKind::InvalidInput,
            Error::Transport(_) | Error::Channel(_) | Error::Driver(_) => ErrorKind::Fatal,
        }
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// The server presented a key that differs from known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Strict verification and the host is not in known_hosts
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Shell channel errors (prompt detection, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Expected pattern never showed up
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (connection state, locking, unexpected replies).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Switch not connected - call connect() first")]
    NotConnected,

    /// Driver already connected
    #[error("Switch already connected")]
    AlreadyConnected,

    /// The device answered with text no rule accounts for
    #[error("Command '{command}' failed: {output}")]
    CommandFailed { command: String, output: String },

    /// The per-device lock could not be taken in time
    #[error("Timed out after {waited:?} waiting for the lock on '{host}'")]
    LockTimeout { host: String, waited: Duration },

    /// Invalid configuration in the switch builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Platform/model lookup errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid platform definition or descriptor
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },

    /// No driver registered for this model tag
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },
}

/// Errors raised when the device rejects an operation or its target.
#[derive(Error, Debug)]
pub enum SwitchError {
    #[error("Vlan {vlan} not found")]
    UnknownVlan { vlan: u16 },

    #[error("Unknown interface {interface}")]
    UnknownInterface { interface: String },

    #[error("VRF name \"{name}\" was not configured.")]
    UnknownVrf { name: String },

    #[error("{direction} IP access group not found")]
    UnknownAccessGroup { direction: Direction },

    #[error("DHCP relay server {address} not found on VLAN {vlan}")]
    UnknownDhcpRelayServer { vlan: u16, address: Ipv4Addr },

    #[error("IP {ip} not found")]
    UnknownIp { ip: Ipv4Network },

    #[error("Vrrp group {group} does not exist for vlan {vlan}")]
    UnknownVrrpGroup { vlan: u16, group: u8 },

    #[error("Vlan {vlan} already exists")]
    VlanAlreadyExists { vlan: u16 },

    #[error("Vrrp group {group} is already in use on vlan {vlan}")]
    VrrpAlreadyExists { vlan: u16, group: u8 },

    #[error("DHCP relay server {address} already exists on VLAN {vlan}")]
    DhcpRelayServerAlreadyExists { vlan: u16, address: Ipv4Addr },

    #[error("IP {ip} is already present in this vlan")]
    IpAlreadySet { ip: Ipv4Network },

    #[error("Vlan number is invalid: {number}, expected a value between 1 and 4094")]
    BadVlanNumber { number: u16 },

    #[error("Vlan name is invalid: \"{name}\"")]
    BadVlanName { name: String },

    #[error("Access group name \"{name}\" is invalid")]
    InvalidAccessGroupName { name: String },

    #[error("VRF name \"{name}\" is invalid")]
    InvalidVrfName { name: String },

    #[error("IP {ip} is not available in this vlan: {reason}")]
    IpNotAvailable { ip: String, reason: String },

    #[error("VRRP group number is invalid, must be contained between {min} and {max}")]
    BadVrrpGroupNumber { min: u8, max: u8 },

    #[error("VRRP priority value is invalid, must be contained between {min} and {max}")]
    BadVrrpPriorityNumber { min: u8, max: u8 },

    #[error("VRRP timers values are invalid")]
    BadVrrpTimers,

    #[error("VRRP tracking values are invalid")]
    BadVrrpTracking,

    #[error("Invalid description: \"{description}\"")]
    BadInterfaceDescription { description: String },

    #[error("Vlan {vlan} needs an IP before configuring VRRP")]
    NoIpOnVlanForVrrp { vlan: u16 },

    #[error("VRF forwarding is not set on vlan {vlan}")]
    VlanVrfNotSet { vlan: u16 },

    #[error("Trunk Vlan is not set on interface {interface}")]
    TrunkVlanNotSet { interface: String },

    #[error("Access Vlan is not set on interface {interface}")]
    AccessVlanNotSet { interface: String },

    #[error("Native Vlan is not set on interface {interface}")]
    NativeVlanNotSet { interface: String },

    #[error("Operation '{operation}' is not supported by model '{model}'")]
    Unsupported { operation: &'static str, model: String },
}

impl SwitchError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        use SwitchError as E;

        match self {
            E::UnknownVlan { .. }
            | E::UnknownInterface { .. }
            | E::UnknownVrf { .. }
            | E::UnknownAccessGroup { .. }
            | E::UnknownDhcpRelayServer { .. }
            | E::UnknownIp { .. }
            | E::UnknownVrrpGroup { .. } => ErrorKind::NotFound,

            E::VlanAlreadyExists { .. }
            | E::VrrpAlreadyExists { .. }
            | E::DhcpRelayServerAlreadyExists { .. }
            | E::IpAlreadySet { .. } => ErrorKind::Conflict,

            E::BadVlanNumber { .. }
            | E::BadVlanName { .. }
            | E::InvalidAccessGroupName { .. }
            | E::InvalidVrfName { .. }
            | E::IpNotAvailable { .. }
            | E::BadVrrpGroupNumber { .. }
            | E::BadVrrpPriorityNumber { .. }
            | E::BadVrrpTimers
            | E::BadVrrpTracking
            | E::BadInterfaceDescription { .. } => ErrorKind::InvalidInput,

            E::NoIpOnVlanForVrrp { .. }
            | E::VlanVrfNotSet { .. }
            | E::TrunkVlanNotSet { .. }
            | E::AccessVlanNotSet { .. }
            | E::NativeVlanNotSet { .. } => ErrorKind::Precondition,

            E::Unsupported { .. } => ErrorKind::Unsupported,
        }
    }
}

/// Session manager errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session ID not found: {id}")]
    UnknownSession { id: String },

    #[error("Session ID already exists: {id}")]
    SessionAlreadyExists { id: String },

    #[error("No switch registered for hostname '{hostname}'")]
    UnknownSwitch { hostname: String },
}

/// Result type alias using netswitch's Error.
pub type Result<T> = std::result::Result<T, Error>;

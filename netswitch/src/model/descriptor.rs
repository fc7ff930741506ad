//! Switch identity and credentials.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// Identity and credentials for one device.
///
/// The hostname doubles as the device identity: two descriptors with the same
/// hostname refer to the same switch and share its lock.
#[derive(Debug, Deserialize)]
pub struct SwitchDescriptor {
    /// Hostname or address used to reach the device.
    pub hostname: String,

    /// Model tag selecting the driver (e.g. `brocade`).
    pub model: String,

    /// Login username.
    pub username: String,

    /// Login password, also used for privilege escalation.
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,

    /// Port override; the connector's default applies when unset.
    #[serde(default)]
    pub port: Option<u16>,

    /// Intermediate hops the device must be reached through.
    #[serde(default)]
    pub proxy_chain: Vec<String>,
}

impl SwitchDescriptor {
    /// Create a descriptor without port override or proxies.
    pub fn new(
        hostname: impl Into<String>,
        model: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            model: model.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            port: None,
            proxy_chain: Vec::new(),
        }
    }

    /// Set the port override.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Append a proxy hop.
    pub fn with_proxy(mut self, hop: impl Into<String>) -> Self {
        self.proxy_chain.push(hop.into());
        self
    }
}

impl Clone for SwitchDescriptor {
    fn clone(&self) -> Self {
        Self {
            hostname: self.hostname.clone(),
            model: self.model.clone(),
            username: self.username.clone(),
            password: SecretString::from(self.password.expose_secret().to_owned()),
            port: self.port,
            proxy_chain: self.proxy_chain.clone(),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::SnmpError;
use crate::snmp::Version;

pub const DEFAULT_PORT: u16 = 161;
pub const DEFAULT_COMMUNITY: &str = "public";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_MAX_OIDS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Udp,
    Tcp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Udp => write!(f, "udp"),
            Transport::Tcp => write!(f, "tcp"),
        }
    }
}

/// Everything needed to open a session with one agent.
///
/// `SessionConfig::default()` carries the usual client defaults (UDP port
/// 161, community `public`, v2c, 2s timeout, 3 retries); only the target has
/// to be filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub target: String,
    pub port: u16,
    pub transport: Transport,
    pub community: String,
    pub version: Version,
    pub timeout: Duration,
    pub retries: u32,
    /// Double the timeout on every retry.
    pub exponential_timeout: bool,
    /// Upper bound on varbinds in a single request.
    pub max_oids: usize,
    pub local_addr: Option<SocketAddr>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            port: DEFAULT_PORT,
            transport: Transport::Udp,
            community: DEFAULT_COMMUNITY.to_string(),
            version: Version::V2c,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            exponential_timeout: true,
            max_oids: DEFAULT_MAX_OIDS,
            local_addr: None,
        }
    }
}

impl SessionConfig {
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_community(mut self, community: impl Into<String>) -> Self {
        self.community = community.into();
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_exponential_timeout(mut self, enabled: bool) -> Self {
        self.exponential_timeout = enabled;
        self
    }

    pub fn with_max_oids(mut self, max_oids: usize) -> Self {
        self.max_oids = max_oids;
        self
    }

    pub fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }

    pub fn validate(&self) -> Result<(), SnmpError> {
        if self.target.trim().is_empty() {
            return Err(SnmpError::InvalidConfig("target is empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(SnmpError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_oids == 0 {
            return Err(SnmpError::InvalidConfig(
                "max_oids must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// `target:port`, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        let target = self.target.trim();
        if target.contains(':') && !target.starts_with('[') {
            format!("[{}]:{}", target, self.port)
        } else {
            format!("{}:{}", target, self.port)
        }
    }

    /// Read timeout for the given zero-based attempt.
    pub fn attempt_timeout(&self, attempt: u32) -> Duration {
        if self.exponential_timeout {
            self.timeout.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
        } else {
            self.timeout
        }
    }
}

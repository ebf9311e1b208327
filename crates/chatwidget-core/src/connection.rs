//! Connection lifecycle with exponential backoff

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Reconnect policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackoffPolicy {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Consecutive failures tolerated before giving up
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
            max_retries: 10,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting { attempt: u32 },
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting { attempt: 0 } => write!(f, "Connecting..."),
            ConnectionState::Connecting { attempt } => {
                write!(f, "Reconnecting (attempt {})...", attempt + 1)
            }
            ConnectionState::Connected => write!(f, "Connected"),
        }
    }
}

/// Decision after a failed connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    After(Duration),
    GiveUp,
}

/// Tracks connection state and failed attempts
#[derive(Debug)]
pub struct Connection {
    state: ConnectionState,
    failures: u32,
    policy: BackoffPolicy,
}

impl Connection {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            failures: 0,
            policy,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Inputs may only submit while the socket is up
    pub fn can_submit(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn begin_connect(&mut self) {
        self.state = ConnectionState::Connecting {
            attempt: self.failures,
        };
    }

    pub fn connected(&mut self) {
        if self.failures > 0 {
            log::info!("Reconnected after {} failed attempt(s)", self.failures);
        }
        self.failures = 0;
        self.state = ConnectionState::Connected;
    }

    /// Record a failed attempt or a dropped connection
    pub fn failed(&mut self) -> Retry {
        self.state = ConnectionState::Disconnected;
        if self.failures >= self.policy.max_retries {
            log::error!("Giving up after {} failed attempts", self.failures);
            return Retry::GiveUp;
        }
        let delay = self.policy.delay_for(self.failures);
        self.failures += 1;
        Retry::After(delay)
    }

    /// Closed on purpose, no retry
    pub fn closed(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}

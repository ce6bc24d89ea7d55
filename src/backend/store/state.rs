//! Store connection state machine.
//!
//! `Disconnected -> Connecting -> Connected`, plus a retry counter for the
//! initial connection sequence. Transitions are pure so the retry policy can
//! be tested without a driver.

/// Phase of the process-wide store link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    Disconnected,
    Connecting,
    Connected,
}

/// What the manager should do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Initial-connect retry `attempt`, delayed by linear backoff
    Retry { attempt: u32 },
    /// The link was established before; retry on the fixed reconnect delay
    Reconnect,
    /// The initial-connect ceiling was exceeded
    Fatal { retries: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConnectionState {
    phase: StorePhase,
    retries: u32,
    established_once: bool,
}

impl StoreConnectionState {
    pub fn new() -> Self {
        Self {
            phase: StorePhase::Disconnected,
            retries: 0,
            established_once: false,
        }
    }

    pub fn phase(&self) -> StorePhase {
        self.phase
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn is_ready(&self) -> bool {
        self.phase == StorePhase::Connected
    }

    /// Enter `Connecting`. Returns false if an attempt is pointless because
    /// the link is already up or another attempt is in flight.
    pub fn begin_connect(&mut self) -> bool {
        match self.phase {
            StorePhase::Connected | StorePhase::Connecting => false,
            StorePhase::Disconnected => {
                self.phase = StorePhase::Connecting;
                true
            }
        }
    }

    pub fn on_connected(&mut self) {
        self.phase = StorePhase::Connected;
        self.retries = 0;
        self.established_once = true;
    }

    pub fn on_failure(&mut self, max_retries: u32) -> FailureOutcome {
        self.phase = StorePhase::Disconnected;

        if self.established_once {
            return FailureOutcome::Reconnect;
        }

        self.retries = self.retries.saturating_add(1);
        if self.retries <= max_retries {
            FailureOutcome::Retry {
                attempt: self.retries,
            }
        } else {
            FailureOutcome::Fatal {
                retries: max_retries,
            }
        }
    }

    /// Returns true if the link was up and is now down
    pub fn on_dropped(&mut self) -> bool {
        if self.phase == StorePhase::Connected {
            self.phase = StorePhase::Disconnected;
            true
        } else {
            false
        }
    }
}

impl Default for StoreConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

//! Per-deck position monitor
//!
//! A monitor is the deck's subscription to the host's frame ticks. While
//! running, each `DeckEngine::tick` samples the deck position, publishes it
//! and checks for the end of the track. At most one monitor runs per deck;
//! starting a running monitor or stopping an idle one is a no-op.

#[derive(Debug, Default, Clone)]
pub struct PositionMonitor {
    running: bool,
    /// Times the monitor went from idle to running
    runs: u64,
}

impl PositionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start monitoring; returns false if already running
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.runs += 1;
        true
    }

    /// Stop monitoring; returns false if not running
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }
}

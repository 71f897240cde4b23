//! Tunable knobs for the poll driver and repeater, with environment-variable
//! defaults.
//!
//! Mirrors `gvthread-runtime::config::SchedulerConfig`: a plain struct with
//! a `Default` impl, chainable builder setters, and a `validate`. Unlike the
//! teacher's scheduler config (which is supplied once at thread-pool
//! startup), these are read from the environment lazily the first time a
//! thread's `TimerCore`/`Repeater` is constructed, since nothing in this
//! crate has an explicit "start the runtime" call site to thread a config
//! argument through.

use timerloop_core::env_get;

/// Tuning for the per-thread [`crate::poll::PollDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollDriverConfig {
    /// Size of the `epoll_wait` event buffer — the maximum number of
    /// readiness events drained in a single [`crate::poll::PollDriver::wait`]
    /// call. Larger values reduce the chance of needing a second
    /// `epoll_wait` in one `run_once` under heavy fan-in, at the cost of a
    /// bigger stack buffer.
    pub max_events: usize,
}

impl Default for PollDriverConfig {
    fn default() -> Self {
        Self { max_events: 256 }
    }
}

impl PollDriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from `TIMERLOOP_POLL_MAX_EVENTS`, falling back to the default
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_events: env_get("TIMERLOOP_POLL_MAX_EVENTS", default.max_events),
        }
    }

    pub fn max_events(mut self, n: usize) -> Self {
        self.max_events = n;
        self
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_events == 0 {
            return Err("max_events must be at least 1");
        }
        Ok(())
    }
}

/// Tuning for [`crate::repeater::Repeater`]'s regime selection and stall
/// detection (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeaterConfig {
    /// Base tick period, in milliseconds, for the HighFreq regime (spec
    /// §9's resolved open question: fixed at 10ms rather than falling
    /// through to the MidFreq interval).
    pub high_freq_tick_ms: u64,
    /// Multiple of a regime's base interval that counts as a stall (spec
    /// §4.6's "more than 200ms" for the default 10ms HighFreq tick, i.e. a
    /// factor of 20).
    pub stall_factor: u64,
}

impl Default for RepeaterConfig {
    fn default() -> Self {
        Self {
            high_freq_tick_ms: 10,
            stall_factor: 20,
        }
    }
}

impl RepeaterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from `TIMERLOOP_REPEATER_HIGH_FREQ_TICK_MS` /
    /// `TIMERLOOP_REPEATER_STALL_FACTOR`, falling back to the defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            high_freq_tick_ms: env_get(
                "TIMERLOOP_REPEATER_HIGH_FREQ_TICK_MS",
                default.high_freq_tick_ms,
            ),
            stall_factor: env_get("TIMERLOOP_REPEATER_STALL_FACTOR", default.stall_factor),
        }
    }

    pub fn high_freq_tick_ms(mut self, ms: u64) -> Self {
        self.high_freq_tick_ms = ms;
        self
    }

    pub fn stall_factor(mut self, factor: u64) -> Self {
        self.stall_factor = factor;
        self
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.high_freq_tick_ms == 0 {
            return Err("high_freq_tick_ms must be at least 1");
        }
        if 1000 % self.high_freq_tick_ms != 0 {
            return Err("high_freq_tick_ms must evenly divide 1000");
        }
        if self.stall_factor == 0 {
            return Err("stall_factor must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_config_defaults_and_builder() {
        let cfg = PollDriverConfig::new().max_events(64);
        assert_eq!(cfg.max_events, 64);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_poll_config_rejects_zero_events() {
        let cfg = PollDriverConfig::new().max_events(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_repeater_config_defaults() {
        let cfg = RepeaterConfig::default();
        assert_eq!(cfg.high_freq_tick_ms, 10);
        assert_eq!(cfg.stall_factor, 20);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_repeater_config_rejects_non_divisor_tick() {
        let cfg = RepeaterConfig::default().high_freq_tick_ms(7);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_poll_config_from_env() {
        std::env::set_var("TIMERLOOP_POLL_MAX_EVENTS", "512");
        let cfg = PollDriverConfig::from_env();
        assert_eq!(cfg.max_events, 512);
        std::env::remove_var("TIMERLOOP_POLL_MAX_EVENTS");
    }
}

// ABOUTME: Timing and addressing configuration for the AT transaction engine
// ABOUTME: Defaults match what SIM800-class modems need to submit one SMS reliably

use std::time::Duration;

/// Configuration for a [`GsmModem`](crate::modem::GsmModem)
///
/// # Example
///
/// ```rust
/// use gsm_sms::modem::ModemConfig;
/// use std::time::Duration;
///
/// // Defaults: modem's own SMSC, 5s commands, 3s submit, 15s delivery
/// let config = ModemConfig::default();
///
/// // Deployed setup with an explicit service center and a patient network
/// let config = ModemConfig::new()
///     .with_smsc("+8613344181200")
///     .with_delivery_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModemConfig {
    /// Service center prefixed to every PDU (default: none, the modem's own)
    pub smsc: Option<String>,

    /// Budget for ordinary commands such as `AT+CMGF=0` (default: 5 seconds)
    pub command_timeout: Duration,

    /// Budget for `AT+CMGS=<n>` to produce the `>` prompt (default: 3 seconds)
    pub submit_timeout: Duration,

    /// Budget for the network to confirm a submitted PDU (default: 15 seconds)
    ///
    /// Delivery confirmation goes over the air and is much slower than local
    /// command handling.
    pub delivery_timeout: Duration,

    /// Pause between protocol steps so the modem can process (default: 500ms)
    pub settle_delay: Duration,

    /// Pause between input polls while waiting for a command reply (default: 100ms)
    pub poll_interval: Duration,

    /// Pause between input polls while waiting for delivery (default: 200ms)
    pub delivery_poll_interval: Duration,

    /// Extra wait after a terminator to catch trailing bytes (default: 50ms)
    pub grace_period: Duration,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            smsc: None,
            command_timeout: Duration::from_secs(5),
            submit_timeout: Duration::from_secs(3),
            delivery_timeout: Duration::from_secs(15),
            settle_delay: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
            delivery_poll_interval: Duration::from_millis(200),
            grace_period: Duration::from_millis(50),
        }
    }
}

impl ModemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service center number; an empty string means the modem default
    pub fn with_smsc(mut self, smsc: impl Into<String>) -> Self {
        let smsc = smsc.into();
        self.smsc = (!smsc.is_empty()).then_some(smsc);
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_delivery_poll_interval(mut self, interval: Duration) -> Self {
        self.delivery_poll_interval = interval;
        self
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }
}

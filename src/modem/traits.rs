// ABOUTME: Core modem traits using native async functions
// ABOUTME: Separates connection lifecycle, raw AT exchanges and SMS submission

use crate::modem::error::{ConnectionError, SmsError};
use std::time::Duration;

/// Connection lifecycle of a modem
pub trait ModemConnection {
    /// What identifies the modem to connect to
    type Endpoint;

    /// Open the channel to the modem
    ///
    /// Any previous connection is closed first. On failure the modem is left
    /// disconnected.
    async fn connect(&mut self, endpoint: &Self::Endpoint) -> Result<(), ConnectionError>;

    /// Close the channel
    ///
    /// Always safe to call, including when never connected.
    async fn disconnect(&mut self);

    /// Check if a channel is open
    fn is_connected(&self) -> bool;
}

/// Raw AT command exchange
pub trait AtCommander: ModemConnection {
    /// Send `command` (without CR) and wait up to `timeout` for the reply
    ///
    /// Returns `(success, trimmed_reply)`. Success means the reply contains
    /// `OK` or the `>` prompt. Not being connected, timing out, and transport
    /// faults all come back as `false` with a description instead of an error.
    async fn send_command(&mut self, command: &str, timeout: Duration) -> (bool, String);
}

/// SMS submission in PDU mode
pub trait SmsSender: AtCommander {
    /// Encode and submit one SMS
    ///
    /// Runs mode selection, `AT+CMGS`, payload and delivery confirmation once
    /// each; the first phase that fails ends the attempt. The connection stays
    /// usable afterwards.
    async fn send_sms(&mut self, destination: &str, text: &str) -> Result<(), SmsError>;
}

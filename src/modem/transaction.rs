// ABOUTME: Per-command working state and the timeout-bounded response accumulation loop
// ABOUTME: Frames modem replies by substring terminators, then classifies the lossily decoded text

use crate::transport::ModemPort;
use bytes::BytesMut;
use std::io;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Substrings that end a command reply early
pub const COMMAND_TERMINATORS: &[&str] = &["OK", "ERROR", ">"];

/// Substrings that make a command reply count as success
///
/// `ERROR` appearing next to either of these does not turn the reply into a
/// failure.
pub const COMMAND_SUCCESS: &[&str] = &["OK", ">"];

/// Substrings that end the wait for delivery confirmation
pub const DELIVERY_TERMINATORS: &[&str] = &["OK", "ERROR"];

/// Substrings that confirm delivery
pub const DELIVERY_SUCCESS: &[&str] = &["OK"];

/// Result of one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Success(String),
    Failure(String),
}

/// How to wait for a reply
#[derive(Debug, Clone, Copy)]
pub struct ReadPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Extra read after a terminator shows up, if any
    pub grace: Option<Duration>,
    pub terminators: &'static [&'static str],
}

/// Working state of a single AT exchange
///
/// Lives from the moment a command is issued until its outcome is known.
#[derive(Debug)]
pub struct AtTransaction {
    command: String,
    timeout: Duration,
    accumulated: BytesMut,
    outcome: Outcome,
}

impl AtTransaction {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
            accumulated: BytesMut::with_capacity(256),
            outcome: Outcome::Pending,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn accumulated(&self) -> &[u8] {
        &self.accumulated
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn absorb(&mut self, bytes: &[u8]) {
        self.accumulated.extend_from_slice(bytes);
    }

    /// True if any of `terminators` occurs in the raw bytes received so far
    pub fn has_terminator(&self, terminators: &[&str]) -> bool {
        terminators
            .iter()
            .any(|t| contains(&self.accumulated, t.as_bytes()))
    }

    /// The reply as ASCII text; other bytes are dropped, whitespace trimmed
    pub fn decoded(&self) -> String {
        let text: String = self
            .accumulated
            .iter()
            .filter(|b| b.is_ascii())
            .map(|&b| char::from(b))
            .collect();
        text.trim().to_string()
    }

    /// Settles the outcome from the decoded reply
    pub fn complete(&mut self, success: &[&str]) -> &Outcome {
        let text = self.decoded();
        self.outcome = if success.iter().any(|token| text.contains(token)) {
            Outcome::Success(text)
        } else {
            Outcome::Failure(text)
        };
        &self.outcome
    }

    /// Settles the outcome by searching the raw bytes for a success token
    ///
    /// Stray non-ASCII bytes inside a token break the match here, unlike
    /// [`complete`](Self::complete). The reply text is still the decoded one.
    pub fn complete_raw(&mut self, success: &[&str]) -> &Outcome {
        let text = self.decoded();
        self.outcome = if self.has_terminator(success) {
            Outcome::Success(text)
        } else {
            Outcome::Failure(text)
        };
        &self.outcome
    }

    /// Settles the outcome as a failure with `reason`, e.g. a transport fault
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.outcome = Outcome::Failure(reason.into());
    }

    /// `(success, text)`; a still pending exchange counts as failed
    pub fn into_reply(self) -> (bool, String) {
        match self.outcome {
            Outcome::Success(text) => (true, text),
            Outcome::Failure(text) => (false, text),
            Outcome::Pending => {
                let text = self.decoded();
                (false, text)
            }
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

/// Reads whatever is waiting on the port into the transaction.
async fn drain<P: ModemPort>(port: &mut P, txn: &mut AtTransaction) -> io::Result<usize> {
    let available = port.bytes_available().await?;
    if available == 0 {
        return Ok(0);
    }

    let mut buf = vec![0u8; available];
    let n = port.read(&mut buf).await?;
    txn.absorb(&buf[..n]);
    Ok(n)
}

/// Accumulates reply bytes until a terminator arrives or `policy.timeout` runs out.
///
/// Running out of time is not an error; the transaction keeps whatever was
/// received.
pub async fn accumulate<P: ModemPort>(
    port: &mut P,
    txn: &mut AtTransaction,
    policy: &ReadPolicy,
) -> io::Result<()> {
    let started = Instant::now();

    while started.elapsed() < policy.timeout {
        if drain(port, txn).await? > 0 && txn.has_terminator(policy.terminators) {
            if let Some(grace) = policy.grace {
                sleep(grace).await;
                drain(port, txn).await?;
            }
            return Ok(());
        }
        sleep(policy.poll_interval).await;
    }

    tracing::debug!(
        command = %txn.command,
        timeout_ms = policy.timeout.as_millis() as u64,
        received = txn.accumulated.len(),
        "Reply timed out"
    );
    Ok(())
}

/// Clears stale input, writes `command` plus CR, and accumulates the reply.
pub async fn exchange<P: ModemPort>(
    port: &mut P,
    txn: &mut AtTransaction,
    policy: &ReadPolicy,
) -> io::Result<()> {
    port.clear_inbound_buffer().await?;

    let mut line = Vec::with_capacity(txn.command.len() + 1);
    line.extend_from_slice(txn.command.as_bytes());
    line.push(b'\r');
    port.write(&line).await?;

    accumulate(port, txn, policy).await
}

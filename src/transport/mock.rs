// ABOUTME: Scripted modem port for deterministic tests and dry runs without hardware
// ABOUTME: Replies arrive on the tokio clock, so paused-time tests exercise real timeout paths

//! Mock modem port
//!
//! A [`MockScript`] lists the writes the engine is expected to make, in order,
//! and what the "modem" answers to each one. Opening the script yields a
//! [`MockPort`]. Reply chunks carry a delay measured from the write, which
//! makes slow network confirmations and silent modems easy to express.
//!
//! ```
//! use gsm_sms::transport::MockScript;
//! use std::time::Duration;
//!
//! let script = MockScript::new()
//!     .expect("AT\r", "\r\nOK\r\n")
//!     .expect_delayed("AT+CSQ\r", Duration::from_millis(300), "\r\n+CSQ: 21,99\r\n\r\nOK\r\n")
//!     .expect_silence("AT+CPIN?\r");
//! assert_eq!(script.remaining(), 3);
//! ```

use crate::transport::ModemPort;
use bytes::{Buf, BytesMut};
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum Reply {
    Chunks(Vec<(Duration, Vec<u8>)>),
    Fault(io::ErrorKind),
}

#[derive(Debug, Clone)]
struct Expectation {
    request: Vec<u8>,
    reply: Reply,
}

/// Ordered request/reply script for a [`MockPort`]
///
/// Cloning a script shares its write log, so a test can keep one copy and
/// inspect what the engine sent after handing the other to `connect`.
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    expectations: Vec<Expectation>,
    stale_input: Vec<u8>,
    unavailable: bool,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// A script whose port cannot be opened
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Answers `request` immediately with `reply`
    pub fn expect(self, request: impl AsRef<[u8]>, reply: impl AsRef<[u8]>) -> Self {
        self.expect_chunks(request, [(Duration::ZERO, reply)])
    }

    /// Answers `request` with `reply` after `delay`
    pub fn expect_delayed(
        self,
        request: impl AsRef<[u8]>,
        delay: Duration,
        reply: impl AsRef<[u8]>,
    ) -> Self {
        self.expect_chunks(request, [(delay, reply)])
    }

    /// Answers `request` with several chunks, each delayed from the write
    pub fn expect_chunks<R: AsRef<[u8]>>(
        mut self,
        request: impl AsRef<[u8]>,
        chunks: impl IntoIterator<Item = (Duration, R)>,
    ) -> Self {
        let chunks = chunks
            .into_iter()
            .map(|(delay, bytes)| (delay, bytes.as_ref().to_vec()))
            .collect();
        self.expectations.push(Expectation {
            request: request.as_ref().to_vec(),
            reply: Reply::Chunks(chunks),
        });
        self
    }

    /// Accepts `request` and never answers
    pub fn expect_silence(self, request: impl AsRef<[u8]>) -> Self {
        self.expect_chunks(request, std::iter::empty::<(Duration, Vec<u8>)>())
    }

    /// Fails the write of `request` with an I/O error of `kind`
    pub fn expect_fault(mut self, request: impl AsRef<[u8]>, kind: io::ErrorKind) -> Self {
        self.expectations.push(Expectation {
            request: request.as_ref().to_vec(),
            reply: Reply::Fault(kind),
        });
        self
    }

    /// Bytes already waiting in the input queue when the port opens
    pub fn with_stale_input(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.stale_input = bytes.as_ref().to_vec();
        self
    }

    /// Number of scripted exchanges
    pub fn remaining(&self) -> usize {
        self.expectations.len()
    }

    /// Every write made by ports opened from this script, in order
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Writes decoded lossily as text, convenient for asserting AT traffic
    pub fn sent_text(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }
}

impl fmt::Display for MockScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock({} exchanges)", self.expectations.len())
    }
}

/// A [`ModemPort`] that plays back a [`MockScript`]
#[derive(Debug)]
pub struct MockPort {
    expectations: VecDeque<Expectation>,
    // Reply chunks that have not "arrived" yet.
    scheduled: VecDeque<(Instant, Vec<u8>)>,
    inbound: BytesMut,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    open: bool,
}

impl MockPort {
    /// Moves every scheduled chunk whose time has come into the input queue.
    fn deliver_due(&mut self) {
        let now = Instant::now();
        while let Some((due, _)) = self.scheduled.front() {
            if *due > now {
                break;
            }
            if let Some((_, bytes)) = self.scheduled.pop_front() {
                self.inbound.extend_from_slice(&bytes);
            }
        }
    }

    fn check_open(&self) -> io::Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::NotConnected, "mock port closed"))
        }
    }

    /// Exchanges not yet consumed by writes
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }
}

impl ModemPort for MockPort {
    type Endpoint = MockScript;

    async fn open(script: &MockScript) -> io::Result<Self> {
        if script.unavailable {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "mock modem unavailable",
            ));
        }

        Ok(Self {
            expectations: script.expectations.iter().cloned().collect(),
            scheduled: VecDeque::new(),
            inbound: BytesMut::from(script.stale_input.as_slice()),
            sent: Arc::clone(&script.sent),
            open: true,
        })
    }

    async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.check_open()?;
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(data.to_vec());

        let expectation = self.expectations.pop_front().ok_or_else(|| {
            io::Error::other(format!(
                "no more expectations in mock port, got {:?}",
                String::from_utf8_lossy(data)
            ))
        })?;

        if data != expectation.request.as_slice() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "unexpected write: expected {:?}, got {:?}",
                    String::from_utf8_lossy(&expectation.request),
                    String::from_utf8_lossy(data)
                ),
            ));
        }

        match expectation.reply {
            Reply::Fault(kind) => Err(io::Error::new(kind, "scripted transport fault")),
            Reply::Chunks(chunks) => {
                let written_at = Instant::now();
                let mut chunks: Vec<_> = chunks
                    .into_iter()
                    .map(|(delay, bytes)| (written_at + delay, bytes))
                    .collect();
                chunks.sort_by_key(|(due, _)| *due);
                self.scheduled.extend(chunks);
                Ok(())
            }
        }
    }

    async fn bytes_available(&mut self) -> io::Result<usize> {
        self.check_open()?;
        self.deliver_due();
        Ok(self.inbound.len())
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_open()?;
        self.deliver_due();
        let n = buf.len().min(self.inbound.len());
        buf[..n].copy_from_slice(&self.inbound[..n]);
        self.inbound.advance(n);
        Ok(n)
    }

    async fn clear_inbound_buffer(&mut self) -> io::Result<()> {
        self.check_open()?;
        self.deliver_due();
        self.inbound.clear();
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        self.open = false;
        self.scheduled.clear();
        self.inbound.clear();
        Ok(())
    }
}

// ABOUTME: Byte-stream capability consumed by the AT transaction engine
// ABOUTME: Serial, TCP-serial bridge and scripted mock implementations share one pollable trait

//! Modem transports
//!
//! The engine never talks to a serial port directly. It drives a
//! [`ModemPort`], a pollable duplex channel shaped like a UART driver:
//! write bytes, ask how many bytes are waiting, read them, discard stale
//! input. This keeps response framing in the engine and lets the same
//! code run against:
//!
//! * [`SerialModemPort`] - a USB or RS-232 serial device via `tokio-serial`
//! * [`TcpModemPort`] - a TCP-serial bridge (ser2net and similar)
//! * [`MockPort`] - a scripted modem for tests and dry runs

pub mod mock;
pub mod serial;
pub mod tcp;

pub use mock::{MockPort, MockScript};
pub use serial::{SerialEndpoint, SerialModemPort};
pub use tcp::TcpModemPort;

use std::fmt;
use std::io;

/// Pollable byte channel to a GSM modem
///
/// Uses native async functions in traits. Implementations must not block in
/// [`bytes_available`](Self::bytes_available) or [`read`](Self::read) when no
/// data is waiting; the engine polls them on its own schedule.
pub trait ModemPort: Sized {
    /// What identifies the channel to open (device path, socket address, script)
    type Endpoint: fmt::Display;

    /// Opens the channel
    async fn open(endpoint: &Self::Endpoint) -> io::Result<Self>;

    /// Writes all of `data` and flushes it
    async fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Number of inbound bytes that can be read without waiting
    async fn bytes_available(&mut self) -> io::Result<usize>;

    /// Reads up to `buf.len()` waiting bytes, returning how many were copied
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Discards any inbound bytes received so far
    async fn clear_inbound_buffer(&mut self) -> io::Result<()>;

    /// Flushes and releases the channel
    async fn close(&mut self) -> io::Result<()>;
}

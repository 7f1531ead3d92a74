// ABOUTME: Serial port transport for GSM modems using tokio-serial
// ABOUTME: Opens 8N1 without flow control and exposes the driver's input queue for polling

use crate::transport::ModemPort;
use std::fmt;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream,
    StopBits,
};

/// Device path and baud rate of a serial modem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialEndpoint {
    /// e.g. `/dev/ttyUSB0` on Linux, `COM8` on Windows
    pub path: String,
    pub baud_rate: u32,
}

impl SerialEndpoint {
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
        }
    }
}

impl fmt::Display for SerialEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path, self.baud_rate)
    }
}

/// A GSM modem attached to a serial port
pub struct SerialModemPort {
    stream: SerialStream,
    path: String,
}

impl SerialModemPort {
    /// Name of the underlying device
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ModemPort for SerialModemPort {
    type Endpoint = SerialEndpoint;

    async fn open(endpoint: &SerialEndpoint) -> io::Result<Self> {
        tracing::debug!(
            port = %endpoint.path,
            baud_rate = endpoint.baud_rate,
            "Opening serial port"
        );

        let stream = tokio_serial::new(&endpoint.path, endpoint.baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %endpoint.path, error = %e, "Failed to open serial port");
                io::Error::from(e)
            })?;

        tracing::info!(port = %endpoint.path, baud_rate = endpoint.baud_rate, "Serial port opened");

        Ok(Self {
            stream,
            path: endpoint.path.clone(),
        })
    }

    async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        tracing::trace!(port = %self.path, bytes = data.len(), data = ?data, "Sending data");
        AsyncWriteExt::write_all(&mut self.stream, data).await?;
        AsyncWriteExt::flush(&mut self.stream).await
    }

    async fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(SerialPort::bytes_to_read(&self.stream)? as usize)
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = AsyncReadExt::read(&mut self.stream, buf).await?;
        tracing::trace!(port = %self.path, bytes = n, data = ?&buf[..n], "Received data");
        Ok(n)
    }

    async fn clear_inbound_buffer(&mut self) -> io::Result<()> {
        SerialPort::clear(&self.stream, ClearBuffer::Input)?;
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        tracing::debug!(port = %self.path, "Closing serial port");
        AsyncWriteExt::flush(&mut self.stream).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_display() {
        let endpoint = SerialEndpoint::new("/dev/ttyUSB0", 115_200);
        assert_eq!(endpoint.to_string(), "/dev/ttyUSB0@115200");
    }

    #[tokio::test]
    async fn test_open_missing_device_fails() {
        let endpoint = SerialEndpoint::new("/dev/this-modem-does-not-exist", 115_200);
        assert!(SerialModemPort::open(&endpoint).await.is_err());
    }
}

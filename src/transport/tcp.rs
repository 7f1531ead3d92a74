// ABOUTME: TCP transport for modems exposed through a serial-to-network bridge
// ABOUTME: Stages socket reads in a buffer so the engine can poll it like a UART input queue

use crate::transport::ModemPort;
use bytes::{Buf, BytesMut};
use std::io;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// A GSM modem reached through a TCP-serial bridge such as ser2net
#[derive(Debug)]
pub struct TcpModemPort {
    stream: TcpStream,
    // Bytes pulled off the socket but not yet handed to the engine.
    inbound: BytesMut,
    peer: String,
    closed_by_peer: bool,
}

impl TcpModemPort {
    /// Moves whatever the socket has ready into `inbound` without waiting.
    fn fill(&mut self) -> io::Result<()> {
        if self.closed_by_peer {
            return Ok(());
        }
        loop {
            match self.stream.try_read_buf(&mut self.inbound) {
                Ok(0) => {
                    tracing::warn!(peer = %self.peer, "Bridge closed the connection");
                    self.closed_by_peer = true;
                    return Ok(());
                }
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    fn check_open(&self) -> io::Result<()> {
        if self.closed_by_peer && self.inbound.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by bridge",
            ));
        }
        Ok(())
    }
}

impl ModemPort for TcpModemPort {
    /// `host:port` of the bridge
    type Endpoint = String;

    async fn open(endpoint: &String) -> io::Result<Self> {
        tracing::debug!(peer = %endpoint, "Connecting to serial bridge");
        let stream = TcpStream::connect(endpoint.as_str()).await?;
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            inbound: BytesMut::with_capacity(4 * 1024),
            peer: endpoint.clone(),
            closed_by_peer: false,
        })
    }

    async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        if self.closed_by_peer {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "connection closed by bridge",
            ));
        }
        self.stream.write_all(data).await?;
        self.stream.flush().await
    }

    async fn bytes_available(&mut self) -> io::Result<usize> {
        self.fill()?;
        self.check_open()?;
        Ok(self.inbound.len())
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fill()?;
        self.check_open()?;
        let n = buf.len().min(self.inbound.len());
        buf[..n].copy_from_slice(&self.inbound[..n]);
        self.inbound.advance(n);
        Ok(n)
    }

    async fn clear_inbound_buffer(&mut self) -> io::Result<()> {
        self.fill()?;
        self.inbound.clear();
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        tracing::debug!(peer = %self.peer, "Closing serial bridge connection");
        self.stream.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn wait_for_bytes(port: &mut TcpModemPort, want: usize) -> usize {
        for _ in 0..100 {
            let available = port.bytes_available().await.unwrap();
            if available >= want {
                return available;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        port.bytes_available().await.unwrap()
    }

    #[tokio::test]
    async fn test_tcp_port_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let bridge = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut command = [0u8; 3];
            socket.read_exact(&mut command).await.unwrap();
            assert_eq!(&command, b"AT\r");
            socket.write_all(b"\r\nOK\r\n").await.unwrap();
            socket
        });

        let mut port = TcpModemPort::open(&addr).await.unwrap();
        assert_eq!(port.bytes_available().await.unwrap(), 0);
        port.write(b"AT\r").await.unwrap();

        assert_eq!(wait_for_bytes(&mut port, 6).await, 6);
        let mut buf = [0u8; 4];
        assert_eq!(port.read(&mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"\r\nOK");
        assert_eq!(port.bytes_available().await.unwrap(), 2);

        port.clear_inbound_buffer().await.unwrap();
        assert_eq!(port.bytes_available().await.unwrap(), 0);

        let _socket = bridge.await.unwrap();
        port.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_tcp_port_reports_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let bridge = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let mut port = TcpModemPort::open(&addr).await.unwrap();
        bridge.await.unwrap();

        let mut result = Ok(0);
        for _ in 0..100 {
            result = port.bytes_available().await;
            if result.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(result.is_err());
        assert!(port.write(b"AT\r").await.is_err());
    }

    #[tokio::test]
    async fn test_tcp_port_open_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        assert!(TcpModemPort::open(&addr).await.is_err());
    }
}

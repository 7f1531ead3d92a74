// ABOUTME: Convenience constructors that create and connect a modem in one step
// ABOUTME: Mirrors the quick-start path most callers want: open a port, then send

use crate::modem::config::ModemConfig;
use crate::modem::default::GsmModem;
use crate::modem::error::ConnectionError;
use crate::modem::traits::ModemConnection;
use crate::transport::{ModemPort, SerialEndpoint, SerialModemPort, TcpModemPort};

/// Factory for connected [`GsmModem`]s
pub struct ModemBuilder;

impl ModemBuilder {
    /// Connect to a modem on a serial device
    pub async fn serial(
        path: impl Into<String>,
        baud_rate: u32,
        config: ModemConfig,
    ) -> Result<GsmModem<SerialModemPort>, ConnectionError> {
        Self::connect(&SerialEndpoint::new(path, baud_rate), config).await
    }

    /// Connect to a modem behind a TCP-serial bridge at `host:port`
    pub async fn tcp(
        addr: impl Into<String>,
        config: ModemConfig,
    ) -> Result<GsmModem<TcpModemPort>, ConnectionError> {
        Self::connect(&addr.into(), config).await
    }

    /// Connect over any transport
    pub async fn connect<P: ModemPort>(
        endpoint: &P::Endpoint,
        config: ModemConfig,
    ) -> Result<GsmModem<P>, ConnectionError> {
        let mut modem = GsmModem::new(config);
        modem.connect(endpoint).await?;
        Ok(modem)
    }
}

/// Convenience functions with default configuration
impl ModemBuilder {
    /// Serial modem with default timeouts and the modem's own SMSC
    pub async fn quick_serial(
        path: impl Into<String>,
        baud_rate: u32,
    ) -> Result<GsmModem<SerialModemPort>, ConnectionError> {
        Self::serial(path, baud_rate, ModemConfig::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockPort, MockScript};

    #[tokio::test]
    async fn test_connect_generic_transport() {
        let modem = ModemBuilder::connect::<MockPort>(&MockScript::new(), ModemConfig::default())
            .await
            .unwrap();
        assert!(modem.is_connected());
    }

    #[tokio::test]
    async fn test_connect_failure_names_endpoint() {
        let err = ModemBuilder::quick_serial("/dev/this-modem-does-not-exist", 115_200)
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("/dev/this-modem-does-not-exist@115200"));
    }
}

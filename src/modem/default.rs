// ABOUTME: Default modem implementation driving AT transactions over any ModemPort
// ABOUTME: Implements the SMS submission sequence plus the status queries run before it

use crate::modem::config::ModemConfig;
use crate::modem::error::{ConnectionError, ProbeError, SmsError};
use crate::modem::status::SignalQuality;
use crate::modem::traits::{AtCommander, ModemConnection, SmsSender};
use crate::modem::transaction::{
    AtTransaction, COMMAND_SUCCESS, COMMAND_TERMINATORS, DELIVERY_SUCCESS, DELIVERY_TERMINATORS,
    ReadPolicy, accumulate, exchange,
};
use crate::pdu::{EncodedPdu, PduMessage};
use crate::transport::ModemPort;
use std::time::Duration;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

/// Reply text of any exchange attempted without a connection
pub const NOT_CONNECTED: &str = "not connected";

/// Terminates the PDU payload after `AT+CMGS`
pub const CTRL_Z: u8 = 0x1A;

/// GSM modem driven over a [`ModemPort`]
///
/// Owns the port exclusively; every operation takes `&mut self`, so there is
/// never more than one command in flight. All logging happens inside the span
/// given at construction.
pub struct GsmModem<P: ModemPort> {
    port: Option<P>,
    config: ModemConfig,
    span: Span,
}

impl<P: ModemPort> GsmModem<P> {
    /// Create a disconnected modem logging under a `gsm_modem` span
    pub fn new(config: ModemConfig) -> Self {
        let span = info_span!("gsm_modem", endpoint = tracing::field::Empty);
        Self::with_span(config, span)
    }

    /// Create a disconnected modem logging under the caller's span
    ///
    /// If the span declares an `endpoint` field it is filled in on connect.
    pub fn with_span(config: ModemConfig, span: Span) -> Self {
        Self {
            port: None,
            config,
            span,
        }
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Liveness check with `AT`
    pub async fn probe(&mut self) -> Result<(), ProbeError> {
        let (ok, response) = self.send_command("AT", self.config.command_timeout).await;
        if !ok {
            return Err(ProbeError::Unresponsive(response));
        }
        Ok(())
    }

    /// SIM check with `AT+CPIN?`, which must report `READY`
    pub async fn check_sim(&mut self) -> Result<(), ProbeError> {
        let (ok, response) = self
            .send_command("AT+CPIN?", self.config.command_timeout)
            .await;
        if !ok || !response.contains("READY") {
            return Err(ProbeError::SimNotReady(response));
        }
        Ok(())
    }

    /// Signal quality with `AT+CSQ`
    pub async fn signal_quality(&mut self) -> Result<SignalQuality, ProbeError> {
        let (ok, response) = self.send_command("AT+CSQ", self.config.command_timeout).await;
        if !ok {
            return Err(ProbeError::UnparseableSignal(response));
        }
        SignalQuality::parse(&response).ok_or(ProbeError::UnparseableSignal(response))
    }

    /// Writes the PDU and Ctrl-Z, then waits for the network to confirm.
    async fn submit_payload(&mut self, pdu: &EncodedPdu) -> (bool, String) {
        let Some(port) = self.port.as_mut() else {
            return (false, NOT_CONNECTED.to_string());
        };

        let mut txn = AtTransaction::new(pdu.hex.as_str(), self.config.delivery_timeout);
        let policy = ReadPolicy {
            timeout: self.config.delivery_timeout,
            poll_interval: self.config.delivery_poll_interval,
            grace: None,
            terminators: DELIVERY_TERMINATORS,
        };

        let mut payload = Vec::with_capacity(pdu.hex.len() + 1);
        payload.extend_from_slice(pdu.hex.as_bytes());
        payload.push(CTRL_Z);

        let result = match port.write(&payload).await {
            Ok(()) => accumulate(port, &mut txn, &policy).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                txn.complete_raw(DELIVERY_SUCCESS);
            }
            Err(e) => {
                error!(error = %e, "Transport fault while submitting PDU");
                txn.fail(e.to_string());
            }
        }

        debug!(raw = ?String::from_utf8_lossy(txn.accumulated()), "Payload response");
        txn.into_reply()
    }
}

impl<P: ModemPort> ModemConnection for GsmModem<P> {
    type Endpoint = P::Endpoint;

    async fn connect(&mut self, endpoint: &P::Endpoint) -> Result<(), ConnectionError> {
        self.disconnect().await;

        let span = self.span.clone();
        span.record("endpoint", tracing::field::display(endpoint));

        async {
            match P::open(endpoint).await {
                Ok(port) => {
                    self.port = Some(port);
                    info!("Modem connected");
                    Ok(())
                }
                Err(source) => {
                    error!(error = %source, "Modem connection failed");
                    Err(ConnectionError::Open {
                        endpoint: endpoint.to_string(),
                        source,
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn disconnect(&mut self) {
        let Some(mut port) = self.port.take() else {
            return;
        };

        let span = self.span.clone();
        async {
            if let Err(e) = port.close().await {
                warn!(error = %e, "Error while closing modem port (continuing anyway)");
            }
            info!("Modem disconnected");
        }
        .instrument(span)
        .await
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

impl<P: ModemPort> AtCommander for GsmModem<P> {
    async fn send_command(&mut self, command: &str, timeout: Duration) -> (bool, String) {
        let policy = ReadPolicy {
            timeout,
            poll_interval: self.config.poll_interval,
            grace: Some(self.config.grace_period),
            terminators: COMMAND_TERMINATORS,
        };

        let span = self.span.clone();
        async {
            let Some(port) = self.port.as_mut() else {
                warn!(command, "AT command issued while not connected");
                return (false, NOT_CONNECTED.to_string());
            };

            info!(command, "Sending AT command");
            let mut txn = AtTransaction::new(command, timeout);
            match exchange(port, &mut txn, &policy).await {
                Ok(()) => {
                    txn.complete(COMMAND_SUCCESS);
                }
                Err(e) => {
                    error!(command, error = %e, "Transport fault during AT command");
                    txn.fail(e.to_string());
                }
            }

            debug!(
                command,
                raw = ?String::from_utf8_lossy(txn.accumulated()),
                outcome = ?txn.outcome(),
                "AT command response"
            );
            txn.into_reply()
        }
        .instrument(span)
        .await
    }
}

impl<P: ModemPort> SmsSender for GsmModem<P> {
    async fn send_sms(&mut self, destination: &str, text: &str) -> Result<(), SmsError> {
        let span = self.span.clone();
        async {
            info!(destination, chars = text.chars().count(), "Preparing SMS");

            let pdu = PduMessage::new(self.config.smsc.as_deref(), destination, text)?.encode()?;
            debug!(pdu = %pdu.hex, submit_length = pdu.submit_length, "Encoded PDU");

            info!("Selecting PDU mode (AT+CMGF=0)");
            let (ok, response) = self
                .send_command("AT+CMGF=0", self.config.command_timeout)
                .await;
            if !ok {
                warn!(response = %response, "PDU mode selection rejected");
                return Err(SmsError::ModeSelectRejected(response));
            }
            tokio::time::sleep(self.config.settle_delay).await;

            let command = format!("AT+CMGS={}", pdu.submit_length);
            info!(command = %command, "Starting submit");
            let (ok, response) = self
                .send_command(&command, self.config.submit_timeout)
                .await;
            if !ok || !response.contains('>') {
                error!(response = %response, "AT+CMGS rejected");
                return Err(SmsError::SubmitRejected(response));
            }
            tokio::time::sleep(self.config.settle_delay).await;

            info!("Sending PDU payload and waiting for delivery confirmation");
            let (ok, response) = self.submit_payload(&pdu).await;
            if !ok {
                error!(response = %response, "Delivery not confirmed");
                return Err(SmsError::DeliveryNotConfirmed(response));
            }

            info!(destination, "SMS sent");
            Ok::<(), SmsError>(())
        }
        .instrument(span)
        .await
    }
}

impl<P: ModemPort> Drop for GsmModem<P> {
    fn drop(&mut self) {
        if self.port.is_some() {
            // Dropping the port closes it.
            let _enter = self.span.enter();
            debug!("GsmModem dropped while connected, closing port");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockPort, MockScript};
    use std::io;

    async fn connected(script: &MockScript) -> GsmModem<MockPort> {
        let mut modem = GsmModem::new(ModemConfig::default());
        modem.connect(script).await.unwrap();
        modem
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_command_ok() {
        let script = MockScript::new().expect("AT\r", "OK\r\n");
        let mut modem = connected(&script).await;

        let reply = modem.send_command("AT", Duration::from_secs(5)).await;
        assert_eq!(reply, (true, "OK".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_command_silence_times_out() {
        let script = MockScript::new().expect_silence("AT\r");
        let mut modem = connected(&script).await;

        let started = tokio::time::Instant::now();
        let reply = modem.send_command("AT", Duration::from_secs(2)).await;
        assert_eq!(reply, (false, String::new()));
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_command_error() {
        let script = MockScript::new().expect("AT+CPIN?\r", "ERROR");
        let mut modem = connected(&script).await;

        let reply = modem.send_command("AT+CPIN?", Duration::from_secs(5)).await;
        assert_eq!(reply, (false, "ERROR".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_command_not_connected_touches_nothing() {
        let mut modem: GsmModem<MockPort> = GsmModem::new(ModemConfig::default());
        let reply = modem.send_command("AT", Duration::from_secs(5)).await;
        assert_eq!(reply, (false, NOT_CONNECTED.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_fault_is_reported_not_raised() {
        let script = MockScript::new()
            .expect_fault("AT\r", io::ErrorKind::BrokenPipe)
            .expect("AT\r", "OK");
        let mut modem = connected(&script).await;

        let (ok, text) = modem.send_command("AT", Duration::from_secs(5)).await;
        assert!(!ok);
        assert!(text.contains("scripted transport fault"));

        // The connection is not poisoned
        assert!(modem.is_connected());
        assert_eq!(
            modem.send_command("AT", Duration::from_secs(5)).await,
            (true, "OK".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_connect_leaves_modem_disconnected() {
        let mut modem: GsmModem<MockPort> = GsmModem::new(ModemConfig::default());
        let err = modem.connect(&MockScript::unavailable()).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Open { .. }));
        assert!(!modem.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_is_idempotent() {
        let mut modem: GsmModem<MockPort> = GsmModem::new(ModemConfig::default());
        modem.disconnect().await;
        assert!(!modem.is_connected());

        modem.connect(&MockScript::new()).await.unwrap();
        assert!(modem.is_connected());
        modem.disconnect().await;
        modem.disconnect().await;
        assert!(!modem.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_and_sim_check() {
        let script = MockScript::new()
            .expect("AT\r", "\r\nOK\r\n")
            .expect("AT+CPIN?\r", "\r\n+CPIN: READY\r\n\r\nOK\r\n")
            .expect("AT+CPIN?\r", "\r\n+CPIN: SIM PIN\r\n\r\nOK\r\n");
        let mut modem = connected(&script).await;

        modem.probe().await.unwrap();
        modem.check_sim().await.unwrap();
        assert!(matches!(
            modem.check_sim().await,
            Err(ProbeError::SimNotReady(response)) if response.contains("SIM PIN")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_unresponsive() {
        let script = MockScript::new().expect_silence("AT\r");
        let mut modem = connected(&script).await;
        assert_eq!(modem.probe().await, Err(ProbeError::Unresponsive(String::new())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_quality() {
        let script = MockScript::new()
            .expect("AT+CSQ\r", "\r\n+CSQ: 18,0\r\n\r\nOK\r\n")
            .expect("AT+CSQ\r", "\r\nOK\r\n");
        let mut modem = connected(&script).await;

        let quality = modem.signal_quality().await.unwrap();
        assert_eq!(quality, SignalQuality { rssi: 18, ber: 0 });
        assert!(matches!(
            modem.signal_quality().await,
            Err(ProbeError::UnparseableSignal(_))
        ));
    }
}

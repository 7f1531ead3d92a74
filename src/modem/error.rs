// ABOUTME: Modem error types naming the exact phase of an exchange that failed
// ABOUTME: Raw modem text is carried along wherever the modem produced any

use crate::pdu::EncodingError;
use std::io;
use thiserror::Error;

/// Failure to open the connection to the modem
///
/// Fatal for the current attempt; the modem is left disconnected.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to open {endpoint}: {source}")]
    Open {
        endpoint: String,
        #[source]
        source: io::Error,
    },
}

/// Failure of one SMS submission, qualified by protocol phase
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmsError {
    /// The message could not be encoded; nothing was sent
    #[error("Encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    /// `AT+CMGF=0` was not acknowledged
    #[error("PDU mode selection rejected: {0:?}")]
    ModeSelectRejected(String),

    /// `AT+CMGS` did not produce the `>` data prompt
    #[error("Submit rejected: {0:?}")]
    SubmitRejected(String),

    /// No `OK` arrived after the PDU payload
    #[error("Delivery not confirmed: {0:?}")]
    DeliveryNotConfirmed(String),
}

/// Failure of a status query issued before sending
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// `AT` was not answered with `OK`
    #[error("Modem not responding: {0:?}")]
    Unresponsive(String),

    /// `AT+CPIN?` did not report `READY`
    #[error("SIM not ready: {0:?}")]
    SimNotReady(String),

    /// `AT+CSQ` did not return a `+CSQ: <rssi>,<ber>` line
    #[error("Unparseable signal quality response: {0:?}")]
    UnparseableSignal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_phase() {
        assert_eq!(
            SmsError::SubmitRejected("ERROR".into()).to_string(),
            "Submit rejected: \"ERROR\""
        );
        assert_eq!(
            SmsError::from(EncodingError::EmptyAddress).to_string(),
            "Encoding failed: Phone number must not be empty"
        );
    }

    #[test]
    fn test_connection_error_keeps_source() {
        let err = ConnectionError::Open {
            endpoint: "COM8@115200".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such port"),
        };
        assert_eq!(err.to_string(), "Failed to open COM8@115200: no such port");
        assert!(std::error::Error::source(&err).is_some());
    }
}

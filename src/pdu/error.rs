// ABOUTME: Error types for PDU encoding, raised before anything touches the modem
// ABOUTME: Every variant describes input the caller has to fix, never a transport condition

use thiserror::Error;

/// Errors produced while building or inspecting an SMS-SUBMIT PDU
///
/// These are structural: no partial PDU is ever handed to the transport when
/// one of them is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The phone number was empty (or only a `+` sign)
    #[error("Phone number must not be empty")]
    EmptyAddress,

    /// The UCS2 encoded message does not fit in a single user data length octet
    #[error("Message too long: {0} bytes of UCS2 data (maximum 255)")]
    MessageTooLong(usize),

    /// The phone number contained something other than digits after the prefix
    #[error("Invalid character {0:?} in phone number")]
    InvalidDigit(char),

    /// More significant digits than a GSM 03.40 address field can carry
    #[error("Phone number has {0} digits (maximum 20)")]
    AddressTooLong(usize),

    /// A hex PDU string could not be interpreted
    #[error("Malformed PDU: {0}")]
    MalformedPdu(String),
}

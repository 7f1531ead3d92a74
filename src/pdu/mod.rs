// ABOUTME: GSM 03.40 SMS-SUBMIT PDU codec for modems operating in PDU mode (AT+CMGF=0)
// ABOUTME: Pure and stateless: phone numbers and text in, uppercase hex octets and submit length out

//! PDU Codec
//!
//! Encodes an SMS into the hexadecimal PDU string a GSM modem expects after
//! `AT+CMGS=<n>`. The layout produced is:
//!
//! ```text
//! SMSC | 11 | 00 | DA | 00 | 08 | AA | UDL | UD
//! ```
//!
//! * **SMSC** - service center block, `00` for the modem default
//! * **11** - SMS-SUBMIT, relative validity period present
//! * **00** - message reference
//! * **DA** - destination address (digit count, type of address, semi-octets)
//! * **00 / 08** - protocol identifier, UCS2 data coding scheme
//! * **AA** - validity period, four days
//! * **UDL / UD** - user data length in bytes, UTF-16BE user data
//!
//! ```
//! use gsm_sms::pdu::{encode_pdu, submit_length_of};
//!
//! let pdu = encode_pdu(Some("+8613344181200"), "+8613800000000", "OK")?;
//! assert_eq!(submit_length_of(&pdu.hex)?, pdu.submit_length);
//! # Ok::<(), gsm_sms::pdu::EncodingError>(())
//! ```

pub mod address;
pub mod error;
pub mod submit;
pub mod user_data;

pub use address::{PhoneNumber, TypeOfAddress, decode_address, encode_address, encode_smsc};
pub use error::EncodingError;
pub use submit::{EncodedPdu, PduMessage, encode_pdu, submit_length_of};
pub use user_data::encode_user_data;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Renders octets as uppercase hex, two characters per octet
pub fn to_hex(octets: &[u8]) -> String {
    let mut hex = String::with_capacity(octets.len() * 2);
    for octet in octets {
        hex.push(char::from(HEX_DIGITS[(octet >> 4) as usize]));
        hex.push(char::from(HEX_DIGITS[(octet & 0x0F) as usize]));
    }
    hex
}

/// Parses a hex string (either case) into octets
pub fn from_hex(hex: &str) -> Result<Vec<u8>, EncodingError> {
    if hex.len() % 2 != 0 {
        return Err(EncodingError::MalformedPdu(format!(
            "odd number of hex digits ({})",
            hex.len()
        )));
    }

    hex.as_bytes()
        .chunks(2)
        .map(|pair| match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(high), Some(low)) => Ok((high << 4) | low),
            _ => Err(EncodingError::MalformedPdu(format!(
                "invalid hex octet {:?}",
                String::from_utf8_lossy(pair)
            ))),
        })
        .collect()
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|value| value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex_is_uppercase() {
        assert_eq!(to_hex(&[0x00, 0x0b, 0xf0, 0xaa]), "000BF0AA");
    }

    #[test]
    fn test_from_hex_accepts_lowercase() {
        assert_eq!(from_hex("0bF0").unwrap(), vec![0x0B, 0xF0]);
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(from_hex("0").is_err());
        assert!(from_hex("G0").is_err());
        assert!(from_hex("+1").is_err());
    }
}

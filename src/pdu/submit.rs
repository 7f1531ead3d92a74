// ABOUTME: SMS-SUBMIT PDU assembly and the AT+CMGS length calculation
// ABOUTME: Combines the SMSC block, address field and UCS2 user data into the hex string sent to the modem

use crate::pdu::address::{PhoneNumber, put_address, put_smsc};
use crate::pdu::error::EncodingError;
use crate::pdu::user_data::{DCS_UCS2, encode_user_data};
use crate::pdu::{from_hex, to_hex};
use bytes::{BufMut, BytesMut};

/// First octet: SMS-SUBMIT with a relative validity period
pub const PDU_TYPE_SUBMIT: u8 = 0x11;

/// Message reference, left for the modem to assign
pub const MESSAGE_REFERENCE: u8 = 0x00;

/// Protocol identifier for plain short messages
pub const PROTOCOL_ID: u8 = 0x00;

/// Relative validity period of four days
pub const VALIDITY_PERIOD: u8 = 0xAA;

/// One SMS to be encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PduMessage {
    pub smsc: Option<PhoneNumber>,
    pub destination: PhoneNumber,
    pub text: String,
}

impl PduMessage {
    /// Validates the numbers and builds a message
    ///
    /// An empty SMSC string is the same as no SMSC.
    pub fn new(
        smsc: Option<&str>,
        destination: &str,
        text: impl Into<String>,
    ) -> Result<Self, EncodingError> {
        let smsc = match smsc {
            Some(number) if !number.is_empty() => Some(PhoneNumber::parse(number)?),
            _ => None,
        };

        let destination = PhoneNumber::parse(destination)?;
        // A bare "+86" leaves nothing to address
        if destination.address_digits().is_empty() {
            return Err(EncodingError::EmptyAddress);
        }

        Ok(Self {
            smsc,
            destination,
            text: text.into(),
        })
    }

    /// Produces the hex PDU and its submit length
    pub fn encode(&self) -> Result<EncodedPdu, EncodingError> {
        let user_data = encode_user_data(&self.text)?;

        let mut buf = BytesMut::with_capacity(32 + user_data.len());
        put_smsc(&mut buf, self.smsc.as_ref());
        buf.put_u8(PDU_TYPE_SUBMIT);
        buf.put_u8(MESSAGE_REFERENCE);
        put_address(&mut buf, &self.destination)?;
        buf.put_u8(PROTOCOL_ID);
        buf.put_u8(DCS_UCS2);
        buf.put_u8(VALIDITY_PERIOD);
        buf.put_u8(user_data.len() as u8);
        buf.put(user_data);

        let hex = to_hex(&buf);
        let submit_length = submit_length_of(&hex)?;
        Ok(EncodedPdu { hex, submit_length })
    }
}

/// An encoded PDU ready to follow `AT+CMGS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPdu {
    /// Uppercase hexadecimal, always of even length
    pub hex: String,
    /// Octets after the SMSC block; the `AT+CMGS` parameter
    pub submit_length: u32,
}

impl EncodedPdu {
    /// Number of octets the hex string represents, SMSC block included
    pub fn octet_len(&self) -> usize {
        self.hex.len() / 2
    }
}

/// Encodes one message in a single call
///
/// ```
/// use gsm_sms::pdu::encode_pdu;
///
/// let pdu = encode_pdu(Some("+8613344181200"), "17712689742", "Hi").unwrap();
/// assert_eq!(pdu.hex, "0891683143141802F011000B817117629847F20008AA0400480069");
/// assert_eq!(pdu.submit_length, 18);
/// ```
pub fn encode_pdu(
    smsc: Option<&str>,
    destination: &str,
    text: &str,
) -> Result<EncodedPdu, EncodingError> {
    PduMessage::new(smsc, destination, text)?.encode()
}

/// Computes the `AT+CMGS` length: total octets minus the SMSC block
pub fn submit_length_of(hex: &str) -> Result<u32, EncodingError> {
    let octets = from_hex(hex)?;
    let smsc_len = *octets
        .first()
        .ok_or_else(|| EncodingError::MalformedPdu("empty PDU".to_string()))?
        as usize;

    let smsc_block = smsc_len + 1;
    if octets.len() < smsc_block {
        return Err(EncodingError::MalformedPdu(format!(
            "SMSC block of {smsc_block} octets exceeds PDU of {} octets",
            octets.len()
        )));
    }
    Ok((octets.len() - smsc_block) as u32)
}

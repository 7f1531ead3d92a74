// ABOUTME: Phone number validation and GSM 03.40 semi-octet address encoding
// ABOUTME: Covers both the destination address field and the SMSC prefix, which count length differently

use crate::pdu::error::EncodingError;
use crate::pdu::{from_hex, to_hex};
use bytes::{BufMut, BytesMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// Type-of-address octet for ISDN/telephone numbering plan addresses
#[derive(TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeOfAddress {
    National = 0x81,
    International = 0x91,
}

/// A validated phone number, optionally in `+` international format
///
/// The number is kept exactly as supplied. Two digit views are derived from
/// it: [`digits`](Self::digits) strips the `+` only, while
/// [`address_digits`](Self::address_digits) also drops a `+86` country code
/// the way the deployed modems expect destination numbers.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber {
    number: String,
}

impl PhoneNumber {
    /// GSM 03.40 address fields carry at most 10 semi-octet pairs
    pub const MAX_DIGITS: usize = 20;

    /// Validates and wraps a phone number
    pub fn parse(number: &str) -> Result<Self, EncodingError> {
        let digits = number.strip_prefix('+').unwrap_or(number);

        if digits.is_empty() {
            return Err(EncodingError::EmptyAddress);
        }
        if let Some(c) = digits.chars().find(|c| !c.is_ascii_digit()) {
            return Err(EncodingError::InvalidDigit(c));
        }
        if digits.len() > Self::MAX_DIGITS {
            return Err(EncodingError::AddressTooLong(digits.len()));
        }

        Ok(Self {
            number: number.to_string(),
        })
    }

    /// Returns the number as originally supplied
    pub fn as_str(&self) -> &str {
        &self.number
    }

    /// True when the number was given with a leading `+`
    pub fn is_international(&self) -> bool {
        self.number.starts_with('+')
    }

    /// The digits with any leading `+` removed
    pub fn digits(&self) -> &str {
        self.number.strip_prefix('+').unwrap_or(&self.number)
    }

    /// The digits placed in a destination address field
    ///
    /// A leading `+86` is removed entirely; the type of address still reports
    /// international.
    pub fn address_digits(&self) -> &str {
        self.number
            .strip_prefix("+86")
            .unwrap_or_else(|| self.digits())
    }

    pub fn type_of_address(&self) -> TypeOfAddress {
        if self.is_international() {
            TypeOfAddress::International
        } else {
            TypeOfAddress::National
        }
    }
}

impl fmt::Debug for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PhoneNumber").field(&self.number).finish()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.number)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Writes digits as swapped BCD nibbles, padding an odd count with `0xF`.
fn put_semi_octets(buf: &mut BytesMut, digits: &str) {
    for pair in digits.as_bytes().chunks(2) {
        let low = pair[0] - b'0';
        let high = pair.get(1).map_or(0x0F, |d| d - b'0');
        buf.put_u8((high << 4) | low);
    }
}

fn semi_octet_len(digit_count: usize) -> usize {
    digit_count.div_ceil(2)
}

/// Appends a destination address field: digit count, type of address, digits.
pub(crate) fn put_address(buf: &mut BytesMut, phone: &PhoneNumber) -> Result<(), EncodingError> {
    let digits = phone.address_digits();
    if digits.is_empty() {
        return Err(EncodingError::EmptyAddress);
    }

    buf.put_u8(digits.len() as u8);
    buf.put_u8(phone.type_of_address().into());
    put_semi_octets(buf, digits);
    Ok(())
}

/// Appends the SMSC block. Its length octet counts octets, not digits.
pub(crate) fn put_smsc(buf: &mut BytesMut, smsc: Option<&PhoneNumber>) {
    match smsc {
        None => buf.put_u8(0x00),
        Some(smsc) => {
            let digits = smsc.digits();
            buf.put_u8((1 + semi_octet_len(digits.len())) as u8);
            buf.put_u8(TypeOfAddress::International.into());
            put_semi_octets(buf, digits);
        }
    }
}

/// Encodes a destination phone number as an uppercase hex address field
///
/// ```
/// use gsm_sms::pdu::encode_address;
///
/// assert_eq!(encode_address("+8613800000000").unwrap(), "0B913108000000F0");
/// assert_eq!(encode_address("17712689742").unwrap(), "0B817117629847F2");
/// ```
pub fn encode_address(phone: &str) -> Result<String, EncodingError> {
    let phone = PhoneNumber::parse(phone)?;
    let mut buf = BytesMut::with_capacity(12);
    put_address(&mut buf, &phone)?;
    Ok(to_hex(&buf))
}

/// Encodes the service center prefix; absent or empty means "modem default" (`00`)
pub fn encode_smsc(smsc: Option<&str>) -> Result<String, EncodingError> {
    let smsc = match smsc {
        Some(number) if !number.is_empty() => Some(PhoneNumber::parse(number)?),
        _ => None,
    };
    let mut buf = BytesMut::with_capacity(12);
    put_smsc(&mut buf, smsc.as_ref());
    Ok(to_hex(&buf))
}

/// Decodes a hex destination address field back into its digits
///
/// The length octet gives the significant digit count, so a trailing filler
/// nibble is dropped.
pub fn decode_address(hex: &str) -> Result<(String, TypeOfAddress), EncodingError> {
    let octets = from_hex(hex)?;
    let (&count, rest) = octets
        .split_first()
        .ok_or_else(|| EncodingError::MalformedPdu("empty address field".to_string()))?;
    let (&toa, digit_octets) = rest
        .split_first()
        .ok_or_else(|| EncodingError::MalformedPdu("missing type of address".to_string()))?;

    let toa = TypeOfAddress::try_from(toa)
        .map_err(|_| EncodingError::MalformedPdu(format!("unknown type of address {toa:02X}")))?;

    let count = count as usize;
    if digit_octets.len() != semi_octet_len(count) {
        return Err(EncodingError::MalformedPdu(format!(
            "address declares {count} digits but carries {} octets",
            digit_octets.len()
        )));
    }

    let mut digits = String::with_capacity(count);
    for octet in digit_octets {
        for nibble in [octet & 0x0F, octet >> 4] {
            if digits.len() == count {
                break;
            }
            if nibble > 9 {
                return Err(EncodingError::MalformedPdu(format!(
                    "non-decimal nibble {nibble:X} in address"
                )));
            }
            digits.push(char::from(b'0' + nibble));
        }
    }

    Ok((digits, toa))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_international_china_number_drops_country_code() {
        assert_eq!(encode_address("+8613800000000").unwrap(), "0B913108000000F0");
    }

    #[test]
    fn test_national_number() {
        assert_eq!(encode_address("17712689742").unwrap(), "0B817117629847F2");
    }

    #[test]
    fn test_international_non_china_number_keeps_country_code() {
        assert_eq!(encode_address("+447700900123").unwrap(), "0C91447700091032");
    }

    #[test]
    fn test_even_length_has_no_filler() {
        assert_eq!(encode_address("1234").unwrap(), "04812143");
    }

    #[test]
    fn test_empty_address_rejected() {
        assert_eq!(encode_address(""), Err(EncodingError::EmptyAddress));
        assert_eq!(encode_address("+"), Err(EncodingError::EmptyAddress));
        assert_eq!(encode_address("+86"), Err(EncodingError::EmptyAddress));
    }

    #[test]
    fn test_invalid_digit_rejected() {
        assert_eq!(encode_address("138-0000"), Err(EncodingError::InvalidDigit('-')));
        assert_eq!(encode_address("++1"), Err(EncodingError::InvalidDigit('+')));
    }

    #[test]
    fn test_too_many_digits_rejected() {
        let number = "1".repeat(21);
        assert_eq!(encode_address(&number), Err(EncodingError::AddressTooLong(21)));
        assert!(encode_address(&"1".repeat(20)).is_ok());
    }

    #[test]
    fn test_smsc_counts_octets_and_keeps_country_code() {
        assert_eq!(
            encode_smsc(Some("+8613344181200")).unwrap(),
            "0891683143141802F0"
        );
    }

    #[test]
    fn test_smsc_absent_or_empty() {
        assert_eq!(encode_smsc(None).unwrap(), "00");
        assert_eq!(encode_smsc(Some("")).unwrap(), "00");
    }

    #[test]
    fn test_smsc_is_always_international() {
        assert_eq!(encode_smsc(Some("12345")).unwrap(), "04912143F5");
    }

    #[test]
    fn test_round_trip_recovers_digits() {
        for digits in ["1", "12", "123", "13800000000", "447700900123", "98765432109876543210"] {
            let (decoded, toa) = decode_address(&encode_address(digits).unwrap()).unwrap();
            assert_eq!(decoded, digits);
            assert_eq!(toa, TypeOfAddress::National);
        }
    }

    #[test]
    fn test_round_trip_international() {
        let (decoded, toa) = decode_address(&encode_address("+8613800000000").unwrap()).unwrap();
        assert_eq!(decoded, "13800000000");
        assert_eq!(toa, TypeOfAddress::International);
    }

    #[test]
    fn test_decode_rejects_inconsistent_length() {
        assert!(matches!(
            decode_address("0B9131"),
            Err(EncodingError::MalformedPdu(_))
        ));
        assert!(matches!(
            decode_address("04A12143"),
            Err(EncodingError::MalformedPdu(_))
        ));
    }

    #[test]
    fn test_phone_number_views() {
        let phone = PhoneNumber::parse("+8613800000000").unwrap();
        assert!(phone.is_international());
        assert_eq!(phone.digits(), "8613800000000");
        assert_eq!(phone.address_digits(), "13800000000");
        assert_eq!(phone.to_string(), "+8613800000000");

        let phone: PhoneNumber = "8613800000000".parse().unwrap();
        assert!(!phone.is_international());
        assert_eq!(phone.address_digits(), "8613800000000");
    }
}

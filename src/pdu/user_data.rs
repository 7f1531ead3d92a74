// ABOUTME: UCS2 (UTF-16BE) user data encoding with its single-octet length field
// ABOUTME: The length counts encoded bytes, not characters

use crate::pdu::error::EncodingError;
use bytes::{BufMut, BytesMut};

/// Data coding scheme octet for the UCS2 alphabet
pub const DCS_UCS2: u8 = 0x08;

/// Largest user data length a single UDL octet can express
pub const MAX_USER_DATA_LEN: usize = u8::MAX as usize;

/// Encodes `text` as UTF-16 big-endian bytes.
///
/// Fails with [`EncodingError::MessageTooLong`] when the result would not fit
/// in the user data length octet.
pub fn encode_user_data(text: &str) -> Result<BytesMut, EncodingError> {
    let mut data = BytesMut::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        data.put_u16(unit);
    }

    if data.len() > MAX_USER_DATA_LEN {
        return Err(EncodingError::MessageTooLong(data.len()));
    }
    Ok(data)
}

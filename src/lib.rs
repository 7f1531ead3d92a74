pub mod modem;
pub mod pdu;
pub mod transport;


// Re-export the codec entry points for direct access
pub use pdu::{EncodedPdu, EncodingError, PduMessage, PhoneNumber, encode_pdu, submit_length_of};

// Re-export the main modem API for easy access
pub use modem::{
    AtCommander, ConnectionError, GsmModem, ModemBuilder, ModemConfig, ModemConnection,
    ProbeError, SignalQuality, SmsError, SmsSender,
};
pub use transport::{ModemPort, SerialEndpoint, SerialModemPort, TcpModemPort};

/// Error returned by most functions.
///
/// The library itself returns the specific error enums ([`SmsError`],
/// [`ConnectionError`], [`ProbeError`], [`EncodingError`]) so callers can
/// tell which phase failed. Binaries that only report failures can collect
/// them all into this boxed type.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for modem tools.
///
/// This is defined as a convenience.
///
/// # Examples
///
/// ## Sending one SMS
///
/// ```rust,no_run
/// use gsm_sms::{ModemBuilder, ModemConfig, ModemConnection, SmsSender};
///
/// #[tokio::main]
/// async fn main() -> gsm_sms::Result<()> {
///     let config = ModemConfig::new().with_smsc("+8613344181200");
///     let mut modem = ModemBuilder::serial("/dev/ttyUSB0", 115_200, config).await?;
///
///     // Always release the port, even when sending fails
///     let sent = modem.send_sms("17712689742", "Hello, World!").await;
///     modem.disconnect().await;
///     sent?;
///
///     Ok(())
/// }
/// ```
///
/// ## Encoding without a modem
///
/// ```rust
/// use gsm_sms::encode_pdu;
///
/// let pdu = encode_pdu(None, "+8613800000000", "测试")?;
/// assert_eq!(pdu.hex, "0011000B913108000000F00008AA046D4B8BD5");
/// assert_eq!(pdu.submit_length, 18);
/// # Ok::<(), gsm_sms::Error>(())
/// ```
pub type Result<T> = std::result::Result<T, Error>;

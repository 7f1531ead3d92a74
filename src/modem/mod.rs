// ABOUTME: AT transaction engine for GSM modems, sending SMS in PDU mode
// ABOUTME: Exports the modem traits, the default implementation, configuration and error types

//! GSM Modem Module
//!
//! Drives a GSM modem with AT commands over a [`ModemPort`](crate::transport::ModemPort):
//!
//! * **Framing by terminator** - replies end at `OK`, `ERROR` or the `>` prompt,
//!   or when the timeout budget runs out
//! * **No unwinding** - transport faults come back as a failed reply, never as a panic or error
//! * **Phase-qualified failures** - [`SmsError`] says which step of a submission failed
//! * **Injected logging** - each modem logs inside the [`tracing::Span`] it was built with
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gsm_sms::modem::{ModemBuilder, ModemConfig, ModemConnection, SmsSender};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ModemConfig::new().with_smsc("+8613344181200");
//! let mut modem = ModemBuilder::serial("/dev/ttyUSB0", 115_200, config).await?;
//!
//! modem.probe().await?;
//! modem.check_sim().await?;
//!
//! let result = modem.send_sms("+8613800000000", "Hello!").await;
//! modem.disconnect().await;
//! result?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Submission sequence
//!
//! ```text
//! AT+CMGF=0        -> OK            (PDU mode)        else ModeSelectRejected
//!   settle
//! AT+CMGS=<n>      -> >             (data prompt)     else SubmitRejected
//!   settle
//! <pdu hex><0x1A>  -> +CMGS: <mr> OK (network accept) else DeliveryNotConfirmed
//! ```
//!
//! ## Architecture
//!
//! * `ModemConnection` - connect and disconnect
//! * `AtCommander` - single AT exchange (extends ModemConnection)
//! * `SmsSender` - SMS submission (extends AtCommander)

pub mod builder;
pub mod config;
pub mod default;
pub mod error;
pub mod status;
pub mod traits;
pub mod transaction;

pub use builder::ModemBuilder;
pub use config::ModemConfig;
pub use default::{CTRL_Z, GsmModem, NOT_CONNECTED};
pub use error::{ConnectionError, ProbeError, SmsError};
pub use status::SignalQuality;
pub use traits::{AtCommander, ModemConnection, SmsSender};
pub use transaction::{AtTransaction, Outcome};

// ABOUTME: Command line tool for checking a GSM modem and sending one SMS in PDU mode
// ABOUTME: Probes the modem, checks the SIM, reports signal quality, then submits the message

use argh::FromArgs;
use gsm_sms::modem::{GsmModem, ModemConfig, ModemConnection, SmsSender};
use gsm_sms::transport::{MockPort, MockScript, ModemPort, SerialEndpoint, TcpModemPort};
use gsm_sms::{SerialModemPort, encode_pdu};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Service center of the deployed carrier
const DEFAULT_SMSC: &str = "+8613344181200";

/// Recipient used when none is given
const DEFAULT_PHONE: &str = "17712689742";

/// Message used when none is given
const DEFAULT_MESSAGE: &str = "这是一条来自点检系统的测试短信。";

/// Check a GSM modem and send an SMS through it
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// serial device of the modem (default: /dev/ttyUSB0)
    #[argh(option, short = 'p')]
    port: Option<String>,

    /// baud rate of the serial device (default: 115200)
    #[argh(option, short = 'b')]
    baudrate: Option<u32>,

    /// host:port of a TCP-serial bridge, used instead of --port
    #[argh(option)]
    tcp: Option<String>,

    /// service center number, empty for the modem default (default: +8613344181200)
    #[argh(option)]
    smsc: Option<String>,

    /// the recipient telephone number (default: 17712689742)
    #[argh(option, short = 't', default = "DEFAULT_PHONE.to_owned()")]
    phone: String,

    /// the message to send (default: a test message)
    #[argh(option, short = 'm', default = "DEFAULT_MESSAGE.to_owned()")]
    message: String,

    /// rehearse the whole exchange against a simulated modem
    #[argh(switch)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> gsm_sms::Result<()> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging {
            Level::TRACE
        } else {
            Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let smsc = cli_args.smsc.clone().unwrap_or_else(|| DEFAULT_SMSC.to_owned());
    let config = ModemConfig::new().with_smsc(smsc);

    if cli_args.dry_run {
        let script = simulated_modem(&config, &cli_args.phone, &cli_args.message)?;
        return session::<MockPort>(&script, config, &cli_args).await;
    }

    match cli_args.tcp.clone() {
        Some(addr) => session::<TcpModemPort>(&addr, config, &cli_args).await,
        None => {
            let endpoint = SerialEndpoint::new(
                cli_args
                    .port
                    .clone()
                    .unwrap_or_else(|| "/dev/ttyUSB0".to_owned()),
                cli_args.baudrate.unwrap_or(115_200),
            );
            session::<SerialModemPort>(&endpoint, config, &cli_args).await
        }
    }
}

/// Connects, runs the checks and the send, and always disconnects.
async fn session<P: ModemPort>(
    endpoint: &P::Endpoint,
    config: ModemConfig,
    cli_args: &CliArgs,
) -> gsm_sms::Result<()> {
    let mut modem = GsmModem::<P>::new(config);

    if let Err(e) = modem.connect(endpoint).await {
        eprintln!("\nError: cannot connect to {endpoint}, check the device and port name: {e}\n");
        return Err(e.into());
    }

    let result = check_and_send(&mut modem, &cli_args.phone, &cli_args.message).await;
    modem.disconnect().await;

    println!("\n==================== Result ====================");
    match &result {
        Ok(()) => println!("  SMS sent to {}", cli_args.phone),
        Err(e) => println!("  SMS not sent: {e}"),
    }
    println!("================================================\n");

    result
}

async fn check_and_send<P: ModemPort>(
    modem: &mut GsmModem<P>,
    phone: &str,
    message: &str,
) -> gsm_sms::Result<()> {
    println!("\nChecking modem status...");

    let probe = modem.probe().await;
    println!("AT -> {}", if probe.is_ok() { "ok" } else { "failed" });
    probe?;

    let sim = modem.check_sim().await;
    println!("AT+CPIN? (SIM) -> {}", if sim.is_ok() { "ready" } else { "failed" });
    sim?;

    // Signal quality is informational only
    match modem.signal_quality().await {
        Ok(quality) => println!("AT+CSQ (signal) -> {quality}"),
        Err(e) => println!("AT+CSQ (signal) -> failed: {e}"),
    }

    println!("\nSending SMS...");
    modem.send_sms(phone, message).await?;
    Ok(())
}

/// A modem that accepts everything, scripted for the message about to be sent.
fn simulated_modem(config: &ModemConfig, phone: &str, message: &str) -> gsm_sms::Result<MockScript> {
    let pdu = encode_pdu(config.smsc.as_deref(), phone, message)?;
    let cmgs = format!("AT+CMGS={}\r", pdu.submit_length);
    let payload = format!("{}\x1A", pdu.hex);

    Ok(MockScript::new()
        .expect("AT\r", "\r\nOK\r\n")
        .expect("AT+CPIN?\r", "\r\n+CPIN: READY\r\n\r\nOK\r\n")
        .expect("AT+CSQ\r", "\r\n+CSQ: 21,99\r\n\r\nOK\r\n")
        .expect("AT+CMGF=0\r", "\r\nOK\r\n")
        .expect(cmgs, "\r\n> ")
        .expect_delayed(
            payload,
            std::time::Duration::from_secs(2),
            "\r\n+CMGS: 1\r\n\r\nOK\r\n",
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::from_args(&["send_sms"], args).unwrap()
    }

    #[test]
    fn test_recipient_and_message_have_defaults() {
        let cli_args = parse(&[]);
        assert_eq!(cli_args.phone, DEFAULT_PHONE);
        assert_eq!(cli_args.message, DEFAULT_MESSAGE);
        assert!(cli_args.port.is_none());
        assert!(!cli_args.dry_run);
    }

    #[test]
    fn test_explicit_recipient_and_message() {
        let cli_args = parse(&["-t", "+8613800000000", "--message", "hello", "--dry-run"]);
        assert_eq!(cli_args.phone, "+8613800000000");
        assert_eq!(cli_args.message, "hello");
        assert!(cli_args.dry_run);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_with_defaults_succeeds() {
        let cli_args = parse(&["--dry-run"]);
        let config = ModemConfig::new().with_smsc(DEFAULT_SMSC);
        let script = simulated_modem(&config, &cli_args.phone, &cli_args.message).unwrap();

        session::<MockPort>(&script, config, &cli_args).await.unwrap();
        assert_eq!(script.remaining(), 6);
        assert_eq!(script.sent().len(), 6);
    }
}

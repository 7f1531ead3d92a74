// ABOUTME: Parsing of modem status replies used before sending (signal quality)
// ABOUTME: Converts the AT+CSQ RSSI index into dBm per 3GPP TS 27.007

use std::fmt;

/// Reply to `AT+CSQ`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalQuality {
    /// 0..=31, or 99 when unknown
    pub rssi: u8,
    /// Bit error rate class 0..=7, or 99 when unknown
    pub ber: u8,
}

impl SignalQuality {
    pub const UNKNOWN: u8 = 99;

    /// Finds and parses the `+CSQ: <rssi>,<ber>` line in a modem reply
    pub fn parse(response: &str) -> Option<Self> {
        let line = response
            .lines()
            .find_map(|line| line.trim().strip_prefix("+CSQ:"))?;
        let (rssi, ber) = line.split_once(',')?;

        Some(Self {
            rssi: rssi.trim().parse().ok()?,
            ber: ber.trim().parse().ok()?,
        })
    }

    /// Received signal strength in dBm, if the modem knows it
    pub fn dbm(&self) -> Option<i16> {
        match self.rssi {
            0..=31 => Some(-113 + 2 * i16::from(self.rssi)),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.dbm().is_some()
    }
}

impl fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dbm() {
            Some(dbm) => write!(f, "rssi {} ({dbm} dBm), ber {}", self.rssi, self.ber),
            None => write!(f, "rssi unknown, ber {}", self.ber),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typical_reply() {
        let quality = SignalQuality::parse("AT+CSQ\r\r\n+CSQ: 21,99\r\n\r\nOK").unwrap();
        assert_eq!(quality, SignalQuality { rssi: 21, ber: 99 });
        assert_eq!(quality.dbm(), Some(-71));
        assert_eq!(quality.to_string(), "rssi 21 (-71 dBm), ber 99");
    }

    #[test]
    fn test_unknown_rssi() {
        let quality = SignalQuality::parse("+CSQ: 99,99\r\nOK").unwrap();
        assert!(!quality.is_known());
        assert_eq!(quality.to_string(), "rssi unknown, ber 99");
    }

    #[test]
    fn test_range_ends() {
        assert_eq!(SignalQuality { rssi: 0, ber: 0 }.dbm(), Some(-113));
        assert_eq!(SignalQuality { rssi: 31, ber: 0 }.dbm(), Some(-51));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(SignalQuality::parse("OK"), None);
        assert_eq!(SignalQuality::parse("+CSQ: x,1"), None);
        assert_eq!(SignalQuality::parse("+CSQ: 21"), None);
    }
}

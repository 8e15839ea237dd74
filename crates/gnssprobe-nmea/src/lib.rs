//! Byte-at-a-time NMEA 0183 sentence parser.
//!
//! Extracts UTC time and position from RMC and GGA sentences of any talker
//! (`GP`, `GN`, `GL`, ...). Sentences must carry a valid `*hh` checksum to be
//! committed; everything else is counted and dropped.
//!
//! ```
//! use gnssprobe_nmea::NmeaParser;
//!
//! let mut parser = NmeaParser::new();
//! for &b in b"$GPRMC,123519.00,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*44\r\n" {
//!     parser.encode(b);
//! }
//! assert!(parser.fix().location.is_valid());
//! ```

use log::debug;

const SENTENCE_CAPACITY: usize = 120;

/// UTC time of day as reported by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtcTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub centisecond: u8,
}

/// Position in decimal degrees (north and east positive).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// A parsed value plus the "changed since last read" flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct Field<T> {
    value: Option<T>,
    updated: bool,
}

impl<T: Copy> Field<T> {
    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    /// True when a sentence committed a new value that has not been read yet.
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// Returns the value without touching the update flag.
    pub fn peek(&self) -> Option<T> {
        self.value
    }

    /// Returns the value and marks it as read.
    pub fn read(&mut self) -> Option<T> {
        self.updated = false;
        self.value
    }

    fn commit(&mut self, value: T) {
        self.value = Some(value);
        self.updated = true;
    }
}

/// Latest time and position seen on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionFix {
    pub time: Field<UtcTime>,
    pub location: Field<Location>,
}

pub struct NmeaParser {
    buf: [u8; SENTENCE_CAPACITY],
    len: usize,
    in_sentence: bool,
    fix: PositionFix,
    passed_checksum: u32,
    failed_checksum: u32,
    sentences_with_fix: u32,
}

impl NmeaParser {
    pub fn new() -> Self {
        Self {
            buf: [0; SENTENCE_CAPACITY],
            len: 0,
            in_sentence: false,
            fix: PositionFix::default(),
            passed_checksum: 0,
            failed_checksum: 0,
            sentences_with_fix: 0,
        }
    }

    /// Feed one byte from the receiver.
    ///
    /// Returns `true` when this byte completed a sentence that passed its
    /// checksum and was committed.
    pub fn encode(&mut self, byte: u8) -> bool {
        match byte {
            b'$' => {
                self.len = 0;
                self.in_sentence = true;
                false
            }
            b'\r' => false,
            b'\n' => {
                if !self.in_sentence {
                    return false;
                }
                self.in_sentence = false;
                self.finish_sentence()
            }
            _ => {
                if !self.in_sentence {
                    return false;
                }
                if self.len < SENTENCE_CAPACITY {
                    self.buf[self.len] = byte;
                    self.len += 1;
                } else {
                    // Overlong garbage, wait for the next `$`.
                    self.in_sentence = false;
                    self.failed_checksum += 1;
                }
                false
            }
        }
    }

    pub fn fix(&self) -> &PositionFix {
        &self.fix
    }

    pub fn fix_mut(&mut self) -> &mut PositionFix {
        &mut self.fix
    }

    pub fn passed_checksum(&self) -> u32 {
        self.passed_checksum
    }

    pub fn failed_checksum(&self) -> u32 {
        self.failed_checksum
    }

    pub fn sentences_with_fix(&self) -> u32 {
        self.sentences_with_fix
    }

    fn finish_sentence(&mut self) -> bool {
        let Some(data) = parse_sentence(&self.buf[..self.len]) else {
            self.failed_checksum += 1;
            return false;
        };
        self.passed_checksum += 1;

        if let Some(time) = data.time {
            self.fix.time.commit(time);
        }
        if let Some(location) = data.location {
            self.sentences_with_fix += 1;
            self.fix.location.commit(location);
        }
        true
    }
}

impl Default for NmeaParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Values carried by one checksummed sentence.
#[derive(Debug, Default)]
struct SentenceData {
    time: Option<UtcTime>,
    location: Option<Location>,
}

/// `None` when the sentence is not text or fails its checksum.
fn parse_sentence(raw: &[u8]) -> Option<SentenceData> {
    let sentence = core::str::from_utf8(raw).ok()?;
    let Some(body) = verify_checksum(sentence) else {
        debug!("dropping sentence with bad checksum: ${sentence}");
        return None;
    };

    let mut fields = body.split(',');
    let data = match fields.next().and_then(|tag| tag.get(2..)) {
        Some("RMC") => parse_rmc(fields),
        Some("GGA") => parse_gga(fields),
        _ => None,
    };
    Some(data.unwrap_or_default())
}

// time, status, lat, N/S, lng, E/W
fn parse_rmc<'a>(fields: impl Iterator<Item = &'a str>) -> Option<SentenceData> {
    let [time, status, lat, ns, lng, ew] = take_fields(fields)?;
    Some(SentenceData {
        time: parse_time(time),
        location: if status == "A" { parse_location(lat, ns, lng, ew) } else { None },
    })
}

// time, lat, N/S, lng, E/W, fix quality
fn parse_gga<'a>(fields: impl Iterator<Item = &'a str>) -> Option<SentenceData> {
    let [time, lat, ns, lng, ew, quality] = take_fields(fields)?;
    let has_fix = quality.parse::<u8>().unwrap_or(0) != 0;
    Some(SentenceData {
        time: parse_time(time),
        location: if has_fix { parse_location(lat, ns, lng, ew) } else { None },
    })
}

fn take_fields<'a, const N: usize>(mut fields: impl Iterator<Item = &'a str>) -> Option<[&'a str; N]> {
    let mut out = [""; N];
    for slot in &mut out {
        *slot = fields.next()?;
    }
    Some(out)
}

fn parse_location(lat: &str, ns: &str, lng: &str, ew: &str) -> Option<Location> {
    Some(Location {
        lat: parse_coordinate(lat, ns)?,
        lng: parse_coordinate(lng, ew)?,
    })
}

/// Checks `body*hh` and returns `body` when the XOR checksum matches.
fn verify_checksum(sentence: &str) -> Option<&str> {
    let (body, tail) = sentence.split_once('*')?;
    let expected = u8::from_str_radix(tail.get(..2)?, 16).ok()?;
    let actual = body.bytes().fold(0u8, |acc, b| acc ^ b);
    (actual == expected).then_some(body)
}

/// Parse NMEA coordinate field (ddmm.mmmm / dddmm.mmmm)
fn parse_coordinate(coord: &str, hemisphere: &str) -> Option<f64> {
    if coord.is_empty() || hemisphere.is_empty() {
        return None;
    }
    let value = coord.parse::<f64>().ok()?;
    let degrees = (value / 100.0).floor();
    let minutes = value - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;

    match hemisphere {
        "N" | "E" => Some(decimal),
        "S" | "W" => Some(-decimal),
        _ => None,
    }
}

/// Parse NMEA time field (hhmmss[.ss])
fn parse_time(field: &str) -> Option<UtcTime> {
    if field.len() < 6 {
        return None;
    }
    let hour = field.get(0..2)?.parse::<u8>().ok()?;
    let minute = field.get(2..4)?.parse::<u8>().ok()?;
    let second = field.get(4..6)?.parse::<u8>().ok()?;
    if hour > 23 || minute > 59 || second > 60 {
        return None;
    }

    let centisecond = match field.get(6..) {
        None | Some("") => 0,
        Some(frac) => {
            let digits = frac.strip_prefix('.')?;
            let mut cs = 0u8;
            for (i, c) in digits.chars().take(2).enumerate() {
                let d = c.to_digit(10)? as u8;
                cs += if i == 0 { d * 10 } else { d };
            }
            cs
        }
    };

    Some(UtcTime { hour, minute, second, centisecond })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(parser: &mut NmeaParser, text: &str) -> usize {
        text.bytes().filter(|&b| parser.encode(b)).count()
    }

    fn with_checksum(body: &str) -> String {
        let sum = body.bytes().fold(0u8, |acc, b| acc ^ b);
        format!("${body}*{sum:02X}\r\n")
    }

    #[test]
    fn test_parse_coordinate() {
        let north = parse_coordinate("3723.2475", "N").unwrap();
        assert!((north - 37.387458).abs() < 1e-6);
        let south = parse_coordinate("3723.2475", "S").unwrap();
        assert!((south + 37.387458).abs() < 1e-6);
        let west = parse_coordinate("12158.3416", "W").unwrap();
        assert!((west + 121.97236).abs() < 1e-6);
        assert_eq!(parse_coordinate("", "N"), None);
        assert_eq!(parse_coordinate("3723.2475", "X"), None);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(
            parse_time("123519.07"),
            Some(UtcTime { hour: 12, minute: 35, second: 19, centisecond: 7 })
        );
        assert_eq!(
            parse_time("000001.5"),
            Some(UtcTime { hour: 0, minute: 0, second: 1, centisecond: 50 })
        );
        assert_eq!(parse_time("235959").map(|t| t.centisecond), Some(0));
        assert_eq!(parse_time("12"), None);
        assert_eq!(parse_time("250000"), None);
    }

    #[test]
    fn test_rmc_with_fix() {
        let mut parser = NmeaParser::new();
        let line = "$GPRMC,123519.00,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*44\r\n";
        assert_eq!(feed(&mut parser, line), 1);

        let fix = parser.fix_mut();
        assert!(fix.time.is_updated());
        assert!(fix.location.is_updated());
        let loc = fix.location.read().unwrap();
        assert!((loc.lat - 48.1173).abs() < 1e-6);
        assert!((loc.lng - 11.516666).abs() < 1e-5);
        assert!(!fix.location.is_updated());
        assert!(fix.location.is_valid());
    }

    #[test]
    fn test_rmc_void_keeps_location_invalid() {
        let mut parser = NmeaParser::new();
        feed(&mut parser, &with_checksum("GNRMC,081836.25,V,,,,,,,130998,,"));
        assert!(parser.fix().time.is_valid());
        assert!(!parser.fix().location.is_valid());
        assert_eq!(parser.fix().time.peek().unwrap().centisecond, 25);
    }

    #[test]
    fn test_gga_quality_gates_location() {
        let mut parser = NmeaParser::new();
        feed(&mut parser, &with_checksum("GPGGA,092750.000,5321.6802,N,00630.3372,W,0,00,,,M,,M,,"));
        assert!(!parser.fix().location.is_valid());

        feed(&mut parser, &with_checksum("GPGGA,092751.000,5321.6802,N,00630.3372,W,1,08,1.03,61.7,M,55.2,M,,"));
        let loc = parser.fix().location.peek().unwrap();
        assert!((loc.lat - 53.361336).abs() < 1e-5);
        assert!(loc.lng < 0.0);
        assert_eq!(parser.sentences_with_fix(), 1);
    }

    #[test]
    fn test_bad_checksum_is_rejected() {
        let mut parser = NmeaParser::new();
        let line = "$GPRMC,123519.00,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*00\r\n";
        assert_eq!(feed(&mut parser, line), 0);
        assert_eq!(parser.failed_checksum(), 1);
        assert!(!parser.fix().time.is_valid());

        feed(&mut parser, "$GPTXT,01,01,01,ANTENNA OPEN\r\n");
        assert_eq!(parser.failed_checksum(), 2);
    }

    #[test]
    fn test_unknown_sentence_counts_as_passed() {
        let mut parser = NmeaParser::new();
        assert_eq!(feed(&mut parser, &with_checksum("GPTXT,01,01,01,ANTENNA OK")), 1);
        assert_eq!(parser.passed_checksum(), 1);
        assert!(!parser.fix().time.is_valid());
    }

    #[test]
    fn test_dollar_restarts_sentence() {
        let mut parser = NmeaParser::new();
        let mut text = String::from("$GPRMC,garbage");
        text.push_str(&with_checksum("GPRMC,010203.00,V,,,,,,,,,"));
        assert_eq!(feed(&mut parser, &text), 1);
        assert_eq!(parser.fix().time.peek().unwrap().hour, 1);
    }

    #[test]
    fn test_short_sentence_commits_nothing() {
        let mut parser = NmeaParser::new();
        assert_eq!(feed(&mut parser, &with_checksum("GPRMC,123519.00,A,4807.038,N")), 1);
        assert_eq!(feed(&mut parser, &with_checksum("GPGGA,123519.00,4807.038,N,01131.000,E")), 1);
        assert_eq!(parser.passed_checksum(), 2);
        assert!(!parser.fix().time.is_valid());
        assert!(!parser.fix().location.is_valid());
    }
}

//! XSD value normalizer.
//!
//! [`Value`] is the tagged union of every `xs:` datatype a Property, Range,
//! Qualifier or Extension may declare. [`Value::parse`] and [`Value::render`]
//! map it to and from canonical text such that
//! `Value::parse(v.data_type(), &v.render()) == Ok(v)` for every representable
//! value (NaN excepted).
//!
//! ```
//! use aas_codec::model::{DataTypeDefXsd, Value};
//!
//! let value = Value::parse(DataTypeDefXsd::Double, "23.5").unwrap();
//! assert_eq!(value, Value::Double(23.5));
//! assert_eq!(value.render(), "23.5");
//! assert!(Value::parse(DataTypeDefXsd::Byte, "128").is_err());
//! ```

use std::fmt;
use std::sync::OnceLock;

use base64::Engine as _;
use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;

use crate::error::{Error, Result};
use crate::registry::token_enum;

token_enum! {
    /// The XSD datatypes a value may declare.
    pub enum DataTypeDefXsd as "DataTypeDefXsd" {
        /// xs:anyURI
        AnyUri => "xs:anyURI",
        /// xs:base64Binary
        Base64Binary => "xs:base64Binary",
        /// xs:boolean
        Boolean => "xs:boolean",
        /// xs:byte
        Byte => "xs:byte",
        /// xs:date
        Date => "xs:date",
        /// xs:dateTime
        DateTime => "xs:dateTime",
        /// xs:decimal
        Decimal => "xs:decimal",
        /// xs:double
        Double => "xs:double",
        /// xs:duration
        Duration => "xs:duration",
        /// xs:float
        Float => "xs:float",
        /// xs:gDay
        GDay => "xs:gDay",
        /// xs:gMonth
        GMonth => "xs:gMonth",
        /// xs:gMonthDay
        GMonthDay => "xs:gMonthDay",
        /// xs:gYear
        GYear => "xs:gYear",
        /// xs:gYearMonth
        GYearMonth => "xs:gYearMonth",
        /// xs:hexBinary
        HexBinary => "xs:hexBinary",
        /// xs:int
        Int => "xs:int",
        /// xs:integer
        Integer => "xs:integer",
        /// xs:long
        Long => "xs:long",
        /// xs:negativeInteger
        NegativeInteger => "xs:negativeInteger",
        /// xs:nonNegativeInteger
        NonNegativeInteger => "xs:nonNegativeInteger",
        /// xs:nonPositiveInteger
        NonPositiveInteger => "xs:nonPositiveInteger",
        /// xs:normalizedString
        NormalizedString => "xs:normalizedString",
        /// xs:positiveInteger
        PositiveInteger => "xs:positiveInteger",
        /// xs:short
        Short => "xs:short",
        /// xs:string
        String => "xs:string",
        /// xs:time
        Time => "xs:time",
        /// xs:unsignedByte
        UnsignedByte => "xs:unsignedByte",
        /// xs:unsignedInt
        UnsignedInt => "xs:unsignedInt",
        /// xs:unsignedLong
        UnsignedLong => "xs:unsignedLong",
        /// xs:unsignedShort
        UnsignedShort => "xs:unsignedShort",
    }
}

/// A typed value of one of the [`DataTypeDefXsd`] datatypes.
///
/// # Range limits
///
/// The value space is narrower than XSD in three places, and literals outside
/// it fail with `InvalidLiteral`:
///
/// - the unbounded integer types hold an `i128`;
/// - years in dates, date-times and the g* types run from 1 to 9999, so
///   negative and five-digit years are rejected;
/// - `24:00:00` is not accepted as a time of day.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// xs:anyURI
    AnyUri(String),
    /// xs:base64Binary
    Base64Binary(Vec<u8>),
    /// xs:boolean
    Boolean(bool),
    /// xs:byte
    Byte(i8),
    /// xs:date
    Date(Date),
    /// xs:dateTime
    DateTime(DateTime),
    /// xs:decimal
    Decimal(Decimal),
    /// xs:double
    Double(f64),
    /// xs:duration
    Duration(Duration),
    /// xs:float
    Float(f32),
    /// xs:gDay
    GDay(GDay),
    /// xs:gMonth
    GMonth(GMonth),
    /// xs:gMonthDay
    GMonthDay(GMonthDay),
    /// xs:gYear
    GYear(GYear),
    /// xs:gYearMonth
    GYearMonth(GYearMonth),
    /// xs:hexBinary
    HexBinary(Vec<u8>),
    /// xs:int
    Int(i32),
    /// xs:integer, limited to `i128`
    Integer(i128),
    /// xs:long
    Long(i64),
    /// xs:negativeInteger
    NegativeInteger(i128),
    /// xs:nonNegativeInteger
    NonNegativeInteger(i128),
    /// xs:nonPositiveInteger
    NonPositiveInteger(i128),
    /// xs:normalizedString
    NormalizedString(String),
    /// xs:positiveInteger
    PositiveInteger(i128),
    /// xs:short
    Short(i16),
    /// xs:string
    String(String),
    /// xs:time
    Time(Time),
    /// xs:unsignedByte
    UnsignedByte(u8),
    /// xs:unsignedInt
    UnsignedInt(u32),
    /// xs:unsignedLong
    UnsignedLong(u64),
    /// xs:unsignedShort
    UnsignedShort(u16),
}

/// An xs:dateTime with optional timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    /// Local date and time.
    pub value: NaiveDateTime,
    /// Offset from UTC, if the literal carried one.
    pub timezone: Option<FixedOffset>,
}

/// An xs:date with optional timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    /// Calendar date.
    pub value: NaiveDate,
    /// Offset from UTC, if the literal carried one.
    pub timezone: Option<FixedOffset>,
}

/// An xs:time with optional timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    /// Time of day.
    pub value: NaiveTime,
    /// Offset from UTC, if the literal carried one.
    pub timezone: Option<FixedOffset>,
}

/// An xs:gYearMonth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GYearMonth {
    /// Year, 1 to 9999.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
    /// Offset from UTC, if the literal carried one.
    pub timezone: Option<FixedOffset>,
}

/// An xs:gYear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GYear {
    /// Year, 1 to 9999.
    pub year: i32,
    /// Offset from UTC, if the literal carried one.
    pub timezone: Option<FixedOffset>,
}

/// An xs:gMonthDay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GMonthDay {
    /// Month, 1 to 12.
    pub month: u32,
    /// Day of month, valid in a leap year.
    pub day: u32,
    /// Offset from UTC, if the literal carried one.
    pub timezone: Option<FixedOffset>,
}

/// An xs:gDay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GDay {
    /// Day of month, 1 to 31.
    pub day: u32,
    /// Offset from UTC, if the literal carried one.
    pub timezone: Option<FixedOffset>,
}

/// An xs:gMonth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GMonth {
    /// Month, 1 to 12.
    pub month: u32,
    /// Offset from UTC, if the literal carried one.
    pub timezone: Option<FixedOffset>,
}

/// An xs:duration, component-wise as written.
///
/// Components are not carried over (`PT90M` stays ninety minutes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Duration {
    /// Leading minus sign.
    pub negative: bool,
    /// Years.
    pub years: u64,
    /// Months.
    pub months: u64,
    /// Days.
    pub days: u64,
    /// Hours.
    pub hours: u64,
    /// Minutes.
    pub minutes: u64,
    /// Whole seconds.
    pub seconds: u64,
    /// Fractional seconds in nanoseconds.
    pub nanos: u32,
}

/// An xs:decimal, kept in its lexical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

impl Decimal {
    /// Validates a decimal literal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLiteral` if `text` is not an XSD decimal.
    pub fn new(text: &str) -> Result<Self> {
        static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        if pattern(&PATTERN, r"^[+-]?(\d+(\.\d*)?|\.\d+)$").is_some_and(|p| p.is_match(text)) {
            Ok(Self(text.to_owned()))
        } else {
            Err(Error::invalid_literal("xs:decimal", text))
        }
    }

    /// The lexical form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn pattern(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(source).ok()).as_ref()
}

const TZ: &str = r"(Z|[+-]\d{2}:\d{2})?";

impl Value {
    /// Parses canonical text as a value of the given datatype.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLiteral` if `text` does not match the datatype's
    /// grammar or lies outside its value space.
    pub fn parse(data_type: DataTypeDefXsd, text: &str) -> Result<Self> {
        let invalid = || Error::invalid_literal(data_type.as_str(), text);
        let value = match data_type {
            DataTypeDefXsd::AnyUri => Self::AnyUri(text.to_owned()),
            DataTypeDefXsd::String => Self::String(text.to_owned()),
            DataTypeDefXsd::NormalizedString => {
                if text.contains(['\r', '\n', '\t']) {
                    return Err(invalid());
                }
                Self::NormalizedString(text.to_owned())
            }
            DataTypeDefXsd::Boolean => match text {
                "true" | "1" => Self::Boolean(true),
                "false" | "0" => Self::Boolean(false),
                _ => return Err(invalid()),
            },
            DataTypeDefXsd::Base64Binary => {
                let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(compact)
                    .map_err(|e| invalid().with_source(e))?;
                Self::Base64Binary(bytes)
            }
            DataTypeDefXsd::HexBinary => {
                Self::HexBinary(hex::decode(text).map_err(|e| invalid().with_source(e))?)
            }
            DataTypeDefXsd::Float => Self::Float(parse_float(text).ok_or_else(invalid)?),
            DataTypeDefXsd::Double => Self::Double(parse_float(text).ok_or_else(invalid)?),
            DataTypeDefXsd::Decimal => Self::Decimal(Decimal::new(text)?),
            DataTypeDefXsd::Integer => Self::Integer(parse_integer(text).ok_or_else(invalid)?),
            DataTypeDefXsd::Long => Self::Long(parse_integer(text).ok_or_else(invalid)?),
            DataTypeDefXsd::Int => Self::Int(parse_integer(text).ok_or_else(invalid)?),
            DataTypeDefXsd::Short => Self::Short(parse_integer(text).ok_or_else(invalid)?),
            DataTypeDefXsd::Byte => Self::Byte(parse_integer(text).ok_or_else(invalid)?),
            DataTypeDefXsd::UnsignedLong => {
                Self::UnsignedLong(parse_integer(text).ok_or_else(invalid)?)
            }
            DataTypeDefXsd::UnsignedInt => {
                Self::UnsignedInt(parse_integer(text).ok_or_else(invalid)?)
            }
            DataTypeDefXsd::UnsignedShort => {
                Self::UnsignedShort(parse_integer(text).ok_or_else(invalid)?)
            }
            DataTypeDefXsd::UnsignedByte => {
                Self::UnsignedByte(parse_integer(text).ok_or_else(invalid)?)
            }
            DataTypeDefXsd::NonPositiveInteger => Self::NonPositiveInteger(
                parse_integer::<i128>(text)
                    .filter(|v| *v <= 0)
                    .ok_or_else(invalid)?,
            ),
            DataTypeDefXsd::NegativeInteger => Self::NegativeInteger(
                parse_integer::<i128>(text)
                    .filter(|v| *v < 0)
                    .ok_or_else(invalid)?,
            ),
            DataTypeDefXsd::NonNegativeInteger => Self::NonNegativeInteger(
                parse_integer::<i128>(text)
                    .filter(|v| *v >= 0)
                    .ok_or_else(invalid)?,
            ),
            DataTypeDefXsd::PositiveInteger => Self::PositiveInteger(
                parse_integer::<i128>(text)
                    .filter(|v| *v > 0)
                    .ok_or_else(invalid)?,
            ),
            DataTypeDefXsd::Duration => Self::Duration(parse_duration(text).ok_or_else(invalid)?),
            DataTypeDefXsd::DateTime => Self::DateTime(parse_date_time(text).ok_or_else(invalid)?),
            DataTypeDefXsd::Date => Self::Date(parse_date(text).ok_or_else(invalid)?),
            DataTypeDefXsd::Time => Self::Time(parse_time(text).ok_or_else(invalid)?),
            DataTypeDefXsd::GYearMonth => {
                Self::GYearMonth(parse_g_year_month(text).ok_or_else(invalid)?)
            }
            DataTypeDefXsd::GYear => Self::GYear(parse_g_year(text).ok_or_else(invalid)?),
            DataTypeDefXsd::GMonthDay => {
                Self::GMonthDay(parse_g_month_day(text).ok_or_else(invalid)?)
            }
            DataTypeDefXsd::GMonth => Self::GMonth(parse_g_month(text).ok_or_else(invalid)?),
            DataTypeDefXsd::GDay => Self::GDay(parse_g_day(text).ok_or_else(invalid)?),
        };
        Ok(value)
    }

    /// The datatype this value belongs to.
    #[must_use]
    pub fn data_type(&self) -> DataTypeDefXsd {
        match self {
            Self::AnyUri(_) => DataTypeDefXsd::AnyUri,
            Self::Base64Binary(_) => DataTypeDefXsd::Base64Binary,
            Self::Boolean(_) => DataTypeDefXsd::Boolean,
            Self::Byte(_) => DataTypeDefXsd::Byte,
            Self::Date(_) => DataTypeDefXsd::Date,
            Self::DateTime(_) => DataTypeDefXsd::DateTime,
            Self::Decimal(_) => DataTypeDefXsd::Decimal,
            Self::Double(_) => DataTypeDefXsd::Double,
            Self::Duration(_) => DataTypeDefXsd::Duration,
            Self::Float(_) => DataTypeDefXsd::Float,
            Self::GDay(_) => DataTypeDefXsd::GDay,
            Self::GMonth(_) => DataTypeDefXsd::GMonth,
            Self::GMonthDay(_) => DataTypeDefXsd::GMonthDay,
            Self::GYear(_) => DataTypeDefXsd::GYear,
            Self::GYearMonth(_) => DataTypeDefXsd::GYearMonth,
            Self::HexBinary(_) => DataTypeDefXsd::HexBinary,
            Self::Int(_) => DataTypeDefXsd::Int,
            Self::Integer(_) => DataTypeDefXsd::Integer,
            Self::Long(_) => DataTypeDefXsd::Long,
            Self::NegativeInteger(_) => DataTypeDefXsd::NegativeInteger,
            Self::NonNegativeInteger(_) => DataTypeDefXsd::NonNegativeInteger,
            Self::NonPositiveInteger(_) => DataTypeDefXsd::NonPositiveInteger,
            Self::NormalizedString(_) => DataTypeDefXsd::NormalizedString,
            Self::PositiveInteger(_) => DataTypeDefXsd::PositiveInteger,
            Self::Short(_) => DataTypeDefXsd::Short,
            Self::String(_) => DataTypeDefXsd::String,
            Self::Time(_) => DataTypeDefXsd::Time,
            Self::UnsignedByte(_) => DataTypeDefXsd::UnsignedByte,
            Self::UnsignedInt(_) => DataTypeDefXsd::UnsignedInt,
            Self::UnsignedLong(_) => DataTypeDefXsd::UnsignedLong,
            Self::UnsignedShort(_) => DataTypeDefXsd::UnsignedShort,
        }
    }

    /// Renders the canonical text of this value.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::AnyUri(s) | Self::String(s) | Self::NormalizedString(s) => s.clone(),
            Self::Boolean(b) => b.to_string(),
            Self::Base64Binary(bytes) => base64::engine::general_purpose::STANDARD.encode(bytes),
            Self::HexBinary(bytes) => hex::encode(bytes),
            Self::Float(v) => render_float(f64::from(*v), format!("{v:?}")),
            Self::Double(v) => render_float(*v, format!("{v:?}")),
            Self::Decimal(d) => d.to_string(),
            Self::Integer(v)
            | Self::NegativeInteger(v)
            | Self::NonNegativeInteger(v)
            | Self::NonPositiveInteger(v)
            | Self::PositiveInteger(v) => v.to_string(),
            Self::Long(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            Self::Short(v) => v.to_string(),
            Self::Byte(v) => v.to_string(),
            Self::UnsignedLong(v) => v.to_string(),
            Self::UnsignedInt(v) => v.to_string(),
            Self::UnsignedShort(v) => v.to_string(),
            Self::UnsignedByte(v) => v.to_string(),
            Self::Duration(d) => render_duration(d),
            Self::DateTime(dt) => format!(
                "{}T{}{}",
                render_date(dt.value.date()),
                render_time(dt.value.time()),
                render_timezone(dt.timezone)
            ),
            Self::Date(d) => format!("{}{}", render_date(d.value), render_timezone(d.timezone)),
            Self::Time(t) => format!("{}{}", render_time(t.value), render_timezone(t.timezone)),
            Self::GYearMonth(g) => {
                format!("{:04}-{:02}{}", g.year, g.month, render_timezone(g.timezone))
            }
            Self::GYear(g) => format!("{:04}{}", g.year, render_timezone(g.timezone)),
            Self::GMonthDay(g) => {
                format!("--{:02}-{:02}{}", g.month, g.day, render_timezone(g.timezone))
            }
            Self::GMonth(g) => format!("--{:02}{}", g.month, render_timezone(g.timezone)),
            Self::GDay(g) => format!("---{:02}{}", g.day, render_timezone(g.timezone)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl std::str::FromStr for DateTime {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        parse_date_time(text).ok_or_else(|| Error::invalid_literal("xs:dateTime", text))
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Value::DateTime(*self).render())
    }
}

impl std::str::FromStr for Duration {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        parse_duration(text).ok_or_else(|| Error::invalid_literal("xs:duration", text))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_duration(self))
    }
}

fn parse_integer<T: std::str::FromStr>(text: &str) -> Option<T> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    if !pattern(&PATTERN, r"^[+-]?\d+$").is_some_and(|p| p.is_match(text)) {
        return None;
    }
    text.parse().ok()
}

fn parse_float<T: std::str::FromStr + FloatSpecials>(text: &str) -> Option<T> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    match text {
        "INF" | "+INF" => return Some(T::INFINITY),
        "-INF" => return Some(T::NEG_INFINITY),
        "NaN" => return Some(T::NAN),
        _ => {}
    }
    if !pattern(&PATTERN, r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").is_some_and(|p| p.is_match(text)) {
        return None;
    }
    text.parse().ok()
}

trait FloatSpecials {
    const INFINITY: Self;
    const NEG_INFINITY: Self;
    const NAN: Self;
}

impl FloatSpecials for f32 {
    const INFINITY: Self = f32::INFINITY;
    const NEG_INFINITY: Self = f32::NEG_INFINITY;
    const NAN: Self = f32::NAN;
}

impl FloatSpecials for f64 {
    const INFINITY: Self = f64::INFINITY;
    const NEG_INFINITY: Self = f64::NEG_INFINITY;
    const NAN: Self = f64::NAN;
}

fn render_float(value: f64, shortest: String) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value == f64::INFINITY {
        "INF".to_owned()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_owned()
    } else {
        shortest.replace('e', "E")
    }
}

fn fraction_to_nanos(digits: &str) -> u32 {
    let mut nanos = 0u32;
    for (i, digit) in digits.bytes().take(9).enumerate() {
        nanos += u32::from(digit - b'0') * 10u32.pow(8 - i as u32);
    }
    nanos
}

fn render_fraction(nanos: u32) -> String {
    if nanos == 0 {
        return String::new();
    }
    let digits = format!("{nanos:09}");
    format!(".{}", digits.trim_end_matches('0'))
}

fn parse_timezone(text: Option<&str>) -> Option<Option<FixedOffset>> {
    let Some(text) = text else {
        return Some(None);
    };
    if text == "Z" {
        return FixedOffset::east_opt(0).map(Some);
    }
    let sign = if text.starts_with('-') { -1 } else { 1 };
    let hours: i32 = text.get(1..3)?.parse().ok()?;
    let minutes: i32 = text.get(4..6)?.parse().ok()?;
    if minutes >= 60 || hours > 14 || (hours == 14 && minutes != 0) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(Some)
}

fn render_timezone(timezone: Option<FixedOffset>) -> String {
    let Some(offset) = timezone else {
        return String::new();
    };
    let seconds = offset.local_minus_utc();
    if seconds == 0 {
        return "Z".to_owned();
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let seconds = seconds.abs();
    format!("{sign}{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60)
}

fn render_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

fn render_time(time: NaiveTime) -> String {
    format!(
        "{:02}:{:02}:{:02}{}",
        time.hour(),
        time.minute(),
        time.second(),
        render_fraction(time.nanosecond())
    )
}

fn number<T: std::str::FromStr>(caps: &regex::Captures<'_>, index: usize) -> Option<T> {
    caps.get(index)?.as_str().parse().ok()
}

fn parse_time_parts(caps: &regex::Captures<'_>, first: usize) -> Option<NaiveTime> {
    let nanos = caps
        .get(first + 3)
        .map_or(0, |m| fraction_to_nanos(&m.as_str()[1..]));
    NaiveTime::from_hms_nano_opt(
        number(caps, first)?,
        number(caps, first + 1)?,
        number(caps, first + 2)?,
        nanos,
    )
}

fn parse_date_time(text: &str) -> Option<DateTime> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let source = format!(r"^(\d{{4}})-(\d{{2}})-(\d{{2}})T(\d{{2}}):(\d{{2}}):(\d{{2}})(\.\d+)?{TZ}$");
    let caps = pattern(&PATTERN, &source)?.captures(text)?;
    let date = NaiveDate::from_ymd_opt(number(&caps, 1)?, number(&caps, 2)?, number(&caps, 3)?)?;
    let time = parse_time_parts(&caps, 4)?;
    Some(DateTime {
        value: NaiveDateTime::new(date, time),
        timezone: parse_timezone(caps.get(8).map(|m| m.as_str()))?,
    })
}

fn parse_date(text: &str) -> Option<Date> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let source = format!(r"^(\d{{4}})-(\d{{2}})-(\d{{2}}){TZ}$");
    let caps = pattern(&PATTERN, &source)?.captures(text)?;
    Some(Date {
        value: NaiveDate::from_ymd_opt(number(&caps, 1)?, number(&caps, 2)?, number(&caps, 3)?)?,
        timezone: parse_timezone(caps.get(4).map(|m| m.as_str()))?,
    })
}

fn parse_time(text: &str) -> Option<Time> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let source = format!(r"^(\d{{2}}):(\d{{2}}):(\d{{2}})(\.\d+)?{TZ}$");
    let caps = pattern(&PATTERN, &source)?.captures(text)?;
    Some(Time {
        value: parse_time_parts(&caps, 1)?,
        timezone: parse_timezone(caps.get(5).map(|m| m.as_str()))?,
    })
}

fn valid_year(year: i32) -> Option<i32> {
    (1..=9999).contains(&year).then_some(year)
}

fn valid_month(month: u32) -> Option<u32> {
    (1..=12).contains(&month).then_some(month)
}

fn parse_g_year_month(text: &str) -> Option<GYearMonth> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let source = format!(r"^(\d{{4}})-(\d{{2}}){TZ}$");
    let caps = pattern(&PATTERN, &source)?.captures(text)?;
    Some(GYearMonth {
        year: valid_year(number(&caps, 1)?)?,
        month: valid_month(number(&caps, 2)?)?,
        timezone: parse_timezone(caps.get(3).map(|m| m.as_str()))?,
    })
}

fn parse_g_year(text: &str) -> Option<GYear> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let source = format!(r"^(\d{{4}}){TZ}$");
    let caps = pattern(&PATTERN, &source)?.captures(text)?;
    Some(GYear {
        year: valid_year(number(&caps, 1)?)?,
        timezone: parse_timezone(caps.get(2).map(|m| m.as_str()))?,
    })
}

fn parse_g_month_day(text: &str) -> Option<GMonthDay> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let source = format!(r"^--(\d{{2}})-(\d{{2}}){TZ}$");
    let caps = pattern(&PATTERN, &source)?.captures(text)?;
    let month = number(&caps, 1)?;
    let day = number(&caps, 2)?;
    // 2000 is a leap year, so --02-29 is accepted.
    NaiveDate::from_ymd_opt(2000, month, day)?;
    Some(GMonthDay {
        month,
        day,
        timezone: parse_timezone(caps.get(3).map(|m| m.as_str()))?,
    })
}

fn parse_g_month(text: &str) -> Option<GMonth> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let source = format!(r"^--(\d{{2}}){TZ}$");
    let caps = pattern(&PATTERN, &source)?.captures(text)?;
    Some(GMonth {
        month: valid_month(number(&caps, 1)?)?,
        timezone: parse_timezone(caps.get(2).map(|m| m.as_str()))?,
    })
}

fn parse_g_day(text: &str) -> Option<GDay> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let source = format!(r"^---(\d{{2}}){TZ}$");
    let caps = pattern(&PATTERN, &source)?.captures(text)?;
    let day: u32 = number(&caps, 1)?;
    Some(GDay {
        day: (1..=31).contains(&day).then_some(day)?,
        timezone: parse_timezone(caps.get(2).map(|m| m.as_str()))?,
    })
}

fn parse_duration(text: &str) -> Option<Duration> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let caps = pattern(
        &PATTERN,
        r"^(-)?P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?(T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.(\d+))?S)?)?$",
    )?
    .captures(text)?;
    let has_date = (2..=4).any(|i| caps.get(i).is_some());
    let has_time = (6..=8).any(|i| caps.get(i).is_some());
    if !has_date && !has_time {
        return None;
    }
    if caps.get(5).is_some() && !has_time {
        return None;
    }
    let component = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    Some(Duration {
        negative: caps.get(1).is_some(),
        years: component(2)?,
        months: component(3)?,
        days: component(4)?,
        hours: component(6)?,
        minutes: component(7)?,
        seconds: component(8)?,
        nanos: caps.get(9).map_or(0, |m| fraction_to_nanos(m.as_str())),
    })
}

fn render_duration(d: &Duration) -> String {
    let mut out = String::from(if d.negative { "-P" } else { "P" });
    if d.years > 0 {
        out.push_str(&format!("{}Y", d.years));
    }
    if d.months > 0 {
        out.push_str(&format!("{}M", d.months));
    }
    if d.days > 0 {
        out.push_str(&format!("{}D", d.days));
    }
    if d.hours > 0 || d.minutes > 0 || d.seconds > 0 || d.nanos > 0 {
        out.push('T');
        if d.hours > 0 {
            out.push_str(&format!("{}H", d.hours));
        }
        if d.minutes > 0 {
            out.push_str(&format!("{}M", d.minutes));
        }
        if d.seconds > 0 || d.nanos > 0 {
            out.push_str(&format!("{}{}S", d.seconds, render_fraction(d.nanos)));
        }
    }
    if out.ends_with('P') {
        out.push_str("0D");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn round_trip(data_type: DataTypeDefXsd, text: &str) -> String {
        match Value::parse(data_type, text) {
            Ok(value) => {
                assert_eq!(value.data_type(), data_type);
                value.render()
            }
            Err(e) => panic!("{text:?} failed to parse as {data_type}: {e}"),
        }
    }

    fn rejects(data_type: DataTypeDefXsd, text: &str) {
        let err = Value::parse(data_type, text).err();
        assert_eq!(
            err.map(|e| e.kind()),
            Some(ErrorKind::InvalidLiteral),
            "{text:?} was accepted as {data_type}"
        );
    }

    #[test]
    fn integer_ranges() {
        assert_eq!(round_trip(DataTypeDefXsd::Byte, "-128"), "-128");
        rejects(DataTypeDefXsd::Byte, "128");
        assert_eq!(round_trip(DataTypeDefXsd::Int, "+42"), "42");
        rejects(DataTypeDefXsd::Int, "2147483648");
        assert_eq!(round_trip(DataTypeDefXsd::UnsignedByte, "255"), "255");
        rejects(DataTypeDefXsd::UnsignedShort, "-1");
        rejects(DataTypeDefXsd::PositiveInteger, "0");
        assert_eq!(round_trip(DataTypeDefXsd::NonNegativeInteger, "0"), "0");
        rejects(DataTypeDefXsd::NegativeInteger, "0");
        assert_eq!(round_trip(DataTypeDefXsd::NonPositiveInteger, "-007"), "-7");
        rejects(DataTypeDefXsd::Long, "1.0");
        rejects(DataTypeDefXsd::Integer, " 1");
    }

    #[test]
    fn floats() {
        assert_eq!(round_trip(DataTypeDefXsd::Double, "23.5"), "23.5");
        assert_eq!(round_trip(DataTypeDefXsd::Double, "1e100"), "1E100");
        assert_eq!(round_trip(DataTypeDefXsd::Double, "INF"), "INF");
        assert_eq!(round_trip(DataTypeDefXsd::Float, "-INF"), "-INF");
        assert_eq!(round_trip(DataTypeDefXsd::Float, "NaN"), "NaN");
        assert_eq!(round_trip(DataTypeDefXsd::Float, "0.1"), "0.1");
        rejects(DataTypeDefXsd::Double, "inf");
        rejects(DataTypeDefXsd::Double, "1,5");
    }

    #[test]
    fn booleans_and_strings() {
        assert_eq!(round_trip(DataTypeDefXsd::Boolean, "1"), "true");
        assert_eq!(round_trip(DataTypeDefXsd::Boolean, "false"), "false");
        rejects(DataTypeDefXsd::Boolean, "True");
        assert_eq!(round_trip(DataTypeDefXsd::String, ""), "");
        rejects(DataTypeDefXsd::NormalizedString, "a\tb");
        assert_eq!(round_trip(DataTypeDefXsd::Decimal, "1.50"), "1.50");
        rejects(DataTypeDefXsd::Decimal, "1e5");
    }

    #[test]
    fn binary() {
        assert_eq!(round_trip(DataTypeDefXsd::Base64Binary, "aGVs\nbG8="), "aGVsbG8=");
        assert_eq!(round_trip(DataTypeDefXsd::HexBinary, "0FB7"), "0fb7");
        rejects(DataTypeDefXsd::HexBinary, "0FB");
    }

    #[test]
    fn durations() {
        assert_eq!(round_trip(DataTypeDefXsd::Duration, "P1Y2M3DT4H5M6.5S"), "P1Y2M3DT4H5M6.5S");
        assert_eq!(round_trip(DataTypeDefXsd::Duration, "PT0S"), "P0D");
        assert_eq!(round_trip(DataTypeDefXsd::Duration, "-PT90M"), "-PT90M");
        rejects(DataTypeDefXsd::Duration, "P");
        rejects(DataTypeDefXsd::Duration, "P1DT");
        rejects(DataTypeDefXsd::Duration, "1D");
    }

    #[test]
    fn dates_and_times() {
        assert_eq!(
            round_trip(DataTypeDefXsd::DateTime, "2020-01-01T12:30:00.250+00:00"),
            "2020-01-01T12:30:00.25Z"
        );
        assert_eq!(
            round_trip(DataTypeDefXsd::DateTime, "2020-02-29T00:00:00-05:30"),
            "2020-02-29T00:00:00-05:30"
        );
        rejects(DataTypeDefXsd::DateTime, "2021-02-29T00:00:00");
        assert_eq!(round_trip(DataTypeDefXsd::Date, "1999-12-31"), "1999-12-31");
        assert_eq!(round_trip(DataTypeDefXsd::Time, "23:59:59Z"), "23:59:59Z");
        rejects(DataTypeDefXsd::Time, "24:00:00");
        assert_eq!(round_trip(DataTypeDefXsd::GYear, "2024"), "2024");
        assert_eq!(round_trip(DataTypeDefXsd::GYearMonth, "2024-07+01:00"), "2024-07+01:00");
        assert_eq!(round_trip(DataTypeDefXsd::GMonthDay, "--02-29"), "--02-29");
        rejects(DataTypeDefXsd::GMonthDay, "--02-30");
        assert_eq!(round_trip(DataTypeDefXsd::GMonth, "--11"), "--11");
        assert_eq!(round_trip(DataTypeDefXsd::GDay, "---05Z"), "---05Z");
        rejects(DataTypeDefXsd::GDay, "---32");
        rejects(DataTypeDefXsd::Date, "2020-01-01+15:00");
    }

    #[test]
    fn range_limits() {
        let max = i128::MAX.to_string();
        assert_eq!(round_trip(DataTypeDefXsd::Integer, &max), max);
        rejects(DataTypeDefXsd::Integer, "170141183460469231731687303715884105728");
        rejects(DataTypeDefXsd::Date, "-0001-01-01");
        rejects(DataTypeDefXsd::Date, "10000-01-01");
        rejects(DataTypeDefXsd::GYear, "0000");
        rejects(DataTypeDefXsd::DateTime, "2020-01-01T24:00:00");
    }
}

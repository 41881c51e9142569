//! Property-based tests for the XSD value normalizer.
//!
//! Uses proptest to verify that rendering is canonical: parsing a rendered
//! value yields the value again, and rendering is a fixpoint.

use aas_codec::model::{DataTypeDefXsd, ElementAttributes, Property, SubmodelElement, Value};
use aas_codec::{decode_fragment, encode_fragment, DecodeOptions, EncodeOptions, Format, Fragment, Selector};
use proptest::prelude::*;

fn reparse(value: &Value) -> Option<Value> {
    Value::parse(value.data_type(), &value.render()).ok()
}

// =============================================================================
// Numbers
// =============================================================================

proptest! {
    /// Integers render without sign or padding noise.
    #[test]
    fn prop_long_is_canonical(x: i64) {
        let padded = if x < 0 { format!("-000{}", x.unsigned_abs()) } else { format!("+000{x}") };
        let value = Value::parse(DataTypeDefXsd::Long, &padded);
        prop_assert_eq!(value.map(|v| v.render()).ok(), Some(x.to_string()));
    }

    /// xs:int accepts exactly the i32 range.
    #[test]
    fn prop_int_range(x: i64) {
        let accepted = Value::parse(DataTypeDefXsd::Int, &x.to_string()).is_ok();
        prop_assert_eq!(accepted, i32::try_from(x).is_ok());
    }

    /// xs:unsignedShort rejects negatives.
    #[test]
    fn prop_unsigned_short_range(x: i32) {
        let accepted = Value::parse(DataTypeDefXsd::UnsignedShort, &x.to_string()).is_ok();
        prop_assert_eq!(accepted, u16::try_from(x).is_ok());
    }

    /// Doubles survive render and parse bit for bit (NaN aside).
    #[test]
    fn prop_double_round_trip(x in any::<f64>().prop_filter("NaN", |x| !x.is_nan())) {
        let value = Value::Double(x);
        prop_assert_eq!(reparse(&value), Some(value));
    }

    /// Floats survive render and parse (NaN aside).
    #[test]
    fn prop_float_round_trip(x in any::<f32>().prop_filter("NaN", |x| !x.is_nan())) {
        let value = Value::Float(x);
        prop_assert_eq!(reparse(&value), Some(value));
    }

    /// Decimals keep their lexical form.
    #[test]
    fn prop_decimal_lexical(text in "[+-]?[0-9]{1,12}(\\.[0-9]{0,6})?") {
        let value = Value::parse(DataTypeDefXsd::Decimal, &text);
        prop_assert_eq!(value.map(|v| v.render()).ok(), Some(text));
    }
}

// =============================================================================
// Binary and text
// =============================================================================

proptest! {
    /// base64Binary round-trips arbitrary bytes.
    #[test]
    fn prop_base64_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let value = Value::Base64Binary(bytes);
        prop_assert_eq!(reparse(&value), Some(value));
    }

    /// hexBinary renders lower case and accepts either case.
    #[test]
    fn prop_hex_case(bytes in proptest::collection::vec(any::<u8>(), 0..32)) {
        let value = Value::HexBinary(bytes);
        let rendered = value.render();
        prop_assert_eq!(rendered.to_ascii_lowercase(), rendered.clone());
        let upper = Value::parse(DataTypeDefXsd::HexBinary, &rendered.to_ascii_uppercase()).ok();
        prop_assert_eq!(upper, Some(value));
    }

    /// Strings are kept verbatim.
    #[test]
    fn prop_string_verbatim(text in "\\PC*") {
        let value = Value::parse(DataTypeDefXsd::String, &text);
        prop_assert_eq!(value.map(|v| v.render()).ok(), Some(text));
    }
}

// =============================================================================
// Dates and durations
// =============================================================================

proptest! {
    /// Durations built from components render as a fixpoint.
    #[test]
    fn prop_duration_fixpoint(
        negative: bool,
        years in 0u32..100,
        months in 0u32..24,
        days in 0u32..400,
        hours in 0u32..48,
        minutes in 0u32..120,
        seconds in 0u32..120,
        millis in 0u32..1000,
    ) {
        let text = format!(
            "{}P{years}Y{months}M{days}DT{hours}H{minutes}M{seconds}.{millis:03}S",
            if negative { "-" } else { "" }
        );
        let value = Value::parse(DataTypeDefXsd::Duration, &text);
        prop_assert!(value.is_ok(), "{} rejected", text);
        let rendered = value.map(|v| v.render()).unwrap_or_default();
        let again = Value::parse(DataTypeDefXsd::Duration, &rendered).map(|v| v.render()).ok();
        prop_assert_eq!(again, Some(rendered));
    }

    /// Calendar dates render exactly as written.
    #[test]
    fn prop_date_exact(year in 1i32..=9999, month in 1u32..=12, day in 1u32..=28) {
        let text = format!("{year:04}-{month:02}-{day:02}");
        let value = Value::parse(DataTypeDefXsd::Date, &text);
        prop_assert_eq!(value.map(|v| v.render()).ok(), Some(text));
    }

    /// Date-times with any valid offset survive render and parse.
    #[test]
    fn prop_date_time_round_trip(
        day in 1u32..=28,
        hour in 0u32..24,
        minute in 0u32..60,
        offset_hours in -13i32..=13,
        offset_minutes in prop::sample::select(vec![0u32, 30, 45]),
    ) {
        let sign = if offset_hours < 0 { '-' } else { '+' };
        let text = format!(
            "2024-02-{day:02}T{hour:02}:{minute:02}:00{sign}{:02}:{offset_minutes:02}",
            offset_hours.unsigned_abs()
        );
        let value = Value::parse(DataTypeDefXsd::DateTime, &text);
        prop_assert!(value.is_ok(), "{} rejected", text);
        let value = value.ok();
        prop_assert_eq!(value.as_ref().and_then(reparse), value);
    }
}

// =============================================================================
// Values inside documents
// =============================================================================

proptest! {
    /// A typed property value reads back identically from both formats.
    #[test]
    fn prop_property_value_in_both_formats(x: i64) {
        let mut property = Property::new(ElementAttributes::named("value"), DataTypeDefXsd::Long);
        property.value = Some(Value::Long(x));
        let fragment = Fragment::Object(SubmodelElement::from(property).into());
        for format in Format::ALL {
            let mut bytes = Vec::new();
            prop_assert!(encode_fragment(format, &fragment, &mut bytes, &EncodeOptions::new()).is_ok());
            let back = decode_fragment(format, bytes.as_slice(), Selector::Property, &DecodeOptions::strict());
            prop_assert_eq!(back.ok(), Some(fragment.clone()));
        }
    }
}

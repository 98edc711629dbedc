//! Defensive number parsing for persisted geometry.
//!
//! Persisted decimal columns can come back as JSON numbers or as
//! decimal-formatted strings (`"12.50"`). Matching must never fail on a bad
//! bound, so anything non-numeric reads as `0.0`.

use std::fmt;

use serde::Deserializer;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};

/// Parse a string as a finite `f64`, defaulting to `0.0`.
pub fn parse_lenient_f64(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Serde `deserialize_with` adapter for lenient `f64` fields.
///
/// ```
/// #[derive(serde::Deserialize)]
/// struct Bounds {
///     #[serde(deserialize_with = "gutter_core::lenient::deserialize_f64")]
///     x: f64,
/// }
/// let b: Bounds = serde_json::from_str(r#"{"x":"12.50"}"#).unwrap();
/// assert_eq!(b.x, 12.5);
/// ```
pub fn deserialize_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientF64Visitor)
}

struct LenientF64Visitor;

impl LenientF64Visitor {
    fn finite_or_zero(value: f64) -> f64 {
        if value.is_finite() { value } else { 0.0 }
    }
}

impl<'de> Visitor<'de> for LenientF64Visitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a decimal string")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<f64, E> {
        Ok(Self::finite_or_zero(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<f64, E> {
        Ok(value as f64)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<f64, E> {
        Ok(value as f64)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<f64, E> {
        Ok(parse_lenient_f64(value))
    }

    fn visit_bool<E: de::Error>(self, _value: bool) -> Result<f64, E> {
        Ok(0.0)
    }

    fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
        Ok(0.0)
    }

    fn visit_none<E: de::Error>(self) -> Result<f64, E> {
        Ok(0.0)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<f64, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(0.0)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<f64, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(0.0)
    }
}

//! Numeric precision normalization.

use serde_json::{Number, Value};

use crate::models::Record;

/// Round to 2 decimal places.
///
/// Rounds the exact binary value, so `0.125` goes to the even digit and
/// `1.285` (stored just below the midpoint) goes down.
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Round every fractional field of every record to 2 decimal places.
///
/// Integer fields and non-numeric fields are left alone, so applying this
/// twice gives the same records as applying it once.
pub fn normalize_records(records: &mut [Record]) {
    for record in records.iter_mut() {
        for value in record.fields.values_mut() {
            normalize_value(value);
        }
    }
}

fn normalize_value(value: &mut Value) {
    let Value::Number(number) = value else {
        return;
    };
    if !number.is_f64() {
        return;
    }
    if let Some(rounded) = number.as_f64().map(round2).and_then(Number::from_f64) {
        *number = rounded;
    }
}

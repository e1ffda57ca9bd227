//! Mapping of webhook payloads onto target fields
//!
//! Locators here are path expressions (see [`crate::core::path`]).

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::core::coerce::{coerce, TypedValue};
use crate::core::mapping::FieldMapping;
use crate::core::path::{extract, FindAnchor};
use crate::core::value::PayloadExt;

/// Extract and coerce every mapped field
///
/// Fields with an empty or `ignore` locator are absent from the result;
/// mapped fields that do not resolve are present as `None`.
pub fn apply_mappings(
    payload: &Value,
    mapping: &FieldMapping,
    anchor: FindAnchor,
) -> BTreeMap<String, Option<TypedValue>> {
    mapping
        .mapped()
        .map(|(field, path)| {
            let value = extract(payload, path, anchor).and_then(|raw| coerce(field, raw));
            (field.to_string(), value)
        })
        .collect()
}

/// Outcome of checking a mapping against a payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingValidation {
    pub is_valid: bool,
    /// Required fields with no locator
    pub missing_fields: Vec<String>,
    /// Required fields whose locator yields nothing on this payload
    pub errors: Vec<String>,
}

/// Check that every required field is mapped and resolves to a value
pub fn validate_mappings<S: AsRef<str>>(
    payload: &Value,
    mapping: &FieldMapping,
    required: &[S],
    anchor: FindAnchor,
) -> MappingValidation {
    let mut result = MappingValidation::default();

    for field in required.iter().map(|f| f.as_ref()) {
        let Some(path) = mapping.locator(field) else {
            result.missing_fields.push(field.to_string());
            continue;
        };

        let reason = match extract(payload, path, anchor) {
            None => Some("did not resolve"),
            Some(Value::Null) => Some("resolved to null"),
            Some(v) if v.is_blank() => Some("resolved to an empty string"),
            Some(_) => None,
        };
        if let Some(reason) = reason {
            result
                .errors
                .push(format!("{}: path '{}' {}", field, path, reason));
        }
    }

    result.is_valid = result.missing_fields.is_empty() && result.errors.is_empty();
    result
}

/// Whether a payload is a reservation event envelope:
/// `{"object": "reservation", "data": {...}}`
pub fn is_reservation_envelope(payload: &Value) -> bool {
    payload.field("object").and_then(Value::as_str) == Some("reservation")
        && payload.field("data").is_some_and(Value::is_object)
}

fn finance(name: &str) -> String {
    format!("data.financeField.find(f => f.name === \"{}\").total", name)
}

/// Known locators for reservation event envelopes
fn reservation_mapping() -> FieldMapping {
    let mut mapping = FieldMapping::new();
    for (field, path) in [
        ("reservationCode", "data.channelReservationId"),
        ("guestName", "data.guestName"),
        ("guestEmail", "data.guestEmail"),
        ("listingName", "data.listingName"),
        ("platform", "data.channelName"),
        ("checkInDate", "data.arrivalDate"),
        ("checkOutDate", "data.departureDate"),
        ("numNights", "data.nights"),
        ("totalPrice", "data.totalPrice"),
    ] {
        mapping.insert(field, path);
    }
    for (field, item) in [
        ("accommodationFee", "baseRate"),
        ("cleaningFee", "cleaningFeeValue"),
        ("lodgingTax", "lodgingTax"),
        ("salesTax", "salesTax"),
        ("channelFee", "hostChannelFee"),
        ("paymentFees", "paymentServiceProcessingFees"),
    ] {
        mapping.insert(field, finance(item));
    }
    mapping
}

/// Key spellings probed for each field when the payload shape is unknown,
/// in priority order
const FALLBACK_KEYS: &[(&str, &[&str])] = &[
    ("guestName", &["guest_name", "guestName", "name"]),
    ("guestEmail", &["guest_email", "guestEmail", "email"]),
    (
        "checkInDate",
        &["check_in", "checkIn", "check_in_date", "checkInDate", "arrival_date", "arrivalDate"],
    ),
    (
        "checkOutDate",
        &["check_out", "checkOut", "check_out_date", "checkOutDate", "departure_date", "departureDate"],
    ),
];

/// Propose a mapping for a payload
///
/// Reservation envelopes get the full known mapping. Anything else is probed
/// for a handful of fields on its `data` object (or the payload itself when
/// there is none); the result may be incomplete.
pub fn suggest_from_payload(payload: &Value) -> FieldMapping {
    if is_reservation_envelope(payload) {
        debug!("Recognized reservation envelope");
        return reservation_mapping();
    }

    let (container, prefix) = match payload.field("data") {
        Some(data) if data.is_object() => (data, "data."),
        _ => (payload, ""),
    };

    let mut mapping = FieldMapping::new();
    for (field, keys) in FALLBACK_KEYS {
        let found = keys
            .iter()
            .find(|key| container.field(key).is_some_and(|v| !v.is_blank()));
        if let Some(key) = found {
            debug!(field, key, "Probed payload key");
            mapping.insert(*field, format!("{}{}", prefix, key));
        }
    }
    mapping
}

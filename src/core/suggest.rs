//! Mapping suggestions from source names to target fields
//!
//! Source names are CSV headers or webhook leaf paths. A source name matches
//! a rule pattern when, after [`normalize`], either one contains the other.
//! The first match for a target field wins and is never replaced.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::core::schema::MappingRule;

/// Lowercase and keep only ASCII letters and digits
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Suggest a source name for each target field
///
/// Source names are visited in order; for each, every rule that has no
/// suggestion yet is tried in order. One source name may satisfy several
/// rules. Target fields with no match are absent from the result.
///
/// Names and patterns that normalize to nothing (such as `---`) never match,
/// although an empty string is technically contained in every pattern.
pub fn suggest<S: AsRef<str>>(source_names: &[S], rules: &[MappingRule]) -> BTreeMap<String, String> {
    let mut suggestions = BTreeMap::new();

    // Normalize patterns once; rules keep their order
    let normalized_rules: Vec<(&str, Vec<String>)> = rules
        .iter()
        .map(|rule| {
            let patterns = rule
                .patterns
                .iter()
                .map(|p| normalize(p))
                .filter(|p| !p.is_empty())
                .collect();
            (rule.field.as_str(), patterns)
        })
        .collect();

    for source in source_names {
        let source = source.as_ref();
        let name = normalize(source);
        if name.is_empty() {
            continue;
        }

        for (field, patterns) in &normalized_rules {
            if suggestions.contains_key(*field) {
                continue;
            }
            if let Some(pattern) = patterns
                .iter()
                .find(|p| name.contains(p.as_str()) || p.contains(name.as_str()))
            {
                debug!(source, field, pattern = pattern.as_str(), "Suggested mapping");
                suggestions.insert(field.to_string(), source.to_string());
            }
        }
    }

    suggestions
}

/// Same suggestions keyed by source name
///
/// A source chosen for several target fields keeps the first in rule order.
pub fn suggest_inverse<S: AsRef<str>>(
    source_names: &[S],
    rules: &[MappingRule],
) -> BTreeMap<String, String> {
    let forward = suggest(source_names, rules);
    let mut inverse = BTreeMap::new();
    for rule in rules {
        if let Some(source) = forward.get(&rule.field) {
            inverse
                .entry(source.clone())
                .or_insert_with(|| rule.field.clone());
        }
    }
    inverse
}

/// Dotted paths to every scalar leaf of a payload
///
/// Object keys are visited in map order (sorted). Array elements are
/// written with indices (`items[0].price`). Empty arrays and objects
/// contribute nothing.
pub fn leaf_paths(payload: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_leaves(payload, String::new(), &mut paths);
    paths
}

fn collect_leaves(value: &Value, prefix: String, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                collect_leaves(child, path, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_leaves(child, format!("{}[{}]", prefix, i), out);
            }
        }
        _ => {
            if !prefix.is_empty() {
                out.push(prefix);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::default_rules;
    use serde_json::json;

    fn rule(field: &str, patterns: &[&str]) -> MappingRule {
        MappingRule::new(field, patterns)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Check-in Date"), "checkindate");
        assert_eq!(normalize("# of Nights"), "ofnights");
        assert_eq!(normalize("Prénom"), "prnom");
        assert_eq!(normalize("---"), "");
    }

    #[test]
    fn test_suggest_case_and_punctuation_insensitive() {
        let result = suggest(&["Guest Email"], &[rule("email", &["email"])]);
        assert_eq!(result.get("email").map(String::as_str), Some("Guest Email"));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_suggest_reverse_containment() {
        let result = suggest(&["Guest"], &[rule("guestName", &["guest name"])]);
        assert_eq!(result.get("guestName").map(String::as_str), Some("Guest"));
    }

    #[test]
    fn test_first_match_wins() {
        let rules = [rule("total", &["total"])];
        let result = suggest(&["Total Payout", "Total"], &rules);
        assert_eq!(result.get("total").map(String::as_str), Some("Total Payout"));
    }

    #[test]
    fn test_one_source_can_satisfy_several_rules() {
        let rules = [rule("a", &["fee"]), rule("b", &["cleaning"])];
        let result = suggest(&["Cleaning Fee"], &rules);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_unmatched_fields_absent() {
        let rules = [rule("guestName", &["guest"]), rule("gst", &["gst"])];
        let result = suggest(&["Guest"], &rules);
        assert!(result.contains_key("guestName"));
        assert!(!result.contains_key("gst"));
        assert!(suggest::<&str>(&[], &rules).is_empty());
    }

    #[test]
    fn test_empty_names_and_patterns_ignored() {
        let rules = [rule("guestName", &["", "guest"])];
        assert!(suggest(&["--", "Listing"], &rules).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let headers = [
            "Confirmation code",
            "Guest name",
            "Start date",
            "End date",
            "# of nights",
            "Listing",
            "Earnings",
        ];
        let rules = default_rules();
        let first = suggest(&headers, &rules);
        for _ in 0..5 {
            assert_eq!(suggest(&headers, &rules), first);
        }
    }

    #[test]
    fn test_default_rules_on_airbnb_export() {
        let headers = [
            "Confirmation code",
            "Status",
            "Guest name",
            "Start date",
            "End date",
            "# of nights",
            "Listing",
            "Earnings",
        ];
        let result = suggest(&headers, &default_rules());
        insta::assert_yaml_snapshot!(result, @r###"
        checkInDate: Start date
        checkOutDate: End date
        guestName: Guest name
        listingName: Listing
        netEarnings: Earnings
        numNights: "# of nights"
        reservationCode: Confirmation code
        "###);
    }

    #[test]
    fn test_suggest_inverse() {
        let rules = [rule("a", &["fee"]), rule("b", &["cleaning"])];
        let result = suggest_inverse(&["Cleaning Fee", "Other"], &rules);
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("Cleaning Fee").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_leaf_paths() {
        let payload = json!({
            "object": "reservation",
            "data": {
                "guest": {"name": "Ann", "email": null},
                "items": [{"price": 1}, {"price": 2}],
                "tags": []
            }
        });
        assert_eq!(
            leaf_paths(&payload),
            vec![
                "data.guest.email",
                "data.guest.name",
                "data.items[0].price",
                "data.items[1].price",
                "object",
            ]
        );
    }

    #[test]
    fn test_suggest_on_leaf_paths() {
        let payload = json!({"data": {"guest_name": "Ann", "arrival_date": "2024-03-01"}});
        let result = suggest(&leaf_paths(&payload), &default_rules());
        assert_eq!(result.get("guestName").map(String::as_str), Some("data.guest_name"));
        assert_eq!(result.get("checkInDate").map(String::as_str), Some("data.arrival_date"));
    }
}

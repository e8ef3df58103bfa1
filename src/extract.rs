//! Field extraction over raw vCard text.
//!
//! This is deliberately not a full RFC 6350 parser: every lookup is a
//! line-oriented, case-insensitive literal match on `KEY:` so that a key
//! such as `ADR;TYPE=home` has to appear verbatim in the source line.
//! Malformed or missing entries resolve to empty values, never to errors.

use serde::Serialize;

const ADDRESS_KEY: &str = "ADR;TYPE=home";
const URL_KEY: &str = "URL";
const CREDENTIAL_KEYS: [&str; 3] = ["ROLE", "X-CREDENCIAL", "X-LICENCIA"];

/// Contact fields pulled out of a single vCard document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactRecord {
    pub full_name: String,
    pub organization: String,
    pub title: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub note: String,
    pub school: String,
    pub urls: Vec<String>,
    pub credential: String,
}

/// Build a [`ContactRecord`] from raw vCard text. Accepts any input,
/// including the empty string.
pub fn extract(text: &str) -> ContactRecord {
    ContactRecord {
        full_name: get_value(text, "FN"),
        organization: get_value(text, "ORG"),
        title: get_value(text, "TITLE"),
        phone: get_value(text, "TEL"),
        email: get_value(text, "EMAIL"),
        address: get_address(text),
        note: get_value(text, "NOTE"),
        school: get_value(text, "X-SCHOOL"),
        urls: get_all_urls(text),
        credential: get_credential(text),
    }
}

/// Trimmed value of the first `<key>:<value>` line, or an empty string.
pub fn get_value(text: &str, key: &str) -> String {
    values(text, key)
        .next()
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// Home address with empty `;` components dropped and the rest joined by
/// single spaces.
pub fn get_address(text: &str) -> String {
    let adr = get_value(text, ADDRESS_KEY);
    if adr.is_empty() {
        return String::new();
    }

    adr.split(';')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Every `URL:` value in the order it appears, duplicates included.
pub fn get_all_urls(text: &str) -> Vec<String> {
    values(text, URL_KEY)
        .map(|value| value.trim().to_string())
        .collect()
}

/// First non-empty of ROLE, X-CREDENCIAL, X-LICENCIA.
pub fn get_credential(text: &str) -> String {
    CREDENTIAL_KEYS
        .iter()
        .map(|key| get_value(text, key))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Line terminators: CR, LF and the Unicode line and paragraph separators.
/// A CRLF pair simply yields an extra empty line.
const LINE_BREAKS: [char; 4] = ['\n', '\r', '\u{2028}', '\u{2029}'];

/// Raw (untrimmed) values of every line whose key is exactly `key`.
fn values<'a>(text: &'a str, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    text.split(LINE_BREAKS)
        .filter_map(move |line| value_for_key(line, key))
}

fn value_for_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    // `str::get` rejects a split inside a multi-byte character
    let prefix = line.get(..key.len())?;
    if !prefix.eq_ignore_ascii_case(key) {
        return None;
    }
    line[key.len()..].strip_prefix(':')
}

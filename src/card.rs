//! Binding a parsed [`ContactRecord`] to display-ready card values.
//!
//! Everything a renderer needs (derived links, URL slot routing, credential
//! visibility, the export file name) is computed here so the renderers only
//! format.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::ContactConfig;
use crate::extract::ContactRecord;

/// Literal two-character escape used for line breaks inside NOTE.
const NOTE_LINE_BREAK: &str = "\\n";

const DEFAULT_FILE_STEM: &str = "contacto";

/// Named link slots, each matched by case-insensitive URL substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSlots {
    slots: BTreeMap<String, Vec<String>>,
}

impl Default for LinkSlots {
    fn default() -> Self {
        let mut slots = Self::empty();
        for name in ["linkedin", "github", "instagram"] {
            slots.insert(name.to_string(), vec![name.to_string()]);
        }
        slots
    }
}

impl LinkSlots {
    pub fn empty() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, slot: String, patterns: Vec<String>) {
        let patterns = patterns.into_iter().map(|p| p.to_lowercase()).collect();
        self.slots.insert(slot, patterns);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// First URL matching each slot, in slot-name order.
    pub fn classify(&self, urls: &[String]) -> Vec<SlotLink> {
        self.slots
            .iter()
            .map(|(slot, patterns)| SlotLink {
                slot: slot.clone(),
                url: urls
                    .iter()
                    .find(|url| {
                        let lower = url.to_lowercase();
                        patterns.iter().any(|p| lower.contains(p.as_str()))
                    })
                    .cloned(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotLink {
    pub slot: String,
    pub url: Option<String>,
}

/// Display-ready card values derived from a [`ContactRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub name: String,
    pub organization: String,
    pub title: String,
    pub school: String,
    pub address: String,
    pub note_lines: Vec<String>,
    pub phone_link: Option<String>,
    pub email_link: Option<String>,
    pub slots: Vec<SlotLink>,
    /// `None` hides the credential block
    pub credential: Option<String>,
    pub download_name: String,
}

impl CardView {
    pub fn bind(record: &ContactRecord, links: &LinkSlots, contact: &ContactConfig) -> Self {
        Self {
            name: record.full_name.clone(),
            organization: record.organization.clone(),
            title: record.title.clone(),
            school: record.school.clone(),
            address: record.address.clone(),
            note_lines: note_lines(&record.note),
            phone_link: phone_link(&record.phone, &contact.phone_link_base),
            email_link: email_link(&record.email),
            slots: links.classify(&record.urls),
            credential: non_empty(&record.credential),
            download_name: download_name(&record.full_name, &contact.fallback_file_stem),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn note_lines(note: &str) -> Vec<String> {
    if note.is_empty() {
        return Vec::new();
    }
    note.split(NOTE_LINE_BREAK).map(str::to_string).collect()
}

/// Messaging deep link from the digits of `phone`.
pub fn phone_link(phone: &str, base: &str) -> Option<String> {
    if phone.trim().is_empty() {
        return None;
    }
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    Some(format!("{base}{digits}"))
}

pub fn email_link(email: &str) -> Option<String> {
    non_empty(email).map(|email| format!("mailto:{email}"))
}

/// `<FN with spaces replaced by underscores>.vcf`, or the fallback stem when
/// FN leaves nothing usable as a file name.
pub fn download_name(full_name: &str, fallback_stem: &str) -> String {
    let stem = file_stem(full_name)
        .or_else(|| file_stem(fallback_stem))
        .unwrap_or_else(|| DEFAULT_FILE_STEM.to_string());
    format!("{stem}.vcf")
}

/// Spaces, path separators and control characters become `_`; leading dots
/// are dropped so the result is always a plain file name.
fn file_stem(raw: &str) -> Option<String> {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = replaced.trim_start_matches('.');
    (!stem.is_empty()).then(|| stem.to_string())
}

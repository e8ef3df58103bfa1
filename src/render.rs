//! Output formats for a bound card.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use crate::card::CardView;
use crate::extract::ContactRecord;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Html,
    Json,
}

pub fn render(format: Format, record: &ContactRecord, view: &CardView) -> Result<String> {
    match format {
        Format::Text => Ok(render_text(view)),
        Format::Html => Ok(render_html(view)),
        Format::Json => render_json(record, view),
    }
}

/// Plain-text card; empty fields are left out entirely.
pub fn render_text(view: &CardView) -> String {
    let mut out = String::new();

    let header: Vec<&str> = [view.name.as_str(), view.organization.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if !header.is_empty() {
        out.push_str(&header.join(" | "));
        out.push('\n');
    }

    push_line(&mut out, "Title", &view.title);
    push_line(&mut out, "School", &view.school);
    push_line(&mut out, "Address", &view.address);
    if let Some(link) = &view.phone_link {
        push_line(&mut out, "Phone", link);
    }
    if let Some(link) = &view.email_link {
        push_line(&mut out, "Email", link);
    }
    for slot in &view.slots {
        if let Some(url) = &slot.url {
            push_line(&mut out, &slot.slot, url);
        }
    }
    if let Some(credential) = &view.credential {
        push_line(&mut out, "Credential", credential);
    }

    if !view.note_lines.is_empty() {
        out.push('\n');
        for line in &view.note_lines {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

fn push_line(out: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let _ = writeln!(out, "{label}: {value}");
}

/// HTML fragment using the card page's selectors.
pub fn render_html(view: &CardView) -> String {
    let mut out = String::new();
    out.push_str("<section class=\"card\">\n");
    let _ = writeln!(out, "  <h1>{}</h1>", escape_html(&view.name));
    let _ = writeln!(out, "  <h2>{}</h2>", escape_html(&view.organization));
    let _ = writeln!(
        out,
        "  <p class=\"cargo\"><i class=\"fas fa-briefcase\"></i> {}</p>",
        escape_html(&view.title)
    );
    let _ = writeln!(
        out,
        "  <p class=\"ubicacion uni\"><i class=\"fas fa-university\"></i> {}</p>",
        escape_html(&view.school)
    );
    let _ = writeln!(
        out,
        "  <p class=\"ubicacion direccion\"><i class=\"fas fa-map-marker-alt\"></i> {}</p>",
        escape_html(&view.address)
    );

    let note = view
        .note_lines
        .iter()
        .map(|line| escape_html(line))
        .collect::<Vec<_>>()
        .join("<br>");
    let _ = writeln!(out, "  <div class=\"mensaje\"><p>{note}</p></div>");

    push_anchor(&mut out, "whatsapp", view.phone_link.as_deref());
    push_anchor(&mut out, "email", view.email_link.as_deref());
    for slot in &view.slots {
        push_anchor(&mut out, &slot.slot, slot.url.as_deref());
    }

    match &view.credential {
        Some(credential) => {
            let _ = writeln!(
                out,
                "  <p id=\"credencial\"><span>{}</span></p>",
                escape_html(credential)
            );
        }
        None => out.push_str("  <p id=\"credencial\" hidden><span></span></p>\n"),
    }

    let _ = writeln!(
        out,
        "  <a id=\"guardarContacto\" download=\"{}\">Save contact</a>",
        escape_html(&view.download_name)
    );
    out.push_str("</section>\n");
    out
}

fn push_anchor(out: &mut String, class: &str, href: Option<&str>) {
    let href = href.map(str::trim).filter(|h| !h.is_empty()).unwrap_or("#");
    let _ = writeln!(
        out,
        "  <a class=\"{}\" href=\"{}\"></a>",
        escape_html(class),
        escape_html(href)
    );
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Serialize)]
struct JsonCard<'a> {
    record: &'a ContactRecord,
    card: &'a CardView,
}

pub fn render_json(record: &ContactRecord, view: &CardView) -> Result<String> {
    let mut json = serde_json::to_string_pretty(&JsonCard { record, card: view })
        .context("failed to serialize card as JSON")?;
    json.push('\n');
    Ok(json)
}

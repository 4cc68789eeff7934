//! Turns one event or a batch of events into channel-agnostic message text.
//!
//! Pure functions, no I/O. Every channel adapter receives the same composed
//! string; channel-specific framing (mail subject, HTML parse mode) lives in
//! the adapters.

use crate::core::{BookEvent, LinkBuilder};

/// Sentinel shown when a book has no authors on record.
const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Maximum number of titles listed in a batch message before eliding.
const MAX_LISTED: usize = 10;

/// Composes the notification text for a batch of events.
///
/// One event produces the singular template with an optional deep link;
/// several events produce a count header, up to [`MAX_LISTED`] numbered
/// lines, and an elision line for the remainder. An empty batch yields an
/// empty string; the dispatch loop checks emptiness before calling.
pub fn compose_batch(events: &[BookEvent], links: &dyn LinkBuilder) -> String {
    match events {
        [] => String::new(),
        [event] => compose_single(event, links),
        _ => compose_many(events),
    }
}

fn compose_single(event: &BookEvent, links: &dyn LinkBuilder) -> String {
    let mut message = format!(
        "\u{1f4da} New book available!\n\nTitle: {}\nAuthor(s): {}",
        event.title,
        format_authors(&event.authors)
    );

    if let Some(url) = event.book_id.and_then(|id| links.book_url(id)) {
        message.push_str(&format!("\n\n\u{1f517} {}", url));
    }

    message
}

fn compose_many(events: &[BookEvent]) -> String {
    let mut lines = vec![format!("\u{1f4da} {} new books available!", events.len())];

    for (i, event) in events.iter().take(MAX_LISTED).enumerate() {
        lines.push(format!(
            "{}. {} \u{2014} {}",
            i + 1,
            event.title,
            format_authors(&event.authors)
        ));
    }

    let remainder = events.len().saturating_sub(MAX_LISTED);
    if remainder > 0 {
        lines.push(format!("\u{2026} and {} more", remainder));
    }

    lines.join("\n")
}

fn format_authors(authors: &[String]) -> String {
    if authors.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        authors.join(", ")
    }
}

/// Builds book deep links from a configured external base URL.
///
/// When no base URL is configured, every lookup returns `None` and the
/// composer simply omits the link line.
pub struct BaseUrlLinkBuilder {
    base_url: Option<String>,
}

impl BaseUrlLinkBuilder {
    pub fn new(base_url: Option<String>) -> Self {
        Self { base_url }
    }
}

impl LinkBuilder for BaseUrlLinkBuilder {
    fn book_url(&self, book_id: i64) -> Option<String> {
        self.base_url
            .as_deref()
            .map(|base| format!("{}/book/{}", base.trim_end_matches('/'), book_id))
    }
}

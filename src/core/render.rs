//! Render step: page of records → display rows
//!
//! Rows are plain data so any front end (terminal, HTML template, test) can
//! draw them. Nothing here touches storage or the collection.

use crate::core::entity::EntityId;
use crate::core::query::PaginatedResponse;
use serde::Serialize;

/// One record prepared for display
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayRow {
    pub id: EntityId,
    pub title: String,
    pub subtitle: String,
    /// Short labels (category, tags, status)
    pub badges: Vec<String>,
    /// Right-aligned details (date, amount, views)
    pub meta: Vec<String>,
}

/// A rendered page: rows plus a footer describing the pagination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPage {
    pub rows: Vec<DisplayRow>,
    pub footer: String,
}

impl RenderedPage {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Records that know how to present themselves as a [`DisplayRow`]
pub trait Render {
    fn to_row(&self) -> DisplayRow;
}

impl<T: Render + ?Sized> Render for &T {
    fn to_row(&self) -> DisplayRow {
        (**self).to_row()
    }
}

/// Render every record of `page` in order
pub fn render_page<T: Render>(page: &PaginatedResponse<T>) -> RenderedPage {
    let rows: Vec<DisplayRow> = page.data.iter().map(|r| r.to_row()).collect();
    let meta = &page.pagination;

    let footer = if meta.total == 0 {
        "No results".to_string()
    } else {
        let start = (meta.page - 1) * meta.page_size + 1;
        let end = start + rows.len().saturating_sub(1);
        format!(
            "Showing {}-{} of {} (page {} of {})",
            start, end, meta.total, meta.page, meta.total_pages
        )
    };

    RenderedPage { rows, footer }
}

/// Format `amount` in `currency` with its symbol and thousands separators.
///
/// Unknown codes fall back to `"<CODE> 1,234.50"`. Yen and won have no
/// minor unit.
pub fn format_amount(amount: f64, currency: &str) -> String {
    let code = currency.trim().to_ascii_uppercase();
    let decimals = match code.as_str() {
        "JPY" | "KRW" => 0,
        _ => 2,
    };
    let number = group_thousands(amount.abs(), decimals);
    let sign = if amount < 0.0 && number.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };

    match currency_symbol(&code) {
        Some(symbol) => format!("{}{}{}", sign, symbol, number),
        None => format!("{}{} {}", sign, code, number),
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    Some(match code {
        "USD" | "CAD" | "AUD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "INR" => "₹",
        "KRW" => "₩",
        "CHF" => "CHF ",
        _ => return None,
    })
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    let (whole, fraction) = match formatted.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{}.{}", grouped, fraction),
        None => grouped,
    }
}

/// First `max_chars` characters of `text`, cut at a word boundary.
///
/// Whitespace is collapsed; an ellipsis marks truncation.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let cut: String = collapsed.chars().take(max_chars).collect();
    let trimmed = match cut.rfind(' ') {
        Some(space) if space > 0 => &cut[..space],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed.trim_end_matches(|c: char| c.is_ascii_punctuation()))
}

/// Estimated reading time at 200 words per minute, at least one minute
pub fn reading_time_minutes(text: &str) -> usize {
    const WORDS_PER_MINUTE: usize = 200;
    text.split_whitespace().count().div_ceil(WORDS_PER_MINUTE).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::{PageRequest, PaginationMeta};

    struct Line(EntityId, &'static str);

    impl Render for Line {
        fn to_row(&self) -> DisplayRow {
            DisplayRow {
                id: self.0,
                title: self.1.to_string(),
                ..DisplayRow::default()
            }
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234.5, "usd"), "$1,234.50");
        assert_eq!(format_amount(-42.0, "EUR"), "-€42.00");
        assert_eq!(format_amount(1500000.0, "JPY"), "¥1,500,000");
        assert_eq!(format_amount(999.999, "GBP"), "£1,000.00");
        assert_eq!(format_amount(12.0, "BRL"), "BRL 12.00");
        assert_eq!(format_amount(-0.001, "USD"), "$0.00");
    }

    #[test]
    fn test_excerpt_cuts_on_word_boundary() {
        assert_eq!(excerpt("short text", 50), "short text");
        assert_eq!(excerpt("Ownership  rules,\nexplained simply", 20), "Ownership rules...");
        assert_eq!(excerpt("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(401)), 3);
    }

    #[test]
    fn test_render_page_footer() {
        let page = PaginatedResponse {
            data: vec![Line(3, "c"), Line(4, "d")],
            pagination: PaginationMeta::new(PageRequest::new(2, 2), 5),
        };
        let rendered = render_page(&page);
        assert_eq!(rendered.rows.len(), 2);
        assert_eq!(rendered.rows[0].title, "c");
        assert_eq!(rendered.footer, "Showing 3-4 of 5 (page 2 of 3)");

        let empty: PaginatedResponse<Line> = PaginatedResponse {
            data: vec![],
            pagination: PaginationMeta::new(PageRequest::default(), 0),
        };
        assert_eq!(render_page(&empty).footer, "No results");
    }
}

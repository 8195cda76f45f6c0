//! One-paragraph natural-language summaries of entities.

use std::sync::LazyLock;

use regex::Regex;

use crate::assemble::DecorationError;
use crate::types::Entity;

static PARENTHESISED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("Invalid regex"));

/// Produces the display summary for a ranked entity.
pub trait SummaryGenerator: Send + Sync {
    fn summarize(&self, entity: &Entity) -> Result<String, DecorationError>;
}

/// Fixed-template summarizer.
///
/// ```text
/// Luigi is a upscale (average $ 1,200 for two) Italian restaurant, situated
/// in Trastevere. It has a rating of 4.5/5. You can find it at Via Roma 1.
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSummarizer;

impl SummaryGenerator for TemplateSummarizer {
    fn summarize(&self, entity: &Entity) -> Result<String, DecorationError> {
        let price = price_description(entity.price_range, entity.avg_cost, &entity.currency);
        let rating = rating_text(entity.rating);

        let location = if !entity.locality.is_empty() && !entity.address.is_empty() {
            format!(", situated in {}", entity.locality)
        } else {
            String::new()
        };

        let mut summary = format!(
            "{} is a {price} {} restaurant{location}. It has a rating of {rating}.",
            entity.name, entity.cuisine
        );

        if !entity.address.is_empty() && !entity.address.starts_with(&entity.locality) {
            summary.push_str(&format!(" You can find it at {}.", entity.address));
        }

        Ok(summary)
    }
}

pub fn price_label(price_range: Option<u8>) -> &'static str {
    match price_range {
        Some(1) => "budget-friendly",
        Some(2) => "casual dining",
        Some(3) => "upscale",
        Some(4) => "fine dining",
        Some(5) => "luxury",
        _ => "moderately priced",
    }
}

/// Price label, plus the average cost for two when one is known.
pub fn price_description(price_range: Option<u8>, avg_cost: f64, currency: &str) -> String {
    let label = price_label(price_range);
    if !(avg_cost.is_finite() && avg_cost > 0.0) {
        return label.to_string();
    }

    let cost = group_thousands(avg_cost.trunc() as u64);
    match currency_symbol(currency) {
        Some(symbol) => format!("{label} (average {symbol} {cost} for two)"),
        None => format!("{label} (average {cost} for two)"),
    }
}

/// Maps dataset currency names to a display symbol.
///
/// Falls back to a parenthesised symbol inside the name (`"Botswana
/// Pula(P)"`), then to the raw string.
pub fn currency_symbol(currency: &str) -> Option<String> {
    let trimmed = currency.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    let has_word = |word: &str| {
        lower
            .split(|c: char| !c.is_ascii_alphabetic())
            .any(|token| token == word)
    };

    let symbol = if lower.contains("rupee") || has_word("rs") {
        "₹"
    } else if lower.contains("pula") {
        "P"
    } else if lower.contains("dollar") || lower.contains("usd") {
        "$"
    } else if lower.contains("euro") {
        "€"
    } else if lower.contains("pound") || lower.contains("gbp") {
        "£"
    } else if let Some(captures) = PARENTHESISED.captures(trimmed) {
        return Some(captures[1].to_string());
    } else {
        return Some(trimmed.to_string());
    };

    Some(symbol.to_string())
}

pub fn rating_text(rating: f64) -> String {
    if rating > 0.0 {
        // Debug keeps the trailing ".0" on whole ratings
        format!("{rating:?}/5")
    } else {
        "Not yet rated".to_string()
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

//! Template helpers
//!
//! - `formatDate`: ISO date or RFC 3339 timestamp → `dd/mm/yyyy` (en-AU)
//! - `formatCurrency`: number or numeric string → `$1,234.56` (AUD)
//!
//! Neither helper fails: a value that does not conform is written through
//! unchanged and a warning is logged.

use chrono::{DateTime, NaiveDate};
use handlebars::{
    html_escape, Context, Handlebars, Helper, HelperResult, Output, RenderContext,
};
use serde_json::Value;

/// Register every helper on a registry
pub fn register(registry: &mut Handlebars<'_>) {
    registry.register_helper("formatDate", Box::new(format_date_helper));
    registry.register_helper("formatCurrency", Box::new(format_currency_helper));
}

/// Format a date as `dd/mm/yyyy`
///
/// # Errors
/// Returns the input back when it is neither `YYYY-MM-DD` nor RFC 3339.
pub fn format_date(input: &str) -> Result<String, &str> {
    let trimmed = input.trim();
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .ok_or(input)?;
    Ok(date.format("%d/%m/%Y").to_string())
}

/// Largest magnitude formatted exactly; cents stay within f64 integer precision
pub const MAX_FORMATTED_AMOUNT: f64 = 1e13;

/// Format an amount as Australian dollars, e.g. `$1,500.00`
///
/// Returns `None` for non-finite amounts or any beyond
/// [`MAX_FORMATTED_AMOUNT`].
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_currency(amount: f64) -> Option<String> {
    if !amount.is_finite() || amount.abs() > MAX_FORMATTED_AMOUNT {
        return None;
    }
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    Some(format!("{sign}${grouped}.{:02}", cents % 100))
}

fn render_date(value: &Value) -> String {
    match value {
        Value::String(s) => match format_date(s) {
            Ok(formatted) => formatted,
            Err(original) => {
                tracing::warn!(value = %original, "formatDate: not a date, passing through");
                html_escape(original)
            }
        },
        Value::Null => String::new(),
        other => {
            tracing::warn!(value = %other, "formatDate: not a date, passing through");
            html_escape(&other.to_string())
        }
    }
}

fn render_currency(value: &Value) -> String {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .parse::<f64>()
            .ok(),
        _ => None,
    };
    match amount.and_then(format_currency) {
        Some(formatted) => formatted,
        None => {
            tracing::warn!(
                value = %value,
                "formatCurrency: not a formattable amount, passing through"
            );
            match value {
                Value::String(s) => html_escape(s),
                Value::Null => String::new(),
                other => html_escape(&other.to_string()),
            }
        }
    }
}

fn format_date_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let rendered = h.param(0).map(|p| render_date(p.value())).unwrap_or_default();
    out.write(&rendered)?;
    Ok(())
}

fn format_currency_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let rendered = h
        .param(0)
        .map(|p| render_currency(p.value()))
        .unwrap_or_default();
    out.write(&rendered)?;
    Ok(())
}

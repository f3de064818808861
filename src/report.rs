//! Renders a [`MarketSnapshot`] as a Telegram message.
//!
//! Messages use the legacy `Markdown` parse mode: `*bold*`, `_italic_` and
//! `` `code` `` spans with single markers.

use rust_decimal::Decimal;

use crate::core::{MarketSnapshot, PriceQuote};

pub const PARSE_MODE: &str = "Markdown";
pub const HEADER: &str = "💎 *گزارش لحظه‌ای بازار*";
pub const FAILURE_NOTICE: &str = "❌ خطا";

const TOMAN_SUFFIX: &str = " ت";
const GOLD_18K_NOTE: &str = "   └ 🧮 (هر گرم - بدون اجرت)";

/// Builds report text. Metrics missing from the snapshot are left out.
#[derive(Debug, Clone)]
pub struct ReportFormatter {
    footer: String,
}

impl ReportFormatter {
    pub fn new(channel_label: &str) -> Self {
        ReportFormatter {
            footer: format!("🆔 {}", escape_markdown(channel_label)),
        }
    }

    pub fn format(&self, snapshot: &MarketSnapshot) -> String {
        let mut blocks = vec![HEADER.to_string()];

        if let Some(block) = quoted_block("🏆", "انس طلا", &snapshot.gold_ounce_usd, |v| {
            format!("{}$", group_decimal(v, 2))
        }) {
            blocks.push(block);
        }
        if let Some(block) =
            quoted_block("💵", "دلار آمریکا", &snapshot.usd_toman, toman)
        {
            blocks.push(block);
        }
        if let Some(block) = quoted_block("💶", "یورو", &snapshot.eur_toman, toman) {
            blocks.push(block);
        }
        if let Some(block) =
            quoted_block("🇺🇸", "تتر (USDT)", &snapshot.usdt_toman, toman)
        {
            blocks.push(block);
        }
        if let Some(value) = snapshot.gold_18k_toman {
            blocks.push(format!(
                "✨ *طلای ۱۸ عیار:* `{}`\n{GOLD_18K_NOTE}",
                toman(value)
            ));
        }

        blocks.push(self.footer.clone());
        blocks.join("\n\n")
    }
}

fn quoted_block(
    icon: &str,
    label: &str,
    quote: &PriceQuote,
    render: impl Fn(Decimal) -> String,
) -> Option<String> {
    quote.as_ref().map(|q| {
        format!(
            "{icon} *{label}:* `{}`\n   └ 🔗 منبع: {}",
            render(q.value),
            italic(&q.source)
        )
    })
}

fn toman(value: Decimal) -> String {
    format!("{}{TOMAN_SUFFIX}", group_decimal(value.trunc(), 0))
}

/// Formats `value` with `dp` decimals and `,` between thousands groups.
pub fn group_decimal(value: Decimal, dp: u32) -> String {
    let rendered = format!("{:.*}", dp as usize, value.round_dp(dp));
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Renders an integer with Persian digits.
pub fn persian_digits(n: u64) -> String {
    n.to_string()
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => char::from_u32(0x06F0 + d).unwrap_or(c),
            None => c,
        })
        .collect()
}

fn is_entity_marker(c: char) -> bool {
    matches!(c, '_' | '*' | '`' | '[')
}

/// Escapes the characters legacy Markdown treats as entity markers.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if is_entity_marker(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Wraps `text` in `_italic_` runs. Escapes are not allowed inside an
/// entity, so each marker character is written escaped between two runs.
pub fn italic(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut run = String::new();
    let flush = |out: &mut String, run: &mut String| {
        if !run.is_empty() {
            out.push('_');
            out.push_str(run);
            out.push('_');
            run.clear();
        }
    };
    for c in text.chars() {
        if is_entity_marker(c) {
            flush(&mut out, &mut run);
            out.push('\\');
            out.push(c);
        } else {
            run.push(c);
        }
    }
    flush(&mut out, &mut run);
    out
}

//! Notification formatter: decision + risk metrics → title/body.
//!
//! Pure. The body is HTML for the PushPlus `html` template; every piece of
//! text that came from outside (symbol, reason, footer) is escaped.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;

use super::NotificationPayload;
use crate::domain::{Signal, TradeDecision};
use crate::risk::RiskMetrics;

/// Icon, label and accent color for a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalStyle {
    pub icon: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

pub fn style(signal: Signal) -> SignalStyle {
    match signal {
        Signal::Long => SignalStyle {
            icon: "🚀",
            label: "Bullish",
            color: "#d93025",
        },
        Signal::Short => SignalStyle {
            icon: "🔻",
            label: "Bearish",
            color: "#188038",
        },
        Signal::Wait => SignalStyle {
            icon: "⚖️",
            label: "Neutral",
            color: "#333333",
        },
    }
}

/// Render the notification for one decision.
///
/// Price levels appear only when set; the risk/reward line appears only for a
/// directional decision whose ratio is defined.
pub fn render(
    decision: &TradeDecision,
    metrics: Option<&RiskMetrics>,
    symbol: &str,
    current_price: f64,
    generated_at: DateTime<Utc>,
    footer: Option<&str>,
) -> NotificationPayload {
    let signal = decision.signal();
    let st = style(signal);

    let title = format!(
        "{} {} {} (confidence {}/100)",
        st.icon,
        signal,
        symbol,
        decision.confidence()
    );

    let mut body = String::new();
    let _ = writeln!(
        body,
        "<div style=\"padding: 10px; border-left: 4px solid {c}; background-color: #f9f9f9;\">\
         <h2 style=\"color:{c}; margin:0;\">{} {} · {}</h2></div>",
        st.icon,
        st.label,
        signal,
        c = st.color
    );
    let _ = writeln!(body, "<b>Symbol:</b> {}<br>", escape_html(symbol));
    let _ = writeln!(body, "<b>Price:</b> {}<br>", format_price(current_price));
    let _ = writeln!(body, "<b>Confidence:</b> {}/100<br>", decision.confidence());

    if decision.is_directional() {
        for (label, price) in [
            ("Entry", decision.entry_price()),
            ("Take profit", decision.tp_price()),
            ("Stop loss", decision.sl_price()),
        ] {
            if price > 0.0 {
                let _ = writeln!(body, "<b>{label}:</b> {}<br>", format_price(price));
            }
        }
        if let Some(ratio) = metrics.and_then(|m| m.ratio).filter(|r| r.is_finite()) {
            let _ = writeln!(body, "<b>Risk/reward:</b> 1:{ratio:.1}<br>");
        }
    }

    let _ = writeln!(body, "<b>Reason:</b> {}<br>", escape_html(decision.reason()));
    if let Some(footer) = footer.filter(|f| !f.trim().is_empty()) {
        let _ = writeln!(body, "<br><small>{}</small>", escape_html(footer));
    }

    NotificationPayload {
        title,
        body,
        generated_at,
    }
}

/// Two decimals for prices at or above 1, six below (low-priced tokens).
pub fn format_price(price: f64) -> String {
    if price.abs() >= 1.0 {
        format!("{price:.2}")
    } else {
        format!("{price:.6}")
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

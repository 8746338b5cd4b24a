//! Server-side HTML for the prediction form

use crate::session::SampleKind;
use crate::types::risk::PredictionOutcome;
use crate::types::transaction::{TransactionRecord, TransactionType, MAX_STEP};
use std::fmt::Write;

/// What to show under the form
pub enum Panel<'a> {
    Outcome(&'a PredictionOutcome),
    Error(&'a str),
}

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 720px; margin: 0 auto; padding: 24px; }
.title { font-size: 32px; font-weight: bold; color: #1E88E5; text-align: center; margin-bottom: 20px; }
.grid { display: grid; grid-template-columns: 1fr 1fr; gap: 12px 24px; }
label { display: block; font-size: 14px; margin-bottom: 4px; }
input, select { width: 100%; padding: 6px; box-sizing: border-box; }
.samples { display: flex; gap: 12px; margin-bottom: 16px; }
.card { padding: 20px; border-radius: 12px; background-color: #f9f9f9; box-shadow: 0px 4px 12px rgba(0,0,0,0.1); margin-top: 20px; }
.safe { color: #2E7D32; font-weight: bold; font-size: 22px; }
.warning { color: #F9A825; font-weight: bold; font-size: 22px; }
.danger { color: #C62828; font-weight: bold; font-size: 22px; }
.error { color: #C62828; border: 1px solid #C62828; }
.track { background: #e0e0e0; border-radius: 10px; overflow: hidden; margin: 10px 0; }
"#;

/// Escape text for HTML element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn number_input(out: &mut String, name: &str, label: &str, value: f64) {
    let _ = write!(
        out,
        r#"<div><label for="{name}">{label}</label><input type="number" id="{name}" name="{name}" min="0" step="0.01" value="{value:.2}" required></div>"#
    );
}

fn render_form(out: &mut String, record: &TransactionRecord) {
    out.push_str(r#"<h3>Load an example</h3><div class="samples">"#);
    for kind in SampleKind::ALL {
        let _ = write!(
            out,
            r#"<form method="post" action="/sample/{kind}"><button type="submit">{title} example</button></form>"#,
            title = capitalize(kind.as_str()),
        );
    }
    out.push_str("</div>");

    out.push_str(r#"<h3>Transaction details</h3><form method="post" action="/predict"><div class="grid">"#);
    let _ = write!(
        out,
        r#"<div><label for="step">Step (transaction sequence)</label><input type="number" id="step" name="step" min="0" max="{MAX_STEP}" step="1" value="{}" required></div>"#,
        record.step
    );
    number_input(out, "newbalanceOrig", "Sender balance after", record.new_balance_orig);
    number_input(out, "amount", "Amount", record.amount);
    number_input(out, "oldbalanceDest", "Receiver balance before", record.old_balance_dest);
    number_input(out, "oldbalanceOrg", "Sender balance before", record.old_balance_org);
    number_input(out, "newbalanceDest", "Receiver balance after", record.new_balance_dest);
    out.push_str("</div>");

    out.push_str(r#"<div style="margin-top:12px"><label for="type">Transaction type</label><select id="type" name="type">"#);
    for kind in TransactionType::ALL {
        let selected = if kind == record.transaction_type {
            " selected"
        } else {
            ""
        };
        let _ = write!(out, r#"<option value="{kind}"{selected}>{kind}</option>"#);
    }
    out.push_str("</select></div>");

    out.push_str(r#"<div style="margin-top:16px"><button type="submit">Predict</button></div></form>"#);
}

fn render_outcome(out: &mut String, outcome: &PredictionOutcome) {
    let label = outcome.label;
    let _ = write!(
        out,
        r#"<div class="card"><div class="{css}">{name}</div><p><strong>Fraud probability:</strong></p><div class="track"><div style="width:{pct}%;height:20px;background:{color};"></div></div><p>{formatted}</p></div>"#,
        css = label.css_class(),
        name = label.display_name(),
        pct = outcome.percent(),
        color = label.color(),
        formatted = outcome.formatted_probability(),
    );
}

fn render_error(out: &mut String, message: &str) {
    let _ = write!(
        out,
        r#"<div class="card error"><strong>Prediction failed:</strong> {}</div>"#,
        escape(message)
    );
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Full page: sample buttons, the form with `record` filled in and an
/// optional result or error panel
pub fn page(record: &TransactionRecord, panel: Option<Panel<'_>>) -> String {
    let mut out = String::with_capacity(8 * 1024);
    let _ = write!(
        out,
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><title>E-Wallet Transaction Fraud Check</title><style>{STYLE}</style></head><body>"#
    );
    out.push_str(r#"<div class="title">E-Wallet Transaction Fraud Check</div>"#);
    out.push_str(
        "<p>Enter the transaction details to check whether it is <strong>SAFE</strong>, a <strong>WARNING</strong> or <strong>FRAUD</strong>.</p>",
    );

    render_form(&mut out, record);

    match panel {
        Some(Panel::Outcome(outcome)) => render_outcome(&mut out, outcome),
        Some(Panel::Error(message)) => render_error(&mut out, message),
        None => {}
    }

    out.push_str("</body></html>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::risk::RiskLabel;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_page_prefills_record() {
        let record = SampleKind::Warning.record();
        let html = page(&record, None);

        assert!(html.contains(r#"name="amount" min="0" step="0.01" value="3000.00""#));
        assert!(html.contains(r#"<option value="CASH_OUT" selected>"#));
        assert!(html.contains(r#"action="/sample/fraud""#));
        assert!(!html.contains("class=\"card"));
    }

    #[test]
    fn test_outcome_card() {
        let outcome = PredictionOutcome::new(0.8, RiskLabel::Fraud, false);
        let html = page(&TransactionRecord::default(), Some(Panel::Outcome(&outcome)));

        assert!(html.contains(r#"<div class="danger">Fraud</div>"#));
        assert!(html.contains("width:80%;height:20px;background:#C62828;"));
        assert!(html.contains("80.00%"));
    }

    #[test]
    fn test_error_panel_is_escaped() {
        let html = page(
            &TransactionRecord::default(),
            Some(Panel::Error("column '<script>' missing")),
        );
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("'<script>'"));
    }
}

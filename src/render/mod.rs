//! Presentation of a parsed trace - text tree and machine-readable JSON
//!
//! Pure rendering over [`ParsedTrace`] and [`DefiAnalysis`]; no decoding
//! happens here.

use std::fmt::Write as _;

use alloy_primitives::U256;
use serde_json::Value;

use crate::domain::defi::{DefiAnalysis, InteractionDetail};
use crate::domain::trace::{ParsedCall, ParsedEvent, ParsedTrace};

/// Machine-readable output: the trace and analysis exactly as typed.
pub fn render_json(trace: &ParsedTrace, defi: Option<&DefiAnalysis>) -> anyhow::Result<String> {
    let payload = serde_json::json!({
        "trace": trace,
        "defi": defi,
    });
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Human-readable text report.
pub fn render_text(trace: &ParsedTrace, defi: Option<&DefiAnalysis>) -> String {
    let mut out = String::new();
    let tx = &trace.transaction;

    let _ = writeln!(out, "Transaction {}", tx.hash);
    let _ = writeln!(out, "  Block:    {}", tx.block_number);
    let _ = writeln!(out, "  From:     {}", tx.from);
    let _ = writeln!(
        out,
        "  To:       {}",
        tx.to.as_deref().unwrap_or("(contract creation)")
    );
    let _ = writeln!(out, "  Value:    {} ETH", format_eth(&tx.value));
    let _ = writeln!(
        out,
        "  Gas used: {} @ {} wei/gas",
        trace.total_gas_used, tx.gas_price
    );
    let _ = writeln!(
        out,
        "  Status:   {}",
        if tx.status { "success" } else { "failed" }
    );

    let _ = writeln!(out, "\nCall tree:");
    render_call(&trace.root_call, &mut out);

    if !trace.events.is_empty() {
        let _ = writeln!(out, "\nEvents ({}):", trace.events.len());
        for event in &trace.events {
            render_event(event, &mut out);
        }
    }

    if let Some(analysis) = defi {
        let _ = writeln!(out, "\nDeFi analysis: {}", analysis.summary);
        if analysis.detected {
            let _ = writeln!(out, "  Confidence: {:.2}", analysis.confidence);
            for interaction in &analysis.interactions {
                let _ = writeln!(
                    out,
                    "  - [{}] {}{}",
                    interaction.interaction_type.label(),
                    interaction.description,
                    render_detail(&interaction.detail),
                );
            }
        }
    }

    out
}

fn render_call(call: &ParsedCall, out: &mut String) {
    let indent = "  ".repeat(call.depth + 1);

    let what = match &call.decoded_function {
        Some(function) => {
            let args: Vec<String> = function
                .inputs
                .iter()
                .map(|param| format!("{}: {}", param.name, compact_value(&param.value)))
                .collect();
            format!(" {}({})", function.name, args.join(", "))
        }
        None => String::new(),
    };

    let value = if call.value != "0" {
        format!(" value={} ETH", format_eth(&call.value))
    } else {
        String::new()
    };

    let status = if call.success {
        String::new()
    } else {
        match &call.revert_reason {
            Some(reason) => format!(" REVERTED: {}", reason),
            None => format!(
                " REVERTED{}",
                call.error
                    .as_deref()
                    .map(|e| format!(" ({})", e))
                    .unwrap_or_default()
            ),
        }
    };

    let _ = writeln!(
        out,
        "{}[{}] {}{}{} gas={}{}",
        indent,
        call.call_type.label(),
        call.to,
        what,
        value,
        call.gas_used,
        status,
    );

    for child in &call.calls {
        render_call(child, out);
    }
}

fn render_event(event: &ParsedEvent, out: &mut String) {
    match &event.decoded {
        Some(decoded) => {
            let args: Vec<String> = decoded
                .params
                .iter()
                .map(|param| format!("{}: {}", param.name, compact_value(&param.value)))
                .collect();
            let _ = writeln!(
                out,
                "  #{} {}({}) @ {}",
                event.log_index,
                decoded.name,
                args.join(", "),
                event.address,
            );
        }
        None => {
            let _ = writeln!(
                out,
                "  #{} <unknown event, {} topic(s)> @ {}",
                event.log_index,
                event.topics.len(),
                event.address,
            );
        }
    }
}

fn render_detail(detail: &InteractionDetail) -> String {
    match detail {
        InteractionDetail::Swap(swap) => {
            let route = swap
                .route
                .as_ref()
                .map(|hops| format!(" via {}", hops.join(" -> ")))
                .unwrap_or_default();
            format!(
                ": {} {} -> {} {}{}",
                amount_or_unknown(&swap.amount_in),
                swap.token_in_symbol,
                amount_or_unknown(&swap.amount_out),
                swap.token_out_symbol,
                route,
            )
        }
        InteractionDetail::Liquidity(liquidity) => {
            match (&liquidity.token_a, &liquidity.token_b) {
                (Some(a), Some(b)) => format!(": {} / {}", a, b),
                (Some(a), None) => format!(": {}", a),
                _ => String::new(),
            }
        }
        InteractionDetail::None => String::new(),
    }
}

fn amount_or_unknown(amount: &str) -> &str {
    if amount == "0" {
        "?"
    } else {
        amount
    }
}

/// One-line rendering of a decoded value; long arrays and strings get
/// elided so the tree stays readable.
fn compact_value(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if rendered.len() > 72 {
        let prefix: String = rendered.chars().take(69).collect();
        format!("{}...", prefix)
    } else {
        rendered
    }
}

/// Wei (decimal string) to ETH as f64, for display only.
fn format_eth(wei: &str) -> f64 {
    let wei: U256 = wei.parse().unwrap_or_default();
    let eth_in_wei = U256::from(1_000_000_000_000_000_000u64);
    let whole = wei / eth_in_wei;
    let frac = wei % eth_in_wei;

    let whole_f64: f64 = whole.to_string().parse().unwrap_or(0.0);
    let frac_f64: f64 = frac.to_string().parse().unwrap_or(0.0);

    whole_f64 + frac_f64 / 1e18
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eth_formatting() {
        assert_eq!(format_eth("1000000000000000000"), 1.0);
        assert_eq!(format_eth("500000000000000000"), 0.5);
        assert_eq!(format_eth("0"), 0.0);
        assert_eq!(format_eth("garbage"), 0.0);
    }

    #[test]
    fn compact_value_elides_long_output() {
        let long = Value::String("a".repeat(100));
        let rendered = compact_value(&long);
        assert!(rendered.len() <= 72);
        assert!(rendered.ends_with("..."));
    }
}

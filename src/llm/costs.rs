//! Per-token pricing for known models (USD).

use rust_decimal::Decimal;

/// Returns (input, output) price per token for a model name.
///
/// Unknown models fall back to the Sonnet-class price.
pub(crate) fn model_cost(model: &str) -> (Decimal, Decimal) {
    let per_million = |input: i64, output: i64| {
        (
            Decimal::new(input, 2) / Decimal::from(1_000_000),
            Decimal::new(output, 2) / Decimal::from(1_000_000),
        )
    };

    let model = model.to_lowercase();
    if model.contains("haiku") {
        per_million(80, 400)
    } else if model.contains("opus") {
        per_million(1500, 7500)
    } else if model.contains("gpt-4o-mini") {
        per_million(15, 60)
    } else if model.contains("gpt-4o") {
        per_million(250, 1000)
    } else {
        per_million(300, 1500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sonnet_is_default_price() {
        let (input, output) = model_cost("claude-sonnet-4-20250514");
        assert_eq!(input, Decimal::new(3, 6));
        assert_eq!(output, Decimal::new(15, 6));
        assert_eq!(model_cost("something-new"), (input, output));
    }

    #[test]
    fn mini_matched_before_full_gpt4o() {
        let (mini_in, _) = model_cost("gpt-4o-mini");
        let (full_in, _) = model_cost("gpt-4o");
        assert!(mini_in < full_in);
    }
}

//! Static model price table and cost estimation.

/// Per-model pricing in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    /// Model identifier or identifier prefix (dated snapshots share a price).
    pub model: &'static str,
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

const fn price(model: &'static str, input_per_mtok: f64, output_per_mtok: f64) -> ModelPrice {
    ModelPrice {
        model,
        input_per_mtok,
        output_per_mtok,
    }
}

/// Known model prices. Read-only for the life of the process.
pub static PRICE_TABLE: &[ModelPrice] = &[
    price("claude-opus-4-5", 5.0, 25.0),
    price("claude-opus-4-1", 15.0, 75.0),
    price("claude-opus-4", 15.0, 75.0),
    price("claude-sonnet-4-5", 3.0, 15.0),
    price("claude-sonnet-4", 3.0, 15.0),
    price("claude-haiku-4-5", 1.0, 5.0),
    price("claude-3-7-sonnet", 3.0, 15.0),
    price("claude-3-5-sonnet", 3.0, 15.0),
    price("claude-3-5-haiku", 0.8, 4.0),
    price("claude-3-opus", 15.0, 75.0),
    price("claude-3-haiku", 0.25, 1.25),
];

/// Look up `model`: exact match first, then the longest matching prefix.
pub fn price_for(model: &str) -> Option<&'static ModelPrice> {
    PRICE_TABLE
        .iter()
        .find(|p| p.model == model)
        .or_else(|| {
            PRICE_TABLE
                .iter()
                .filter(|p| model.starts_with(p.model))
                .max_by_key(|p| p.model.len())
        })
}

/// Estimated cost in USD, or `None` when `model` is not priced.
pub fn estimate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
    price_for(model).map(|p| {
        (input_tokens as f64 * p.input_per_mtok + output_tokens as f64 * p.output_per_mtok)
            / 1_000_000.0
    })
}

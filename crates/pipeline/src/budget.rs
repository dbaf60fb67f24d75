//! Token estimation and budget-constrained truncation.
//!
//! Token counts are approximated as characters divided by four, the usual
//! rough ratio for English prose under BPE tokenizers. The estimate only
//! gates how much text enters a prompt, so systematic error is acceptable;
//! what matters is that the same text always estimates the same and that
//! budgets are honoured.
//!
//! `fit` keeps the head and tail of an oversized text and elides the
//! middle, on the theory that documents front-load their summary and
//! back-load their conclusions. `fit_many` shares one aggregate budget
//! across several named sources by scaling every source's allowance with
//! the same factor, so relative proportions survive truncation.

use std::collections::BTreeMap;

use tracing::debug;

/// Approximate characters per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of `text`.
///
/// Character count divided by four, rounded down. Deterministic and
/// monotonic: more characters never estimate fewer tokens.
pub fn estimate(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Truncate `text` to fit within `max_tokens` estimated tokens.
///
/// Unchanged when it already fits. Otherwise the result is the leading
/// portion, an elision marker stating how much was dropped, and the
/// trailing portion, sized so the whole result fits the budget. Applying
/// `fit` to its own output returns it unchanged.
///
/// Budgets too small to hold even the marker degrade to a plain hard
/// truncation at the character allowance.
pub fn fit(text: &str, max_tokens: usize) -> String {
    if estimate(text) <= max_tokens {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let allowed = max_tokens * CHARS_PER_TOKEN;

    // Size the marker from a provisional elision count, then recompute it
    // from the exact count. The two differ by at most a couple of digits,
    // which the integer-division estimate absorbs.
    let provisional = elision_marker(total - allowed);
    let marker_len = provisional.chars().count();

    if allowed <= marker_len {
        let truncated: String = chars[..allowed].iter().collect();
        debug!(total, allowed, "budget below marker size, hard truncation");
        return truncated;
    }

    let body = allowed - marker_len;
    let half = body / 2;
    let elided = total - 2 * half;
    let marker = elision_marker(elided);

    let mut out = String::with_capacity(allowed + 8);
    out.extend(chars[..half].iter());
    out.push_str(&marker);
    out.extend(chars[total - half..].iter());

    debug!(
        total_chars = total,
        kept_chars = 2 * half,
        elided_chars = elided,
        max_tokens,
        "text truncated to budget"
    );
    out
}

/// Fit several named sources under one aggregate token budget.
///
/// Unchanged when the summed estimates fit. Otherwise every source's
/// allowance is its own estimate scaled by `max_total_tokens / sum`, so
/// larger sources keep proportionally more text, and each source is
/// truncated independently via [`fit`].
pub fn fit_many(
    sources: &BTreeMap<String, String>,
    max_total_tokens: usize,
) -> BTreeMap<String, String> {
    let total: usize = sources.values().map(|t| estimate(t)).sum();
    if total <= max_total_tokens {
        return sources.clone();
    }

    // total > max_total_tokens >= 0 here, so the division is safe.
    let scale = max_total_tokens as f64 / total as f64;
    debug!(
        sources = sources.len(),
        total_tokens = total,
        max_total_tokens,
        scale,
        "scaling sources to aggregate budget"
    );

    sources
        .iter()
        .map(|(name, text)| {
            let allowance = (estimate(text) as f64 * scale).floor() as usize;
            (name.clone(), fit(text, allowance))
        })
        .collect()
}

fn elision_marker(elided_chars: usize) -> String {
    format!(
        "\n[... {} tokens (~{} characters) elided ...]\n",
        elided_chars / CHARS_PER_TOKEN,
        elided_chars
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_down() {
        assert_eq!(estimate(""), 0);
        assert_eq!(estimate("abc"), 0);
        assert_eq!(estimate("abcd"), 1);
        assert_eq!(estimate("abcdefg"), 1);
        assert_eq!(estimate(&"x".repeat(4000)), 1000);
    }

    #[test]
    fn estimate_counts_characters_not_bytes() {
        // 8 characters, far more bytes.
        assert_eq!(estimate("héllø✨✨wö"), 2);
    }

    #[test]
    fn fit_returns_fitting_text_unchanged() {
        let text = "short text";
        assert_eq!(fit(text, 100), text);
        // Exactly at the budget is unchanged too.
        let exact = "x".repeat(400);
        assert_eq!(fit(&exact, 100), exact);
    }

    #[test]
    fn fit_truncates_oversized_text() {
        let text = "a".repeat(8000);
        let out = fit(&text, 500);
        assert!(estimate(&out) <= 500);
        assert!(out.contains("elided"));
        assert!(out.starts_with('a'));
        assert!(out.ends_with('a'));
    }

    #[test]
    fn fit_keeps_head_and_tail() {
        let mut text = "HEAD".to_string();
        text.push_str(&"m".repeat(10000));
        text.push_str("TAIL");
        let out = fit(&text, 200);
        assert!(out.starts_with("HEAD"));
        assert!(out.ends_with("TAIL"));
        assert!(out.contains("elided"));
        assert!(out.chars().count() <= 200 * CHARS_PER_TOKEN + 2);
        assert!(estimate(&out) <= 200);
    }

    #[test]
    fn fit_marker_states_elided_amounts() {
        let text = "z".repeat(4400);
        let out = fit(&text, 100);
        // 4400 chars into a 400-char allowance: roughly 4000 chars elided.
        assert!(out.contains("characters) elided"));
        assert!(out.contains("tokens"));
    }

    #[test]
    fn fit_is_idempotent() {
        for (len, budget) in [(8000, 500), (4401, 1000), (100_000, 37), (977, 13)] {
            let text = "q".repeat(len);
            let once = fit(&text, budget);
            let twice = fit(&once, budget);
            assert_eq!(once, twice, "len={len} budget={budget}");
            assert!(estimate(&once) <= budget);
        }
    }

    #[test]
    fn fit_tiny_budget_hard_truncates() {
        let text = "w".repeat(1000);
        let out = fit(&text, 2);
        assert_eq!(out, "w".repeat(8));
        assert_eq!(fit(&out, 2), out);
    }

    #[test]
    fn fit_zero_budget_is_empty() {
        let out = fit("some text that does not fit", 0);
        assert_eq!(out, "");
        assert_eq!(fit("", 0), "");
    }

    #[test]
    fn fit_many_unchanged_when_under_budget() {
        let mut sources = BTreeMap::new();
        sources.insert("a".to_string(), "x".repeat(400));
        sources.insert("b".to_string(), "y".repeat(400));
        let out = fit_many(&sources, 1000);
        assert_eq!(out, sources);
    }

    #[test]
    fn fit_many_empty_sources_sum_to_zero_and_fit() {
        let mut sources = BTreeMap::new();
        sources.insert("a".to_string(), String::new());
        sources.insert("b".to_string(), "  ".to_string());
        let out = fit_many(&sources, 0);
        assert_eq!(out, sources);
    }

    #[test]
    fn fit_many_scales_proportionally() {
        let mut sources = BTreeMap::new();
        sources.insert("a".to_string(), "x".repeat(20000)); // 5000 tokens
        sources.insert("b".to_string(), "y".repeat(10000)); // 2500 tokens
        let out = fit_many(&sources, 3000);

        let a_tokens = estimate(&out["a"]);
        let b_tokens = estimate(&out["b"]);

        // Both truncated, both carry markers.
        assert!(out["a"].contains("elided"));
        assert!(out["b"].contains("elided"));

        // a keeps roughly twice as much as b.
        let ratio = a_tokens as f64 / b_tokens as f64;
        assert!((1.7..=2.3).contains(&ratio), "ratio was {ratio}");

        // Aggregate honours the ceiling.
        assert!(a_tokens + b_tokens <= 3000);
    }

    #[test]
    fn fit_many_leaves_small_source_alone_when_it_fits_its_share() {
        let mut sources = BTreeMap::new();
        sources.insert("big".to_string(), "x".repeat(40000)); // 10000 tokens
        sources.insert("tiny".to_string(), "hello".to_string()); // 1 token
        let out = fit_many(&sources, 2000);
        // tiny's scaled allowance (~0 tokens) may drop it entirely, but the
        // big source must still dominate the output.
        assert!(estimate(&out["big"]) <= 2000);
        assert!(out["big"].contains("elided"));
    }

    #[test]
    fn fit_many_preserves_key_set() {
        let mut sources = BTreeMap::new();
        for name in ["compliance_requirements", "findings_details", "remediation_plan"] {
            sources.insert(name.to_string(), "t".repeat(8000));
        }
        let out = fit_many(&sources, 100);
        let keys: Vec<_> = out.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                "compliance_requirements",
                "findings_details",
                "remediation_plan"
            ]
        );
    }
}

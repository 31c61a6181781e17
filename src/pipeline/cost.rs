//! Price a call in integer microdollars.
//!
//! Rates are converted once to whole picodollars per token
//! (`$/1k × 10⁹`, rounded to absorb binary float error), the call is priced
//! in picodollars, and the result is divided by 10⁶ truncating toward zero.
//! Doing the sum in integers keeps `1000 in / 1000 out` at exactly 2000 µ$
//! where the float formula would land on 1999.9999, and sub-nanodollar
//! rates such as $0.0000375 / 1k are priced exactly.

use crate::config::Pricing;
use crate::output::UsageReport;

const PICODOLLARS_PER_MICRODOLLAR: u128 = 1_000_000;

/// Whole picodollars per token for a USD-per-thousand-tokens rate.
fn picodollars_per_token(usd_per_1k: f64) -> u128 {
    (usd_per_1k * 1_000_000_000.0).round().max(0.0) as u128
}

/// Cost of `usage` at `pricing`, in microdollars, truncated toward zero.
pub fn cost_microdollars(usage: &UsageReport, pricing: &Pricing) -> u64 {
    let input = u128::from(usage.input_tokens)
        .saturating_mul(picodollars_per_token(pricing.input_per_1k_usd));
    let output = u128::from(usage.output_tokens)
        .saturating_mul(picodollars_per_token(pricing.output_per_1k_usd));
    let pico = input.saturating_add(output);
    u64::try_from(pico / PICODOLLARS_PER_MICRODOLLAR).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(input_tokens: u64, output_tokens: u64) -> UsageReport {
        UsageReport {
            input_tokens,
            output_tokens,
        }
    }

    #[test]
    fn thousand_each_at_default_rates_is_exact() {
        assert_eq!(cost_microdollars(&usage(1000, 1000), &Pricing::default()), 2000);
    }

    #[test]
    fn small_call_at_default_rates() {
        // 100 × 0.5 µ$ + 20 × 1.5 µ$
        assert_eq!(cost_microdollars(&usage(100, 20), &Pricing::default()), 80);
    }

    #[test]
    fn fractions_truncate_toward_zero() {
        // 1 × 0.5 + 1 × 1.5 = 2.0 ; 3 × 0.5 = 1.5 → 1
        assert_eq!(cost_microdollars(&usage(1, 1), &Pricing::default()), 2);
        assert_eq!(cost_microdollars(&usage(3, 0), &Pricing::default()), 1);
        assert_eq!(cost_microdollars(&usage(1, 0), &Pricing::default()), 0);
    }

    #[test]
    fn zero_usage_or_zero_rates_cost_nothing() {
        assert_eq!(cost_microdollars(&usage(0, 0), &Pricing::default()), 0);
        assert_eq!(cost_microdollars(&usage(5000, 5000), &Pricing::new(0.0, 0.0)), 0);
    }

    #[test]
    fn custom_rates() {
        // gpt-4o-mini style: $0.00015 / $0.0006 per 1k
        let p = Pricing::new(0.00015, 0.0006);
        assert_eq!(cost_microdollars(&usage(10_000, 1_000), &p), 1500 + 600);
    }

    #[test]
    fn sub_nanodollar_rates_are_not_rounded_per_token() {
        // $0.0000375 / 1k is 37.5 n$ per token.
        let p = Pricing::new(0.0000375, 0.0);
        assert_eq!(cost_microdollars(&usage(1_000_000, 0), &p), 37_500);
        assert_eq!(cost_microdollars(&usage(1, 0), &p), 0);
        assert_eq!(cost_microdollars(&usage(27, 0), &p), 1);

        // 0.4 n$ per token must not price at zero.
        let p = Pricing::new(0.0000004, 0.0);
        assert_eq!(cost_microdollars(&usage(1_000_000, 0), &p), 400);
    }
}

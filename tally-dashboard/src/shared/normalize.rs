//! Tally normalization: recompute the total, annotate percentages and rank.
//!
//! Pure functions only. The payload's own `total_votes` is ignored.

use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};

use super::types::{RankedCandidate, TallyPayload, ViewModel, FALLBACK_COLORS};

/// Normalize a raw tally into a render-ready view model
///
/// Candidates are sorted descending by votes; equal counts keep their
/// incoming order. A zero total gives 0% for everyone. The total is summed
/// in `u128` so no combination of `u64` counts can overflow it.
pub fn normalize(payload: &TallyPayload) -> ViewModel {
    let total: u128 = payload.candidates.iter().map(|c| u128::from(c.votes)).sum();

    let mut ranked: Vec<(RankedCandidate, Option<&str>)> = payload
        .candidates
        .iter()
        .map(|c| {
            let candidate = RankedCandidate {
                id: c.id,
                name: c.name.clone(),
                votes: c.votes,
                percentage: percentage_of(c.votes, total),
                color: String::new(),
            };
            (candidate, c.color.as_deref())
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|(a, _), (b, _)| b.votes.cmp(&a.votes));

    let candidates = ranked
        .into_iter()
        .enumerate()
        .map(|(rank, (mut candidate, own_color))| {
            candidate.color = own_color.unwrap_or_else(|| fallback_color(rank)).to_string();
            candidate
        })
        .collect();

    ViewModel {
        last_updated: payload.last_updated,
        total_votes: total,
        candidates,
    }
}

/// Share of `total` in percent, rounded half away from zero to one decimal
pub fn percentage_of(votes: u64, total: u128) -> Decimal {
    // Totals beyond 96 bits only arise from billions of saturated candidates
    let Some(total) = Decimal::from_u128(total).filter(|t| !t.is_zero()) else {
        return Decimal::ZERO;
    };

    (Decimal::from(votes) / total * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Palette colour for a candidate rank
pub fn fallback_color(rank: usize) -> &'static str {
    FALLBACK_COLORS[rank % FALLBACK_COLORS.len()]
}

/// Format a vote count with thousands separators (e.g., 1245 -> "1,245")
pub fn format_votes(votes: u128) -> String {
    let digits = votes.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

//! Shared scoring primitives.
//!
//! Every analyzer builds its scores and labels from these functions so that
//! scales and band cut-points are defined once.

/// Threshold table for turning a score into a label.
///
/// `labels` has one more entry than `thresholds`; a value below
/// `thresholds[i]` (and at or above every earlier threshold) gets `labels[i]`,
/// anything at or above the last threshold gets the last label.
#[derive(Debug, Clone, Copy)]
pub struct BandTable {
    pub thresholds: &'static [f64],
    pub labels: &'static [&'static str],
}

impl BandTable {
    pub fn label(&self, value: f64) -> &'static str {
        band(value, self.thresholds, self.labels)
    }
}

/// Crowding (1-10) bands
pub const CROWDING_BANDS: BandTable = BandTable {
    thresholds: &[3.5, 6.0, 8.0],
    labels: &["Low", "Moderate", "High", "Extremely High"],
};

/// HHI bands, following the classic antitrust cut-points plus a monopoly tier
pub const CONCENTRATION_BANDS: BandTable = BandTable {
    thresholds: &[1500.0, 2500.0, 5000.0],
    labels: &[
        "Fragmented",
        "Moderately Concentrated",
        "Highly Concentrated",
        "Monopolistic",
    ],
};

/// Partner match score (0-100) bands
pub const FIT_BANDS: BandTable = BandTable {
    thresholds: &[40.0, 60.0, 75.0],
    labels: &["Weak", "Moderate", "Strong", "Excellent"],
};

/// Opportunity score (0-100) bands
pub const OPPORTUNITY_TIERS: BandTable = BandTable {
    thresholds: &[35.0, 50.0, 65.0],
    labels: &["Limited", "Moderate", "Attractive", "Prime"],
};

/// White-space segment opportunity (0-10) bands
pub const WHITE_SPACE_BANDS: BandTable = BandTable {
    thresholds: &[3.0, 6.0],
    labels: &["modest", "meaningful", "significant"],
};

/// Pick the label for `value` from a threshold table.
///
/// NaN falls into the lowest band.
pub fn band<'a>(value: f64, thresholds: &[f64], labels: &[&'a str]) -> &'a str {
    debug_assert_eq!(labels.len(), thresholds.len() + 1);
    if value.is_nan() {
        return labels[0];
    }
    let index = thresholds.iter().take_while(|t| value >= **t).count();
    labels[index.min(labels.len() - 1)]
}

/// Clamp to the 1-10 scale used by crowding, differentiation and evidence
#[inline]
pub fn clamp_1_to_10(value: f64) -> f64 {
    if value.is_nan() {
        return 1.0;
    }
    value.clamp(1.0, 10.0)
}

/// Clamp to the 0-100 scale used by match, opportunity and penetration figures
#[inline]
pub fn clamp_0_to_100(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Round to one decimal place
#[inline]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Weighted average of sub-scores paired positionally with weights.
///
/// Returns 0 when the weights sum to zero or nothing is paired.
pub fn weighted_average(subscores: &[f64], weights: &[f64]) -> f64 {
    let (total, weight_sum) = subscores
        .iter()
        .zip(weights)
        .fold((0.0, 0.0), |(total, sum), (score, weight)| {
            (total + score * weight, sum + weight)
        });

    if weight_sum <= 0.0 {
        return 0.0;
    }
    total / weight_sum
}

/// Smooth 0-1 saturation curve: 0 at x = 0, approaching 1 as x grows
#[inline]
pub fn saturation(x: f64, scale: f64) -> f64 {
    if x <= 0.0 || scale <= 0.0 {
        return 0.0;
    }
    1.0 - (-x / scale).exp()
}

/// Log-scaled magnitude in 0-1 against a ceiling
#[inline]
pub fn log_scaled(value: f64, ceiling: f64) -> f64 {
    if value <= 0.0 || ceiling <= 0.0 {
        return 0.0;
    }
    clamp_unit((1.0 + value).ln() / (1.0 + ceiling).ln())
}

/// Herfindahl-Hirschman Index: sum of squared percentage shares
pub fn herfindahl_index(shares_pct: &[f64]) -> f64 {
    shares_pct
        .iter()
        .filter(|s| s.is_finite() && **s > 0.0)
        .map(|s| s * s)
        .sum()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of an unsorted slice; `None` when empty
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

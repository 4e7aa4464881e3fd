//! Risk classification over detected label sets.

use examsweep_core::{label, Risk};

/// Judge confidence below this tier marks the verdict MEDIUM risk.
pub const CONFIDENT_JUDGE: f64 = 0.75;

/// Map a label set to its severity tier.
///
/// HIGH wins over MEDIUM; labels outside both sets (including unknown
/// judge labels) classify LOW.
pub fn classify_labels(labels: &[String]) -> Risk {
    if labels
        .iter()
        .any(|l| label::RISK_HIGH.contains(&l.as_str()))
    {
        return Risk::High;
    }
    if labels
        .iter()
        .any(|l| label::RISK_MEDIUM.contains(&l.as_str()))
    {
        return Risk::Medium;
    }
    Risk::Low
}

/// Tier derived from the judge's self-reported confidence, used right
/// after judge evaluation: an unsure judge is itself a finding.
pub fn classify_confidence(confidence: f64) -> Risk {
    if confidence >= CONFIDENT_JUDGE {
        Risk::Low
    } else {
        Risk::Medium
    }
}

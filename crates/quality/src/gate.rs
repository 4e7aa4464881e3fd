//! Auto-fix gating policy.
//!
//! The gate decides, per item, whether a generated fix may be applied
//! without a human in the loop. Every input that can disqualify an item
//! does so independently; auto-apply requires all of them to agree.

use examsweep_core::{label, Risk};

/// Minimum overall fix confidence the gate accepts for auto-apply.
pub const AUTO_APPLY_CONFIDENCE: f64 = 0.85;

/// Whether a label set is safe for machine correction.
///
/// Any label in the critical set disqualifies the item outright. The
/// remaining labels must all be cosmetic or the neutral `ok`; labels the
/// policy has never seen disqualify too, since there is no basis for
/// trusting a machine edit on them.
pub fn is_auto_fixable(labels: &[String]) -> bool {
    if labels
        .iter()
        .any(|l| label::NOT_AUTO_FIXABLE.contains(&l.as_str()))
    {
        return false;
    }

    labels
        .iter()
        .all(|l| l == label::OK || label::COSMETIC.contains(&l.as_str()))
}

/// Everything the gate looks at for one item.
#[derive(Debug, Clone)]
pub struct GateInput<'a> {
    /// Caller asked for automatic application
    pub auto_apply_requested: bool,

    /// Labels detected for the item
    pub labels: &'a [String],

    /// Severity tier of the item
    pub risk: Risk,

    /// Overall confidence of the generated fix
    pub overall_confidence: f64,

    /// Fix generation flagged the item for a domain expert
    pub requires_expert_review: bool,
}

/// Outcome of the gate for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Apply the patches now, no human involved
    AutoApply,
    /// Park the result in the human review queue
    QueueForReview,
}

/// Pure auto-apply decision.
pub struct AutoFixGate;

impl AutoFixGate {
    /// Auto-apply iff the caller asked for it, the label set is
    /// auto-fixable, risk is LOW, confidence clears the threshold and no
    /// expert review was requested. Anything else queues for review.
    pub fn decide(input: &GateInput<'_>) -> GateDecision {
        let auto = input.auto_apply_requested
            && is_auto_fixable(input.labels)
            && input.risk == Risk::Low
            && input.overall_confidence >= AUTO_APPLY_CONFIDENCE
            && !input.requires_expert_review;

        if auto {
            GateDecision::AutoApply
        } else {
            GateDecision::QueueForReview
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn passing_input(labels: &[String]) -> GateInput<'_> {
        GateInput {
            auto_apply_requested: true,
            labels,
            risk: Risk::Low,
            overall_confidence: 0.9,
            requires_expert_review: false,
        }
    }

    #[test]
    fn cosmetic_labels_are_auto_fixable() {
        assert!(is_auto_fixable(&[]));
        assert!(is_auto_fixable(&labels(&["ok"])));
        assert!(is_auto_fixable(&labels(&[
            "sin_interrogacion",
            "pregunta_corta",
            "dificultad_invalida",
            "explicacion_global_insuficiente",
        ])));
    }

    #[test]
    fn critical_labels_disqualify() {
        assert!(!is_auto_fixable(&labels(&["clave_incorrecta"])));
        assert!(!is_auto_fixable(&labels(&["sin_contenido"])));
        assert!(!is_auto_fixable(&labels(&["alternativas_vacias"])));
    }

    #[test]
    fn unknown_labels_disqualify() {
        assert!(!is_auto_fixable(&labels(&["etiqueta_nueva"])));
        assert!(!is_auto_fixable(&labels(&["pregunta_corta", "etiqueta_nueva"])));
    }

    #[test]
    fn adding_a_critical_label_never_restores_auto_fixability() {
        let base = labels(&["sin_interrogacion", "pregunta_corta"]);
        assert!(is_auto_fixable(&base));

        for critical in examsweep_core::label::NOT_AUTO_FIXABLE {
            let mut widened = base.clone();
            widened.push(critical.to_string());
            assert!(!is_auto_fixable(&widened), "critical label {critical}");
        }
    }

    #[test]
    fn gate_approves_when_everything_holds() {
        let l = labels(&["sin_interrogacion"]);
        assert_eq!(
            AutoFixGate::decide(&passing_input(&l)),
            GateDecision::AutoApply
        );
    }

    #[test]
    fn gate_queues_without_caller_request() {
        let l = labels(&["sin_interrogacion"]);
        let mut input = passing_input(&l);
        input.auto_apply_requested = false;
        assert_eq!(AutoFixGate::decide(&input), GateDecision::QueueForReview);
    }

    #[test]
    fn gate_never_auto_applies_above_low_risk() {
        let l = labels(&["sin_interrogacion"]);
        for risk in [Risk::Medium, Risk::High] {
            let mut input = passing_input(&l);
            input.risk = risk;
            input.overall_confidence = 1.0;
            assert_eq!(AutoFixGate::decide(&input), GateDecision::QueueForReview);
        }
    }

    #[test]
    fn gate_queues_below_confidence_threshold() {
        let l = labels(&["sin_interrogacion"]);
        let mut input = passing_input(&l);
        input.overall_confidence = 0.84;
        assert_eq!(AutoFixGate::decide(&input), GateDecision::QueueForReview);

        input.overall_confidence = 0.85;
        assert_eq!(AutoFixGate::decide(&input), GateDecision::AutoApply);
    }

    #[test]
    fn gate_respects_expert_review_flag() {
        let l = labels(&["sin_interrogacion"]);
        let mut input = passing_input(&l);
        input.requires_expert_review = true;
        assert_eq!(AutoFixGate::decide(&input), GateDecision::QueueForReview);
    }
}

//! Deterministic structural precheck.

use examsweep_core::{label, Item, PrecheckVerdict};
use regex::Regex;

/// Stems shorter than this are flagged `pregunta_corta`.
const MIN_STEM_CHARS: usize = 60;
/// Stems at or past this length are candidates for `pregunta_larga`.
const LONG_STEM_CHARS: usize = 700;
/// Stems at or past this length are candidates for `pregunta_muy_larga`.
const VERY_LONG_STEM_CHARS: usize = 1000;
/// A long stem only counts as inflated past this ratio to its base stem.
const STEM_GROWTH_RATIO: f64 = 1.25;
/// Minimum alternative text length.
const MIN_ALTERNATIVE_CHARS: usize = 8;
/// Minimum explanation length for the correct alternative.
const MIN_CORRECT_EXPLANATION_CHARS: usize = 20;
/// Minimum explanation length for incorrect alternatives.
const MIN_INCORRECT_EXPLANATION_CHARS: usize = 15;
/// Minimum global explanation length.
const MIN_GLOBAL_EXPLANATION_CHARS: usize = 40;

/// Accepted difficulty values.
const DIFFICULTIES: &[&str] = &["EASY", "MEDIUM", "HARD"];

/// Clinical vocabulary a medical stem is expected to touch. Matching is
/// case-insensitive; accent-free spellings are listed alongside the
/// accented ones because generated text drops diacritics unpredictably.
const CLINICAL_VOCABULARY: &[&str] = &[
    "paciente",
    "años",
    "anos de edad",
    "consulta",
    "dolor",
    "síntoma",
    "sintoma",
    "signo",
    "tratamiento",
    "diagnóstico",
    "diagnostico",
    "examen",
    "clínic",
    "clinic",
    "hospital",
    "urgencia",
    "enfermedad",
    "fiebre",
    "presión arterial",
    "presion arterial",
    "antecedente",
    "embarazo",
    "cirugía",
    "cirugia",
    "fármaco",
    "farmaco",
    "medicamento",
];

/// Pure, deterministic rule evaluator over one item.
///
/// Every rule runs on every evaluation; each violated rule appends its
/// label. No external calls, no side effects beyond the returned
/// verdict; callers persist the result themselves.
pub struct PrecheckEngine {
    /// Matches completion-style stems ending "... es:"
    completion_ending: Regex,
}

impl PrecheckEngine {
    /// Create a new precheck engine.
    pub fn new() -> Self {
        Self {
            completion_ending: Regex::new(r"(?i)\bes\s*:\s*$")
                .unwrap_or_else(|_| Regex::new("$^").unwrap()),
        }
    }

    /// Evaluate every rule against the item.
    pub fn evaluate(&self, item: &Item) -> PrecheckVerdict {
        tracing::debug!("prechecking variant {}", item.variant_id);

        let mut labels = Vec::new();
        let mut notes = Vec::new();

        let stem = item.stem.trim();
        let stem_len = stem.chars().count();
        let base_len = item.base_stem.trim().chars().count();

        if stem.is_empty() {
            labels.push(label::SIN_CONTENIDO.to_string());
            notes.push("el enunciado está vacío".to_string());
        }

        if !stem.contains('?') && !self.completion_ending.is_match(stem) {
            labels.push(label::SIN_INTERROGACION.to_string());
            notes.push("el enunciado no está formulado como pregunta".to_string());
        }

        if stem_len < MIN_STEM_CHARS {
            labels.push(label::PREGUNTA_CORTA.to_string());
            notes.push(format!(
                "enunciado de {stem_len} caracteres, mínimo {MIN_STEM_CHARS}"
            ));
        }

        let inflated = stem_len as f64 > STEM_GROWTH_RATIO * base_len as f64;
        if stem_len >= VERY_LONG_STEM_CHARS && inflated {
            labels.push(label::PREGUNTA_MUY_LARGA.to_string());
            notes.push(format!(
                "enunciado de {stem_len} caracteres, muy extendido respecto a la pregunta base"
            ));
        } else if stem_len >= LONG_STEM_CHARS && inflated {
            labels.push(label::PREGUNTA_LARGA.to_string());
            notes.push(format!(
                "enunciado de {stem_len} caracteres, extendido respecto a la pregunta base"
            ));
        }

        let lowered = stem.to_lowercase();
        if !CLINICAL_VOCABULARY.iter().any(|kw| lowered.contains(kw)) {
            labels.push(label::SIN_CONTEXTO_MEDICO.to_string());
            notes.push("el enunciado no menciona contexto clínico".to_string());
        }

        if item.alternatives.is_empty() {
            labels.push(label::SIN_ALTERNATIVAS.to_string());
            notes.push("la variante no tiene alternativas".to_string());
        } else {
            self.check_alternatives(item, &mut labels, &mut notes);
        }

        let global_len = item
            .explanation
            .as_deref()
            .map(|e| e.trim().chars().count())
            .unwrap_or(0);
        if global_len < MIN_GLOBAL_EXPLANATION_CHARS {
            labels.push(label::EXPLICACION_GLOBAL_INSUFICIENTE.to_string());
            notes.push("la explicación global falta o es demasiado breve".to_string());
        }

        if !DIFFICULTIES.contains(&item.difficulty.as_str()) {
            labels.push(label::DIFICULTAD_INVALIDA.to_string());
            notes.push(format!("dificultad \"{}\" no reconocida", item.difficulty));
        }

        let ok = !labels.iter().any(|l| label::is_blocking(l));
        let structure = (1.0 - 0.1 * labels.len() as f64).max(0.0);
        let mut scores = std::collections::BTreeMap::new();
        scores.insert("structure".to_string(), structure);

        PrecheckVerdict {
            ok,
            labels,
            scores,
            notes,
        }
    }

    fn check_alternatives(&self, item: &Item, labels: &mut Vec<String>, notes: &mut Vec<String>) {
        let alternatives = &item.alternatives;

        if alternatives.len() != 4 {
            labels.push(label::ALTERNATIVAS_DISTINTAS_DE_4.to_string());
            notes.push(format!("{} alternativas en lugar de 4", alternatives.len()));
        }

        if alternatives.iter().any(|a| a.text.trim().is_empty()) {
            labels.push(label::ALTERNATIVAS_VACIAS.to_string());
            notes.push("hay alternativas sin texto".to_string());
        }

        if alternatives
            .iter()
            .any(|a| a.text.trim().chars().count() < MIN_ALTERNATIVE_CHARS)
        {
            labels.push(label::ALTERNATIVAS_CORTAS.to_string());
            notes.push("hay alternativas demasiado breves".to_string());
        }

        match item.correct_count() {
            0 => {
                labels.push(label::SIN_ALTERNATIVA_CORRECTA.to_string());
                notes.push("ninguna alternativa está marcada como correcta".to_string());
            }
            1 => {}
            n => {
                labels.push(label::MULTIPLES_CORRECTAS.to_string());
                notes.push(format!("{n} alternativas marcadas como correctas"));
            }
        }

        let correct_thin = alternatives.iter().filter(|a| a.is_correct).any(|a| {
            a.explanation
                .as_deref()
                .map(|e| e.trim().chars().count())
                .unwrap_or(0)
                < MIN_CORRECT_EXPLANATION_CHARS
        });
        if alternatives.iter().any(|a| a.is_correct) && correct_thin {
            labels.push(label::EXPLICACION_CORRECTA_INSUFICIENTE.to_string());
            notes.push("la explicación de la alternativa correcta falta o es breve".to_string());
        }

        let incorrect_thin = alternatives.iter().filter(|a| !a.is_correct).any(|a| {
            a.explanation
                .as_deref()
                .map(|e| e.trim().chars().count())
                .unwrap_or(0)
                < MIN_INCORRECT_EXPLANATION_CHARS
        });
        if incorrect_thin {
            labels.push(label::EXPLICACIONES_INCORRECTAS_INSUFICIENTES.to_string());
            notes.push("hay alternativas incorrectas sin explicación suficiente".to_string());
        }
    }
}

impl Default for PrecheckEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examsweep_core::Alternative;

    fn alt(text: &str, is_correct: bool, position: i64, explanation: &str) -> Alternative {
        Alternative {
            id: position + 1,
            text: text.to_string(),
            is_correct,
            position,
            explanation: Some(explanation.to_string()),
        }
    }

    /// An item that passes every rule.
    fn clean_item() -> Item {
        Item {
            question_id: 1,
            variant_id: 10,
            sequence: 1,
            variant_number: 1,
            base_stem: "¿Cuál es la conducta inicial frente a un dolor torácico opresivo?"
                .to_string(),
            stem: "Paciente de 45 años consulta por dolor torácico opresivo de dos horas. \
                   ¿Cuál es la conducta inicial más adecuada?"
                .to_string(),
            difficulty: "MEDIUM".to_string(),
            explanation: Some(
                "El cuadro orienta a síndrome coronario agudo y la conducta inicial es aspirina."
                    .to_string(),
            ),
            alternatives: vec![
                alt(
                    "Ácido acetilsalicílico",
                    true,
                    0,
                    "Es la conducta inicial de elección.",
                ),
                alt("Paracetamol oral", false, 1, "No modifica el pronóstico."),
                alt(
                    "Observación domiciliaria",
                    false,
                    2,
                    "Retrasa el manejo del cuadro.",
                ),
                alt(
                    "Antibióticos de amplio espectro",
                    false,
                    3,
                    "No hay foco infeccioso.",
                ),
            ],
        }
    }

    #[test]
    fn clean_item_passes_with_no_labels() {
        let verdict = PrecheckEngine::new().evaluate(&clean_item());
        assert!(verdict.ok);
        assert!(verdict.labels.is_empty());
        assert_eq!(verdict.scores["structure"], 1.0);
        assert!(verdict.notes.is_empty());
    }

    #[test]
    fn evaluation_is_deterministic() {
        let engine = PrecheckEngine::new();
        let mut item = clean_item();
        item.stem = "corta".to_string();

        let first = engine.evaluate(&item);
        let second = engine.evaluate(&item);
        assert_eq!(first, second);
    }

    #[test]
    fn short_statement_stem_is_cosmetic_only() {
        // 50 characters, no question mark, clinical context present
        let stem = "Paciente de 60 años con fiebre y tos hace dos dias";
        assert_eq!(stem.chars().count(), 50);

        let mut item = clean_item();
        item.stem = stem.to_string();

        let verdict = PrecheckEngine::new().evaluate(&item);
        assert_eq!(
            verdict.labels,
            vec!["sin_interrogacion".to_string(), "pregunta_corta".to_string()]
        );
        // Neither label blocks
        assert!(verdict.ok);
        assert!((verdict.scores["structure"] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn empty_stem_blocks() {
        let mut item = clean_item();
        item.stem = "  ".to_string();

        let verdict = PrecheckEngine::new().evaluate(&item);
        assert!(verdict.labels.contains(&"sin_contenido".to_string()));
        assert!(!verdict.ok);
    }

    #[test]
    fn three_alternatives_do_not_block() {
        let mut item = clean_item();
        item.alternatives.pop();

        let verdict = PrecheckEngine::new().evaluate(&item);
        assert!(verdict
            .labels
            .contains(&"alternativas_distintas_de_4".to_string()));
        assert!(verdict.ok);
    }

    #[test]
    fn multiple_correct_blocks() {
        let mut item = clean_item();
        item.alternatives[1].is_correct = true;

        let verdict = PrecheckEngine::new().evaluate(&item);
        assert!(verdict.labels.contains(&"multiples_correctas".to_string()));
        assert!(!verdict.ok);
    }

    #[test]
    fn no_correct_blocks() {
        let mut item = clean_item();
        item.alternatives[0].is_correct = false;

        let verdict = PrecheckEngine::new().evaluate(&item);
        assert!(verdict
            .labels
            .contains(&"sin_alternativa_correcta".to_string()));
        assert!(!verdict.ok);
    }

    #[test]
    fn completion_style_stem_counts_as_question() {
        let mut item = clean_item();
        item.stem = "Paciente de 45 años con dolor torácico opresivo; el diagnóstico más probable es:"
            .to_string();

        let verdict = PrecheckEngine::new().evaluate(&item);
        assert!(!verdict.labels.contains(&"sin_interrogacion".to_string()));

        // A colon alone is not enough
        item.stem = "Paciente de 45 años con dolor torácico opresivo, señale el diagnóstico:"
            .to_string();
        let verdict = PrecheckEngine::new().evaluate(&item);
        assert!(verdict.labels.contains(&"sin_interrogacion".to_string()));
    }

    #[test]
    fn overlong_stem_needs_both_length_and_growth() {
        let engine = PrecheckEngine::new();
        let filler = "dolor torácico en paciente adulto mayor con antecedentes. ".repeat(20);

        // Inflated relative to a short base
        let mut item = clean_item();
        item.stem = format!("{filler}¿Cuál es el diagnóstico?");
        assert!(item.stem.chars().count() >= 1000);
        let verdict = engine.evaluate(&item);
        assert!(verdict.labels.contains(&"pregunta_muy_larga".to_string()));
        assert!(!verdict.ok);

        // Same length but the base grew with it: no length label
        item.base_stem = item.stem.clone();
        let verdict = engine.evaluate(&item);
        assert!(!verdict.labels.contains(&"pregunta_muy_larga".to_string()));
        assert!(!verdict.labels.contains(&"pregunta_larga".to_string()));
    }

    #[test]
    fn moderately_long_stem_is_not_blocking() {
        let engine = PrecheckEngine::new();
        let filler = "dolor torácico en paciente adulto mayor con antecedentes. ".repeat(13);

        let mut item = clean_item();
        item.stem = format!("{filler}¿Cuál es el diagnóstico?");
        let len = item.stem.chars().count();
        assert!((700..1000).contains(&len), "fixture length {len}");

        let verdict = engine.evaluate(&item);
        assert!(verdict.labels.contains(&"pregunta_larga".to_string()));
        assert!(!verdict.labels.contains(&"pregunta_muy_larga".to_string()));
        assert!(verdict.ok);
    }

    #[test]
    fn missing_clinical_context_is_flagged() {
        let mut item = clean_item();
        item.stem =
            "¿Cuál de las siguientes opciones describe mejor la estructura del documento final?"
                .to_string();

        let verdict = PrecheckEngine::new().evaluate(&item);
        assert!(verdict.labels.contains(&"sin_contexto_medico".to_string()));
        assert!(verdict.ok);
    }

    #[test]
    fn thin_explanations_are_flagged() {
        let mut item = clean_item();
        item.alternatives[0].explanation = Some("Correcta.".to_string());
        item.alternatives[2].explanation = None;
        item.explanation = Some("Breve.".to_string());

        let verdict = PrecheckEngine::new().evaluate(&item);
        assert!(verdict
            .labels
            .contains(&"explicacion_correcta_insuficiente".to_string()));
        assert!(verdict
            .labels
            .contains(&"explicaciones_incorrectas_insuficientes".to_string()));
        assert!(verdict
            .labels
            .contains(&"explicacion_global_insuficiente".to_string()));
        assert!(verdict.ok);
    }

    #[test]
    fn unknown_difficulty_is_flagged() {
        let mut item = clean_item();
        item.difficulty = "media".to_string();

        let verdict = PrecheckEngine::new().evaluate(&item);
        assert!(verdict.labels.contains(&"dificultad_invalida".to_string()));
        assert!(verdict.ok);
    }

    #[test]
    fn empty_alternative_text_is_flagged_not_blocking() {
        let mut item = clean_item();
        item.alternatives[3].text = " ".to_string();

        let verdict = PrecheckEngine::new().evaluate(&item);
        assert!(verdict.labels.contains(&"alternativas_vacias".to_string()));
        assert!(verdict.labels.contains(&"alternativas_cortas".to_string()));
        assert!(verdict.ok);
    }

    #[test]
    fn score_floors_at_zero() {
        let item = Item {
            question_id: 1,
            variant_id: 2,
            sequence: 1,
            variant_number: 1,
            base_stem: String::new(),
            stem: String::new(),
            difficulty: String::new(),
            explanation: None,
            alternatives: vec![
                Alternative {
                    id: 1,
                    text: String::new(),
                    is_correct: false,
                    position: 0,
                    explanation: None,
                },
                Alternative {
                    id: 2,
                    text: String::new(),
                    is_correct: false,
                    position: 1,
                    explanation: None,
                },
            ],
        };

        let verdict = PrecheckEngine::new().evaluate(&item);
        assert!(!verdict.ok);
        assert_eq!(verdict.labels.len(), 11);
        assert_eq!(verdict.scores["structure"], 0.0);
    }
}

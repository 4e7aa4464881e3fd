//! Prompt construction for judge evaluation and fix generation.
//!
//! Both prompts demand strict JSON output; the extractors clean up what
//! actually comes back.

use examsweep_core::Item;

/// System prompt for the evaluation call.
pub const EVAL_SYSTEM: &str = r#"You are a medical-exam content reviewer. You receive one generated question variant together with its source question and must judge whether the variant is clinically sound and structurally usable.

OUTPUT FORMAT (strict JSON, no prose, no markdown):
{
  "labels": ["..."],
  "scores": {"clinica": 0.0, "coherencia": 0.0},
  "critique": "short rationale in Spanish",
  "confidence": 0.0
}

LABEL VOCABULARY (use only when the problem is present):
- error_contenido: the stem or key states something factually wrong
- inconsistencia_clinica: the clinical scenario is internally inconsistent
- clave_incorrecta: the alternative marked correct is not the best answer
- distractores_debiles: incorrect alternatives are too weak to discriminate
- sin_contexto_medico: the stem lacks a clinical scenario
- ok: nothing to report

RULES:
- scores and confidence are numbers in [0, 1]
- an empty labels list or ["ok"] means the variant is acceptable
- critique is 1-3 sentences, Spanish, naming the concrete problem
- never invent labels outside the vocabulary"#;

/// System prompt for the correction call.
pub const FIX_SYSTEM: &str = r#"You are a medical-exam content editor. You receive one question variant, the problems detected in it and a reviewer critique. Propose the smallest field-level edits that fix the detected problems.

OUTPUT FORMAT (strict JSON, no prose, no markdown):
{
  "patches": [
    {
      "kind": "stem|alternative|explanation|difficulty",
      "field": "stem",
      "original": "current value",
      "proposed": "corrected value",
      "rationale": "why, in Spanish",
      "confidence": 0.0
    }
  ],
  "overall_confidence": 0.0,
  "requires_expert_review": false,
  "review_notes": null
}

FIELD PATHS:
- "stem", "explanation", "difficulty" address the variant's own fields
- "alternative[N]" addresses the text of the N-th alternative (0-based, display order)
- "alternative[N].explanation" addresses that alternative's explanation

RULES:
- only touch fields involved in the detected problems
- never change which alternative is correct
- difficulty proposals must be EASY, MEDIUM or HARD
- set requires_expert_review true when the problems need clinical judgement you cannot guarantee
- confidences are numbers in [0, 1]"#;

/// Shared content block describing one item.
fn format_item(item: &Item) -> String {
    let mut out = String::new();

    out.push_str(&format!("PREGUNTA BASE:\n{}\n\n", item.base_stem.trim()));
    out.push_str(&format!("ENUNCIADO DE LA VARIANTE:\n{}\n\n", item.stem.trim()));
    out.push_str(&format!("DIFICULTAD: {}\n\n", item.difficulty));

    out.push_str("ALTERNATIVAS:\n");
    for (i, alt) in item.alternatives.iter().enumerate() {
        let marker = if alt.is_correct { " [CORRECTA]" } else { "" };
        out.push_str(&format!("{i}. {}{marker}\n", alt.text.trim()));
        if let Some(explanation) = alt.explanation.as_deref() {
            out.push_str(&format!("   explicación: {}\n", explanation.trim()));
        }
    }

    out.push_str(&format!(
        "\nEXPLICACIÓN GLOBAL:\n{}\n",
        item.explanation.as_deref().unwrap_or("(ausente)").trim()
    ));

    out
}

/// User prompt for the evaluation call.
pub fn eval_prompt(item: &Item) -> String {
    format!(
        "Evalúa la siguiente variante generada.\n\n{}",
        format_item(item)
    )
}

/// User prompt for the correction call.
pub fn fix_prompt(item: &Item, labels: &[String], critique: Option<&str>) -> String {
    let problems = if labels.is_empty() {
        "(ninguno detectado)".to_string()
    } else {
        labels.join(", ")
    };

    format!(
        "Corrige la siguiente variante.\n\nPROBLEMAS DETECTADOS: {problems}\n\nCRÍTICA DEL REVISOR:\n{}\n\n{}",
        critique.unwrap_or("(sin crítica)"),
        format_item(item)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use examsweep_core::Alternative;

    fn item() -> Item {
        Item {
            question_id: 1,
            variant_id: 7,
            sequence: 1,
            variant_number: 2,
            base_stem: "¿Cuál es el diagnóstico más probable?".to_string(),
            stem: "Paciente de 60 años con disnea. ¿Cuál es el diagnóstico más probable?"
                .to_string(),
            difficulty: "HARD".to_string(),
            explanation: Some("La disnea súbita orienta a TEP.".to_string()),
            alternatives: vec![
                Alternative {
                    id: 1,
                    text: "Tromboembolismo pulmonar".to_string(),
                    is_correct: true,
                    position: 0,
                    explanation: Some("Cuadro clásico.".to_string()),
                },
                Alternative {
                    id: 2,
                    text: "Neumonía atípica".to_string(),
                    is_correct: false,
                    position: 1,
                    explanation: None,
                },
            ],
        }
    }

    #[test]
    fn eval_prompt_embeds_all_content() {
        let prompt = eval_prompt(&item());
        assert!(prompt.contains("PREGUNTA BASE"));
        assert!(prompt.contains("¿Cuál es el diagnóstico más probable?"));
        assert!(prompt.contains("Paciente de 60 años con disnea"));
        assert!(prompt.contains("0. Tromboembolismo pulmonar [CORRECTA]"));
        assert!(prompt.contains("1. Neumonía atípica\n"));
        assert!(prompt.contains("DIFICULTAD: HARD"));
        assert!(prompt.contains("La disnea súbita orienta a TEP."));
    }

    #[test]
    fn fix_prompt_lists_problems_and_critique() {
        let labels = vec!["sin_interrogacion".to_string(), "pregunta_corta".to_string()];
        let prompt = fix_prompt(&item(), &labels, Some("El enunciado es telegráfico."));
        assert!(prompt.contains("PROBLEMAS DETECTADOS: sin_interrogacion, pregunta_corta"));
        assert!(prompt.contains("El enunciado es telegráfico."));

        let prompt = fix_prompt(&item(), &[], None);
        assert!(prompt.contains("(ninguno detectado)"));
        assert!(prompt.contains("(sin crítica)"));
    }
}

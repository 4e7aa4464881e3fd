//! Label vocabulary shared by the precheck rules, the judge and the
//! gating policy.
//!
//! Labels are plain strings on the wire: the judge model may emit labels
//! outside this vocabulary, and unknown labels are carried through
//! verbatim. The constant sets below drive the pass/fail, risk and
//! auto-fix decisions.

/// Variant has an empty stem
pub const SIN_CONTENIDO: &str = "sin_contenido";
/// Stem is not phrased as a question
pub const SIN_INTERROGACION: &str = "sin_interrogacion";
/// Stem is shorter than expected
pub const PREGUNTA_CORTA: &str = "pregunta_corta";
/// Stem is long relative to its base question
pub const PREGUNTA_LARGA: &str = "pregunta_larga";
/// Stem is far too long relative to its base question
pub const PREGUNTA_MUY_LARGA: &str = "pregunta_muy_larga";
/// Stem carries no clinical vocabulary
pub const SIN_CONTEXTO_MEDICO: &str = "sin_contexto_medico";
/// Variant has no alternatives at all
pub const SIN_ALTERNATIVAS: &str = "sin_alternativas";
/// Alternative count differs from the expected four
pub const ALTERNATIVAS_DISTINTAS_DE_4: &str = "alternativas_distintas_de_4";
/// Some alternative has empty text
pub const ALTERNATIVAS_VACIAS: &str = "alternativas_vacias";
/// Some alternative text is suspiciously short
pub const ALTERNATIVAS_CORTAS: &str = "alternativas_cortas";
/// No alternative is flagged correct
pub const SIN_ALTERNATIVA_CORRECTA: &str = "sin_alternativa_correcta";
/// More than one alternative is flagged correct
pub const MULTIPLES_CORRECTAS: &str = "multiples_correctas";
/// Correct alternative's explanation is missing or too short
pub const EXPLICACION_CORRECTA_INSUFICIENTE: &str = "explicacion_correcta_insuficiente";
/// Some incorrect alternative's explanation is missing or too short
pub const EXPLICACIONES_INCORRECTAS_INSUFICIENTES: &str = "explicaciones_incorrectas_insuficientes";
/// Global explanation is missing or too short
pub const EXPLICACION_GLOBAL_INSUFICIENTE: &str = "explicacion_global_insuficiente";
/// Difficulty is not one of EASY, MEDIUM, HARD
pub const DIFICULTAD_INVALIDA: &str = "dificultad_invalida";

/// Judge verdict: factual/content error in the stem or key
pub const ERROR_CONTENIDO: &str = "error_contenido";
/// Judge verdict: clinically inconsistent scenario
pub const INCONSISTENCIA_CLINICA: &str = "inconsistencia_clinica";
/// Judge verdict: the keyed answer is wrong
pub const CLAVE_INCORRECTA: &str = "clave_incorrecta";
/// Judge verdict: distractors too weak to discriminate
pub const DISTRACTORES_DEBILES: &str = "distractores_debiles";
/// Neutral label meaning "nothing to report"
pub const OK: &str = "ok";

/// Labels that fail the precheck outright.
pub const BLOCKING: &[&str] = &[
    SIN_CONTENIDO,
    SIN_ALTERNATIVAS,
    SIN_ALTERNATIVA_CORRECTA,
    MULTIPLES_CORRECTAS,
    PREGUNTA_MUY_LARGA,
];

/// Labels that put an item at HIGH risk.
pub const RISK_HIGH: &[&str] = &[
    ERROR_CONTENIDO,
    INCONSISTENCIA_CLINICA,
    CLAVE_INCORRECTA,
    MULTIPLES_CORRECTAS,
    SIN_ALTERNATIVA_CORRECTA,
];

/// Labels that put an item at MEDIUM risk.
pub const RISK_MEDIUM: &[&str] = &[
    PREGUNTA_MUY_LARGA,
    PREGUNTA_LARGA,
    SIN_CONTEXTO_MEDICO,
    DISTRACTORES_DEBILES,
];

/// Labels that rule out automatic fixing entirely.
pub const NOT_AUTO_FIXABLE: &[&str] = &[
    SIN_CONTENIDO,
    SIN_ALTERNATIVAS,
    SIN_ALTERNATIVA_CORRECTA,
    MULTIPLES_CORRECTAS,
    PREGUNTA_MUY_LARGA,
    ALTERNATIVAS_VACIAS,
    CLAVE_INCORRECTA,
    INCONSISTENCIA_CLINICA,
    ERROR_CONTENIDO,
];

/// Cosmetic labels a machine is trusted to fix on its own.
pub const COSMETIC: &[&str] = &[
    SIN_INTERROGACION,
    PREGUNTA_CORTA,
    DIFICULTAD_INVALIDA,
    EXPLICACION_CORRECTA_INSUFICIENTE,
    EXPLICACIONES_INCORRECTAS_INSUFICIENTES,
    EXPLICACION_GLOBAL_INSUFICIENTE,
];

/// Whether a single label fails the precheck.
pub fn is_blocking(label: &str) -> bool {
    BLOCKING.contains(&label)
}

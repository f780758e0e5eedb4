//! Field Extractor — pulls labeled fields out of a teacher's free-form message.
//!
//! Matching is case- and accent-sensitive on the label text ("Duración:" must
//! carry the accent). The value is the trimmed remainder of the labeled line;
//! a missing label resolves to the field's default. First match wins.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default assumed when the message carries no "Duración:" line.
pub const DEFAULT_DURATION: &str = "2 horas";

// `[ \t]*` rather than `\s*` so an empty remainder cannot swallow the newline
// and capture the following line.
static TEMA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Tema:[ \t]*(.*)").unwrap());
static COMPETENCIA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Competencia:[ \t]*(.*)").unwrap());
static GRADO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Grado:[ \t]*(.*)").unwrap());
static CONTEXTO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Contexto:[ \t]*(.*)").unwrap());
static DURACION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Duración:[ \t]*(.*)").unwrap());

/// The structured fields extracted from one teacher message.
/// Immutable once extracted; consumed only by the prompt assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherInputs {
    pub tema: String,
    pub competencia: String,
    pub grado: String,
    pub contexto: String,
    pub duracion: String,
}

/// Parses a teacher message into its labeled fields. Pure function:
/// free-form values are accepted verbatim, nothing is validated.
pub fn parse_teacher_message(message: &str) -> TeacherInputs {
    TeacherInputs {
        tema: capture(&TEMA_RE, message).unwrap_or_default(),
        competencia: capture(&COMPETENCIA_RE, message).unwrap_or_default(),
        grado: capture(&GRADO_RE, message).unwrap_or_default(),
        contexto: capture(&CONTEXTO_RE, message).unwrap_or_default(),
        duracion: capture(&DURACION_RE, message)
            .unwrap_or_else(|| DEFAULT_DURATION.to_string()),
    }
}

fn capture(re: &Regex, message: &str) -> Option<String> {
    re.captures(message).map(|c| c[1].trim().to_string())
}

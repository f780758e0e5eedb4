//! Prompt Assembler — deterministic rendering of extracted fields, retrieved
//! passages, and recent conversation into the instruction prompt.
//!
//! No truncation logic: prompt length is bounded only by `MAX_PASSAGES` and
//! `MAX_HISTORY_TURNS`, which match the retrieval and history call limits.

use crate::lesson::extractor::TeacherInputs;
use crate::lesson::history::ConversationTurn;

/// Cap on retrieved passages rendered into one prompt.
pub const MAX_PASSAGES: usize = 3;
/// Cap on prior exchanges rendered into one prompt (user + bot halves each).
pub const MAX_HISTORY_TURNS: usize = 3;

/// The output contract stated to the model, verbatim, with every expected
/// top-level and nested field name.
pub const LESSON_CONTRACT: &str = r#"Eres un asistente pedagógico experto en Matemática del currículo peruano. Genera el entregable en formato JSON **válido** siguiendo exactamente esta estructura:

{
  "tema": "",
  "ciclo": "",
  "contexto": "",
  "horasClase": 2,
  "competenciasSeleccionadas": [],
  "materialesDisponibles": "",
  "competenciaDescripcion": "",
  "secuenciaMetodologica": {
    "inicio": "",
    "desarrollo": "",
    "cierre": ""
  },
  "procesosDidacticos": [],
  "materialesDidacticosSugeridos": [],
  "actividadesContextualizadas": [],
  "distribucionHoras": ""
}

Usa la información recibida para llenar los campos.
"#;

/// Renders the full instruction prompt. Pure and deterministic: the same
/// inputs always produce the same string.
pub fn build_prompt(
    inputs: &TeacherInputs,
    passages: &[String],
    history: &[ConversationTurn],
) -> String {
    let mut prompt = String::new();

    if !history.is_empty() {
        prompt.push_str("Conversación previa:\n");
        // Oldest first; the log already returns them in chronological order.
        for turn in history.iter().rev().take(MAX_HISTORY_TURNS * 2).rev() {
            prompt.push_str(&format!("{}: {}\n", turn.role, turn.content));
        }
        prompt.push('\n');
    }

    prompt.push_str(LESSON_CONTRACT);
    prompt.push('\n');

    prompt.push_str(&format!("Tema: {}\n", inputs.tema));
    prompt.push_str(&format!("Competencia: {}\n", inputs.competencia));
    prompt.push_str(&format!("Grado: {}\n", inputs.grado));
    prompt.push_str(&format!("Contexto del aula: {}\n", inputs.contexto));
    prompt.push_str(&format!("Duración: {}\n\n", inputs.duracion));

    if !passages.is_empty() {
        prompt.push_str("Referencias curriculares relevantes:\n");
        for passage in passages.iter().take(MAX_PASSAGES) {
            prompt.push_str(&format!("- {passage}\n"));
        }
    }

    prompt
}

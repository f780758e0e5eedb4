//! Static curriculum corpus embedded at startup.
//!
//! These passages are the whole knowledge collection; there is no runtime
//! ingestion endpoint. The index is rebuilt in memory on every process start.

pub const CURRICULUM_CORPUS: [&str; 5] = [
    "Competencia: Resuelve problemas de cantidad. Capacidades: Traduce cantidades a expresiones numéricas...",
    "Competencia: Resuelve problemas de regularidad, equivalencia y cambios...",
    "Competencia: Resuelve problemas de forma, movimiento y localización...",
    "Competencia: Resuelve problemas de gestión de datos e incertidumbre...",
    "Procesos didácticos de Matemática: Comprensión del problema, Búsqueda y ejecución de estrategias, Socializa sus representaciones, Reflexión y formalización, Planteamiento de otros problemas.",
];

use serde::Serialize;
use serde::Serializer;
use std::fmt::Display;

/// Name of the derived session count column appended to every dataset.
pub const SESSIONS_COLUMN: &str = "SESSIONS";

/// Rewrites a header name into its canonical form: surrounding whitespace trimmed,
/// upper-cased, and each space replaced by an underscore.
///
/// The transformation is idempotent.
pub fn canonical_column_name(name: &str) -> String {
    name.trim().to_uppercase().replace(' ', "_")
}

macro_rules! known_columns {
    ($($variant:ident => $name:literal,)*) => {
        /// Canonical course-session columns, declared in display order.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum KnownColumn {
            $($variant,)*
        }

        impl KnownColumn {
            /// Every known column in display order.
            pub const ALL: &'static [KnownColumn] = &[$(KnownColumn::$variant,)*];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(KnownColumn::$variant => $name,)*
                }
            }

            /// Looks up a column by its canonical name.
            pub fn from_canonical(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(KnownColumn::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

known_columns! {
    Id => "ID",
    NombreDeLaAsignatura => "NOMBRE_DE_LA_ASIGNATURA",
    AsignaturaOficialEquivalente => "ASIGNATURA_OFICIAL_EQUIVALENTE",
    CreditosOficiales => "CRÉDITOS_OFICIALES",
    Programa => "PROGRAMA",
    Convocatoria => "CONVOCATORIA",
    Seccion => "SECCIÓN",
    Campus => "CAMPUS",
    Curso => "CURSO",
    CodProfesor => "CÓD._PROFESOR",
    Profesor => "PROFESOR",
    EmailFaculty => "EMAIL_FACULTY",
    TipoPro => "TIPO_PRO.",
    Doctorado => "DOCTORADO",
    Acreditacion => "ACREDITACIÓN",
    FechaDesde => "FECHA_DESDE",
    FechaHasta => "FECHA_HASTA",
    PeriodoDeImparticion => "PERIODO_DE_IMPARTICIÓN",
    PeriodoAcademico => "PERIODO_ACADÉMICO",
    Sesiones => "SESIONES",
    SesionesLiveInPerson => "S._LV-IP",
    SesionesAsync => "S._ASYNC",
    Foro => "FORO",
    SesionesTutor => "S._TUTOR",
    SesionesLiveOnline => "S._LV-OL",
    Idioma => "IDIOMA",
    Area => "AREA",
    TipoAsig => "TIPO_ASIG.",
    TipoP => "TIPO_P.",
    ObsDirArea => "OBS._DIR_ÁREA",
    ObsDirProg => "OBS._DIR_PROG.",
    PagoEstandar => "PAGO_ESTÁNDAR",
    OkDp => "OK_DP",
    ResAsig => "RES._ASIG.",
}

impl Display for KnownColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical column name, either one of the known columns or an unrecognized one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    Known(KnownColumn),
    Other(String),
}

impl ColumnKey {
    /// Classifies an already canonical name.
    pub fn from_canonical(name: &str) -> Self {
        match KnownColumn::from_canonical(name) {
            Some(column) => ColumnKey::Known(column),
            None => ColumnKey::Other(name.to_owned()),
        }
    }

    /// Canonicalizes a free-form column name and classifies it.
    pub fn parse(name: &str) -> Self {
        Self::from_canonical(&canonical_column_name(name))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColumnKey::Known(column) => column.as_str(),
            ColumnKey::Other(name) => name,
        }
    }
}

impl Display for ColumnKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ColumnKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_names() {
        assert_eq!(canonical_column_name("  Sesiones Academicas "), "SESIONES_ACADEMICAS");
        assert_eq!(canonical_column_name("area "), "AREA");
        assert_eq!(canonical_column_name("Sección"), "SECCIÓN");
        assert_eq!(canonical_column_name("Tipo Asig."), "TIPO_ASIG.");
        assert_eq!(canonical_column_name("Nombre  de"), "NOMBRE__DE");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for name in ["  Sesiones Academicas ", "Cód. Profesor", "S. LV-IP", "obs. dir área", "x"] {
            let once = canonical_column_name(name);
            assert_eq!(canonical_column_name(&once), once);
        }
    }

    #[test]
    fn known_columns_round_trip_names() {
        assert_eq!(KnownColumn::ALL.len(), 34);
        for column in KnownColumn::ALL {
            assert_eq!(KnownColumn::from_canonical(column.as_str()), Some(*column));
            assert_eq!(canonical_column_name(column.as_str()), column.as_str());
        }
        assert!(KnownColumn::Id < KnownColumn::ResAsig);
    }

    #[test]
    fn classifies_keys() {
        assert_eq!(ColumnKey::parse(" cód. profesor"), ColumnKey::Known(KnownColumn::CodProfesor));
        assert_eq!(ColumnKey::parse("Comentarios"), ColumnKey::Other("COMENTARIOS".into()));
        assert_eq!(ColumnKey::from_canonical("AREA").to_string(), "AREA");
    }
}

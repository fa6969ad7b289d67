use serde::Serialize;
use std::fmt;

/// One educational center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationalCenterRecord {
    pub name: String,
    pub locality: String,
    pub regime: Regime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Free-form center type ("IES", "CEIP", ...), shown in detail views.
    pub kind: Option<String>,
}

impl EducationalCenterRecord {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Funding/ownership category of a center.
///
/// Unknown source values are preserved in `Other` and drawn with the
/// fallback color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Regime {
    Public,
    SubsidizedPrivate,
    Private,
    Other(String),
}

impl Regime {
    /// Parse the value used in the source table ("púb.", "priv. conc.", "priv.").
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "púb." | "pub." | "public" | "público" | "publico" => Regime::Public,
            "priv. conc." | "priv.conc." | "concertado" | "subsidized" => Regime::SubsidizedPrivate,
            "priv." | "private" | "privado" => Regime::Private,
            _ => Regime::Other(raw.trim().to_string()),
        }
    }

    /// The value as it appears in the source table.
    pub fn source_label(&self) -> &str {
        match self {
            Regime::Public => "púb.",
            Regime::SubsidizedPrivate => "priv. conc.",
            Regime::Private => "priv.",
            Regime::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Regime::Public => "Public",
            Regime::SubsidizedPrivate => "Subsidized private",
            Regime::Private => "Private",
            Regime::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Regime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.source_label())
    }
}

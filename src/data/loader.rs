//! CSV readers for the municipality and educational-center tables.
//!
//! Column names follow the regional open-data exports; English aliases are
//! accepted too. Rate columns present in the exports are ignored, since
//! rates are always derived from the raw counts.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::DataError;
use crate::model::{EducationalCenterRecord, MunicipalityRecord, Regime};

/// (source column, accepted alias)
const MUNICIPALITY_COLUMNS: &[(&str, &str)] = &[
    ("municipio", "name"),
    ("Poblacion_Total", "population_total"),
    ("n_centros_total", "school_count_total"),
    ("total_ofertas", "housing_offer_total"),
    ("empresas_total", "company_count_total"),
];

const CENTER_COLUMNS: &[(&str, &str)] = &[
    ("DENOMINACION", "name"),
    ("localidad", "locality"),
    ("regimen", "regime"),
    ("LATITUD", "latitude"),
    ("LONGITUD", "longitude"),
];

/// A raw municipality row.
#[derive(Debug, Deserialize)]
struct MunicipalityRow {
    #[serde(rename = "municipio", alias = "name")]
    name: String,
    #[serde(rename = "Poblacion_Total", alias = "population_total", default)]
    population_total: Option<f64>,
    #[serde(rename = "n_centros_total", alias = "school_count_total", default)]
    school_count_total: Option<f64>,
    #[serde(rename = "total_ofertas", alias = "housing_offer_total", default)]
    housing_offer_total: Option<f64>,
    #[serde(rename = "empresas_total", alias = "company_count_total", default)]
    company_count_total: Option<f64>,
    #[serde(alias = "latitude", default)]
    lat: Option<f64>,
    #[serde(alias = "longitude", default)]
    lon: Option<f64>,
}

impl MunicipalityRow {
    fn into_record(self) -> Result<MunicipalityRecord, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("empty municipality name".to_string());
        }
        Ok(MunicipalityRecord {
            population_total: count(self.population_total, "population")?,
            school_count_total: count(self.school_count_total, "school count")?,
            housing_offer_total: count(self.housing_offer_total, "housing offer count")?,
            company_count_total: count(self.company_count_total, "company count")?,
            latitude: self.lat,
            longitude: self.lon,
            name,
        })
    }
}

/// Counts may be exported as `12` or `12.0`.
fn count(value: Option<f64>, what: &str) -> Result<u64, String> {
    match value {
        None => Err(format!("missing {}", what)),
        Some(v) if !v.is_finite() || v < 0.0 || v.fract() != 0.0 => {
            Err(format!("{} is not a non-negative integer: {}", what, v))
        }
        // `u64::MAX as f64` rounds up to 2^64, which does not fit.
        Some(v) if v >= u64::MAX as f64 => Err(format!("{} is out of range: {}", what, v)),
        Some(v) => Ok(v as u64),
    }
}

/// A raw educational-center row.
#[derive(Debug, Deserialize)]
struct CenterRow {
    #[serde(rename = "DENOMINACION", alias = "name")]
    name: String,
    #[serde(rename = "localidad", alias = "locality")]
    locality: String,
    #[serde(rename = "regimen", alias = "regime", default)]
    regime: Option<String>,
    #[serde(rename = "LATITUD", alias = "latitude", default)]
    latitude: Option<f64>,
    #[serde(rename = "LONGITUD", alias = "longitude", default)]
    longitude: Option<f64>,
    #[serde(rename = "tipo", alias = "kind", default)]
    kind: Option<String>,
}

impl CenterRow {
    fn into_record(self) -> Result<EducationalCenterRecord, String> {
        let regime = match self.regime.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Regime::parse(raw),
            _ => return Err(format!("center '{}' has no regime", self.name.trim())),
        };
        Ok(EducationalCenterRecord {
            name: self.name.trim().to_string(),
            locality: self.locality.trim().to_string(),
            regime,
            latitude: self.latitude,
            longitude: self.longitude,
            kind: self.kind.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()),
        })
    }
}

/// Rows read from one file, plus how many were rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

pub fn load_municipalities(path: &Path) -> Result<Loaded<MunicipalityRecord>, DataError> {
    let file = open(path)?;
    parse_municipalities(file, path)
}

pub fn load_centers(path: &Path) -> Result<Loaded<EducationalCenterRecord>, DataError> {
    let file = open(path)?;
    parse_centers(file, path)
}

/// Parse a municipality table from any reader. `source` labels errors.
pub fn parse_municipalities(
    reader: impl Read,
    source: &Path,
) -> Result<Loaded<MunicipalityRecord>, DataError> {
    parse(reader, source, MUNICIPALITY_COLUMNS, MunicipalityRow::into_record)
}

/// Parse an educational-center table from any reader. `source` labels errors.
pub fn parse_centers(
    reader: impl Read,
    source: &Path,
) -> Result<Loaded<EducationalCenterRecord>, DataError> {
    parse(reader, source, CENTER_COLUMNS, CenterRow::into_record)
}

fn open(path: &Path) -> Result<File, DataError> {
    File::open(path).map_err(|e| DataError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse<Row, T>(
    reader: impl Read,
    source: &Path,
    required: &[(&str, &str)],
    convert: impl Fn(Row) -> Result<T, String>,
) -> Result<Loaded<T>, DataError>
where
    Row: for<'de> Deserialize<'de>,
{
    let csv_error = |e: csv::Error| DataError::Csv {
        path: source.to_path_buf(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let missing: Vec<String> = required
        .iter()
        .filter(|(column, alias)| !headers.iter().any(|h| h == *column || h == *alias))
        .map(|(column, _)| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DataError::MissingColumns {
            path: source.to_path_buf(),
            columns: missing,
        });
    }

    let mut records = Vec::new();
    let mut skipped = 0;
    for (line, result) in reader.deserialize::<Row>().enumerate() {
        let converted = result.map_err(|e| e.to_string()).and_then(&convert);
        match converted {
            Ok(record) => records.push(record),
            Err(reason) => {
                // Header is line 1.
                log::warn!("{}:{}: skipping row: {}", source.display(), line + 2, reason);
                skipped += 1;
            }
        }
    }

    log::info!(
        "Loaded {} rows from {} ({} skipped)",
        records.len(),
        source.display(),
        skipped
    );

    Ok(Loaded { records, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn municipalities(csv: &str) -> Result<Loaded<MunicipalityRecord>, DataError> {
        parse_municipalities(csv.as_bytes(), Path::new("municipios.csv"))
    }

    fn centers(csv: &str) -> Result<Loaded<EducationalCenterRecord>, DataError> {
        parse_centers(csv.as_bytes(), Path::new("centros.csv"))
    }

    #[test]
    fn test_parse_source_columns() {
        let csv = "\
municipio,Poblacion_Total,n_centros_total,total_ofertas,empresas_total,centros_por_1000hab,lat,lon
Alzira,44000,30,120,2900,0.68,39.15,-0.43
Bocairent,500,2.0,10,50,4.0,,
";
        let loaded = municipalities(csv).unwrap();
        assert_eq!(loaded.skipped, 0);
        assert_eq!(loaded.records.len(), 2);

        let alzira = &loaded.records[0];
        assert_eq!(alzira.name, "Alzira");
        assert_eq!(alzira.population_total, 44000);
        assert_eq!(alzira.company_count_total, 2900);
        assert_eq!(alzira.coordinates(), Some((39.15, -0.43)));

        let bocairent = &loaded.records[1];
        assert_eq!(bocairent.school_count_total, 2);
        assert_eq!(bocairent.latitude, None);
    }

    #[test]
    fn test_parse_english_aliases() {
        let csv = "\
name,population_total,school_count_total,housing_offer_total,company_count_total,latitude,longitude
Elx,235000,160,1500,19000,38.26,-0.70
";
        let loaded = municipalities(csv).unwrap();
        assert_eq!(loaded.records[0].name, "Elx");
        assert_eq!(loaded.records[0].longitude, Some(-0.70));
    }

    #[test]
    fn test_missing_columns_are_all_reported() {
        let csv = "municipio,Poblacion_Total,n_centros_total\nA,1,1\n";
        match municipalities(csv) {
            Err(DataError::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec!["total_ofertas", "empresas_total"]);
            }
            other => panic!("expected missing columns, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let csv = "\
municipio,Poblacion_Total,n_centros_total,total_ofertas,empresas_total
Good,1000,1,2,3
Negative,1000,-1,2,3
Fraction,1000,1.5,2,3
Missing,,1,2,3
Text,many,1,2,3
,1000,1,2,3
Zero,0,1,2,3
";
        let loaded = municipalities(csv).unwrap();
        let names: Vec<&str> = loaded.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Good", "Zero"]);
        assert_eq!(loaded.skipped, 5);
    }

    #[test]
    fn test_count_beyond_u64_is_skipped() {
        let csv = "\
municipio,Poblacion_Total,n_centros_total,total_ofertas,empresas_total
Huge,1e20,1,2,3
Edge,18446744073709551616,1,2,3
Large,9007199254740992,1,2,3
";
        let loaded = municipalities(csv).unwrap();
        assert_eq!(loaded.skipped, 2);
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].name, "Large");
        assert_eq!(loaded.records[0].population_total, 9_007_199_254_740_992);
    }

    #[test]
    fn test_parse_centers() {
        let csv = "\
DENOMINACION,localidad,regimen,LATITUD,LONGITUD,tipo
CEIP Sant Jordi,Alcoi,púb.,38.70,-0.47,CEIP
Col·legi Sant Roc,Alcoi,priv. conc.,38.69,-0.47,
Acadèmia Nova,València,Mixto,,,
Sense Règim,Gandia,,38.99,-0.16,IES
";
        let loaded = centers(csv).unwrap();
        assert_eq!(loaded.records.len(), 3);
        assert_eq!(loaded.skipped, 1);

        assert_eq!(loaded.records[0].regime, Regime::Public);
        assert_eq!(loaded.records[0].kind.as_deref(), Some("CEIP"));
        assert_eq!(loaded.records[1].regime, Regime::SubsidizedPrivate);
        assert_eq!(loaded.records[1].kind, None);
        assert_eq!(loaded.records[2].regime, Regime::Other("Mixto".to_string()));
        assert_eq!(loaded.records[2].coordinates(), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = Path::new("/nonexistent/muni-compass/municipios.csv");
        let err = load_municipalities(path).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}

pub mod center;
pub mod municipality;
pub mod rate;

pub use center::{EducationalCenterRecord, Regime};
pub use municipality::{Indicator, IndicatorRates, Metric, MunicipalityRecord, ScoredMunicipality};
pub use rate::Rate;

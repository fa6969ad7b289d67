use crate::error::ScoringError;
use crate::model::ScoredMunicipality;
use crate::scoring::{validate_thresholds, Thresholds};

/// Keep the rows meeting every supplied threshold, ranked.
///
/// Ranking is by opportunity index descending, undefined indices last, ties
/// broken by name ascending. A row with an undefined rate never satisfies a
/// threshold on that rate. Accepts any row source, so a result can be
/// filtered again.
pub fn filter_by_minimum_thresholds<'a>(
    rows: impl IntoIterator<Item = &'a ScoredMunicipality>,
    thresholds: &Thresholds,
) -> Result<Vec<&'a ScoredMunicipality>, ScoringError> {
    validate_thresholds(thresholds)?;

    let mut matching: Vec<&'a ScoredMunicipality> = rows
        .into_iter()
        .filter(|row| thresholds.admits(&row.rates))
        .collect();
    rank(&mut matching);
    Ok(matching)
}

/// Sort rows by opportunity index descending, undefined last, then by name.
pub fn rank(rows: &mut [&ScoredMunicipality]) {
    rows.sort_by(|a, b| {
        a.opportunity_index
            .cmp_desc_undefined_last(b.opportunity_index)
            .then_with(|| a.name().cmp(b.name()))
    });
}

use crate::options::Check;
use anyhow::{bail, Context, Result};
use gridid::FeatureCollection;
use log::{info, warn};

impl Check {
    pub fn run(&self) -> Result<()> {
        let collection = FeatureCollection::load(&self.input)
            .with_context(|| format!("reading {}", self.input.display()))?;
        let report = gridid::check(&collection, &self.base.into(), &self.field)?;

        for (index, raw, reason) in &report.malformed {
            warn!("feature {index}: malformed identifier {raw}, {reason}");
        }
        for (index, raw) in &report.foreign_counters {
            warn!("feature {index}: counter of {raw} is not in {}", self.base);
        }
        for (identifier, indices) in &report.duplicates {
            warn!("{identifier} held by features {indices:?}");
        }
        info!(
            "{} features, {} labeled, {} unlabeled",
            report.total,
            report.labeled,
            report.unlabeled.len()
        );

        if !report.is_clean() {
            bail!(
                "{} malformed and {} duplicated identifiers",
                report.malformed.len(),
                report.duplicates.len()
            );
        }
        Ok(())
    }
}

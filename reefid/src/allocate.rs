use crate::options::Allocate;
use anyhow::{Context, Result};
use gridid::{Allocator, Assignment, FeatureCollection, Scheme};
use log::info;

impl Allocate {
    pub fn run(&self) -> Result<()> {
        let scheme = Scheme::new(self.base.into(), self.layout, self.zero_padding)?;
        let allocator = Allocator::new(scheme, self.prefix.as_str())?;

        info!("loading {}", self.input.display());
        let mut collection = FeatureCollection::load(&self.input)
            .with_context(|| format!("reading {}", self.input.display()))?;

        info!(
            "allocating {}-<grid>-<counter> identifiers to {} features, base {}, {} layout",
            self.prefix,
            collection.len(),
            self.base,
            self.layout
        );
        let report = allocator.allocate(&mut collection, &self.field);
        for Assignment { index, identifier } in &report.assignments {
            info!("assigned {identifier} to feature {index}");
        }

        info!("saving to {}", self.output.display());
        collection
            .save(&self.output)
            .with_context(|| format!("writing {}", self.output.display()))?;

        info!(
            "done, {} assigned, {} preserved, {} warnings",
            report.assignments.len(),
            report.preserved,
            report.warnings.len()
        );
        Ok(())
    }
}

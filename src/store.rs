use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::dataset::{Artifact, Dataset};

/// Load the persisted dataset. A missing file is not an error: the first run
/// starts from an empty dataset.
pub fn load(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        warn!(path = %path.display(), "no stored dataset, starting empty");
        return Ok(Dataset::default());
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let dataset = read_from(file).with_context(|| format!("reading {}", path.display()))?;
    info!(records = dataset.len(), "dataset loaded");
    Ok(dataset)
}

/// Write the whole dataset ascending by id. Called exactly once per run,
/// after every page has been scraped and merged without error.
pub fn save(path: &Path, dataset: &Dataset) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_to(file, &dataset.sorted())?;
    info!(records = dataset.len(), path = %path.display(), "dataset saved");
    Ok(())
}

pub fn read_from(reader: impl io::Read) -> Result<Dataset> {
    let mut rows = csv::Reader::from_reader(reader);
    let mut artifacts = Vec::new();
    for row in rows.deserialize() {
        let artifact: Artifact = row?;
        artifacts.push(artifact);
    }
    Ok(artifacts.into_iter().collect())
}

pub fn write_to(writer: impl io::Write, artifacts: &[&Artifact]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for artifact in artifacts {
        out.serialize(artifact)?;
    }
    out.flush()?;
    Ok(())
}

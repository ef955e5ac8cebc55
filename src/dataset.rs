use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Days an unchanged discount may sit before a fresh sighting refreshes its date.
pub const REFRESH_AFTER_DAYS: i64 = 7;

/// One catalog work: identity plus the best discount observed so far.
///
/// `name` holds plain text (entities already decoded); `date` is the day of
/// the most recent observation that was accepted into the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Price")]
    pub price: u32,
    #[serde(rename = "Discount")]
    pub discount: u8,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
}

/// Counters from one merge pass, for end-of-run logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub inserted: usize,
    pub replaced: usize,
    pub unchanged: usize,
}

impl MergeOutcome {
    pub fn absorb(&mut self, other: MergeOutcome) {
        self.inserted += other.inserted;
        self.replaced += other.replaced;
        self.unchanged += other.unchanged;
    }
}

/// The accumulated history, keyed by artifact id. Ids are never removed:
/// dropping off the ranking does not mean a discount ended, so merges only
/// insert or replace.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Dataset {
    entries: HashMap<String, Artifact>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Artifact> {
        self.entries.get(id)
    }

    /// Fold newly observed artifacts into the dataset in place.
    ///
    /// An incoming record replaces a stored one with the same id only if its
    /// discount is strictly higher, or the discount is unchanged and at least
    /// [`REFRESH_AFTER_DAYS`] whole days have passed since the stored
    /// observation. Replacement is always wholesale. Same-discount sightings
    /// inside the window leave the stored record (and its date) untouched.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = Artifact>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for new in incoming {
            match self.entries.get(&new.id) {
                None => {
                    debug!(id = %new.id, discount = new.discount, "insert");
                    self.entries.insert(new.id.clone(), new);
                    outcome.inserted += 1;
                }
                Some(old) if supersedes(&new, old) => {
                    debug!(id = %new.id, old = old.discount, new = new.discount, "replace");
                    self.entries.insert(new.id.clone(), new);
                    outcome.replaced += 1;
                }
                Some(_) => outcome.unchanged += 1,
            }
        }
        outcome
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.entries.values()
    }

    /// The hand-off shape for downstream consumers: ascending by id.
    pub fn sorted(&self) -> Vec<&Artifact> {
        let mut all: Vec<&Artifact> = self.entries.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

impl FromIterator<Artifact> for Dataset {
    fn from_iter<I: IntoIterator<Item = Artifact>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();
        Dataset { entries }
    }
}

// Whole-day calendar difference; time of day and timezone play no part.
fn supersedes(new: &Artifact, old: &Artifact) -> bool {
    new.discount > old.discount
        || (new.discount == old.discount
            && new.date.signed_duration_since(old.date).num_days() >= REFRESH_AFTER_DAYS)
}

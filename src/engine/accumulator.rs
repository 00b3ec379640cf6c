use crate::model::Grant;

/// Append-only buffer of result records for one job lifetime.
///
/// Owned by the engine run and replaced wholesale when a new job starts; its
/// length is the cursor (`startIndex`) sent on the next poll, so the same
/// instance must live across ticks.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    records: Vec<Grant>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one result page. Records are never reordered or removed.
    pub fn append(&mut self, records: Vec<Grant>) {
        self.records.extend(records);
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn all(&self) -> &[Grant] {
        &self.records
    }

    /// Consume the buffer, mapping an empty set to `None` so callers can
    /// distinguish "zero matches" from "never received anything".
    pub fn into_grants(self) -> Option<Vec<Grant>> {
        if self.records.is_empty() {
            None
        } else {
            Some(self.records)
        }
    }
}

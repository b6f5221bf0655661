use std::collections::BTreeMap;

use crate::error::ReconError;
use crate::model::{FieldValue, LookupRecord, Table};
use crate::normalize::{normalize, NormalizedName};

/// Reference roster keyed by normalized name. At most one record per key;
/// later input rows overwrite earlier ones. Keys iterate in lexicographic order.
#[derive(Debug, Clone, Default)]
pub struct LookupIndex {
    records: BTreeMap<NormalizedName, LookupRecord>,
}

impl LookupIndex {
    /// Build from a reference table. Both columns must exist, even when the
    /// table has no rows.
    pub fn build(
        dataset: &str,
        table: &Table,
        name_column: &str,
        id_column: &str,
    ) -> Result<Self, ReconError> {
        let name_idx = table
            .column_index(name_column)
            .ok_or_else(|| ReconError::missing_column(dataset, name_column))?;
        let id_idx = table
            .column_index(id_column)
            .ok_or_else(|| ReconError::missing_column(dataset, id_column))?;

        let index = Self::from_records(table.rows().iter().map(|row| {
            (
                row.get(name_idx).and_then(raw_name),
                row.get(id_idx).and_then(|v| v.as_text()),
            )
        }));

        log::debug!(
            "dataset '{dataset}': lookup index holds {} of {} rows",
            index.len(),
            table.len()
        );
        Ok(index)
    }

    /// Build from (name, id) pairs. Pairs with a blank id or a name that
    /// normalizes to empty are skipped; names are kept as given for display.
    pub fn from_records<I, N, D>(records: I) -> Self
    where
        I: IntoIterator<Item = (Option<N>, Option<D>)>,
        N: AsRef<str>,
        D: AsRef<str>,
    {
        let mut index = BTreeMap::new();
        let mut overwritten = 0usize;

        for (name, id) in records {
            let (Some(name), Some(id)) = (name, id) else {
                continue;
            };
            let id = id.as_ref().trim();
            if id.is_empty() {
                continue;
            }
            let key = normalize(Some(name.as_ref()));
            if key.is_empty() {
                continue;
            }
            let record = LookupRecord {
                normalized_name: key.clone(),
                id: id.to_string(),
                display_name: name.as_ref().to_string(),
            };
            if index.insert(key, record).is_some() {
                overwritten += 1;
            }
        }

        if overwritten > 0 {
            log::warn!("{overwritten} duplicate name(s) in reference data; later rows kept");
        }

        Self { records: index }
    }

    pub fn lookup(&self, key: &NormalizedName) -> Option<&LookupRecord> {
        self.records.get(key)
    }

    /// All keys in lexicographic order.
    pub fn all_keys(&self) -> impl Iterator<Item = &NormalizedName> {
        self.records.keys()
    }

    /// All records in key order.
    pub fn records(&self) -> impl Iterator<Item = &LookupRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Name cell as written, untrimmed; `None` when blank.
fn raw_name(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(s) if !s.trim().is_empty() => Some(s.clone()),
        other => other.as_text(),
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::corpus::MetadataTable;

/// Normalizes a free-text title for index lookups: trimmed and lowercased
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// One entry of the title index artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleEntry {
    pub title: String,
    pub row: usize,
}

/// Normalized title → row index
///
/// Keys are normalized once at build time. When two titles normalize to the same
/// key, the earlier entry wins.
#[derive(Debug, Clone, Default)]
pub struct TitleIndex {
    rows: HashMap<String, usize>,
    collisions: usize,
    /// Entry with the largest row, counting entries dropped on collision
    widest: Option<TitleEntry>,
}

impl TitleIndex {
    pub fn from_entries(entries: impl IntoIterator<Item = TitleEntry>) -> Self {
        let mut rows = HashMap::new();
        let mut collisions = 0;
        let mut widest: Option<TitleEntry> = None;

        for entry in entries {
            if widest.as_ref().map_or(true, |w| entry.row > w.row) {
                widest = Some(entry.clone());
            }

            let key = normalize_title(&entry.title);
            if rows.contains_key(&key) {
                collisions += 1;
                continue;
            }
            rows.insert(key, entry.row);
        }

        Self {
            rows,
            collisions,
            widest,
        }
    }

    /// Indexes every row of a metadata table by its display title
    pub fn from_metadata(metadata: &MetadataTable) -> Self {
        Self::from_entries(metadata.iter().enumerate().map(|(row, record)| TitleEntry {
            title: record.title.clone(),
            row,
        }))
    }

    pub fn get(&self, title: &str) -> Option<usize> {
        self.rows.get(&normalize_title(title)).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Entries dropped because their normalized key was already taken
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Largest row referenced by any source entry, kept or not
    pub fn widest_entry(&self) -> Option<&TitleEntry> {
        self.widest.as_ref()
    }
}

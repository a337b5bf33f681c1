use std::{collections::HashMap, fs, io::ErrorKind, path::Path};

use derive_new::new;
use serde::Deserialize;
use tracing::debug;

/// Class count assumed when no usable label file exists.
pub const DEFAULT_CLASS_COUNT: usize = 22;

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelDocument {
    Ordered(Vec<String>),
    Keyed(HashMap<String, String>),
}

/// Outcome of reading the label file.
#[derive(Debug)]
pub enum LabelFile {
    Loaded(HashMap<String, String>),
    NotFound,
    Malformed(String),
}

impl LabelFile {
    pub fn read(path: &Path) -> Self {
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return LabelFile::NotFound,
            Err(err) => return LabelFile::Malformed(err.to_string()),
        };

        match serde_json::from_slice::<LabelDocument>(&contents) {
            Ok(document) => LabelFile::Loaded(document.into_mapping()),
            Err(err) => LabelFile::Malformed(err.to_string()),
        }
    }
}

impl LabelDocument {
    fn into_mapping(self) -> HashMap<String, String> {
        match self {
            LabelDocument::Ordered(names) => names
                .into_iter()
                .enumerate()
                .map(|(idx, name)| (idx.to_string(), name))
                .collect(),
            LabelDocument::Keyed(mapping) => mapping,
        }
    }
}

/// Lookup from stringified class index to label. Indices without an entry
/// resolve to `class_<index>`.
#[derive(Debug, Clone, new)]
pub struct LabelMap {
    labels: HashMap<String, String>,
}

impl LabelMap {
    pub fn synthetic(num_classes: usize) -> Self {
        Self::new((0..num_classes).map(|idx| (idx.to_string(), synthetic_label(idx))).collect())
    }

    pub fn load(path: &Path) -> Self {
        match LabelFile::read(path) {
            LabelFile::Loaded(labels) => {
                debug!("loaded {} labels from {}", labels.len(), path.display());
                Self::new(labels)
            }
            LabelFile::NotFound => {
                debug!("no label file at {}, using synthetic labels", path.display());
                Self::synthetic(DEFAULT_CLASS_COUNT)
            }
            LabelFile::Malformed(reason) => {
                debug!("ignoring label file {}: {reason}", path.display());
                Self::synthetic(DEFAULT_CLASS_COUNT)
            }
        }
    }

    pub fn label(&self, index: usize) -> String {
        self.labels
            .get(&index.to_string())
            .cloned()
            .unwrap_or_else(|| synthetic_label(index))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn synthetic_label(index: usize) -> String {
    format!("class_{index}")
}

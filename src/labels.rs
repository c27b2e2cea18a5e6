// Class labels, index-aligned with the model output
use std::path::Path;

use crate::error::StartupError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelList {
    labels: Vec<String>,
}

impl LabelList {
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        let text = std::fs::read_to_string(path).map_err(|source| StartupError::Labels {
            path: path.to_path_buf(),
            source,
        })?;
        let labels = Self::parse(&text);
        if labels.is_empty() {
            return Err(StartupError::EmptyLabels(path.to_path_buf()));
        }
        Ok(labels)
    }

    /// One label per line. Blank lines in the middle still occupy an index.
    pub fn parse(text: &str) -> Self {
        let labels = text
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();
        Self { labels }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LabelList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).collect(),
        }
    }
}

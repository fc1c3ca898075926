use std::collections::BTreeMap;

use serde::Serialize;

use crate::locator::locator_model::LocatorRecord;
use crate::scenario::scenario_model::StepKeyword;

/// A locator together with the step line that mentioned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedStep {
    pub element_info: LocatorRecord,
    pub step: String,
}

/// Human identifier -> the locator a scenario step refers to.
///
/// Keys are identifiers with underscores read as spaces. Inserting an
/// identifier again replaces the earlier entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StepLocatorMapping {
    entries: BTreeMap<String, MappedStep>,
}

impl StepLocatorMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a scenario document for step lines and link each to the first
    /// record (in record order) whose human identifier occurs in the line,
    /// ignoring case. Lines without a match contribute nothing.
    pub fn from_document(document: &str, records: &[LocatorRecord]) -> Self {
        let mut mapping = Self::new();

        let needles: Vec<(String, &LocatorRecord)> = records
            .iter()
            .map(|r| (r.human_identifier().to_lowercase(), r))
            .collect();

        for line in document.lines().map(str::trim) {
            if StepKeyword::of_line(line).is_none() {
                continue;
            }
            let haystack = line.to_lowercase();
            if let Some((_, record)) = needles
                .iter()
                .find(|(needle, _)| haystack.contains(needle.as_str()))
            {
                mapping.insert(&record.human_identifier(), (*record).clone(), line);
            }
        }

        mapping
    }

    pub fn insert(&mut self, identifier: &str, record: LocatorRecord, step: &str) {
        self.entries.insert(
            identifier.to_string(),
            MappedStep {
                element_info: record,
                step: step.to_string(),
            },
        );
    }

    pub fn get(&self, identifier: &str) -> Option<&MappedStep> {
        self.entries.get(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MappedStep)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

use serde::Serialize;

use crate::naming::{NameRegistry, sanitize};

/// Gherkin step keywords recognised when scanning a scenario document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepKeyword {
    /// Precondition.
    Given,
    /// Action.
    When,
    /// Continuation of the previous step.
    And,
    /// Expectation.
    Then,
}

impl StepKeyword {
    pub const ALL: [StepKeyword; 4] = [
        StepKeyword::Given,
        StepKeyword::When,
        StepKeyword::And,
        StepKeyword::Then,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            StepKeyword::Given => "Given ",
            StepKeyword::When => "When ",
            StepKeyword::And => "And ",
            StepKeyword::Then => "Then ",
        }
    }

    /// Keyword of a trimmed line, if it is a step line.
    pub fn of_line(line: &str) -> Option<StepKeyword> {
        Self::ALL
            .into_iter()
            .find(|keyword| line.starts_with(keyword.prefix()))
    }
}

const SCENARIO_MARKERS: [&str; 4] = [
    "Scenario Outline:",
    "Scenario Template:",
    "Scenario:",
    "Background:",
];

/// Title of a scenario header line, or `None` when the line is not one.
pub fn scenario_title(line: &str) -> Option<&str> {
    SCENARIO_MARKERS.iter().find_map(|marker| {
        line.strip_prefix(marker).map(|rest| {
            let rest = rest.trim();
            if rest.is_empty() && *marker == "Background:" {
                "background"
            } else {
                rest
            }
        })
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub keyword: StepKeyword,
    /// The whole trimmed line, keyword included.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub title: String,
    /// Sanitized title, unique within the document.
    pub test_name: String,
    pub steps: Vec<Step>,
}

/// A Gherkin feature as far as the pipeline cares about it: a title and
/// scenarios made of keyword-tagged step lines. Everything else is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioDocument {
    pub feature: Option<String>,
    pub scenarios: Vec<Scenario>,
}

impl ScenarioDocument {
    /// Scan `text` line by line. Steps are grouped under the most recent
    /// scenario header; steps seen before any header form an unnamed group.
    pub fn parse(text: &str) -> Self {
        let mut doc = ScenarioDocument::default();
        let mut names = NameRegistry::new();

        for line in text.lines().map(str::trim) {
            if let Some(rest) = line.strip_prefix("Feature:") {
                if doc.feature.is_none() {
                    doc.feature = Some(rest.trim().to_string());
                }
            } else if let Some(title) = scenario_title(line) {
                doc.scenarios.push(Scenario {
                    title: title.to_string(),
                    test_name: names.claim(&sanitize(title, "scenario")),
                    steps: Vec::new(),
                });
            } else if let Some(keyword) = StepKeyword::of_line(line) {
                if doc.scenarios.is_empty() {
                    doc.scenarios.push(Scenario {
                        title: String::new(),
                        test_name: names.claim(&sanitize("", "scenario")),
                        steps: Vec::new(),
                    });
                }
                if let Some(current) = doc.scenarios.last_mut() {
                    current.steps.push(Step {
                        keyword,
                        text: line.to_string(),
                    });
                }
            }
        }

        doc
    }

    pub fn step_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.steps.len()).sum()
    }

    /// Every step line in document order.
    pub fn step_lines(&self) -> impl Iterator<Item = &str> {
        self.scenarios
            .iter()
            .flat_map(|s| s.steps.iter().map(|step| step.text.as_str()))
    }

    /// Scenarios that carry at least one step.
    pub fn runnable_scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter().filter(|s| !s.steps.is_empty())
    }
}

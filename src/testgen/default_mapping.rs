use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::browser::session::PageSession;
use crate::locator::locator_model::{Category, LocatorRecord};
use crate::pipeline::error::Result;
use crate::scenario::mapping::StepLocatorMapping;
use crate::scenario::scenario_model::ScenarioDocument;

/// One row of the fallback table: a phrase a step may contain and the
/// locator it stands for.
#[derive(Debug, Clone, Copy)]
pub struct DefaultLocator {
    pub phrase: &'static str,
    pub identifier: &'static str,
    pub category: &'static str,
    pub xpath: &'static str,
    pub css_selector: &'static str,
}

/// Known form fields used when no mapping was derived from extracted locators.
pub const DEFAULT_LOCATORS: &[DefaultLocator] = &[
    DefaultLocator {
        phrase: "name field",
        identifier: "name",
        category: "input_field",
        xpath: r#"//input[@id="name" or @name="name"]"#,
        css_selector: "input#name",
    },
    DefaultLocator {
        phrase: "email field",
        identifier: "email",
        category: "input_field",
        xpath: r#"//input[@id="email" or @name="email"]"#,
        css_selector: "input#email",
    },
    DefaultLocator {
        phrase: "male gender radio button",
        identifier: "gender",
        category: "radio",
        xpath: r#"//input[@id="gender" and @name="gender"]"#,
        css_selector: "input#gender",
    },
    DefaultLocator {
        phrase: "mobile field",
        identifier: "mobile",
        category: "input_field",
        xpath: r#"//input[@id="mobile" or @name="mobile"]"#,
        css_selector: "input#mobile",
    },
    DefaultLocator {
        phrase: "date_of_birth dropdown",
        identifier: "date_of_birth",
        category: "input_field",
        xpath: r#"//input[@id="dob" or @name="dob"]"#,
        css_selector: "input#dob",
    },
    DefaultLocator {
        phrase: "subjects field",
        identifier: "subjects",
        category: "input_field",
        xpath: r#"//input[@id="subjects" or @name="subjects"]"#,
        css_selector: "input#subjects",
    },
    DefaultLocator {
        phrase: "sports hobby checkbox",
        identifier: "hobbies_sports",
        category: "checkbox",
        xpath: r#"//input[@id="hobbies" and following-sibling::label[text()="Sports"]]"#,
        css_selector: "input#hobbies",
    },
    DefaultLocator {
        phrase: "address field",
        identifier: "address",
        category: "input_field",
        xpath: r#"//textarea[@id="address" or @name="address"]"#,
        css_selector: "textarea#address",
    },
    DefaultLocator {
        phrase: "submit button",
        identifier: "submit",
        category: "button",
        xpath: r#"//input[@type="submit"]"#,
        css_selector: "input[type='submit']",
    },
    DefaultLocator {
        phrase: "form submission confirmation",
        identifier: "confirmation",
        category: "text",
        xpath: r#"//div[contains(text(), "Form submitted") or contains(text(), "Submission successful")]"#,
        css_selector: "div.alert-success",
    },
];

static SINGLE_QUOTED_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"='([^']*)'").expect("valid regex"));

static PLAIN_XPATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^//[\w\[\]@=*()|"'\s]+$"#).expect("valid regex"));

/// Rewrite `='value'` comparisons to `="value"`. Expressions outside the
/// plain `//tag[@attr="v"]` shape are returned as-is with a warning.
pub fn normalize_xpath_quotes(xpath: &str) -> String {
    let normalized = SINGLE_QUOTED_ATTR.replace_all(xpath, r#"="$1""#).into_owned();
    if !PLAIN_XPATH.is_match(&normalized) {
        tracing::warn!(xpath = %normalized, "Potentially invalid XPath");
    }
    normalized
}

impl DefaultLocator {
    pub fn to_record(&self) -> Option<LocatorRecord> {
        LocatorRecord::new(
            self.identifier,
            Category::parse(self.category),
            &normalize_xpath_quotes(self.xpath),
            self.css_selector,
        )
        .ok()
    }
}

/// Table row whose phrase occurs in `line`, ignoring case. First row wins.
pub fn default_for_line(line: &str) -> Option<&'static DefaultLocator> {
    let haystack = line.to_lowercase();
    DEFAULT_LOCATORS
        .iter()
        .find(|row| haystack.contains(&row.phrase.to_lowercase()))
}

/// Build a mapping for `document` from the fallback table, keeping only
/// locators that resolve to at least one element on the live page at `url`.
///
/// Each table row is checked against the page once; lines that mention a
/// row that did not resolve, or whose query failed, are skipped. Only a
/// navigation failure is an error.
pub fn build_default_mapping(
    document: &ScenarioDocument,
    url: &str,
    session: &mut dyn PageSession,
) -> Result<StepLocatorMapping> {
    session.navigate(url)?;

    let mut mapping = StepLocatorMapping::new();
    let mut resolved: HashMap<&'static str, Option<LocatorRecord>> = HashMap::new();

    for line in document.step_lines() {
        let Some(row) = default_for_line(line) else {
            tracing::debug!(step = line, "No default locator for step");
            continue;
        };

        if !resolved.contains_key(row.phrase) {
            let checked = match row.to_record() {
                Some(record) => {
                    match session.count_xpath(record.xpath()) {
                        Ok(count) if count > 0 => Some(record),
                        Ok(_) => {
                            tracing::warn!(
                                identifier = row.identifier,
                                xpath = record.xpath(),
                                "Default locator does not resolve, dropping"
                            );
                            None
                        }
                        Err(e) => {
                            tracing::warn!(
                                identifier = row.identifier,
                                xpath = record.xpath(),
                                error = %e,
                                "Default locator query failed, dropping"
                            );
                            None
                        }
                    }
                }
                None => None,
            };
            resolved.insert(row.phrase, checked);
        }

        if let Some(Some(record)) = resolved.get(row.phrase) {
            mapping.insert(&record.human_identifier(), record.clone(), line);
        }
    }

    tracing::info!(mapped = mapping.len(), "Built default step mapping");
    Ok(mapping)
}

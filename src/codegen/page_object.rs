use std::collections::HashSet;
use std::path::PathBuf;

use crate::codegen::accessor::{AccessorMethod, BuilderRegistry, WAIT_TIMEOUT_MS};
use crate::locator::extractor::{ExtractionSettings, request_locators};
use crate::locator::locator_model::LocatorRecord;
use crate::naming::{NameRegistry, page_class_name, sanitize};
use crate::oracle::ollama::TextInference;
use crate::pipeline::artifacts::ArtifactStore;
use crate::pipeline::error::{PipelineError, Result};
use crate::trace::logger::RunLog;
use crate::trace::trace::{Outcome, Stage, StageEvent};

/// A page object: one class bundling an accessor per known element.
#[derive(Debug, Clone, PartialEq)]
pub struct PageObject {
    pub subject: String,
    pub class_name: String,
    pub methods: Vec<AccessorMethod>,
}

impl PageObject {
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|m| m.method_name.as_str()).collect()
    }

    pub fn signatures(&self) -> Vec<String> {
        self.methods.iter().map(|m| m.signature()).collect()
    }

    /// Render the class as a Playwright TypeScript module.
    pub fn render(&self, registry: &BuilderRegistry) -> String {
        let mut out = String::new();
        out.push_str("import { type Locator, type Page } from '@playwright/test';\n\n");
        out.push_str(&format!(
            "/** Page object for `{}`. Generated by page-scribe. */\n",
            self.subject
        ));
        out.push_str(&format!("export class {} {{\n", self.class_name));
        out.push_str(&format!(
            "  static readonly WAIT_TIMEOUT_MS = {};\n\n",
            WAIT_TIMEOUT_MS
        ));
        out.push_str("  constructor(readonly page: Page) {}\n\n");
        out.push_str("  private locate(xpath: string): Locator {\n");
        out.push_str("    return this.page.locator(`xpath=${xpath}`);\n");
        out.push_str("  }\n");

        for method in &self.methods {
            match registry.get(&method.category) {
                Some(builder) => {
                    out.push('\n');
                    out.push_str(&builder.render(method, &self.class_name));
                }
                None => tracing::warn!(
                    method = %method.method_name,
                    category = %method.category,
                    "No builder registered at render time, dropping accessor"
                ),
            }
        }

        out.push_str("}\n");
        out
    }
}

// ============================================================================
// Accessor generation
// ============================================================================

/// Build the page object for `subject` from usable records, in order.
///
/// Each record claims a page-unique name before anything else, so a record
/// that is later skipped still reserves its name. When the builder's method
/// name is already emitted, the element re-claims a suffixed name until the
/// method name is free. Records without an xpath and categories without a
/// builder are logged and skipped.
pub fn build_page_object(
    records: &[LocatorRecord],
    subject: &str,
    registry: &BuilderRegistry,
) -> PageObject {
    let mut names = NameRegistry::new();
    let mut emitted = HashSet::new();
    let mut methods = Vec::new();

    for record in records {
        let base = sanitize(record.identifier(), record.category().as_str());
        let mut element_name = names.claim(&base);

        if !record.has_xpath() {
            tracing::warn!(
                identifier = record.identifier(),
                name = %element_name,
                "No XPath locator, skipping accessor"
            );
            continue;
        }

        match registry.get(record.category()) {
            Some(builder) => {
                while emitted.contains(&builder.method_name(&element_name)) {
                    element_name = names.claim(&base);
                }
                emitted.insert(builder.method_name(&element_name));
                methods.push(builder.build(&element_name, record));
            }
            None => tracing::info!(
                identifier = record.identifier(),
                category = %record.category(),
                "No accessor template for category"
            ),
        }
    }

    PageObject {
        subject: subject.to_string(),
        class_name: page_class_name(subject),
        methods,
    }
}

/// Render and persist a page object built from `records`.
pub fn write_page_object(
    records: &[LocatorRecord],
    subject: &str,
    store: &ArtifactStore,
    registry: &BuilderRegistry,
    log: &RunLog,
) -> Result<PathBuf> {
    if records.is_empty() {
        return Err(PipelineError::validation(
            "accessors",
            "no usable locator records",
        ));
    }

    let page = build_page_object(records, subject, registry);
    let source = page.render(registry);
    let path = store.write_text(&store.page_object_path(subject), &source)?;

    log.record(
        StageEvent::now(subject, Stage::Accessors, Outcome::Succeeded)
            .with_detail(format!(
                "{} accessors from {} records",
                page.methods.len(),
                records.len()
            ))
            .with_artifact(&path, &source),
    );
    Ok(path)
}

/// Accessor generation stage.
///
/// Issues its own locator request against the page markup, then writes the
/// page object. Returns the artifact path.
pub fn generate_page_object(
    oracle: &dyn TextInference,
    markup: &str,
    subject: &str,
    store: &ArtifactStore,
    settings: &ExtractionSettings,
    registry: &BuilderRegistry,
    log: &RunLog,
) -> Result<PathBuf> {
    log.stage(subject, Stage::Accessors, || {
        let records = request_locators(oracle, markup, settings)?;
        write_page_object(&records, subject, store, registry, log)
    })
}

/// Accessor generation stage over records that were already extracted.
pub fn generate_page_object_from_records(
    records: &[LocatorRecord],
    subject: &str,
    store: &ArtifactStore,
    registry: &BuilderRegistry,
    log: &RunLog,
) -> Result<PathBuf> {
    log.stage(subject, Stage::Accessors, || {
        write_page_object(records, subject, store, registry, log)
    })
}

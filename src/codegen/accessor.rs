use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::locator::locator_model::{Category, LocatorRecord};

/// Bound on every readiness wait inside a generated accessor.
pub const WAIT_TIMEOUT_MS: u64 = 20_000;

/// What a generated accessor does once its element is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    EnterValue,
    Click,
    ToggleIfUnchecked,
    SelectByVisibleText,
    SelectRadioIfUnchecked,
}

/// State an element must reach before the accessor acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// Attached to the DOM.
    Present,
    /// Visible and able to receive clicks.
    Interactable,
}

impl Readiness {
    fn wait_state(&self) -> &'static str {
        match self {
            Readiness::Present => "attached",
            Readiness::Interactable => "visible",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    XPath,
}

/// One generated operation on a page object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessorMethod {
    /// Full operation name, e.g. `enter_username`.
    pub method_name: String,
    /// Page-unique sanitized element name the operation was built from.
    pub element_name: String,
    pub category: Category,
    pub locator_strategy: LocatorStrategy,
    pub locator_value: String,
    pub action_kind: ActionKind,
    pub readiness: Readiness,
    pub parameter: Option<String>,
}

impl AccessorMethod {
    /// Name and parameter list, e.g. `enter_username(value)` or `click_submit()`.
    pub fn signature(&self) -> String {
        format!(
            "{}({})",
            self.method_name,
            self.parameter.as_deref().unwrap_or("")
        )
    }
}

// ============================================================================
// Accessor builders: one per element shape
// ============================================================================

/// Template for one accessor shape.
///
/// A builder names the operation, declares its parameter and readiness wait,
/// and renders the statements that act on the element once it is ready.
pub trait AccessorBuilder {
    fn action_kind(&self) -> ActionKind;

    fn readiness(&self) -> Readiness;

    fn method_name(&self, element_name: &str) -> String;

    fn parameter(&self) -> Option<&'static str> {
        None
    }

    /// Statements run after the readiness wait. `element` is in scope.
    fn action_lines(&self, method: &AccessorMethod) -> Vec<String>;

    fn build(&self, element_name: &str, record: &LocatorRecord) -> AccessorMethod {
        AccessorMethod {
            method_name: self.method_name(element_name),
            element_name: element_name.to_string(),
            category: record.category().clone(),
            locator_strategy: LocatorStrategy::XPath,
            locator_value: record.xpath().to_string(),
            action_kind: self.action_kind(),
            readiness: self.readiness(),
            parameter: self.parameter().map(|p| p.to_string()),
        }
    }

    /// Full method text, indented for a class body.
    fn render(&self, method: &AccessorMethod, class_name: &str) -> String {
        let params = match &method.parameter {
            Some(p) => format!("{}: string", p),
            None => String::new(),
        };

        let mut out = String::new();
        out.push_str(&format!(
            "  async {}({}): Promise<void> {{\n",
            method.method_name, params
        ));
        out.push_str(&format!(
            "    const element = this.locate({});\n",
            ts_string(&method.locator_value)
        ));
        out.push_str(&format!(
            "    await element.waitFor({{ state: '{}', timeout: {}.WAIT_TIMEOUT_MS }});\n",
            method.readiness.wait_state(),
            class_name
        ));
        for line in self.action_lines(method) {
            out.push_str("    ");
            out.push_str(&line.replace("{class}", class_name));
            out.push('\n');
        }
        out.push_str("  }\n");
        out
    }
}

/// `input_field`: clear, then type the given value.
pub struct EnterValueBuilder;

impl AccessorBuilder for EnterValueBuilder {
    fn action_kind(&self) -> ActionKind {
        ActionKind::EnterValue
    }

    fn readiness(&self) -> Readiness {
        Readiness::Present
    }

    fn method_name(&self, element_name: &str) -> String {
        format!("enter_{}", element_name)
    }

    fn parameter(&self) -> Option<&'static str> {
        Some("value")
    }

    fn action_lines(&self, _method: &AccessorMethod) -> Vec<String> {
        vec![
            "await element.clear();".to_string(),
            "await element.fill(value);".to_string(),
        ]
    }
}

/// `button`: click once interactable.
pub struct ClickBuilder;

impl AccessorBuilder for ClickBuilder {
    fn action_kind(&self) -> ActionKind {
        ActionKind::Click
    }

    fn readiness(&self) -> Readiness {
        Readiness::Interactable
    }

    fn method_name(&self, element_name: &str) -> String {
        format!("click_{}", element_name)
    }

    fn action_lines(&self, _method: &AccessorMethod) -> Vec<String> {
        vec!["await element.click({ timeout: {class}.WAIT_TIMEOUT_MS });".to_string()]
    }
}

/// `checkbox`: click only when not already checked.
pub struct CheckBuilder;

impl AccessorBuilder for CheckBuilder {
    fn action_kind(&self) -> ActionKind {
        ActionKind::ToggleIfUnchecked
    }

    fn readiness(&self) -> Readiness {
        Readiness::Present
    }

    fn method_name(&self, element_name: &str) -> String {
        format!("check_{}", element_name)
    }

    fn action_lines(&self, _method: &AccessorMethod) -> Vec<String> {
        vec![
            "if (!(await element.isChecked())) {".to_string(),
            "  await element.click();".to_string(),
            "}".to_string(),
        ]
    }
}

/// `dropdown`: pick an option by its visible text.
pub struct SelectOptionBuilder;

impl AccessorBuilder for SelectOptionBuilder {
    fn action_kind(&self) -> ActionKind {
        ActionKind::SelectByVisibleText
    }

    fn readiness(&self) -> Readiness {
        Readiness::Present
    }

    fn method_name(&self, element_name: &str) -> String {
        format!("select_option_from_{}", element_name)
    }

    fn parameter(&self) -> Option<&'static str> {
        Some("option_text")
    }

    fn action_lines(&self, _method: &AccessorMethod) -> Vec<String> {
        vec!["await element.selectOption({ label: option_text });".to_string()]
    }
}

/// `radio`: click once interactable, only when not already selected.
pub struct SelectRadioBuilder;

impl AccessorBuilder for SelectRadioBuilder {
    fn action_kind(&self) -> ActionKind {
        ActionKind::SelectRadioIfUnchecked
    }

    fn readiness(&self) -> Readiness {
        Readiness::Interactable
    }

    fn method_name(&self, element_name: &str) -> String {
        format!("select_{}", element_name)
    }

    fn action_lines(&self, _method: &AccessorMethod) -> Vec<String> {
        vec![
            "if (!(await element.isChecked())) {".to_string(),
            "  await element.click({ timeout: {class}.WAIT_TIMEOUT_MS });".to_string(),
            "}".to_string(),
        ]
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Maps element categories to the builder that shapes their accessor.
/// Categories with no registered builder produce no accessor.
pub struct BuilderRegistry {
    builders: HashMap<Category, Box<dyn AccessorBuilder>>,
}

impl BuilderRegistry {
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// The five built-in shapes.
    pub fn standard() -> Self {
        Self::empty()
            .with(Category::InputField, EnterValueBuilder)
            .with(Category::Button, ClickBuilder)
            .with(Category::Checkbox, CheckBuilder)
            .with(Category::Dropdown, SelectOptionBuilder)
            .with(Category::Radio, SelectRadioBuilder)
    }

    pub fn with(mut self, category: Category, builder: impl AccessorBuilder + 'static) -> Self {
        self.register(category, builder);
        self
    }

    pub fn register(&mut self, category: Category, builder: impl AccessorBuilder + 'static) {
        self.builders.insert(category, Box::new(builder));
    }

    pub fn get(&self, category: &Category) -> Option<&dyn AccessorBuilder> {
        self.builders.get(category).map(|b| b.as_ref())
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Quote `s` as a TypeScript string literal.
pub fn ts_string(s: &str) -> String {
    Value::from(s).to_string()
}

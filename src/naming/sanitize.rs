use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static NON_ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static pattern"));

// ============================================================================
// Identifier sanitization
// ============================================================================

/// Turn an arbitrary label into a method-name fragment.
///
/// The result is lower-case, contains only `[a-z0-9_]`, never starts with a
/// digit (a leading `_` is forced instead) and is never empty: when nothing
/// survives, `unnamed_<fallback_category>` is returned. Applying the function
/// to its own output returns the same string.
///
/// Two labels may sanitize to the same name. Callers that need unique names
/// claim them through a [`NameRegistry`].
pub fn sanitize(raw: &str, fallback_category: &str) -> String {
    let name = collapse(raw);
    let name = if name.is_empty() {
        fallback_name(fallback_category)
    } else {
        name
    };

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", name)
    } else {
        name
    }
}

fn collapse(raw: &str) -> String {
    let lower = raw.to_lowercase();
    NON_ALNUM_RUN
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}

fn fallback_name(category: &str) -> String {
    let category = collapse(category);
    if category.is_empty() {
        "unnamed_element".to_string()
    } else {
        format!("unnamed_{}", category)
    }
}

// ============================================================================
// Collision resolution
// ============================================================================

/// Hands out names that are unique within one scope (one page object, one
/// test file). The first claim of a base name gets it verbatim; later claims
/// get `_1`, `_2`, ... appended.
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }

        let mut count = 1;
        loop {
            let candidate = format!("{}_{}", base, count);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            count += 1;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

// ============================================================================
// Subject names
// ============================================================================

/// Derive the subject name for a target page from its URL.
///
/// Uses the last non-empty path segment with its file extension dropped
/// (`/login.php` -> `login`), falling back to the host when the path is
/// empty. Always returns a sanitized name.
pub fn subject_from_url(raw_url: &str) -> String {
    let (segment, host) = match url::Url::parse(raw_url) {
        Ok(parsed) => {
            let segment = parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(|s| s.to_string());
            (segment, parsed.host_str().map(|h| h.to_string()))
        }
        Err(_) => (
            raw_url
                .split('/')
                .filter(|s| !s.is_empty())
                .last()
                .map(|s| s.to_string()),
            None,
        ),
    };

    let base = match segment {
        Some(s) => strip_extension(&s).replace('-', "_"),
        None => host.unwrap_or_default(),
    };

    sanitize(&base, "page")
}

fn strip_extension(segment: &str) -> &str {
    match segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            stem
        }
        _ => segment,
    }
}

/// PascalCase a sanitized subject for use as a class name (`login_form` ->
/// `LoginForm`). Empty subjects become `Default`.
pub fn pascal_case(subject: &str) -> String {
    let pascal: String = subject
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();

    if pascal.is_empty() {
        "Default".to_string()
    } else if pascal.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", pascal)
    } else {
        pascal
    }
}

/// Class name of the generated page object for a subject.
pub fn page_class_name(subject: &str) -> String {
    format!("{}Page", pascal_case(subject))
}

// Placeholder substitution for HTTP targets
//
// URLs carry `:name` placeholders that are filled from the job payload,
// e.g. `http://host/items/:id` with payload `{"id": "42"}`.

use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::instrument;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder regex is valid")
    })
}

/// PlaceholderSubstitutor replaces `:name` placeholders with variable values
///
/// Placeholders with no matching variable are left untouched, so a URL
/// that happens to contain a colon followed by a word survives unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderSubstitutor;

impl PlaceholderSubstitutor {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, variables), fields(template_len = template.len(), var_count = variables.len()))]
    pub fn substitute(&self, template: &str, variables: &HashMap<String, String>) -> String {
        let result: Cow<'_, str> = placeholder_regex().replace_all(template, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match variables.get(name) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        });
        result.into_owned()
    }

    /// Placeholder names in order of first appearance
    pub fn extract_placeholders(&self, template: &str) -> Vec<String> {
        let mut names = Vec::new();
        for caps in placeholder_regex().captures_iter(template) {
            let name = caps[1].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Flatten the top level of a payload into substitution variables
///
/// Strings are used verbatim; any other value uses its JSON text. A payload
/// that is not an object yields no variables.
pub fn payload_variables(payload: &serde_json::Value) -> HashMap<String, String> {
    let Some(object) = payload.as_object() else {
        return HashMap::new();
    };

    object
        .iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

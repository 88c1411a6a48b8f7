//! Page template rendering with minijinja.
//!
//! Templates use `{{ name }}` placeholders. The older `{{{name}}}` form is
//! rewritten to `{{ name }}` before rendering. Values are HTML-escaped
//! except the ones marked safe (rendered markup, highlighted source, readme).

use minijinja::{AutoEscape, Environment, Value};
use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TRIPLE_STASH: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\{\{\{\s*([A-Za-z_][\w.]*)\s*\}\}\}"));

/// Why a page template could not be rendered.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("placeholder pattern is invalid: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Render(#[from] minijinja::Error),
}

/// Everything the page template can refer to.
#[derive(Debug, Clone, Default)]
pub struct DocumentContext {
    /// Top-level package.json fields
    pub fields: Map<String, JsonValue>,
    /// Highlighted example source (HTML)
    pub example: String,
    /// Server-side rendered example (HTML)
    pub demo: String,
    /// Readme converted to HTML
    pub readme: Option<String>,
    /// Example file name as declared in the descriptor
    pub entry: String,
}

impl DocumentContext {
    fn into_value(self) -> Value {
        let mut context: BTreeMap<String, Value> = self
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), Value::from_serialize(value)))
            .collect();

        context.insert("example".to_string(), Value::from_safe_string(self.example));
        context.insert("demo".to_string(), Value::from_safe_string(self.demo));
        context.insert(
            "readme".to_string(),
            self.readme.map(Value::from_safe_string).unwrap_or_default(),
        );
        context.insert("entry".to_string(), Value::from(self.entry));

        Value::from(context)
    }
}

/// Rewrite `{{{name}}}` placeholders to `{{ name }}`.
pub fn normalize_placeholders(source: &str) -> Result<String, regex::Error> {
    let re = TRIPLE_STASH.as_ref().map_err(Clone::clone)?;
    Ok(re.replace_all(source, "{{ $1 }}").into_owned())
}

/// Render `source` with `context`.
pub fn render_template(source: &str, context: DocumentContext) -> Result<String, TemplateError> {
    let source = normalize_placeholders(source)?;
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    Ok(env.render_str(&source, context.into_value())?)
}

//! `{{key}}` placeholder expansion for URL templates

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)] // pattern is a literal
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(.*?)\}\}").expect("valid placeholder pattern"))
}

/// Replace every `{{key}}` in `template` with the matching field of `item`
///
/// Keys are trimmed, so `{{ id }}` and `{{id}}` are the same. Strings are
/// inserted verbatim, other values as their JSON text. Missing fields,
/// `null`, and non-object items expand to an empty string.
///
/// ```
/// use oh_no_again::template::expand_template;
/// use serde_json::json;
///
/// let url = expand_template("https://api.example.com/users/{{id}}", &json!({"id": 7}));
/// assert_eq!(url, "https://api.example.com/users/7");
/// ```
pub fn expand_template(template: &str, item: &Value) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures<'_>| {
            let key = caps[1].trim();
            match item.get(key) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            }
        })
        .into_owned()
}

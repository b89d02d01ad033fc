//! Validation Rule Expressions
//!
//! CMS authors write FormKit-style rule strings ("required|min:6").
//! The parser is forgiving: unknown or malformed rules are logged
//! and skipped, never a crash.

use crate::descriptor::FieldValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    Number,
    Url,
    Min(u64),
    Max(u64),
}

impl Rule {
    /// Rule name as authored, used to look up message overrides.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Email => "email",
            Self::Number => "number",
            Self::Url => "url",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
        }
    }

    /// True when the value satisfies the rule.
    ///
    /// Only `required` rejects empty values; every other rule passes
    /// on empty and constrains the value once one is provided.
    pub fn check(&self, value: &FieldValue) -> bool {
        if value.is_empty() {
            return !matches!(self, Self::Required);
        }

        match self {
            Self::Required => true,
            Self::Email => looks_like_email(&value.to_text()),
            Self::Number => value.to_text().parse::<f64>().is_ok(),
            Self::Url => looks_like_url(&value.to_text()),
            Self::Min(n) => magnitude(value) >= *n as f64,
            Self::Max(n) => magnitude(value) <= *n as f64,
        }
    }

    pub fn default_message(&self, label: &str) -> String {
        match self {
            Self::Required => format!("{label} is required."),
            Self::Email => format!("{label} must be a valid email address."),
            Self::Number => format!("{label} must be a number."),
            Self::Url => format!("{label} must be a valid URL."),
            Self::Min(n) => format!("{label} must be at least {n}."),
            Self::Max(n) => format!("{label} must be at most {n}."),
        }
    }
}

/// What min/max measure: numeric value for numeric text, element
/// count for file lists, character count otherwise.
fn magnitude(value: &FieldValue) -> f64 {
    match value {
        FieldValue::Files(refs) => refs.len() as f64,
        other => {
            let text = other.to_text();
            text.parse::<f64>()
                .unwrap_or_else(|_| text.chars().count() as f64)
        }
    }
}

fn looks_like_email(text: &str) -> bool {
    if text.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = text.rsplit_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn looks_like_url(text: &str) -> bool {
    let rest = text
        .strip_prefix("https://")
        .or_else(|| text.strip_prefix("http://"));
    rest.map_or(false, |host| !host.is_empty())
}

/// Parse a rule expression. Rules are `|`-separated, arguments
/// `:`-separated ("min:6").
pub fn parse_rules(expr: &str) -> Vec<Rule> {
    expr.split('|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let (name, arg) = match part.split_once(':') {
                Some((name, arg)) => (name.trim(), Some(arg.trim())),
                None => (part, None),
            };
            let rule = match name {
                "required" => Some(Rule::Required),
                "email" => Some(Rule::Email),
                "number" => Some(Rule::Number),
                "url" => Some(Rule::Url),
                "min" => arg.and_then(|a| a.parse().ok()).map(Rule::Min),
                "max" => arg.and_then(|a| a.parse().ok()).map(Rule::Max),
                _ => None,
            };
            if rule.is_none() {
                tracing::warn!("unknown or malformed validation rule '{part}', skipped");
            }
            rule
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_piped_expressions() {
        let rules = parse_rules("required|min:6|email");
        assert_eq!(rules, vec![Rule::Required, Rule::Min(6), Rule::Email]);
    }

    #[test]
    fn unknown_rules_are_skipped() {
        let rules = parse_rules("required|matches:/x/|min:abc");
        assert_eq!(rules, vec![Rule::Required]);
    }

    #[test]
    fn required_rejects_empty_values() {
        assert!(!Rule::Required.check(&FieldValue::Null));
        assert!(!Rule::Required.check(&FieldValue::Text(String::new())));
        assert!(!Rule::Required.check(&FieldValue::Bool(false)));
        assert!(!Rule::Required.check(&FieldValue::Files(vec![])));
        assert!(Rule::Required.check(&FieldValue::Text("x".into())));
        assert!(Rule::Required.check(&FieldValue::Bool(true)));
    }

    #[test]
    fn non_required_rules_pass_on_empty() {
        assert!(Rule::Email.check(&FieldValue::Null));
        assert!(Rule::Min(3).check(&FieldValue::Text(String::new())));
    }

    #[test]
    fn email_shape_check() {
        assert!(Rule::Email.check(&FieldValue::Text("a@b.co".into())));
        assert!(!Rule::Email.check(&FieldValue::Text("a@b".into())));
        assert!(!Rule::Email.check(&FieldValue::Text("not an email".into())));
        assert!(!Rule::Email.check(&FieldValue::Text("@b.co".into())));
    }

    #[test]
    fn min_max_measure_length_count_or_value() {
        assert!(Rule::Min(3).check(&FieldValue::Text("abcd".into())));
        assert!(!Rule::Min(3).check(&FieldValue::Text("ab".into())));

        // Numeric text compares by value.
        assert!(Rule::Min(10).check(&FieldValue::Text("42".into())));
        assert!(!Rule::Max(10).check(&FieldValue::Text("42".into())));

        // File lists compare by element count.
        assert!(Rule::Max(2).check(&FieldValue::Files(vec!["a".into()])));
        assert!(!Rule::Max(1).check(&FieldValue::Files(vec!["a".into(), "b".into()])));
    }

    #[test]
    fn url_shape_check() {
        assert!(Rule::Url.check(&FieldValue::Text("https://example.com".into())));
        assert!(Rule::Url.check(&FieldValue::Text("http://x".into())));
        assert!(!Rule::Url.check(&FieldValue::Text("example.com".into())));
        assert!(!Rule::Url.check(&FieldValue::Text("https://".into())));
    }
}

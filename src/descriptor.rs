//! Field Descriptor Model - Strict Schemas From Loose CMS Records
//!
//! CMS field records are duck-typed; everything downstream is not.
//! Normalization happens once, at this boundary.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub type FieldId = String;

/// Live form state: field key -> current value.
pub type FormState = BTreeMap<String, FieldValue>;

/// Grid resolution used by the width-to-span tables.
pub const GRID_TRACKS: u8 = 6;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Field record is missing an id")]
    MissingId,

    #[error("Duplicate field id: {0}")]
    DuplicateId(String),

    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed schema JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Non-fatal authoring problems. Logged, carried on the schema,
/// never a crash (fail-open policy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaWarning {
    UnknownFieldType { field: FieldId, raw: String },
    UnknownWidth { field: FieldId, raw: String },
    EmptyOptions { field: FieldId },
    UnknownConditionKind { field: FieldId, raw: String },
    DanglingConditionRef { field: FieldId, target: String },
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFieldType { field, raw } => {
                write!(f, "field '{field}': unknown type '{raw}', falling back to text")
            }
            Self::UnknownWidth { field, raw } => {
                write!(f, "field '{field}': unknown width '{raw}', falling back to 100")
            }
            Self::EmptyOptions { field } => {
                write!(f, "field '{field}': select/radio with no options")
            }
            Self::UnknownConditionKind { field, raw } => {
                write!(f, "field '{field}': unknown condition kind '{raw}', condition ignored")
            }
            Self::DanglingConditionRef { field, target } => {
                write!(f, "field '{field}': condition references unknown field '{target}', condition dropped")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Select,
    Radio,
    Checkbox,
    File,
    Signature,
    Datepicker,
}

impl FieldType {
    fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "text" => Some(Self::Text),
            "textarea" => Some(Self::Textarea),
            "select" => Some(Self::Select),
            "radio" => Some(Self::Radio),
            "checkbox" => Some(Self::Checkbox),
            "file" => Some(Self::File),
            "signature" => Some(Self::Signature),
            "datepicker" => Some(Self::Datepicker),
            _ => None,
        }
    }

    pub fn wants_options(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldWidth {
    #[serde(rename = "33")]
    Third,
    #[serde(rename = "50")]
    Half,
    #[serde(rename = "67")]
    TwoThirds,
    #[serde(rename = "100")]
    Full,
}

impl FieldWidth {
    fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "33" => Some(Self::Third),
            "50" => Some(Self::Half),
            "67" => Some(Self::TwoThirds),
            "100" => Some(Self::Full),
            _ => None,
        }
    }

    /// Columns occupied out of [`GRID_TRACKS`].
    pub fn span(&self) -> u8 {
        match self {
            Self::Third => 2,
            Self::Half => 3,
            Self::TwoThirds => 4,
            Self::Full => 6,
        }
    }
}

impl Default for FieldWidth {
    fn default() -> Self {
        Self::Full
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionAction {
    Show,
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    IsEmpty,
    IsFilled,
    Contains,
    NotContains,
    Equals,
    NotEqual,
}

impl ConditionKind {
    fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "is_empty" => Some(Self::IsEmpty),
            "is_filled" => Some(Self::IsFilled),
            "contains" => Some(Self::Contains),
            "not_contains" => Some(Self::NotContains),
            "equals" => Some(Self::Equals),
            "not_equal" => Some(Self::NotEqual),
            _ => None,
        }
    }
}

/// One visibility predicate over another field's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub action: ConditionAction,
    #[serde(rename = "condition")]
    pub kind: ConditionKind,
    #[serde(default)]
    pub value: String,
}

/// A state-map value. Shape depends on the widget: text-ish widgets
/// store strings, checkboxes booleans, uploads ordered file references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Text(String),
    Files(Vec<String>),
}

impl FieldValue {
    /// Empty means: null, empty string, empty file list, or `false`.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Text(s) => s.is_empty(),
            Self::Files(refs) => refs.is_empty(),
        }
    }

    /// Stringified form used by condition comparisons.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Text(s) => s.clone(),
            Self::Files(refs) => refs.join(","),
        }
    }
}

/// Permissive mirror of a CMS field record. Unknown JSON keys are
/// ignored; known keys tolerate the shapes Directus actually emits
/// (`name` for label, numeric or string widths, a single condition
/// or a list).
#[derive(Debug, Clone, Deserialize)]
pub struct RawField {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default, alias = "name")]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub width: Option<RawWidth>,
    #[serde(default)]
    pub validation: Option<String>,
    #[serde(default, alias = "validationMessages")]
    pub validation_messages: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub condition: Option<RawCondition>,
    #[serde(default)]
    pub conditions: Option<Vec<RawCondition>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawWidth {
    Number(u64),
    Text(String),
}

impl RawWidth {
    fn as_token(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCondition {
    pub field: String,
    #[serde(default)]
    pub action: Option<String>,
    pub condition: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Normalized form field. Every downstream consumer sees this and
/// only this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: FieldId,
    /// State-map key; defaults to `id`.
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub width: FieldWidth,
    #[serde(default)]
    pub validation: Option<String>,
    #[serde(default)]
    pub validation_messages: BTreeMap<String, String>,
    /// All entries are honored and AND-ed together.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl FieldDescriptor {
    /// Normalize one raw record. Missing `id` is the only fatal case;
    /// everything else degrades to a permissive default plus a warning.
    pub fn normalize(raw: RawField) -> Result<(Self, Vec<SchemaWarning>), ConfigurationError> {
        let id = raw.id.filter(|s| !s.is_empty()).ok_or(ConfigurationError::MissingId)?;
        let key = raw.key.filter(|s| !s.is_empty()).unwrap_or_else(|| id.clone());
        let mut warnings = Vec::new();

        let field_type = match raw.field_type.as_deref() {
            None | Some("") => FieldType::Text,
            Some(token) => FieldType::from_raw(token).unwrap_or_else(|| {
                warnings.push(SchemaWarning::UnknownFieldType {
                    field: id.clone(),
                    raw: token.to_string(),
                });
                FieldType::Text
            }),
        };

        let width = match raw.width.as_ref().map(RawWidth::as_token) {
            None => FieldWidth::Full,
            Some(token) if token.is_empty() => FieldWidth::Full,
            Some(token) => FieldWidth::from_raw(&token).unwrap_or_else(|| {
                warnings.push(SchemaWarning::UnknownWidth {
                    field: id.clone(),
                    raw: token,
                });
                FieldWidth::Full
            }),
        };

        let options = raw.options.unwrap_or_default();
        if field_type.wants_options() && options.is_empty() {
            // Not fatal: the renderer shows an empty list.
            warnings.push(SchemaWarning::EmptyOptions { field: id.clone() });
        }

        let raw_conditions = match (raw.conditions, raw.condition) {
            (Some(list), _) => list,
            (None, Some(single)) => vec![single],
            (None, None) => Vec::new(),
        };

        let mut conditions = Vec::with_capacity(raw_conditions.len());
        for rc in raw_conditions {
            let Some(kind) = ConditionKind::from_raw(&rc.condition) else {
                warnings.push(SchemaWarning::UnknownConditionKind {
                    field: id.clone(),
                    raw: rc.condition,
                });
                continue;
            };
            let action = match rc.action.as_deref() {
                Some("hide") => ConditionAction::Hide,
                _ => ConditionAction::Show,
            };
            conditions.push(Condition {
                field: rc.field,
                action,
                kind,
                value: rc.value.unwrap_or_default(),
            });
        }

        Ok((
            Self {
                id,
                key,
                label: raw.label,
                description: raw.description,
                placeholder: raw.placeholder,
                field_type,
                options,
                width,
                validation: raw.validation.filter(|s| !s.is_empty()),
                validation_messages: raw.validation_messages.unwrap_or_default(),
                conditions,
            },
            warnings,
        ))
    }
}

/// Form-level CMS strings carried alongside the field schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub submit_label: Option<String>,
    #[serde(default)]
    pub success_message: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// A full CMS form record: metadata plus its raw fields.
#[derive(Debug, Clone, Deserialize)]
pub struct RawForm {
    #[serde(flatten)]
    pub meta: FormMeta,
    #[serde(default)]
    pub fields: Vec<RawField>,
}

/// Validated, ordered descriptor list. The only way to build one is
/// through [`FormSchema::normalize`], which enforces the schema-level
/// invariants (unique ids, resolvable condition references).
#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub fields: Vec<FieldDescriptor>,
    pub warnings: Vec<SchemaWarning>,
}

impl FormSchema {
    pub fn normalize(raw: Vec<RawField>) -> Result<Self, ConfigurationError> {
        let mut fields = Vec::with_capacity(raw.len());
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for record in raw {
            let (field, field_warnings) = FieldDescriptor::normalize(record)?;
            if !seen.insert(field.id.clone()) {
                return Err(ConfigurationError::DuplicateId(field.id));
            }
            warnings.extend(field_warnings);
            fields.push(field);
        }

        // Conditions may only reference keys present in this schema.
        // Dangling references drop the condition and the field stays
        // visible (fail-open).
        let keys: HashSet<String> = fields.iter().map(|f| f.key.clone()).collect();
        let mut dangling = Vec::new();
        for field in &fields {
            for cond in &field.conditions {
                if !keys.contains(cond.field.as_str()) {
                    dangling.push(SchemaWarning::DanglingConditionRef {
                        field: field.id.clone(),
                        target: cond.field.clone(),
                    });
                }
            }
        }
        for field in &mut fields {
            field.conditions.retain(|c| keys.contains(c.field.as_str()));
        }
        warnings.extend(dangling);

        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        Ok(Self { fields, warnings })
    }

    /// Normalize a full CMS form record, splitting off its metadata.
    pub fn normalize_form(raw: RawForm) -> Result<(FormMeta, Self), ConfigurationError> {
        let schema = Self::normalize(raw.fields)?;
        Ok((raw.meta, schema))
    }

    /// Load a schema from a JSON file holding either a bare field
    /// array or a full form record.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        if value.is_array() {
            let raw: Vec<RawField> = serde_json::from_value(value)?;
            Self::normalize(raw)
        } else {
            let raw: RawForm = serde_json::from_value(value)?;
            Ok(Self::normalize_form(raw)?.1)
        }
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }
}

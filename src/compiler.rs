//! Schema Compiler - Descriptors To Renderer Nodes
//!
//! Pure transform: a descriptor list plus the current form state
//! yields an ordered node tree the renderer can draw. Output order
//! equals input order; nothing here mutates state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::condition::is_visible;
use crate::descriptor::{FieldDescriptor, FieldType, FormSchema, FormState, GRID_TRACKS};

/// Date format handed to the date-time widget.
pub const DATE_FORMAT: &str = "yyyy-MM-dd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    Text,
    Textarea,
    FileUpload,
    SignaturePad,
    Checkbox,
    Select,
    RadioGroup,
    DateTime,
}

/// Fixed descriptor-type to widget-kind table.
pub fn widget_for(field_type: FieldType) -> WidgetKind {
    match field_type {
        FieldType::Textarea => WidgetKind::Textarea,
        FieldType::File => WidgetKind::FileUpload,
        FieldType::Signature => WidgetKind::SignaturePad,
        FieldType::Checkbox => WidgetKind::Checkbox,
        FieldType::Select => WidgetKind::Select,
        FieldType::Radio => WidgetKind::RadioGroup,
        FieldType::Datepicker => WidgetKind::DateTime,
        FieldType::Text => WidgetKind::Text,
    }
}

/// Columns a field occupies out of the [`GRID_TRACKS`]-column grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSpan {
    pub span: u8,
    pub of: u8,
}

impl LayoutSpan {
    pub fn new(span: u8) -> Self {
        Self {
            span,
            of: GRID_TRACKS,
        }
    }

    /// CSS class for the site's md breakpoint grid.
    pub fn css_class(&self) -> String {
        format!("md:col-span-{}", self.span)
    }
}

impl std::fmt::Display for LayoutSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.span, self.of)
    }
}

/// Widget props assembled from the descriptor fields relevant to
/// the chosen widget kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub validation_messages: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clearable: Option<bool>,
}

/// One renderer-ready unit. Derived, never mutated by callers; the
/// controller recomputes `visible` as state changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledNode {
    pub field_id: String,
    pub key: String,
    pub widget: WidgetKind,
    pub props: WidgetProps,
    pub layout: LayoutSpan,
    pub visible: bool,
}

/// Compile one descriptor against the current state.
pub fn compile_field(field: &FieldDescriptor, state: &FormState) -> CompiledNode {
    let widget = widget_for(field.field_type);

    let mut props = WidgetProps {
        label: field.label.clone(),
        description: field.description.clone(),
        validation: field.validation.clone(),
        validation_messages: field.validation_messages.clone(),
        ..WidgetProps::default()
    };

    // Checkboxes have no placeholder; options only mean something
    // to select and radio widgets.
    if widget != WidgetKind::Checkbox {
        props.placeholder = field.placeholder.clone();
    }
    if field.field_type.wants_options() {
        props.options = field.options.clone();
    }
    if widget == WidgetKind::DateTime {
        props.format = Some(DATE_FORMAT.to_string());
        props.clearable = Some(true);
    }

    CompiledNode {
        field_id: field.id.clone(),
        key: field.key.clone(),
        widget,
        props,
        layout: LayoutSpan::new(field.width.span()),
        visible: is_visible(&field.conditions, state),
    }
}

/// Compile a whole schema. Stable: output order equals field order,
/// and the same inputs always produce the same nodes.
pub fn compile(schema: &FormSchema, state: &FormState) -> Vec<CompiledNode> {
    schema
        .fields
        .iter()
        .map(|field| compile_field(field, state))
        .collect()
}

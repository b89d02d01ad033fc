//! Formsmith Core - CMS Form Schema Compiler
//!
//! # Ground Rules (Non-Negotiable)
//! 1. Descriptors Are Contracts
//! 2. Configuration Problems Degrade, Never Crash
//! 3. Compilation Is Pure And Order-Preserving
//! 4. Hidden Fields Never Validate
//! 5. One Submission At A Time

pub mod compiler;
pub mod condition;
pub mod descriptor;
pub mod rules;
pub mod state;

pub use compiler::{
    compile, compile_field, widget_for, CompiledNode, LayoutSpan, WidgetKind, WidgetProps,
};
pub use condition::{evaluate, is_visible};
pub use descriptor::{
    Condition, ConditionAction, ConditionKind, ConfigurationError, FieldDescriptor, FieldType,
    FieldValue, FieldWidth, FormMeta, FormSchema, FormState, RawField, RawForm, SchemaWarning,
};
pub use rules::{parse_rules, Rule};
pub use state::{
    FormController, SubmissionPayload, SubmissionReceipt, SubmitError, ValidationReport,
};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

//! Formsmith CLI - Bridge interface for build tooling
//!
//! Commands: fields, compile, validate
//! Outputs JSON to stdout
//! Returns non-zero on validation failure

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::ExitCode;

use formsmith_core::{
    compile,
    descriptor::{FormSchema, FormState, RawField},
    FormController,
};

#[derive(Parser)]
#[command(name = "formsmith-cli")]
#[command(about = "Formsmith CLI - CMS Form Schema Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize raw CMS field records into a strict schema
    Fields {
        /// JSON payload (array of raw fields, or a full form record)
        #[arg(short, long, conflicts_with = "file")]
        payload: Option<String>,

        /// Path to a JSON schema file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Compile a schema plus form state into renderer nodes
    Compile {
        /// JSON payload ({"fields": [...], "state": {...}})
        #[arg(short, long)]
        payload: String,
    },

    /// Validate form state against a schema (visible fields only)
    Validate {
        /// JSON payload ({"fields": [...], "state": {...}})
        #[arg(short, long)]
        payload: String,
    },
}

#[derive(Deserialize)]
struct StatePayload {
    fields: Vec<RawField>,
    #[serde(default)]
    state: FormState,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fields { payload, file } => {
            let schema = match (payload, file) {
                (Some(json), _) => {
                    let raw: Vec<RawField> = match serde_json::from_str(&json) {
                        Ok(r) => r,
                        Err(e) => {
                            eprintln!(r#"{{"error": "Invalid payload: {}"}}"#, e);
                            return ExitCode::FAILURE;
                        }
                    };
                    FormSchema::normalize(raw)
                }
                (None, Some(path)) => FormSchema::load_from_path(&path),
                (None, None) => {
                    eprintln!(r#"{{"error": "Provide --payload or --file"}}"#);
                    return ExitCode::FAILURE;
                }
            };

            match schema {
                Ok(schema) => {
                    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!(r#"{{"error": "{}"}}"#, e);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Compile { payload } => {
            let input: StatePayload = match serde_json::from_str(&payload) {
                Ok(i) => i,
                Err(e) => {
                    eprintln!(r#"{{"error": "Invalid payload: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            match FormSchema::normalize(input.fields) {
                Ok(schema) => {
                    let nodes = compile(&schema, &input.state);
                    let output = serde_json::json!({
                        "nodes": nodes,
                        "warnings": schema.warnings,
                    });
                    println!("{}", serde_json::to_string_pretty(&output).unwrap());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!(r#"{{"error": "{}"}}"#, e);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Validate { payload } => {
            let input: StatePayload = match serde_json::from_str(&payload) {
                Ok(i) => i,
                Err(e) => {
                    eprintln!(r#"{{"error": "Invalid payload: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            let schema = match FormSchema::normalize(input.fields) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!(r#"{{"error": "{}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            let controller = FormController::with_values(schema, input.state);
            let report = controller.validate();
            let output = serde_json::json!({
                "valid": report.is_clean(),
                "report": &report,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());

            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2) // Validation failure
            }
        }
    }
}

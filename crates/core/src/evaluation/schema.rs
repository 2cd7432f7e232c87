//! Structural validation of evaluation documents.

use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use super::error::EvaluationError;

/// Errors reported back to the caller are capped to keep the detail readable.
const MAX_REPORTED_ERRORS: usize = 5;

static EVALUATION_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Evaluation config",
        "type": "object",
        "required": ["source_type", "options", "marking_schemes"],
        "properties": {
            "source_type": { "enum": ["csv", "custom"] },
            "options": {
                "type": "object",
                "properties": {
                    "questions_in_order": { "$ref": "#/$defs/field_list" },
                    "should_explain_scoring": { "type": "boolean" }
                }
            },
            "marking_schemes": {
                "type": "object",
                "required": ["DEFAULT"],
                "properties": {
                    "DEFAULT": { "$ref": "#/$defs/marking" }
                },
                "additionalProperties": {
                    "type": "object",
                    "required": ["questions", "marking"],
                    "properties": {
                        "questions": { "$ref": "#/$defs/field_list" },
                        "marking": { "$ref": "#/$defs/marking" }
                    }
                }
            }
        },
        "allOf": [
            {
                "if": { "properties": { "source_type": { "const": "csv" } } },
                "then": {
                    "properties": {
                        "options": {
                            "required": ["answer_key_csv_path"],
                            "properties": {
                                "answer_key_csv_path": { "type": "string" },
                                "answer_key_image_path": { "type": "string" }
                            }
                        }
                    }
                }
            },
            {
                "if": { "properties": { "source_type": { "const": "custom" } } },
                "then": {
                    "properties": {
                        "options": {
                            "required": ["answers_in_order", "questions_in_order"],
                            "properties": {
                                "answers_in_order": {
                                    "type": "array",
                                    "items": { "$ref": "#/$defs/answer" }
                                }
                            }
                        }
                    }
                }
            }
        ],
        "$defs": {
            "field_list": {
                "type": "array",
                "items": { "type": "string", "minLength": 1 }
            },
            "answer": {
                "anyOf": [
                    { "type": "string", "minLength": 1 },
                    {
                        "type": "array",
                        "minItems": 1,
                        "items": {
                            "anyOf": [
                                { "type": "string", "minLength": 1 },
                                {
                                    "type": "array",
                                    "minItems": 2,
                                    "maxItems": 2,
                                    "prefixItems": [
                                        { "type": "string" },
                                        { "$ref": "#/$defs/score" }
                                    ]
                                }
                            ]
                        }
                    }
                ]
            },
            "score": {
                "anyOf": [
                    { "type": "number" },
                    { "type": "string", "pattern": "^-?(\\d+)(/(\\d+))?$" }
                ]
            },
            "marking": {
                "type": "object",
                "required": ["correct", "incorrect", "unanswered"],
                "properties": {
                    "correct": { "$ref": "#/$defs/score" },
                    "incorrect": { "$ref": "#/$defs/score" },
                    "unanswered": { "$ref": "#/$defs/score" }
                }
            }
        }
    })
});

static VALIDATOR: Lazy<Validator> =
    Lazy::new(|| jsonschema::validator_for(&EVALUATION_SCHEMA).unwrap());

/// Validate a parsed evaluation document against the evaluation schema.
pub fn validate_evaluation(document: &Value) -> Result<(), EvaluationError> {
    let messages: Vec<String> = VALIDATOR
        .iter_errors(document)
        .take(MAX_REPORTED_ERRORS)
        .map(|e| e.to_string())
        .collect();

    if messages.is_empty() {
        Ok(())
    } else {
        Err(EvaluationError::InvalidConfig {
            reason: messages.join("; "),
        })
    }
}

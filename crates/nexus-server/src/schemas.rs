//! JSON Schemas for the structured extraction endpoints.

use serde_json::{json, Value};

/// Schema of the recipe object streamed by `/api/structured-data`.
pub fn recipe_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "recipe": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "ingredients": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name":   { "type": "string" },
                                "amount": { "type": "string" }
                            },
                            "required": ["name", "amount"]
                        }
                    },
                    "steps": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                },
                "required": ["name", "ingredients", "steps"]
            }
        },
        "required": ["recipe"]
    })
}

/// Schema of the pokémon list streamed by `/api/structured-array`.
pub fn pokemon_list_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "pokemon": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "abilities": {
                            "type": "array",
                            "items": { "type": "string" }
                        }
                    },
                    "required": ["name", "abilities"]
                }
            }
        },
        "required": ["pokemon"]
    })
}

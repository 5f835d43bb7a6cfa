//! Tool Parameter Schemas
//!
//! A tool declares its arguments as a tree of [`Param`] nodes. The tree is
//! compiled into the object schema used by function-calling backends:
//!
//! ```text
//! {"type": "object", "properties": {..}, "required": [..], "additionalProperties": false}
//! ```
//!
//! and checked against the field list of the tool's argument struct when the
//! tool is built, so every advertised parameter can be decoded.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{AgentError, Result};

/// JSON type of a parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    /// Name used in the compiled schema
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name; must match a field of the tool's argument struct
    pub name: String,

    #[serde(rename = "type")]
    pub param_type: ParamType,

    /// Human-readable description (shown to LLM)
    pub description: String,

    #[serde(default)]
    pub required: bool,

    /// Allowed literal values
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,

    /// Element schema for arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Param>>,

    /// Nested fields for objects
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Param>,
}

impl Param {
    pub fn new(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: false,
            enum_values: Vec::new(),
            items: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::String, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::Integer, description)
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::Number, description)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::Boolean, description)
    }

    pub fn object(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::Object, description)
    }

    pub fn array(name: impl Into<String>, description: impl Into<String>, items: Self) -> Self {
        Self::new(name, ParamType::Array, description).with_items(items)
    }

    /// Mark the parameter as required
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_enum<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_items(mut self, items: Self) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    /// Add a nested field, keyed by its name
    #[must_use]
    pub fn with_property(mut self, property: Self) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }
}

/// Compile a parameter list into the top-level object schema.
pub fn compile_schema(params: &[Param]) -> Value {
    let properties: Map<String, Value> = params
        .iter()
        .map(|p| (p.name.clone(), compile_param(p)))
        .collect();
    let required: Vec<&str> = params
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// Compile a single parameter node, recursing into items and properties.
pub fn compile_param(param: &Param) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), json!(param.param_type.as_str()));
    schema.insert("description".into(), json!(param.description));

    if !param.enum_values.is_empty() {
        schema.insert("enum".into(), Value::Array(param.enum_values.clone()));
    }

    match param.param_type {
        ParamType::Array => {
            if let Some(items) = &param.items {
                schema.insert("items".into(), compile_param(items));
            }
        }
        ParamType::Object => {
            let properties: Map<String, Value> = param
                .properties
                .iter()
                .map(|(name, sub)| (name.clone(), compile_param(sub)))
                .collect();
            let required: Vec<&str> = param
                .properties
                .iter()
                .filter(|(_, sub)| sub.required)
                .map(|(name, _)| name.as_str())
                .collect();

            schema.insert("properties".into(), Value::Object(properties));
            schema.insert("required".into(), json!(required));
            schema.insert("additionalProperties".into(), json!(false));
        }
        ParamType::String | ParamType::Integer | ParamType::Number | ParamType::Boolean => {}
    }

    Value::Object(schema)
}

/// One field of a tool's argument struct, as seen by serde.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgField {
    /// Rust field name
    pub field: &'static str,
    /// Explicit `#[serde(rename = "..")]`
    pub rename: Option<&'static str>,
    /// `#[serde(skip)]`: not visible to the model
    pub skip: bool,
}

impl ArgField {
    pub const fn new(field: &'static str) -> Self {
        Self {
            field,
            rename: None,
            skip: false,
        }
    }

    pub const fn renamed(field: &'static str, rename: &'static str) -> Self {
        Self {
            field,
            rename: Some(rename),
            skip: false,
        }
    }

    pub const fn skipped(field: &'static str) -> Self {
        Self {
            field,
            rename: None,
            skip: true,
        }
    }

    /// Name this field has in the JSON arguments, `None` when skipped.
    pub fn json_name(&self) -> Option<Cow<'static, str>> {
        if self.skip {
            return None;
        }
        Some(match self.rename {
            Some(rename) => Cow::Borrowed(rename),
            None => Cow::Owned(default_json_name(self.field)),
        })
    }
}

/// First letter lowercased, unless the name opens with an acronym
/// (two or more uppercase letters), which is kept verbatim.
pub fn default_json_name(field: &str) -> String {
    let mut chars = field.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if first.is_uppercase() && field.chars().nth(1).is_some_and(char::is_uppercase) {
        return field.to_string();
    }
    first.to_lowercase().chain(chars).collect()
}

/// Check that every declared parameter maps onto a visible field.
///
/// serde matches keys exactly, so a field whose default JSON name differs
/// from its Rust name (`Min` -> `min`) must carry an explicit rename.
pub fn validate_params(params: &[Param], fields: &[ArgField], shape: &str) -> Result<()> {
    for field in fields.iter().filter(|f| f.rename.is_none() && !f.skip) {
        let json_name = default_json_name(field.field);
        if json_name != field.field {
            return Err(AgentError::ToolValidation(format!(
                "Field {:?} of {shape} is advertised as {json_name:?} but serde only accepts {:?}; \
                 declare it with ArgField::renamed({:?}, {json_name:?}) and #[serde(rename = {json_name:?})]",
                field.field, field.field, field.field
            )));
        }
    }

    let visible: HashSet<Cow<'static, str>> = fields.iter().filter_map(ArgField::json_name).collect();
    let mut seen = HashSet::new();

    for param in params {
        if !visible.contains(param.name.as_str()) {
            return Err(AgentError::ToolValidation(format!(
                "Param name {:?} does not match any field (renamed or default) of {shape}",
                param.name
            )));
        }
        if !seen.insert(param.name.as_str()) {
            return Err(AgentError::ToolValidation(format!(
                "Param name {:?} is declared twice for {shape}",
                param.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_flat_params() {
        let schema = compile_schema(&[
            Param::integer("a", "First number").required(),
            Param::integer("b", "Second number").required(),
            Param::string("unit", "Unit").with_enum(["cm", "in"]),
        ]);

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"], json!(["a", "b"]));
        assert_eq!(
            schema["properties"]["a"],
            json!({"type": "integer", "description": "First number"})
        );
        assert_eq!(schema["properties"]["unit"]["enum"], json!(["cm", "in"]));
    }

    #[test]
    fn test_compile_empty_params() {
        let schema = compile_schema(&[]);
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {},
                "required": [],
                "additionalProperties": false,
            })
        );
    }

    #[test]
    fn test_compile_nested_object() {
        let opts = Param::object("opts", "Options")
            .with_property(Param::integer("x", "X coordinate").required())
            .with_property(Param::boolean("verbose", "Chatty output"));
        let schema = compile_schema(&[opts]);

        let compiled = &schema["properties"]["opts"];
        assert_eq!(compiled["type"], "object");
        assert_eq!(compiled["properties"]["x"]["type"], "integer");
        assert_eq!(compiled["properties"]["verbose"]["type"], "boolean");
        assert_eq!(compiled["required"], json!(["x"]));
        assert_eq!(compiled["additionalProperties"], false);
        assert_eq!(schema["required"], json!([]));
    }

    #[test]
    fn test_compile_array_items() {
        let tags = Param::array(
            "tags",
            "Labels",
            Param::string("tag", "One label").with_enum(["a", "b"]),
        );
        let compiled = compile_param(&tags);

        assert_eq!(compiled["type"], "array");
        assert_eq!(compiled["items"]["type"], "string");
        assert_eq!(compiled["items"]["enum"], json!(["a", "b"]));
        assert!(compiled.get("properties").is_none());
    }

    #[test]
    fn test_type_names() {
        let all = [
            (ParamType::String, "string"),
            (ParamType::Integer, "integer"),
            (ParamType::Number, "number"),
            (ParamType::Boolean, "boolean"),
            (ParamType::Object, "object"),
            (ParamType::Array, "array"),
        ];
        for (param_type, name) in all {
            assert_eq!(param_type.as_str(), name);
            assert_eq!(serde_json::to_value(param_type).unwrap(), name);
        }
    }

    #[test]
    fn test_default_json_name() {
        assert_eq!(default_json_name("Min"), "min");
        assert_eq!(default_json_name("max"), "max");
        assert_eq!(default_json_name("URL"), "URL");
        assert_eq!(default_json_name("IDList"), "IDList");
        assert_eq!(default_json_name("A"), "a");
        assert_eq!(default_json_name(""), "");
    }

    #[test]
    fn test_validate_params_matches_fields() {
        const FIELDS: &[ArgField] = &[
            ArgField::new("a"),
            ArgField::renamed("second", "b"),
            ArgField::new("HTTPCode"),
            ArgField::skipped("cache"),
        ];

        let ok = [
            Param::integer("a", "").required(),
            Param::integer("b", ""),
            Param::integer("HTTPCode", ""),
        ];
        assert!(validate_params(&ok, FIELDS, "Args").is_ok());

        let err = validate_params(&[Param::integer("second", "")], FIELDS, "Args").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"second\""), "{msg}");
        assert!(msg.contains("Args"), "{msg}");

        assert!(validate_params(&[Param::string("cache", "")], FIELDS, "Args").is_err());
    }

    #[test]
    fn test_validate_requires_rename_for_capitalized_fields() {
        const BARE: &[ArgField] = &[ArgField::new("Min")];
        let params = [Param::integer("min", "Lower bound")];

        let err = validate_params(&params, BARE, "Bounds").unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(_)));
        let msg = err.to_string();
        assert!(msg.contains("\"Min\""), "{msg}");
        assert!(msg.contains("ArgField::renamed"), "{msg}");

        const RENAMED: &[ArgField] = &[ArgField::renamed("Min", "min")];
        assert!(validate_params(&params, RENAMED, "Bounds").is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        const FIELDS: &[ArgField] = &[ArgField::new("a")];
        let params = [Param::integer("a", ""), Param::integer("a", "")];
        assert!(matches!(
            validate_params(&params, FIELDS, "Args"),
            Err(AgentError::ToolValidation(_))
        ));
    }
}

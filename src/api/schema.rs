//! Flat record schemas used to constrain and validate generation output.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use super::error::PipelineError;
use super::parser::extract_json_from_text;

/// Scalar JSON types a field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Integer,
    Number,
    Boolean,
}

impl Primitive {
    fn as_str(self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Integer => "integer",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Primitive::String => value.is_string(),
            Primitive::Integer => value.is_i64() || value.is_u64(),
            Primitive::Number => value.is_number(),
            Primitive::Boolean => value.is_boolean(),
        }
    }
}

impl FromStr for Primitive {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "string" | "str" => Ok(Primitive::String),
            "integer" | "int" => Ok(Primitive::Integer),
            "number" | "float" => Ok(Primitive::Number),
            "boolean" | "bool" => Ok(Primitive::Boolean),
            other => Err(format!("unsupported field type '{}'", other)),
        }
    }
}

/// Declared type of a schema field: a primitive or a homogeneous list of one.
///
/// Written in schema files as `string`, `integer`, `number`, `boolean` or
/// `list<...>` of any of those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    Primitive(Primitive),
    List(Primitive),
}

impl FieldType {
    pub const STRING: FieldType = FieldType::Primitive(Primitive::String);
    pub const INTEGER: FieldType = FieldType::Primitive(Primitive::Integer);
    pub const NUMBER: FieldType = FieldType::Primitive(Primitive::Number);
    pub const BOOLEAN: FieldType = FieldType::Primitive(Primitive::Boolean);
    pub const STRING_LIST: FieldType = FieldType::List(Primitive::String);

    fn json_schema(self) -> Value {
        match self {
            FieldType::Primitive(p) => json!({ "type": p.as_str() }),
            FieldType::List(p) => json!({ "type": "array", "items": { "type": p.as_str() } }),
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::Primitive(p) => p.accepts(value),
            FieldType::List(p) => value
                .as_array()
                .map_or(false, |items| items.iter().all(|v| p.accepts(v))),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive(p) => f.write_str(p.as_str()),
            FieldType::List(p) => write!(f, "list<{}>", p.as_str()),
        }
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix("list<").and_then(|rest| rest.strip_suffix('>')) {
            Some(inner) => Ok(FieldType::List(inner.parse()?)),
            None => Ok(FieldType::Primitive(s.parse()?)),
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}

fn default_required() -> bool {
    true
}

/// One named, typed, described field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

/// An ordered set of uniquely-named fields describing one flat record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredSchema {
    name: String,
    description: String,
    fields: Vec<FieldSpec>,
}

impl StructuredSchema {
    /// Creates a schema, rejecting empty or duplicate field names.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        fields: Vec<FieldSpec>,
    ) -> Result<Self, PipelineError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PipelineError::InvalidSchema("schema name is empty".to_string()));
        }
        if fields.is_empty() {
            return Err(PipelineError::InvalidSchema(format!(
                "schema '{}' declares no fields",
                name
            )));
        }
        for (i, field) in fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(PipelineError::InvalidSchema(format!(
                    "field #{} of schema '{}' has an empty name",
                    i + 1,
                    name
                )));
            }
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(PipelineError::InvalidSchema(format!(
                    "duplicate field '{}' in schema '{}'",
                    field.name, name
                )));
            }
        }
        Ok(Self {
            name,
            description: description.into(),
            fields,
        })
    }

    /// Starts a fluent schema declaration.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            description: String::new(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Whether every field is required, which strict backends insist on.
    pub fn all_required(&self) -> bool {
        self.fields.iter().all(|f| f.required)
    }

    /// Instruction text appended to a prompt so the model emits this record.
    pub fn instructions(&self) -> String {
        let mut out = format!(
            "Respond with a single JSON object \"{}\"",
            self.name
        );
        if !self.description.is_empty() {
            out.push_str(&format!(" ({})", self.description));
        }
        out.push_str(" containing these fields:\n");
        for field in &self.fields {
            out.push_str(&format!(
                "- {} ({}, {}): {}\n",
                field.name,
                field.field_type,
                if field.required { "required" } else { "optional" },
                field.description
            ));
        }
        out.push_str("Output only the JSON object, without any surrounding text.");
        out
    }

    /// JSON Schema object describing this record.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut prop = field.field_type.json_schema();
            if let Some(obj) = prop.as_object_mut() {
                obj.insert("description".into(), Value::String(field.description.clone()));
            }
            properties.insert(field.name.clone(), prop);
        }
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        json!({
            "title": self.name,
            "description": self.description,
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Extracts the JSON object from raw model text and validates it.
    pub fn parse(&self, raw: &str) -> Result<StructuredRecord, PipelineError> {
        let payload = extract_json_from_text(raw).ok_or_else(|| {
            PipelineError::SchemaConformance(format!(
                "no JSON object found in output for '{}'",
                self.name
            ))
        })?;
        let value: Value = serde_json::from_str(&payload).map_err(|e| {
            PipelineError::SchemaConformance(format!("malformed JSON payload: {}", e))
        })?;
        self.validate(&value)
    }

    /// Checks that every declared field is present with the declared type.
    ///
    /// Undeclared keys are dropped; absent optional fields are omitted.
    pub fn validate(&self, value: &Value) -> Result<StructuredRecord, PipelineError> {
        let obj = value.as_object().ok_or_else(|| {
            PipelineError::SchemaConformance(format!(
                "expected a JSON object for '{}'",
                self.name
            ))
        })?;

        let mut fields = Vec::with_capacity(self.fields.len());
        for spec in &self.fields {
            match obj.get(&spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(PipelineError::SchemaConformance(format!(
                        "required field '{}' is missing",
                        spec.name
                    )));
                }
                None | Some(Value::Null) => continue,
                Some(v) if !spec.field_type.accepts(v) => {
                    return Err(PipelineError::SchemaConformance(format!(
                        "field '{}' should be {} but was {}",
                        spec.name, spec.field_type, v
                    )));
                }
                Some(Value::String(s)) if spec.required && s.trim().is_empty() => {
                    return Err(PipelineError::SchemaConformance(format!(
                        "required field '{}' is empty",
                        spec.name
                    )));
                }
                Some(v) => fields.push((spec.name.clone(), v.clone())),
            }
        }

        Ok(StructuredRecord {
            schema: self.name.clone(),
            fields,
        })
    }
}

/// Fluent builder returned by [`StructuredSchema::builder`].
pub struct SchemaBuilder {
    name: String,
    description: String,
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a required field.
    pub fn field(self, name: &str, field_type: FieldType, description: &str) -> Self {
        self.push(name, field_type, description, true)
    }

    /// Adds a field that may be absent or null.
    pub fn optional_field(self, name: &str, field_type: FieldType, description: &str) -> Self {
        self.push(name, field_type, description, false)
    }

    fn push(mut self, name: &str, field_type: FieldType, description: &str, required: bool) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            field_type,
            description: description.to_string(),
            required,
        });
        self
    }

    pub fn build(self) -> Result<StructuredSchema, PipelineError> {
        StructuredSchema::new(self.name, self.description, self.fields)
    }
}

/// A record that passed validation, with fields in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRecord {
    schema: String,
    fields: Vec<(String, Value)>,
}

impl StructuredRecord {
    /// Name of the schema this record was validated against.
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_str_list(&self, name: &str) -> Option<Vec<&str>> {
        self.get(name)?
            .as_array()?
            .iter()
            .map(Value::as_str)
            .collect()
    }

    /// The record as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.iter().cloned().collect())
    }

    /// Converts the record into a caller-defined type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, PipelineError> {
        serde_json::from_value(self.to_value())
            .map_err(|e| PipelineError::SchemaConformance(e.to_string()))
    }
}

impl fmt::Display for StructuredRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{}({})", self.schema, parts.join(", "))
    }
}

//! JSON-Schema subset and the matcher that evaluates documents against it.
//!
//! Supported keywords: `type` (a name or a list of names), `properties`,
//! `required`, `additionalProperties` (boolean only) and `items` (a single
//! schema). Annotation keywords such as `$schema`, `title` or `description`
//! are ignored. Anything else that changes validation meaning is out of the
//! subset and is not interpreted.
//!
//! Matching is exhaustive within one document: every violation found is
//! returned, except that a type mismatch stops descent into that subtree.

use crate::error::ConfigError;
use crate::models::{Violation, ViolationKind};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Runtime kinds a schema `type` may name.
pub enum JsonType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl JsonType {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "object" => JsonType::Object,
            "array" => JsonType::Array,
            "string" => JsonType::String,
            "number" => JsonType::Number,
            "integer" => JsonType::Integer,
            "boolean" => JsonType::Boolean,
            "null" => JsonType::Null,
            _ => return None,
        })
    }

    /// Kind of a concrete value; integral numbers report `Integer`.
    pub fn of(value: &Json) -> Self {
        match value {
            Json::Object(_) => JsonType::Object,
            Json::Array(_) => JsonType::Array,
            Json::String(_) => JsonType::String,
            Json::Number(n) => {
                if n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0) {
                    JsonType::Integer
                } else {
                    JsonType::Number
                }
            }
            Json::Bool(_) => JsonType::Boolean,
            Json::Null => JsonType::Null,
        }
    }

    fn admits(self, actual: JsonType) -> bool {
        self == actual || (self == JsonType::Number && actual == JsonType::Integer)
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::Boolean => "boolean",
            JsonType::Null => "null",
        };
        f.write_str(s)
    }
}

/// Allowed runtime kinds for one schema node; empty means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet(Vec<JsonType>);

impl TypeSet {
    pub fn admits(&self, value: &Json) -> bool {
        let actual = JsonType::of(value);
        self.0.is_empty() || self.0.iter().any(|t| t.admits(actual))
    }

    fn contains(&self, t: JsonType) -> bool {
        self.0.contains(&t)
    }

    fn only_other_than(&self, t: JsonType) -> bool {
        !self.0.is_empty() && !self.contains(t)
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(|t| t.to_string()).collect();
        f.write_str(&names.join(" or "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    pub types: TypeSet,
    pub properties: BTreeMap<String, Schema>,
    pub required: Vec<String>,
    pub additional_properties: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub types: TypeSet,
    pub items: Option<Box<Schema>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafSchema {
    pub types: TypeSet,
}

/// One node of a parsed schema tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Object(ObjectSchema),
    Array(ArraySchema),
    Leaf(LeafSchema),
}

impl Schema {
    /// Parse a schema document, rejecting anything outside the subset that
    /// would change its meaning.
    pub fn from_json(doc: &Json) -> Result<Self, ConfigError> {
        parse_node(doc, "")
    }

    /// Load a schema file. `.yaml`/`.yml` files are read as YAML, anything
    /// else as JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let load_err = |reason: String| ConfigError::SchemaLoad {
            path: path.to_path_buf(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let doc: Json = if is_yaml {
            serde_yaml::from_str(&text).map_err(|e| load_err(e.to_string()))?
        } else {
            serde_json::from_str(&text).map_err(|e| load_err(e.to_string()))?
        };
        Schema::from_json(&doc).map_err(|e| load_err(e.to_string()))
    }

    pub fn types(&self) -> &TypeSet {
        match self {
            Schema::Object(o) => &o.types,
            Schema::Array(a) => &a.types,
            Schema::Leaf(l) => &l.types,
        }
    }

    /// Evaluate `value` against this schema, reporting at `path`.
    pub fn check(&self, value: &Json, path: &str) -> Vec<Violation> {
        let mut out = Vec::new();
        match_value(value, self, path, &mut out);
        out
    }
}

/// Evaluate a document from its root.
pub fn check_document(value: &Json, schema: &Schema) -> Vec<Violation> {
    schema.check(value, "")
}

fn parse_node(doc: &Json, at: &str) -> Result<Schema, ConfigError> {
    let obj = match doc {
        Json::Object(m) => m,
        // `true` accepts anything; `false` would need a "never" node.
        Json::Bool(true) => return Ok(Schema::Leaf(LeafSchema { types: TypeSet::default() })),
        _ => {
            return Err(ConfigError::malformed(format!(
                "schema at '{}' must be an object",
                display_path(at)
            )))
        }
    };
    let types = parse_types(obj, at)?;

    let is_object = obj.contains_key("properties")
        || obj.contains_key("required")
        || obj.contains_key("additionalProperties")
        || types.contains(JsonType::Object);
    let is_array = obj.contains_key("items") || types.contains(JsonType::Array);

    if is_object && is_array {
        return Err(ConfigError::malformed(format!(
            "schema at '{}' mixes object and array keywords",
            display_path(at)
        )));
    }

    if is_object {
        if types.only_other_than(JsonType::Object) {
            return Err(ConfigError::malformed(format!(
                "schema at '{}' has object keywords but type {}",
                display_path(at),
                types
            )));
        }
        let mut properties = BTreeMap::new();
        if let Some(props) = obj.get("properties") {
            let props = props.as_object().ok_or_else(|| {
                ConfigError::malformed(format!(
                    "'properties' at '{}' must be an object",
                    display_path(at)
                ))
            })?;
            for (name, sub) in props {
                let sub_at = format!("{}/properties/{}", at, escape_pointer(name));
                properties.insert(name.clone(), parse_node(sub, &sub_at)?);
            }
        }
        let required = match obj.get("required") {
            None => Vec::new(),
            Some(Json::Array(names)) => names
                .iter()
                .map(|n| {
                    n.as_str().map(str::to_string).ok_or_else(|| {
                        ConfigError::malformed(format!(
                            "'required' at '{}' must list strings",
                            display_path(at)
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(ConfigError::malformed(format!(
                    "'required' at '{}' must be an array",
                    display_path(at)
                )))
            }
        };
        let additional_properties = match obj.get("additionalProperties") {
            None => true,
            Some(Json::Bool(b)) => *b,
            Some(_) => {
                return Err(ConfigError::malformed(format!(
                    "'additionalProperties' at '{}' must be a boolean",
                    display_path(at)
                )))
            }
        };
        return Ok(Schema::Object(ObjectSchema {
            types,
            properties,
            required,
            additional_properties,
        }));
    }

    if is_array {
        if types.only_other_than(JsonType::Array) {
            return Err(ConfigError::malformed(format!(
                "schema at '{}' has 'items' but type {}",
                display_path(at),
                types
            )));
        }
        let items = match obj.get("items") {
            None => None,
            Some(sub) if sub.is_object() || sub.as_bool() == Some(true) => {
                Some(Box::new(parse_node(sub, &format!("{}/items", at))?))
            }
            Some(_) => {
                return Err(ConfigError::malformed(format!(
                    "'items' at '{}' must be a single schema",
                    display_path(at)
                )))
            }
        };
        return Ok(Schema::Array(ArraySchema { types, items }));
    }

    Ok(Schema::Leaf(LeafSchema { types }))
}

fn parse_types(obj: &Map<String, Json>, at: &str) -> Result<TypeSet, ConfigError> {
    let unknown = |name: &str| {
        ConfigError::malformed(format!(
            "unknown type '{}' at '{}'",
            name,
            display_path(at)
        ))
    };
    match obj.get("type") {
        None => Ok(TypeSet::default()),
        Some(Json::String(name)) => {
            let t = JsonType::parse(name).ok_or_else(|| unknown(name))?;
            Ok(TypeSet(vec![t]))
        }
        Some(Json::Array(names)) if !names.is_empty() => {
            let mut out = Vec::with_capacity(names.len());
            for n in names {
                let name = n.as_str().ok_or_else(|| {
                    ConfigError::malformed(format!(
                        "'type' at '{}' must list strings",
                        display_path(at)
                    ))
                })?;
                out.push(JsonType::parse(name).ok_or_else(|| unknown(name))?);
            }
            Ok(TypeSet(out))
        }
        Some(_) => Err(ConfigError::malformed(format!(
            "'type' at '{}' must be a string or non-empty array",
            display_path(at)
        ))),
    }
}

fn match_value(value: &Json, schema: &Schema, path: &str, out: &mut Vec<Violation>) {
    let types = schema.types();
    if !types.admits(value) {
        out.push(Violation::new(
            ViolationKind::TypeMismatch,
            path,
            format!("expected {}, found {}", types, JsonType::of(value)),
        ));
        return;
    }
    match (schema, value) {
        (Schema::Object(os), Json::Object(map)) => match_object(map, os, path, out),
        (Schema::Array(arr), Json::Array(elems)) => {
            if let Some(items) = arr.items.as_deref() {
                for (i, elem) in elems.iter().enumerate() {
                    match_value(elem, items, &format!("{}/{}", path, i), out);
                }
            }
        }
        // Leaf schemas, and untyped object/array schemas applied to other kinds.
        _ => {}
    }
}

fn match_object(map: &Map<String, Json>, os: &ObjectSchema, path: &str, out: &mut Vec<Violation>) {
    for name in &os.required {
        if !map.contains_key(name) {
            out.push(Violation::new(
                ViolationKind::MissingRequiredProperty,
                child_path(path, name),
                format!("missing required property '{}'", name),
            ));
        }
    }
    if !os.additional_properties {
        for key in map.keys() {
            if !os.properties.contains_key(key) {
                out.push(Violation::new(
                    ViolationKind::DisallowedProperty,
                    child_path(path, key),
                    format!("property '{}' is not allowed", key),
                ));
            }
        }
    }
    for (key, val) in map {
        if let Some(sub) = os.properties.get(key) {
            match_value(val, sub, &child_path(path, key), out);
        }
    }
}

fn child_path(path: &str, key: &str) -> String {
    format!("{}/{}", path, escape_pointer(key))
}

/// Escape one reference token per RFC 6901.
pub fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn display_path(at: &str) -> &str {
    if at.is_empty() {
        "#"
    } else {
        at
    }
}

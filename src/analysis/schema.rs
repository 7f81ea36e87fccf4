//! Output shape contracts for analyzers
//!
//! A schema serves two purposes: it renders to the JSON template embedded in
//! the analyzer prompt, and it checks a parsed answer. Checking is advisory;
//! every finding comes back as a human-readable warning and never changes an
//! analyzer's status.

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Integer,
    Number,
    Enum(Vec<String>),
    TextList,
    Object(Vec<SchemaField>),
    ObjectList(Vec<SchemaField>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub hint: Option<String>,
}

impl SchemaField {
    fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            hint: None,
        }
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn one_of(name: &str, allowed: &[&str]) -> Self {
        Self::new(
            name,
            FieldKind::Enum(allowed.iter().map(|s| s.to_string()).collect()),
        )
    }

    pub fn text_list(name: &str) -> Self {
        Self::new(name, FieldKind::TextList)
    }

    pub fn object(name: &str, fields: Vec<SchemaField>) -> Self {
        Self::new(name, FieldKind::Object(fields))
    }

    pub fn object_list(name: &str, fields: Vec<SchemaField>) -> Self {
        Self::new(name, FieldKind::ObjectList(fields))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }

    fn template(&self) -> Value {
        match &self.kind {
            FieldKind::Text => Value::String(self.hint.clone().unwrap_or_else(|| "string".into())),
            FieldKind::Integer => {
                Value::String(self.hint.clone().unwrap_or_else(|| "integer".into()))
            }
            FieldKind::Number => {
                Value::String(self.hint.clone().unwrap_or_else(|| "number".into()))
            }
            FieldKind::Enum(allowed) => Value::String(allowed.join("|")),
            FieldKind::TextList => json!([self.hint.clone().unwrap_or_else(|| "string".into())]),
            FieldKind::Object(fields) => template_object(fields),
            FieldKind::ObjectList(fields) => json!([template_object(fields)]),
        }
    }

    fn check(&self, value: &Value, path: &str, warnings: &mut Vec<String>) {
        match (&self.kind, value) {
            (_, Value::Null) if !self.required => {}
            (FieldKind::Text, Value::String(_)) => {}
            // Models often answer "Unknown" for numbers they cannot find
            (FieldKind::Integer | FieldKind::Number, Value::Number(_) | Value::String(_)) => {}
            (FieldKind::Enum(allowed), Value::String(s)) => {
                if !allowed.iter().any(|a| a.eq_ignore_ascii_case(s)) {
                    warnings.push(format!(
                        "{}: '{}' is not one of {}",
                        path,
                        s,
                        allowed.join("/")
                    ));
                }
            }
            (FieldKind::TextList, Value::Array(_)) => {}
            (FieldKind::Object(fields), Value::Object(map)) => {
                check_fields(fields, map, path, warnings);
            }
            (FieldKind::ObjectList(fields), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    match item {
                        Value::Object(map) => check_fields(fields, map, &item_path, warnings),
                        other => warnings.push(format!(
                            "{}: expected object, found {}",
                            item_path,
                            type_name(other)
                        )),
                    }
                }
            }
            (kind, other) => warnings.push(format!(
                "{}: expected {}, found {}",
                path,
                kind_name(kind),
                type_name(other)
            )),
        }
    }
}

/// Ordered field list plus the wrapper key models tend to nest answers under
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub wrapper: Option<String>,
    pub fields: Vec<SchemaField>,
}

impl OutputSchema {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self {
            wrapper: None,
            fields,
        }
    }

    pub fn wrapped(wrapper: &str, fields: Vec<SchemaField>) -> Self {
        Self {
            wrapper: Some(wrapper.to_string()),
            fields,
        }
    }

    pub fn declares(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.name == key)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// JSON template shown to the model
    pub fn template(&self) -> Value {
        let inner = template_object(&self.fields);
        match &self.wrapper {
            Some(wrapper) => {
                let mut outer = Map::new();
                outer.insert(wrapper.clone(), inner);
                Value::Object(outer)
            }
            None => inner,
        }
    }

    pub fn render_template(&self) -> String {
        serde_json::to_string_pretty(&self.template()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Advisory check of an already-unwrapped answer
    pub fn validate(&self, output: &Map<String, Value>) -> Vec<String> {
        let mut warnings = Vec::new();
        check_fields(&self.fields, output, "", &mut warnings);
        warnings
    }
}

fn template_object(fields: &[SchemaField]) -> Value {
    let mut map = Map::new();
    for field in fields {
        map.insert(field.name.clone(), field.template());
    }
    Value::Object(map)
}

fn check_fields(
    fields: &[SchemaField],
    map: &Map<String, Value>,
    parent: &str,
    warnings: &mut Vec<String>,
) {
    for field in fields {
        let path = if parent.is_empty() {
            field.name.clone()
        } else {
            format!("{}.{}", parent, field.name)
        };

        match map.get(&field.name) {
            Some(value) => field.check(value, &path, warnings),
            None if field.required => warnings.push(format!("{}: missing required field", path)),
            None => {}
        }
    }
}

fn kind_name(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "string",
        FieldKind::Integer => "integer",
        FieldKind::Number => "number",
        FieldKind::Enum(_) => "enumerated string",
        FieldKind::TextList => "list of strings",
        FieldKind::Object(_) => "object",
        FieldKind::ObjectList(_) => "list of objects",
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Tool descriptor and tool result types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Declared type of a tool parameter, as read from the tool's JSON schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParamType {
    Integer,
    Number,
    Array,
    String,
    /// Any other schema type (`boolean`, `object`, ...). Values are stringified.
    Other(String),
}

impl ParamType {
    /// Map a JSON-schema `type` keyword onto a parameter type.
    pub fn from_schema_type(ty: &str) -> Self {
        match ty {
            "integer" => Self::Integer,
            "number" => Self::Number,
            "array" => Self::Array,
            "string" => Self::String,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Array => "array",
            Self::String => "string",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ParamType {
    fn from(ty: String) -> Self {
        Self::from_schema_type(&ty)
    }
}

impl From<ParamType> for String {
    fn from(ty: ParamType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: ParamType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
        }
    }
}

/// Description of a tool exposed by the tool server.
///
/// Parameters keep the order in which the server declared them; the model
/// supplies positional values that are matched against this order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// Create a descriptor with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.params.push(ParamSpec::new(name, ty));
        self
    }

    /// Build a descriptor from a JSON-schema `inputSchema`.
    ///
    /// Properties are read in declaration order. A property without a
    /// `type` is treated as a string; a schema without `properties` yields
    /// a tool with no parameters.
    pub fn from_input_schema(
        name: impl Into<String>,
        description: Option<String>,
        schema: &Value,
    ) -> Self {
        let params = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(param_name, info)| ParamSpec {
                        name: param_name.clone(),
                        ty: ParamType::from_schema_type(
                            info.get("type").and_then(Value::as_str).unwrap_or("string"),
                        ),
                        description: info
                            .get("description")
                            .and_then(Value::as_str)
                            .map(String::from),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.into(),
            description: description.unwrap_or_else(|| "No description available".to_string()),
            params,
        }
    }

    /// `name(a: integer, b: integer)` style signature.
    pub fn signature(&self) -> String {
        if self.params.is_empty() {
            return format!("{}(no parameters)", self.name);
        }
        let params = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", self.name, params)
    }
}

/// One item of a tool result's `content` sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Remaining fields (`data`, `mimeType`, `resource`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
            extra: Map::new(),
        }
    }

    /// Text form of the item: its text if it has one, otherwise its JSON.
    pub fn to_text(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => serde_json::to_string(self).unwrap_or_else(|_| format!("<{}>", self.kind)),
        }
    }
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    /// A sequence of content items.
    Content(Vec<ContentItem>),
    /// An opaque value with no content sequence.
    Value(Value),
}

impl ToolResult {
    /// Render the result as the text folded into the iteration trace.
    ///
    /// Content sequences render as `[a, b, c]`; opaque values are
    /// stringified directly.
    pub fn to_text(&self) -> String {
        match self {
            Self::Content(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(ContentItem::to_text)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Value(Value::String(s)) => s.clone(),
            Self::Value(value) => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_input_schema_keeps_order() {
        let schema = json!({
            "type": "object",
            "properties": {
                "text": {"type": "string"},
                "b": {"type": "integer", "description": "second"},
                "a": {"type": "number"}
            }
        });
        let tool = ToolDescriptor::from_input_schema("f", Some("does f".into()), &schema);
        let names: Vec<_> = tool.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["text", "b", "a"]);
        assert_eq!(tool.params[1].ty, ParamType::Integer);
        assert_eq!(tool.params[1].description.as_deref(), Some("second"));
        assert_eq!(tool.signature(), "f(text: string, b: integer, a: number)");
    }

    #[test]
    fn test_from_input_schema_defaults() {
        let tool = ToolDescriptor::from_input_schema(
            "open_paint",
            None,
            &json!({"type": "object"}),
        );
        assert!(tool.params.is_empty());
        assert_eq!(tool.description, "No description available");
        assert_eq!(tool.signature(), "open_paint(no parameters)");

        let tool = ToolDescriptor::from_input_schema(
            "echo",
            None,
            &json!({"properties": {"msg": {}}}),
        );
        assert_eq!(tool.params[0].ty, ParamType::String);
    }

    #[test]
    fn test_param_type_other() {
        let ty = ParamType::from_schema_type("boolean");
        assert_eq!(ty, ParamType::Other("boolean".into()));
        assert_eq!(ty.to_string(), "boolean");
    }

    #[test]
    fn test_content_item_deserialize() {
        let item: ContentItem = serde_json::from_value(json!({"type": "text", "text": "5"})).unwrap();
        assert_eq!(item, ContentItem::text("5"));

        let item: ContentItem =
            serde_json::from_value(json!({"type": "image", "data": "AA==", "mimeType": "image/png"}))
                .unwrap();
        assert_eq!(item.kind, "image");
        assert!(item.text.is_none());
        assert!(item.to_text().contains("image/png"));
    }

    #[test]
    fn test_tool_result_to_text() {
        let result = ToolResult::Content(vec![ContentItem::text("73"), ContentItem::text("78")]);
        assert_eq!(result.to_text(), "[73, 78]");

        let result = ToolResult::Content(vec![ContentItem::text("5")]);
        assert_eq!(result.to_text(), "[5]");

        assert_eq!(ToolResult::Value(json!("done")).to_text(), "done");
        assert_eq!(ToolResult::Value(json!({"ok": true})).to_text(), r#"{"ok":true}"#);
    }
}

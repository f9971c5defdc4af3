//! One-line response protocol
//!
//! Every model reply must be exactly one line of JSON whose `type` field is
//! either `FUNCTION_CALL` or `FINAL_ANSWER`. Anything else is rejected with
//! `EngineError::MalformedResponse`.

use sdk::errors::EngineError;
use serde::Deserialize;
use serde_json::Value;

/// A parsed model reply
#[derive(Debug, Clone, PartialEq)]
pub enum AgentMessage {
    /// Call a tool with positional, still untyped parameters.
    FunctionCall {
        name: String,
        parameters: Vec<Value>,
        reasoning_type: String,
    },

    /// Stop and report an answer.
    FinalAnswer {
        value: String,
        reasoning_type: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum WireMessage {
    #[serde(rename = "FUNCTION_CALL")]
    FunctionCall {
        name: String,
        parameters: Vec<Value>,
        #[serde(default)]
        reasoning_type: Option<String>,
    },

    #[serde(rename = "FINAL_ANSWER")]
    FinalAnswer {
        final_answer: Value,
        #[serde(default)]
        reasoning_type: Option<String>,
    },
}

/// Parse a raw completion into an `AgentMessage`.
///
/// Leading and trailing whitespace is ignored; any interior line break is
/// a protocol violation.
pub fn parse_response(text: &str) -> Result<AgentMessage, EngineError> {
    let line = text.trim();

    if line.is_empty() {
        return Err(EngineError::MalformedResponse("empty response".to_string()));
    }
    if line.contains('\n') {
        return Err(EngineError::MalformedResponse(
            "response spans multiple lines".to_string(),
        ));
    }

    let message: WireMessage = serde_json::from_str(line)
        .map_err(|e| EngineError::MalformedResponse(e.to_string()))?;

    Ok(match message {
        WireMessage::FunctionCall {
            name,
            parameters,
            reasoning_type,
        } => AgentMessage::FunctionCall {
            name,
            parameters,
            reasoning_type: reasoning_type.unwrap_or_default(),
        },
        WireMessage::FinalAnswer {
            final_answer,
            reasoning_type,
        } => AgentMessage::FinalAnswer {
            value: match final_answer {
                Value::String(s) => s,
                other => other.to_string(),
            },
            reasoning_type: reasoning_type.unwrap_or_default(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_function_call() {
        let msg = parse_response(
            r#"{"type":"FUNCTION_CALL","name":"add","parameters":[2,3],"reasoning_type":"arithmetic"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            AgentMessage::FunctionCall {
                name: "add".into(),
                parameters: vec![json!(2), json!(3)],
                reasoning_type: "arithmetic".into(),
            }
        );
    }

    #[test]
    fn test_parse_final_answer() {
        let msg = parse_response(
            "  {\"type\":\"FINAL_ANSWER\",\"final_answer\":\"42\",\"reasoning_type\":\"arithmetic\"}\n",
        )
        .unwrap();
        assert_eq!(
            msg,
            AgentMessage::FinalAnswer {
                value: "42".into(),
                reasoning_type: "arithmetic".into(),
            }
        );
    }

    #[test]
    fn test_non_string_final_answer_is_stringified() {
        let msg = parse_response(r#"{"type":"FINAL_ANSWER","final_answer":7.5}"#).unwrap();
        assert_eq!(msg, AgentMessage::FinalAnswer { value: "7.5".into(), reasoning_type: String::new() });
    }

    #[test]
    fn test_missing_reasoning_type_defaults_to_empty() {
        let msg =
            parse_response(r#"{"type":"FUNCTION_CALL","name":"open_paint","parameters":[]}"#).unwrap();
        assert!(matches!(
            msg,
            AgentMessage::FunctionCall { reasoning_type, .. } if reasoning_type.is_empty()
        ));
    }

    #[test]
    fn test_not_json_is_malformed() {
        let err = parse_response("not json at all").unwrap_err();
        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[test]
    fn test_rejected_shapes() {
        let cases = [
            "",
            r#"{"type":"THINK","thought":"hmm"}"#,
            r#"{"name":"add","parameters":[1,2]}"#,
            r#"{"type":"FUNCTION_CALL","parameters":[1,2]}"#,
            r#"{"type":"FUNCTION_CALL","name":"add"}"#,
            r#"{"type":"FUNCTION_CALL","name":"add","parameters":{"a":1}}"#,
            r#"{"type":"FINAL_ANSWER","reasoning_type":"x"}"#,
            "{\"type\":\"FINAL_ANSWER\",\n\"final_answer\":\"1\"}",
            r#"Sure! {"type":"FINAL_ANSWER","final_answer":"1"}"#,
            r#"[{"type":"FINAL_ANSWER","final_answer":"1"}]"#,
        ];
        for case in cases {
            let result = parse_response(case);
            assert!(
                matches!(result, Err(EngineError::MalformedResponse(_))),
                "accepted {:?}",
                case
            );
        }
    }
}

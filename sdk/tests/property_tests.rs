use proptest::prelude::*;
use sdk::errors::{EngineError, RelayErrorExt};
use sdk::types::{ParamType, ToolDescriptor};

// Every error kind carries a non-empty, static user hint that never echoes
// the raw detail text.
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "[a-zA-Z0-9 ]{8,40}") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::LLMProvider(error_str.clone()),
            EngineError::MalformedResponse(error_str.clone()),
            EngineError::UnknownTool(error_str.clone()),
            EngineError::ToolChannel(error_str.clone()),
            EngineError::ToolInvocation { tool: "t".into(), message: error_str.clone() },
            EngineError::TypeMismatch {
                tool: "t".into(),
                param: "p".into(),
                expected: "integer".into(),
                value: error_str.clone(),
            },
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            prop_assert!(!hint.contains(&error_str));
        }
    }
}

// Parameters come out of a schema in the order the server declared them,
// whatever the names are.
proptest! {
    #[test]
    fn test_schema_property_order_is_preserved(
        names in prop::collection::hash_set("[a-z][a-z0-9_]{0,11}", 1..8),
        type_seed in any::<u64>(),
    ) {
        let kinds = ["integer", "number", "array", "string", "boolean"];
        let names: Vec<String> = names.into_iter().collect();

        let mut props = serde_json::Map::new();
        for (i, name) in names.iter().enumerate() {
            let kind = kinds[((type_seed as usize) + i) % kinds.len()];
            props.insert(name.clone(), serde_json::json!({ "type": kind }));
        }
        let schema = serde_json::json!({ "type": "object", "properties": props });

        let tool = ToolDescriptor::from_input_schema("t", None, &schema);

        let parsed: Vec<&str> = tool.params.iter().map(|p| p.name.as_str()).collect();
        let expected: Vec<&str> = names.iter().map(String::as_str).collect();
        prop_assert_eq!(parsed, expected);

        for (i, param) in tool.params.iter().enumerate() {
            let kind = kinds[((type_seed as usize) + i) % kinds.len()];
            prop_assert_eq!(param.ty.clone(), ParamType::from_schema_type(kind));
        }
    }
}

//! Prompt construction
//!
//! The system prompt lists the tools and fixes the one-line reply format.
//! Each completion request is the system prompt followed by the current
//! query, which grows by one sentence per iteration.

use super::registry::ToolRegistry;

pub const FUNCTION_CALL_FORMAT: &str = r#"{"type": "FUNCTION_CALL", "name": "function_name", "parameters": [param1, param2, ...], "reasoning_type": "type_of_reasoning"}"#;
pub const FINAL_ANSWER_FORMAT: &str =
    r#"{"type": "FINAL_ANSWER", "final_answer": "answer", "reasoning_type": "type_of_reasoning"}"#;

const EXAMPLES: &[&str] = &[
    "User: Find the ASCII values of characters in INDIA and then return sum of exponentials of those values.",
    r#"Assistant: {"type": "FUNCTION_CALL", "name": "strings_to_chars_to_int", "parameters": ["INDIA"], "reasoning_type": "lookup"}"#,
    "User: Result is [73, 78, 68, 73, 65]. Verify this step. What should I do next?",
    r#"Assistant: {"type": "FUNCTION_CALL", "name": "int_list_to_exponential_sum", "parameters": [[73, 78, 68, 73, 65]], "reasoning_type": "arithmetic"}"#,
    "User: Result is [7.59982224609308e+33]. What should I do next?",
    r#"Assistant: {"type": "FINAL_ANSWER", "final_answer": "7.59982224609308e+33", "reasoning_type": "arithmetic"}"#,
];

/// Build the system prompt for the registry's tools.
pub fn build_system_prompt(registry: &ToolRegistry) -> String {
    let mut parts = vec![
        "You are a reasoning agent that solves problems step by step.".to_string(),
        "You have access to various tools.".to_string(),
        "Available tools:".to_string(),
        registry.describe(),
        String::new(),
        "You must respond with EXACTLY ONE line in one of these formats (no additional text):"
            .to_string(),
        "1. For function calls:".to_string(),
        FUNCTION_CALL_FORMAT.to_string(),
        String::new(),
        "2. For final answers:".to_string(),
        FINAL_ANSWER_FORMAT.to_string(),
        String::new(),
        "Instructions:".to_string(),
        "- Classify each step with \"reasoning_type\" (e.g., \"lookup\", \"arithmetic\", \"string\", \"drawing\", \"control\").".to_string(),
        "- Pass parameters positionally, in the order the tool declares them.".to_string(),
        "- Verify each result before using it. If a function output looks incorrect or out of expected range, repeat the call or choose an alternative.".to_string(),
        "- Before returning the final answer, cross-check it with a second method or a sanity check.".to_string(),
        "- If a tool fails or returns an unexpected value, retry with adjusted parameters, or return \"final_answer\": \"UNKNOWN\" with \"reasoning_type\": \"error_handling\".".to_string(),
        String::new(),
        "Output Rules:".to_string(),
        "- Your entire response must be a single line of JSON with no newlines.".to_string(),
        "- Do not repeat a function call with the same parameters unless verifying.".to_string(),
        "- Do not include any explanations or additional text.".to_string(),
        String::new(),
        "Format Examples:".to_string(),
    ];

    parts.extend(EXAMPLES.iter().map(|line| format!("- {}", line)));
    parts.join("\n")
}

/// Full text of one completion request.
pub fn build_prompt(system_prompt: &str, current_query: &str) -> String {
    format!(
        "{}\n\nQuery: {}\n\nWhat should I do next ? ",
        system_prompt, current_query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::types::{ParamType, ToolDescriptor};

    #[test]
    fn test_system_prompt_lists_tools_and_formats() {
        let registry = ToolRegistry::new(vec![ToolDescriptor::new("add", "Add two numbers")
            .with_param("a", ParamType::Integer)
            .with_param("b", ParamType::Integer)]);
        let prompt = build_system_prompt(&registry);

        assert!(prompt.contains("1. add(a: integer, b: integer) - Add two numbers"));
        assert!(prompt.contains(FUNCTION_CALL_FORMAT));
        assert!(prompt.contains(FINAL_ANSWER_FORMAT));
    }

    #[test]
    fn test_example_replies_follow_protocol() {
        for line in EXAMPLES.iter().filter_map(|l| l.strip_prefix("Assistant: ")) {
            assert!(super::super::protocol::parse_response(line).is_ok(), "{}", line);
        }
    }

    #[test]
    fn test_build_prompt() {
        assert_eq!(
            build_prompt("SYS", "What is 2+3?"),
            "SYS\n\nQuery: What is 2+3?\n\nWhat should I do next ? "
        );
    }
}

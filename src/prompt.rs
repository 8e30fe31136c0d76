//! Completion request construction.
//!
//! Every question is sent with the same system prompt, a single `get_answer` tool whose
//! parameters are `{ "answer": string }`, a forced tool choice naming that tool, and
//! temperature 0. The tool call is what keeps the model's output machine-readable.

use once_cell::sync::Lazy;
use serde_json::json;

use crate::models::chat::{ChatCompletionRequest, ChatMessage, FunctionDef, ToolChoice, ToolDefinition};

/// Model used when no override is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Name of the single tool the model is forced to call.
pub const ANSWER_TOOL_NAME: &str = "get_answer";

/// Instruction prompt sent as the first message of every request.
pub const SYSTEM_PROMPT: &str = r#"- You are an LLM agent solving assignment questions for IIT Madras' Online Degree course in Data Science, specifically in the "Tools in Data Science" course.
- Your task is to accurately answer questions from the graded assignments.
- You will be provided with a question and an optional file if needed.

How to approach a problem:
1. Focus on accuracy and precision.
2. If the question involves calculations, code or anything else, execute it and provide the final answer.
3. Check your result before committing to it.

Output format:
1. Your response must be structured as a JSON object with a single key: "answer".
2. Return only the final answer inside the "answer" key. Do not include explanations or formatting.
3. Your response must follow this JSON format:
   {
     "answer": "Your final answer here"
   }
"#;

static ANSWER_TOOL: Lazy<ToolDefinition> = Lazy::new(|| ToolDefinition::Function {
    function: FunctionDef {
        name: ANSWER_TOOL_NAME.to_string(),
        description: Some("Returns a JSON object containing only the final answer".to_string()),
        parameters: json!({
            "type": "object",
            "properties": {
                "answer": {
                    "type": "string",
                    "description": "The final answer to the question"
                }
            },
            "required": ["answer"]
        }),
    },
});

/// The `get_answer` tool definition.
pub fn answer_tool() -> ToolDefinition {
    ANSWER_TOOL.clone()
}

/// Build the completion request for `question` against the default model.
pub fn build(question: &str) -> ChatCompletionRequest {
    build_request(question, DEFAULT_MODEL)
}

/// Build the completion request for `question` against `model`.
///
/// The question is passed through untouched: no trimming, truncation or escaping.
pub fn build_request(question: &str, model: &str) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(question)],
        temperature: Some(0.0),
        tools: Some(vec![answer_tool()]),
        tool_choice: Some(ToolChoice::function(ANSWER_TOOL_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;

    #[test]
    fn question_is_second_message_verbatim() {
        for q in ["", "plain", "with \"quotes\"\nand\nnewlines", "ünïcødé ✓"] {
            let req = build(q);
            assert_eq!(req.messages.len(), 2);
            assert_eq!(req.messages[0].role, Role::System);
            assert_eq!(req.messages[1].role, Role::User);
            assert_eq!(req.messages[1].content, q);
        }
    }

    #[test]
    fn wire_body_matches_completion_contract() {
        let v = serde_json::to_value(build("How many Wednesdays?")).unwrap();
        assert_eq!(v["model"], "gpt-4o-mini");
        assert_eq!(v["temperature"], json!(0.0));
        assert_eq!(v["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(
            v["tool_choice"],
            json!({"type": "function", "function": {"name": "get_answer"}})
        );
        let tools = v["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["name"], "get_answer");
        assert_eq!(
            tools[0]["function"]["parameters"]["properties"]["answer"]["type"],
            "string"
        );
        assert_eq!(tools[0]["function"]["parameters"]["required"], json!(["answer"]));
    }

    #[test]
    fn model_override_is_honoured() {
        let req = build_request("q", "gpt-4.1-nano");
        assert_eq!(req.model, "gpt-4.1-nano");
    }

    #[test]
    fn system_prompt_asks_for_answer_key_only() {
        assert!(SYSTEM_PROMPT.contains("single key: \"answer\""));
    }
}

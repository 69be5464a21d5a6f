//! Prompt assembly for the Generator: system constraints, one format-priming
//! few-shot, and user content built from requirement + plan + base prompt.

use stc_core::{Case, ChatMessage};

const GENERATOR_SYSTEM_PROMPT: &str = "You are an expert CODESYS Structured Text developer. Output only \
Structured Text, with no markdown headings. You may declare local VARs but must not modify VAR_INPUT, \
VAR_OUTPUT, or VAR_IN_OUT blocks. Use RETURN; only inside a FUNCTION. Always place your code inside a single \
triple-backtick fenced block. Never emit a METHOD when the target is a FUNCTION or FUNCTION_BLOCK.";

const FEW_SHOT_USER: &str = "Continue writing the following code:\n\n```\nFUNCTION FUN_Noop : BOOL\n```";
const FEW_SHOT_ASSISTANT: &str = "```\nFUN_Noop := TRUE;\nEND_FUNCTION\n```";

/// Render retrieved documents as ST line comments ahead of `provide_code`, per
/// the documented rendering decision (comments, placed before the stub).
pub fn build_base_prompt(provide_code: &str, retrieved_texts: &[&str]) -> String {
    let mut parts = Vec::new();
    for (idx, text) in retrieved_texts.iter().enumerate() {
        parts.push(format!("(* retrieved reference {} *)", idx + 1));
        for line in text.lines() {
            parts.push(format!("(* {line} *)"));
        }
    }
    parts.push(provide_code.trim_end().to_string());
    parts.join("\n")
}

pub fn build_user_prompt(case: &Case, plan_text: Option<&str>, base_prompt: &str) -> String {
    let mut sections = vec![format!(
        "This is the known requirement information for the function to be completed:\n{}",
        case.requirement.trim()
    )];

    if let Some(plan) = plan_text {
        sections.push(format!(
            "This provides you with a plan of execution. The following is the plan of implementation steps:\n{}",
            plan.trim()
        ));
    }

    sections.push(format!("Continue writing the following code:\n\n```\n{base_prompt}\n```"));
    sections.join("\n\n")
}

pub fn build_messages(case: &Case, plan_text: Option<&str>, base_prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(GENERATOR_SYSTEM_PROMPT),
        ChatMessage::user(FEW_SHOT_USER),
        ChatMessage::assistant(FEW_SHOT_ASSISTANT),
        ChatMessage::user(build_user_prompt(case, plan_text, base_prompt)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use stc_core::FunctionType;

    fn sample_case() -> Case {
        Case {
            task_id: "FB_Counter".into(),
            function_name: "FB_Counter".into(),
            function_type: FunctionType::FunctionBlock,
            requirement: "Count up on enable.".into(),
            provide_code: "FUNCTION_BLOCK FB_Counter\nVAR_INPUT\nEND_VAR\n".into(),
            ground_truth: String::new(),
        }
    }

    #[test]
    fn base_prompt_places_retrieved_docs_before_stub_as_comments() {
        let base = build_base_prompt("FUNCTION_BLOCK FB_Counter\n", &["IF x THEN y; END_IF"]);
        let stub_pos = base.find("FUNCTION_BLOCK FB_Counter").unwrap();
        let comment_pos = base.find("(* retrieved reference 1 *)").unwrap();
        assert!(comment_pos < stub_pos);
        assert!(base.contains("(* IF x THEN y; END_IF *)"));
    }

    #[test]
    fn user_prompt_includes_plan_section_only_when_present() {
        let case = sample_case();
        let without_plan = build_user_prompt(&case, None, "stub");
        assert!(!without_plan.contains("plan of implementation"));

        let with_plan = build_user_prompt(&case, Some("1. do it"), "stub");
        assert!(with_plan.contains("plan of implementation"));
        assert!(with_plan.contains("1. do it"));
    }

    #[test]
    fn messages_start_with_system_then_few_shot() {
        let case = sample_case();
        let messages = build_messages(&case, None, "stub");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].content, GENERATOR_SYSTEM_PROMPT);
    }
}

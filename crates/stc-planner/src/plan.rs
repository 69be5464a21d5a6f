//! Builds the planning prompt and drives the LLM call that produces a
//! numbered implementation-step plan for one case.

use stc_core::{Case, ChatMessage, ContextWindow, FunctionType};
use stc_llm::{LlmClient, LlmError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Llm(#[from] LlmError),
}

fn function_type_label(ft: FunctionType) -> &'static str {
    match ft {
        FunctionType::Function => "function",
        FunctionType::FunctionBlock => "function_block",
        FunctionType::Method => "method",
    }
}

pub fn build_planning_prompt(case: &Case, project_name: &str, contexts: &[ContextWindow]) -> String {
    let context_section = if contexts.is_empty() {
        "(no call-site context found; plan from requirement and declaration alone)".to_string()
    } else {
        contexts
            .iter()
            .enumerate()
            .map(|(idx, ctx)| {
                format!(
                    "[Context fragment {}]\n- file: {}\n- line: {}\n- kind: {:?}\n```st\n{}\n```",
                    idx + 1,
                    ctx.file_path.display(),
                    ctx.line_number,
                    ctx.context_type,
                    ctx.code_window.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        "You are a senior IEC 61131-3 / CODESYS Structured Text architect. Write an \
implementation step plan for a function/function block that will guide later code \
generation toward the real reference implementation.\n\n\
==== Basic info ====\n\
- Project: {project_name}\n\
- Function type: {function_type}\n\
- Function name: {function_name}\n\n\
==== Requirement ====\n{requirement}\n\n\
==== Existing declaration ====\n```st\n{provide_code}\n```\n\n\
==== Call-site context from the project ====\n{context_section}\n\n\
==== Rules ====\n\
1. Steps cover only the core execution logic: no constraints/assumptions prose, no \
restating the call site, no repeating a validation already implied by an earlier step.\n\
2. Each step names exactly one operation, plainly, with no filler.\n\
3. Variable names and types referenced must match the declaration or the call-site \
context exactly.\n\
4. Produce 3 to 6 steps total.\n\n\
==== Task ====\n\
Infer the responsibility of this function/function block from the requirement, \
declaration, and call-site context, then output a numbered step plan suitable for \
direct translation into ST. Do not output code, only steps.\n\n\
==== Output format ====\n\
Plan:\n1. ...\n2. ...\nN. ...",
        project_name = project_name,
        function_type = function_type_label(case.function_type),
        function_name = case.function_name,
        requirement = case.requirement.trim(),
        provide_code = case.provide_code.trim(),
        context_section = context_section,
    )
}

const PLANNER_SYSTEM_PROMPT: &str = "You are a senior architect familiar with CODESYS / IEC 61131-3 \
Structured Text, skilled at turning a requirement, a declaration stub, and call-site context into an \
implementation step plan for function blocks and functions.";

/// Call the LLM to produce a plan for `case`, returning the raw plan text.
pub fn generate_plan(
    llm: &dyn LlmClient,
    case: &Case,
    project_name: &str,
    contexts: &[ContextWindow],
) -> Result<(String, String), PlanError> {
    let prompt = build_planning_prompt(case, project_name, contexts);
    let messages = [ChatMessage::system(PLANNER_SYSTEM_PROMPT), ChatMessage::user(prompt.clone())];
    let plan_text = llm.complete_chat(&messages)?;
    Ok((plan_text, prompt))
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
            requirement: "Count up on enable, reset to zero on reset.".into(),
            provide_code: "FUNCTION_BLOCK FB_Counter\nVAR_INPUT\n  bEnable : BOOL;\nEND_VAR\n".into(),
            ground_truth: String::new(),
        }
    }

    #[test]
    fn prompt_contains_all_sections() {
        let prompt = build_planning_prompt(&sample_case(), "counter", &[]);
        assert!(prompt.contains("Project: counter"));
        assert!(prompt.contains("Function name: FB_Counter"));
        assert!(prompt.contains("Count up on enable"));
        assert!(prompt.contains("no call-site context found"));
    }

    struct FakeLlm(&'static str);
    impl LlmClient for FakeLlm {
        fn complete_chat(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn generate_plan_returns_llm_text_and_prompt() {
        let (plan_text, prompt) = generate_plan(&FakeLlm("Plan:\n1. Do it."), &sample_case(), "counter", &[]).unwrap();
        assert_eq!(plan_text, "Plan:\n1. Do it.");
        assert!(prompt.contains("Task"));
    }
}

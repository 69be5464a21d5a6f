//! Repair-prompt assembly: error list rendering, fixed system instructions,
//! and the optional library-reference section.

use stc_core::CompileError;

pub const REPAIR_SYSTEM_PROMPT: &str = "You are repairing Structured Text for the CODESYS target platform \
(commonly deployed to Beckhoff, WAGO, or Schneider controllers). You will be given the current source and a \
list of compile errors. Rules:\n\
1. The content inside <code_segment> must be copied verbatim from the current source — do not paraphrase it.\n\
2. Do not alter control logic unless the error requires it.\n\
3. You may reason about how one error cascades into another.\n\
4. Output one or more fix pairs in exactly this format, one per suggestion:\n\
(1)\n<code_segment>\n...\n</code_segment>\n<patch>\n...\n</patch>\n(2)\n...";

fn render_error(err: &CompileError) -> String {
    format!("[{:?}] (line {}) {}\n{}", err.error_type, err.line_no, err.error_desc, err.code_window)
}

pub fn render_errors(errors: &[CompileError]) -> String {
    errors.iter().map(render_error).collect::<Vec<_>>().join("\n\n")
}

pub fn build_repair_user_prompt(code: &str, errors: &[CompileError], library_section: Option<&str>) -> String {
    let mut sections = vec![
        format!("Current ST source:\n```st\n{code}\n```"),
        format!("Compile errors:\n{}", render_errors(errors)),
    ];
    if let Some(section) = library_section {
        sections.push(section.to_string());
    }
    sections.join("\n\n")
}

//! Prompts for the coding assistant panel.

/// Ask the model to explain and fix an execution error.
pub fn explain_error_prompt(language: &str, code: &str, error: &str) -> String {
    format!(
        "I encountered an error in my {language} code. Can you help me understand and fix it?\n\n\
         **Programming Language:** {language}\n\n\
         **Full Code:**\n```{language}\n{code}\n```\n\n\
         **Error Message:**\n{error}\n"
    )
}

/// Ask the model a question about a selected snippet in context.
pub fn ask_about_selection_prompt(
    language: &str,
    code: &str,
    selection: &str,
    question: &str,
) -> String {
    format!(
        "You are an expert code assistant. A user has selected a specific part of their code \
         and has a question.\nProvide a concise and helpful answer.\n\n\
         **Programming Language:** {language}\n\n\
         **Full Code Context:**\n```{language}\n{code}\n```\n\n\
         **Selected Code Snippet:**\n```{language}\n{selection}\n```\n\n\
         **User's Question:**\n{question}\n"
    )
}

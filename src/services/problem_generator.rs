//! Contest problem generation through the LLM collaborator.

use tracing::{info, warn};

use crate::models::contest::{Difficulty, Problem};
use crate::services::llm::{CompletionProvider, LlmError};

/// Problem generation errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Generated problem is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Generated problem has no title")]
    MissingTitle,

    #[error("Generated problem has no test cases")]
    NoTestCases,
}

/// Compose the generation prompt. Previously attempted titles are listed so
/// the model avoids repeating them.
pub fn build_prompt(difficulty: Difficulty, topic: &str, previous_titles: &[String]) -> String {
    let level = difficulty.as_str();
    let exclusions = if previous_titles.is_empty() {
        String::new()
    } else {
        let list: Vec<String> = previous_titles
            .iter()
            .enumerate()
            .map(|(i, title)| format!("{}. {}", i + 1, title))
            .collect();
        format!(
            "\n\nIMPORTANT: The user has already attempted the following problems. \
             DO NOT generate any of these problems again:\n{}\n\n\
             Generate a COMPLETELY DIFFERENT problem that is NOT in the above list.",
            list.join("\n")
        )
    };

    format!(
        r##"Generate a {level} level DSA problem on the topic: {topic}.{exclusions}

Please provide the response in the following JSON format (make sure it's valid JSON):
{{
  "title": "Problem Title",
  "description": "Detailed problem description. DO NOT include examples in the description - they will be shown separately. Use PLAIN TEXT only - no markdown symbols. Explain the problem clearly, specify input format, output format, and constraints.",
  "difficulty": "{level}",
  "topic": "{topic}",
  "testCases": [
    {{ "input": "test input 1", "expectedOutput": "expected output 1", "isHidden": false }},
    {{ "input": "test input 2", "expectedOutput": "expected output 2", "isHidden": false }},
    {{ "input": "test input 3", "expectedOutput": "expected output 3", "isHidden": true }}
  ],
  "starterCode": {{
    "python": "# Read input\n# Write your solution here\n# Print output\n",
    "javascript": "// Read input\n// Write your solution here\n// Print output\n",
    "cpp": "#include <iostream>\nusing namespace std;\n\nint main() {{\n    // Read input\n    // Write your solution here\n    // Print output\n    return 0;\n}}",
    "java": "import java.util.*;\n\npublic class Main {{\n    public static void main(String[] args) {{\n        Scanner sc = new Scanner(System.in);\n        // Read input\n        // Write your solution here\n        // Print output\n    }}\n}}"
  }}
}}

IMPORTANT:
- Use PLAIN TEXT in the description - NO markdown formatting symbols
- DO NOT include example test cases in the description - they will be displayed separately below
- Make the problem clear and well-defined
- Test cases should have simple input/output (numbers, strings, arrays as space-separated values)
- Clearly specify input format, output format, and constraints in the description
- Output should be a single line
- Make sure the problem is appropriate for {level} level and focuses on {topic}"##
    )
}

/// Pull the JSON payload out of a response that may be wrapped in a
/// ```` ```json ```` or bare ```` ``` ```` fence.
pub fn extract_json(response: &str) -> &str {
    fenced(response, "```json").or_else(|| fenced(response, "```")).unwrap_or(response).trim()
}

fn fenced<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let body = &text[start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Remove markdown emphasis, inline code and heading markers.
pub fn strip_markdown(text: &str) -> String {
    let text = unwrap_delimited(text, "**");
    let text = unwrap_delimited(&text, "*");
    let text = unwrap_delimited(&text, "`");
    strip_heading_markers(&text).trim().to_string()
}

/// Replace `<d>inner<d>` with `inner` when `inner` is a non-empty run on a
/// single line. Unpaired delimiters are kept.
fn unwrap_delimited(text: &str, delim: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(delim) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + delim.len()..];

        let first_len = after.chars().next().filter(|c| *c != '\n').map(char::len_utf8);
        let closing = first_len.and_then(|skip| {
            let line_end = after.find('\n').unwrap_or(after.len());
            after[skip..line_end].find(delim).map(|i| i + skip)
        });

        match closing {
            Some(end) => {
                out.push_str(&after[..end]);
                rest = &after[end + delim.len()..];
            }
            None => {
                // Not an opener here; keep one character and rescan.
                let c_len = rest[pos..].chars().next().map_or(1, char::len_utf8);
                out.push_str(&rest[pos..pos + c_len]);
                rest = &rest[pos + c_len..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Drop runs of `#` together with the whitespace that follows them.
fn strip_heading_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '#' {
            out.push(c);
            continue;
        }
        while chars.next_if_eq(&'#').is_some() {}
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    out
}

/// Parse and sanitize a model response into a problem.
pub fn parse_problem(
    response: &str,
    difficulty: Difficulty,
    topic: &str,
) -> Result<Problem, GenerationError> {
    let mut problem: Problem = serde_json::from_str(extract_json(response))?;

    if problem.title.trim().is_empty() {
        return Err(GenerationError::MissingTitle);
    }
    if problem.test_cases.is_empty() {
        return Err(GenerationError::NoTestCases);
    }

    problem.title = problem.title.trim().to_string();
    problem.description = strip_markdown(&problem.description);
    if problem.topic.trim().is_empty() {
        problem.topic = topic.to_string();
    }
    if problem.difficulty.trim().is_empty() {
        problem.difficulty = difficulty.as_str().to_string();
    }

    Ok(problem)
}

/// Ask the model for one new problem. A malformed answer is not retried.
pub async fn generate(
    provider: &dyn CompletionProvider,
    difficulty: Difficulty,
    topic: &str,
    previous_titles: &[String],
) -> Result<Problem, GenerationError> {
    let prompt = build_prompt(difficulty, topic, previous_titles);
    let response = provider.prompt(&prompt).await?;

    match parse_problem(&response, difficulty, topic) {
        Ok(problem) => {
            info!(title = %problem.title, %difficulty, topic, "Generated contest problem");
            Ok(problem)
        }
        Err(e) => {
            warn!("Rejected generated problem: {}", e);
            Err(e)
        }
    }
}

//! Cleanup of raw model output.

/// Normalises the SQL generation output.
///
/// The text is trimmed. If the whole response is a single Markdown code
/// block (with or without a language tag) the block's content is returned
/// instead. Anything else is left as is, so prose around a code block still
/// fails the validation gate.
pub fn clean_sql_output(response: &str) -> String {
    let trimmed = response.trim();

    match unwrap_code_fence(trimmed) {
        Some(inner) => inner.trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Returns the content of a response made of exactly one fenced block.
fn unwrap_code_fence(text: &str) -> Option<&str> {
    let body = text.strip_prefix("```")?.strip_suffix("```")?;

    // The opening fence line may carry a language tag.
    let newline = body.find('\n')?;
    let tag = &body[..newline];
    if tag.contains('`') || tag.trim().contains(char::is_whitespace) {
        return None;
    }

    let content = &body[newline + 1..];
    if content.contains("```") {
        return None;
    }

    Some(content)
}

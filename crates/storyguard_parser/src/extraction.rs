//! Locating JSON inside an LLM reply.
//!
//! Replies often wrap their JSON in markdown code blocks or surround it with
//! explanatory text. These helpers find the candidate JSON text; they do not
//! parse it.

/// Extract content from a markdown code block.
///
/// Handles fences with or without a language tag:
/// - ```json\n...\n```
/// - ``` ... ``` (no language specified)
///
/// A missing closing fence (a truncated response) yields everything after
/// the opening fence.
///
/// # Examples
///
/// ```
/// use storyguard_parser::extract_from_code_block;
///
/// let reply = "Here you go:\n```json\n{\"narrative\": \"Rain.\"}\n```\nEnjoy!";
/// assert_eq!(extract_from_code_block(reply), Some("{\"narrative\": \"Rain.\"}"));
/// assert_eq!(extract_from_code_block("no fences here"), None);
/// ```
pub fn extract_from_code_block(response: &str) -> Option<&str> {
    let start = response.find("```")?;
    let after_fence = start + 3;
    let rest = &response[after_fence..];

    // Skip the language tag unless the payload starts on the fence line
    let content_start = if rest.trim_start().starts_with(['{', '[']) {
        after_fence
    } else {
        rest.find('\n')
            .map(|n| after_fence + n + 1)
            .unwrap_or(response.len())
    };

    let content = match response[content_start..].find("```") {
        Some(end) => &response[content_start..content_start + end],
        // No closing fence found - likely truncated response
        None => &response[content_start..],
    };

    Some(content.trim())
}

/// Extract content between balanced delimiters.
///
/// Finds the first occurrence of `open` and returns the text up to the
/// matching `close`, skipping delimiters inside JSON strings. Returns `None`
/// if the delimiters never balance.
///
/// # Examples
///
/// ```
/// use storyguard_parser::extract_balanced;
///
/// let reply = r#"Sure! {"narrative": "A {curious} door", "n": {"x": 1}} done"#;
/// assert_eq!(
///     extract_balanced(reply, '{', '}'),
///     Some(r#"{"narrative": "A {curious} door", "n": {"x": 1}}"#)
/// );
/// ```
pub fn extract_balanced(response: &str, open: char, close: char) -> Option<&str> {
    let start = response.find(open)?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&response[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_block_without_language() {
        let response = "```\n{\"narrative\": \"x\"}\n```";
        assert_eq!(extract_from_code_block(response), Some("{\"narrative\": \"x\"}"));
    }

    #[test]
    fn test_code_block_payload_on_fence_line() {
        let response = "```{\"narrative\": \"x\"}```";
        assert_eq!(extract_from_code_block(response), Some("{\"narrative\": \"x\"}"));
    }

    #[test]
    fn test_truncated_code_block() {
        let response = "```json\n{\"narrative\": \"The door";
        assert_eq!(extract_from_code_block(response), Some("{\"narrative\": \"The door"));
    }

    #[test]
    fn test_balanced_with_string_escapes() {
        let response = r#"{"text": "She said \"}\" twice"} trailing"#;
        assert_eq!(
            extract_balanced(response, '{', '}'),
            Some(r#"{"text": "She said \"}\" twice"}"#)
        );
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(extract_balanced(r#"{"narrative": "cut off"#, '{', '}'), None);
    }
}

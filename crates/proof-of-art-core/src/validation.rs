//! Request validation shared by the orchestrator and the catalog.

use crate::error::ValidationError;
use crate::hash::normalize_prompt;

/// Maximum prompt length in characters, after trimming.
pub const MAX_PROMPT_CHARS: usize = 1000;

/// Check a prompt and return its normalized form.
///
/// Length is counted in characters, not bytes.
pub fn validate_prompt(prompt: &str) -> Result<&str, ValidationError> {
    let normalized = normalize_prompt(prompt);
    let len = normalized.chars().count();
    if len == 0 {
        return Err(ValidationError::EmptyPrompt);
    }
    if len > MAX_PROMPT_CHARS {
        return Err(ValidationError::PromptTooLong {
            len,
            max: MAX_PROMPT_CHARS,
        });
    }
    Ok(normalized)
}

/// Check a model identifier is present.
pub fn validate_model_id(model: &str) -> Result<&str, ValidationError> {
    let model = model.trim();
    if model.is_empty() {
        return Err(ValidationError::EmptyModel);
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_bounds() {
        assert_eq!(validate_prompt("  a red cube  "), Ok("a red cube"));
        assert_eq!(validate_prompt("   "), Err(ValidationError::EmptyPrompt));
        assert!(validate_prompt(&"x".repeat(MAX_PROMPT_CHARS)).is_ok());
        assert_eq!(
            validate_prompt(&"x".repeat(MAX_PROMPT_CHARS + 1)),
            Err(ValidationError::PromptTooLong {
                len: MAX_PROMPT_CHARS + 1,
                max: MAX_PROMPT_CHARS
            })
        );
    }

    #[test]
    fn test_prompt_counts_characters() {
        // 1000 multi-byte characters is within bounds.
        assert!(validate_prompt(&"é".repeat(MAX_PROMPT_CHARS)).is_ok());
    }

    #[test]
    fn test_model_id() {
        assert_eq!(validate_model_id(" dall-e-3 "), Ok("dall-e-3"));
        assert_eq!(validate_model_id(""), Err(ValidationError::EmptyModel));
    }
}

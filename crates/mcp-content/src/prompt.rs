//! Prompt templates served through `prompts/get`.

/// Name of the general-purpose query prompt.
pub const QUERY_PROMPT_NAME: &str = "query";

const QUERY_PROMPT: &str = "You are an AI assistant that helps users query information from various sources.\n\
Please respond to the user's query in a helpful, accurate, and concise manner.\n\
If you don't know the answer, it's better to say so than to make up information.\n\
Always cite your sources when providing factual information.";

/// Render the query prompt, optionally focused on a topic.
pub fn query_prompt(topic: Option<&str>) -> String {
    match topic.map(str::trim).filter(|t| !t.is_empty()) {
        Some(topic) => format!("{QUERY_PROMPT}\n\nThe user's query concerns: {topic}"),
        None => QUERY_PROMPT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_prompt_plain() {
        let text = query_prompt(None);
        assert!(text.starts_with("You are an AI assistant"));
        assert!(!text.contains("concerns"));
    }

    #[test]
    fn test_query_prompt_topic() {
        let text = query_prompt(Some("  rust lifetimes "));
        assert!(text.ends_with("The user's query concerns: rust lifetimes"));
    }

    #[test]
    fn test_query_prompt_blank_topic_ignored() {
        assert_eq!(query_prompt(Some("   ")), query_prompt(None));
    }
}

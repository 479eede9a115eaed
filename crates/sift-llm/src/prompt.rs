//! Prompt shared by the completion-based scorers.

/// Instruction asking the model to rate `text` against `topic` with a bare number.
pub fn similarity_prompt(text: &str, topic: &str) -> String {
    format!(
        "Rate how semantically close the message \"{}\" is to the topic \"{}\".\n\
         Reply with a single number from 0.0 to 1.0, where 1.0 means the message is \
         about the topic and 0.0 means it is unrelated. Do not add any other text.",
        text.replace('"', "'"),
        topic.replace('"', "'")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_quotes_inputs() {
        let prompt = similarity_prompt("Собрание в \"15:00\"", "встреча");
        assert!(prompt.contains("\"Собрание в '15:00'\""));
        assert!(prompt.contains("\"встреча\""));
        assert!(prompt.contains("0.0 to 1.0"));
    }
}

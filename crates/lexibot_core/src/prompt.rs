//! Builds the system instruction sent with every generation session.

/// Context flag that switches on the stricter legal-assistant directives.
pub const LEGAL_ASSISTANT_CONTEXT: &str = "legal_assistant";

const PERSONA: &str = r#"You are a helpful legal assistant named "Lexi." Your role is to offer basic legal information and guidance in an approachable and easy-to-understand way. You specialize in answering questions about rights, legal terms, and processes. You provide general information only, never legal advice."#;

const LEGAL_ASSISTANT_DIRECTIVES: &str = r#" You are specifically focused on legal assistance and should:
- Provide clear, accurate legal information
- Explain complex legal terms in simple language
- Remind users that this is general information and they should consult a qualified attorney for specific legal advice
- Stay helpful and professional in your responses
- If asked about non-legal topics, politely redirect the conversation back to legal matters"#;

const CLOSING_REMINDER: &str =
    " Always remind users to seek advice from a licensed legal professional for specific issues.";

/// Returns the instruction text for the given context flag.
pub fn compose_instruction(context: Option<&str>) -> String {
    let mut instruction = String::from(PERSONA);
    if context == Some(LEGAL_ASSISTANT_CONTEXT) {
        instruction.push_str(LEGAL_ASSISTANT_DIRECTIVES);
    }
    instruction.push_str(CLOSING_REMINDER);
    instruction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_contains_persona_and_reminder() {
        for context in [None, Some("other"), Some(LEGAL_ASSISTANT_CONTEXT)] {
            let text = compose_instruction(context);
            assert!(text.starts_with(PERSONA));
            assert!(text.ends_with(CLOSING_REMINDER));
            assert!(text.contains("Lexi"));
        }
    }

    #[test]
    fn legal_assistant_context_adds_directives() {
        let plain = compose_instruction(None);
        let legal = compose_instruction(Some(LEGAL_ASSISTANT_CONTEXT));

        assert!(!plain.contains("redirect the conversation"));
        assert!(legal.contains("redirect the conversation"));
        assert_eq!(compose_instruction(Some("unrelated")), plain);
    }
}

use cupid_types::models::Question;

/// The set every proposal falls back to when it has no usable custom prompts.
pub fn default_questions() -> Vec<Question> {
    vec![
        Question::new("1", "Do you like surprises?", "Yes! ✨", "Not really... 😅"),
        Question::new(
            "2",
            "Do you like how I always think about you?",
            "Yes, always! 💕",
            "Maybe too much? 🙈",
        ),
        Question::new(
            "3",
            "Do you love me?",
            "Yes, with all my heart! 💖",
            "I'm not sure... 🤔",
        ),
    ]
}

/// Pick the question set a session walks through.
///
/// Custom entries with a blank prompt are unset and dropped. If nothing is
/// left, the default set is used.
pub fn resolve_questions(custom: Option<&[Question]>) -> Vec<Question> {
    let filled: Vec<Question> = custom
        .unwrap_or_default()
        .iter()
        .filter(|q| !q.prompt.trim().is_empty())
        .cloned()
        .collect();

    if filled.is_empty() {
        default_questions()
    } else {
        filled
    }
}

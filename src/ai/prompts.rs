/// System prompt for item stories
pub fn story_system() -> String {
    "You are a storyteller for an art and culture museum guide. You write engaging, \
     accurate narratives for a general audience. Respond in plain prose paragraphs \
     without markdown headings."
        .to_string()
}

/// Story about one catalog item, with optional encyclopedia background
pub fn story(title: &str, category: &str, background: &str) -> String {
    let background = if background.trim().is_empty() {
        "none available".to_string()
    } else {
        background.trim().to_string()
    };
    format!(
        "Create a compelling story about \"{}\" from the collection \"{}\".\n\n\
         Background information:\n{}\n\n\
         The story should:\n\
         1. Introduce the art or cultural tradition\n\
         2. Explain its historical significance\n\
         3. Describe its cultural impact\n\
         4. Include interesting facts and details\n\
         5. Conclude with its modern relevance\n\n\
         Write a clear, engaging narrative of four to six paragraphs.",
        title, category, background
    )
}

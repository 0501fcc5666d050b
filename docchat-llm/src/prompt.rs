/// Reply shown to the user whenever generation fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error processing your request.";

/// Build the text submitted to the model.
///
/// With non-empty context the question is wrapped in the context template;
/// otherwise the prompt is sent unmodified.
pub fn build_prompt(prompt: &str, context: Option<&str>) -> String {
    match context.filter(|context| !context.is_empty()) {
        Some(context) => format!("Context: {context}\n\nQuestion: {prompt}\nAnswer:"),
        None => prompt.to_owned(),
    }
}

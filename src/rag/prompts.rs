use crate::docs::types::DocumentChunk;

/// Stuff the retrieved chunks into the answer template.
pub fn render_answer_prompt(chunks: &[&DocumentChunk], question: &str) -> String {
    let context = chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Answer the following question based only on the provided context:\n\
         <context>\n{}\n</context>\n\
         Question: {}",
        context, question
    )
}

//! Question answering over the index.
//!
//! [`QueryEngine`] ties the embedder, vector store, and generator together:
//! embed the question, pull the nearest chunks, render them into a prompt,
//! and hand off to the language model. The query path always returns answer
//! text — no retrieved context short-circuits with a fixed response, and a
//! generation failure is rendered inline instead of propagating.

use anyhow::Result;

use crate::embedding::Embedder;
use crate::llm::Generator;
use crate::store::VectorStore;

/// Instructions given to the language model on every query.
pub const SYSTEM_PROMPT: &str = "\
You are a helpful assistant that answers questions based on the provided context.

Rules:
1. ONLY use information from the provided context to answer
2. If the context doesn't contain enough information, say \"I don't have enough information to answer that based on your documents.\"
3. Be specific and quote from the context when relevant
4. If asked about dates, grades, or specific facts, provide exact values from the context
5. Keep answers concise but complete";

/// Returned when retrieval finds nothing; generation is never invoked.
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find any relevant information in your documents. \
     Make sure you've ingested some documents first.";

/// A retrieved chunk ready for prompt assembly.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    pub text: String,
    /// Display label for attribution (the source file name).
    pub source_label: String,
    pub distance: f32,
}

/// Retrieval-augmented answer pipeline over one store, embedder, and
/// generator, all borrowed from the caller for the engine's lifetime.
pub struct QueryEngine<'a> {
    store: &'a VectorStore,
    embedder: &'a dyn Embedder,
    generator: &'a dyn Generator,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        store: &'a VectorStore,
        embedder: &'a dyn Embedder,
        generator: &'a dyn Generator,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
        }
    }

    /// Embed the question and fetch the `top_k` nearest chunks, ascending by
    /// distance. Empty when the index is empty.
    pub async fn retrieve_context(
        &self,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedContext>> {
        let query_vec = self.embedder.embed_one(question).await?;
        let hits = self.store.query(&query_vec, top_k, None).await?;

        Ok(hits
            .into_iter()
            .map(|hit| RetrievedContext {
                text: hit.text,
                source_label: hit.metadata.filename,
                distance: hit.distance,
            })
            .collect())
    }

    /// Render the user prompt: numbered, source-attributed context blocks
    /// followed by the question. Pure formatting, deterministic.
    pub fn build_prompt(question: &str, contexts: &[RetrievedContext]) -> String {
        let context_blocks: Vec<String> = contexts
            .iter()
            .enumerate()
            .map(|(i, ctx)| format!("[{}] From {}:\n{}", i + 1, ctx.source_label, ctx.text))
            .collect();

        format!(
            "Context from your documents:\n---\n{}\n---\n\nQuestion: {}\n\nAnswer based on the context above:",
            context_blocks.join("\n\n"),
            question
        )
    }

    /// Answer a question end to end.
    ///
    /// Retrieval and index errors propagate; generation failures are caught
    /// and rendered into the returned string. With `include_sources`, the
    /// deduplicated source labels actually used are appended.
    pub async fn answer(
        &self,
        question: &str,
        top_k: usize,
        include_sources: bool,
    ) -> Result<String> {
        let contexts = self.retrieve_context(question, top_k).await?;

        if contexts.is_empty() {
            return Ok(NO_CONTEXT_ANSWER.to_string());
        }

        let prompt = Self::build_prompt(question, &contexts);

        let mut answer = match self.generator.generate(SYSTEM_PROMPT, &prompt).await {
            Ok(text) => text,
            Err(e) => format!(
                "Error getting a response from the language model: {}\n\n\
                 Make sure Ollama is running (`ollama serve`) or your OpenAI key is set.",
                e
            ),
        };

        if include_sources {
            let mut sources: Vec<&str> = Vec::new();
            for ctx in &contexts {
                if !sources.contains(&ctx.source_label.as_str()) {
                    sources.push(&ctx.source_label);
                }
            }
            answer.push_str(&format!("\n\nSources: {}", sources.join(", ")));
        }

        Ok(answer)
    }
}

/// CLI wrapper: answer one question and print it.
pub async fn run_query(
    store: &VectorStore,
    embedder: &dyn Embedder,
    generator: &dyn Generator,
    question: &str,
    top_k: usize,
    include_sources: bool,
) -> Result<()> {
    let engine = QueryEngine::new(store, embedder, generator);

    println!("Question: {}\n", question);
    let answer = engine.answer(question, top_k, include_sources).await?;
    println!("{}", answer);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(text: &str, label: &str) -> RetrievedContext {
        RetrievedContext {
            text: text.to_string(),
            source_label: label.to_string(),
            distance: 0.1,
        }
    }

    #[test]
    fn prompt_numbers_and_attributes_contexts() {
        let contexts = vec![
            ctx("Alice studied Biology.", "resume.pdf"),
            ctx("She graduated in 2020.", "notes.md"),
        ];
        let prompt = QueryEngine::build_prompt("Where did Alice study?", &contexts);

        assert!(prompt.contains("[1] From resume.pdf:\nAlice studied Biology."));
        assert!(prompt.contains("[2] From notes.md:\nShe graduated in 2020."));
        assert!(prompt.ends_with("Question: Where did Alice study?\n\nAnswer based on the context above:"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let contexts = vec![ctx("Some text.", "a.txt")];
        let a = QueryEngine::build_prompt("q", &contexts);
        let b = QueryEngine::build_prompt("q", &contexts);
        assert_eq!(a, b);
    }
}

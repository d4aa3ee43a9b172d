//! Retrieval-augmented answer composition.
//!
//! [`KnowledgeChatbot::ask`] retrieves the top chunks for a question, renders
//! them as numbered `[Context i]:` blocks, embeds them in a fixed instruction
//! template that restricts the model to the supplied context, and delegates
//! to the [`TextGenerator`].
//!
//! Two outcomes never reach the generator: an empty knowledge base, and a
//! non-empty one whose documents produced no chunks.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{KnowledgeError, Result};
use crate::generation::{GenerationOptions, GenerationRequest, TextGenerator};
use crate::models::RetrievalCandidate;
use crate::retrieve::DEFAULT_TOP_K;
use crate::store::{KnowledgeStore, Retrieval};

pub const EMPTY_KNOWLEDGE_BASE_NOTICE: &str =
    "⚠️ Knowledge base is empty. Please upload documents first using /api/chatbot/upload";

pub const NO_RELEVANT_INFORMATION_NOTICE: &str =
    "I couldn't find relevant information in the knowledge base to answer your question.";

const PROMPT_PREAMBLE: &str =
    "You are a helpful AI assistant that answers questions based ONLY on the provided context.";

const PROMPT_INSTRUCTIONS: &str = "Instructions:
- Answer the question using ONLY information from the provided context
- If the context doesn't contain enough information, say so honestly
- Be concise and accurate
- Cite which context section you used if relevant
- DO NOT make up information or use external knowledge";

/// Result of asking the knowledge base a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Generated(String),
    EmptyKnowledgeBase,
    NoRelevantInformation,
}

impl Answer {
    /// User-facing text for this answer.
    pub fn text(&self) -> &str {
        match self {
            Answer::Generated(text) => text,
            Answer::EmptyKnowledgeBase => EMPTY_KNOWLEDGE_BASE_NOTICE,
            Answer::NoRelevantInformation => NO_RELEVANT_INFORMATION_NOTICE,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Answer::Generated(text) => text,
            other => other.text().to_string(),
        }
    }
}

/// Render candidates as `[Context i]:` blocks separated by a blank line.
pub fn build_context(candidates: &[RetrievalCandidate]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[Context {}]:\n{}", i + 1, c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Embed a rendered context block and the literal question in the template.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "{PROMPT_PREAMBLE}\n\nContext from knowledge base:\n{context}\n\nUser Question: {question}\n\n{PROMPT_INSTRUCTIONS}\n\nAnswer:\n"
    )
}

/// Question-answering service over a shared [`KnowledgeStore`].
pub struct KnowledgeChatbot {
    store: Arc<KnowledgeStore>,
    generator: Arc<dyn TextGenerator>,
    top_k: usize,
    options: GenerationOptions,
}

impl KnowledgeChatbot {
    pub fn new(store: Arc<KnowledgeStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            store,
            generator,
            top_k: DEFAULT_TOP_K,
            options: GenerationOptions::CHATBOT,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Answer `question` from the knowledge base.
    ///
    /// # Errors
    ///
    /// - [`KnowledgeError::Validation`] for a blank question.
    /// - [`KnowledgeError::Generation`] when the completion call fails;
    ///   the failure is passed through unchanged.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(KnowledgeError::Validation(
                "question must not be empty".to_string(),
            ));
        }

        let candidates = match self.store.retrieve(question, self.top_k) {
            Retrieval::EmptyStore => return Ok(Answer::EmptyKnowledgeBase),
            Retrieval::Candidates(c) if c.is_empty() => return Ok(Answer::NoRelevantInformation),
            Retrieval::Candidates(c) => c,
        };

        let request = GenerationRequest {
            system: None,
            prompt: build_prompt(&build_context(&candidates), question),
            options: self.options,
        };
        debug!(
            contexts = candidates.len(),
            prompt_chars = request.prompt.len(),
            "composing answer"
        );

        let text = self.generator.complete(&request).await.map_err(|e| {
            warn!(error = %e, "answer generation failed");
            e
        })?;
        Ok(Answer::Generated(text))
    }

    /// Filenames of every stored document.
    pub fn sources(&self) -> Vec<String> {
        self.store.get_sources()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::num::NonZeroUsize;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::GenerationError;

    /// Records every request and replies with a fixed string or failure.
    pub(crate) struct RecordingGenerator {
        pub requests: Mutex<Vec<GenerationRequest>>,
        reply: std::result::Result<String, String>,
    }

    impl RecordingGenerator {
        pub(crate) fn replying(text: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                reply: Ok(text.to_string()),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                reply: Err(message.to_string()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub(crate) fn last(&self) -> GenerationRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        fn model_name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            request: &GenerationRequest,
        ) -> std::result::Result<String, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply
                .clone()
                .map_err(GenerationError::Transport)
        }
    }

    fn chatbot(generator: &Arc<RecordingGenerator>) -> KnowledgeChatbot {
        let store = Arc::new(KnowledgeStore::default());
        KnowledgeChatbot::new(store, generator.clone())
    }

    #[test]
    fn context_blocks_are_numbered_and_separated() {
        let candidates = vec![
            RetrievalCandidate {
                text: "first chunk".to_string(),
                source: "a.txt".to_string(),
                score: 2,
            },
            RetrievalCandidate {
                text: "second chunk".to_string(),
                source: "b.txt".to_string(),
                score: 1,
            },
        ];
        assert_eq!(
            build_context(&candidates),
            "[Context 1]:\nfirst chunk\n\n[Context 2]:\nsecond chunk"
        );
    }

    #[test]
    fn prompt_matches_template() {
        let prompt = build_prompt("[Context 1]:\nabc", "why?");
        let expected = "You are a helpful AI assistant that answers questions based ONLY on the provided context.

Context from knowledge base:
[Context 1]:
abc

User Question: why?

Instructions:
- Answer the question using ONLY information from the provided context
- If the context doesn't contain enough information, say so honestly
- Be concise and accurate
- Cite which context section you used if relevant
- DO NOT make up information or use external knowledge

Answer:
";
        assert_eq!(prompt, expected);
    }

    #[tokio::test]
    async fn empty_store_never_calls_generator() {
        let generator = Arc::new(RecordingGenerator::replying("unused"));
        let bot = chatbot(&generator);

        let answer = bot.ask("what is anything?").await.unwrap();
        assert_eq!(answer, Answer::EmptyKnowledgeBase);
        assert_eq!(answer.text(), EMPTY_KNOWLEDGE_BASE_NOTICE);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn chunkless_store_reports_no_relevant_information() {
        let generator = Arc::new(RecordingGenerator::replying("unused"));
        let bot = chatbot(&generator);
        bot.store().add_text("blank.txt", String::new());

        let answer = bot.ask("anything").await.unwrap();
        assert_eq!(answer, Answer::NoRelevantInformation);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn single_document_scenario() {
        let generator = Arc::new(RecordingGenerator::replying("They sleep a lot."));
        let bot = chatbot(&generator);
        bot.store()
            .add_text("doc.txt", "cats are small pets. cats sleep a lot.".to_string());

        let hits = bot.store().search("what do cats do", 3);
        assert!(hits
            .iter()
            .any(|c| c.text.contains("cats") && c.text.contains("sleep")));

        let answer = bot.ask("what do cats do").await.unwrap();
        assert_eq!(answer, Answer::Generated("They sleep a lot.".to_string()));
        assert_eq!(generator.calls(), 1);

        let request = generator.last();
        assert_eq!(request.prompt.matches("[Context 1]:").count(), 1);
        assert!(!request.prompt.contains("[Context 2]:"));
        assert!(request
            .prompt
            .contains("[Context 1]:\ncats are small pets. cats sleep a lot."));
        assert!(request.prompt.contains("User Question: what do cats do\n"));
        assert_eq!(request.options, GenerationOptions::CHATBOT);
        assert!(request.system.is_none());
    }

    #[tokio::test]
    async fn contexts_follow_retrieval_order() {
        let generator = Arc::new(RecordingGenerator::replying("ok"));
        let store = Arc::new(KnowledgeStore::new(NonZeroUsize::new(2).unwrap()));
        store.add_text("a.txt", "red green blue yellow".to_string());
        let bot = KnowledgeChatbot::new(store, generator.clone()).with_top_k(2);

        bot.ask("blue yellow").await.unwrap();
        let prompt = generator.last().prompt;
        assert!(prompt.contains("[Context 1]:\nblue yellow\n\n[Context 2]:\nred green"));
    }

    #[tokio::test]
    async fn generation_failure_propagates() {
        let generator = Arc::new(RecordingGenerator::failing("quota exceeded"));
        let bot = chatbot(&generator);
        bot.store().add_text("a.txt", "alpha beta".to_string());

        let err = bot.ask("alpha").await.unwrap_err();
        assert!(matches!(
            err,
            KnowledgeError::Generation(GenerationError::Transport(ref m)) if m == "quota exceeded"
        ));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let generator = Arc::new(RecordingGenerator::replying("unused"));
        let bot = chatbot(&generator);
        bot.store().add_text("a.txt", "alpha".to_string());

        let err = bot.ask("   ").await.unwrap_err();
        assert!(matches!(err, KnowledgeError::Validation(_)));
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn sentinel_answers_render_notices() {
        assert_eq!(
            Answer::NoRelevantInformation.into_text(),
            NO_RELEVANT_INFORMATION_NOTICE
        );
        assert_eq!(Answer::Generated("x".into()).into_text(), "x");
    }
}

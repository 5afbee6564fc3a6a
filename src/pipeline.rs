//! The question answering pipeline
//!
//! [`ComplaintPipeline`] is the online facade: retrieve sources for a
//! question, assemble the prompt, generate an answer. Everything the
//! pipeline needs is owned by the pipeline object; nothing lives in global
//! state, so two pipelines with different stores or models coexist in one
//! process.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::embed::Embedder;
use crate::generate::{GenerationOptions, Generator, GENERATION_ERROR_ANSWER};
use crate::prompt::build_prompt;
use crate::retrieve::{RetrievedSource, Retriever, DEFAULT_TOP_K};
use crate::store::ComplaintStore;
use crate::{Error, Result};

/// A generated answer together with the evidence behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The question as asked
    pub question: String,
    /// The generated answer, or the fallback answer if generation failed
    pub answer: String,
    /// The sources the answer was generated from, ordered by distance
    pub retrieved_sources: Vec<RetrievedSource>,
}

/// Facade over retrieval, prompt assembly, and generation
pub struct ComplaintPipeline<E: Embedder, G: Generator> {
    retriever: Retriever<E>,
    generator: G,
    options: GenerationOptions,
}

impl<E: Embedder, G: Generator> ComplaintPipeline<E, G> {
    /// Answer a question using the default number of retrieved sources
    pub fn answer(&self, question: &str) -> Result<Answer> {
        self.answer_question(question, DEFAULT_TOP_K)
    }

    /// Answer a question from the `top_k` most relevant complaint excerpts.
    ///
    /// Retrieval failure is an error carrying the question. Generation
    /// failure is not: the pipeline degrades to the fallback answer and
    /// keeps the retrieved sources, because the evidence is still useful
    /// without the synthesis.
    pub fn answer_question(&self, question: &str, top_k: usize) -> Result<Answer> {
        let sources = self.retriever.retrieve_for_question(question, top_k)?;
        let prompt = build_prompt(question, &sources);

        let answer = match self.generator.generate(&prompt, &self.options) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "generation failed, returning fallback answer");
                GENERATION_ERROR_ANSWER.to_string()
            }
        };

        info!(
            question_chars = question.chars().count(),
            sources = sources.len(),
            answer_chars = answer.chars().count(),
            "answered question"
        );
        Ok(Answer {
            question: question.to_string(),
            answer,
            retrieved_sources: sources,
        })
    }

    /// Retrieve sources for a question without generating an answer
    pub fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedSource>> {
        self.retriever.retrieve_for_question(question, top_k)
    }

    /// The underlying store
    #[must_use]
    pub fn store(&self) -> &ComplaintStore {
        self.retriever.store()
    }

    /// The generation options in effect
    #[must_use]
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }
}

/// Builder for [`ComplaintPipeline`]
#[derive(Debug)]
pub struct PipelineBuilder<E: Embedder, G: Generator> {
    store: Option<ComplaintStore>,
    embedder: Option<E>,
    generator: Option<G>,
    options: GenerationOptions,
}

impl<E: Embedder, G: Generator> Default for PipelineBuilder<E, G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Embedder, G: Generator> PipelineBuilder<E, G> {
    /// Create a new pipeline builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: None,
            embedder: None,
            generator: None,
            options: GenerationOptions::default(),
        }
    }

    /// Set the complaint store
    #[must_use]
    pub fn store(mut self, store: ComplaintStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the embedder (must match the one that built the store)
    #[must_use]
    pub fn embedder(mut self, embedder: E) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the generator
    #[must_use]
    pub fn generator(mut self, generator: G) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the generation options
    #[must_use]
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the sampling temperature, keeping other options
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = temperature;
        self
    }

    /// Set the cap on newly generated tokens, keeping other options
    #[must_use]
    pub fn max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.options.max_new_tokens = max_new_tokens;
        self
    }

    /// Build the pipeline.
    ///
    /// Fails if a component is missing or the embedder dimension does not
    /// match the store index.
    pub fn build(self) -> Result<ComplaintPipeline<E, G>> {
        let store = self
            .store
            .ok_or_else(|| Error::InvalidConfig("store is required".to_string()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| Error::InvalidConfig("embedder is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| Error::InvalidConfig("generator is required".to_string()))?;

        let retriever = Retriever::new(store, embedder)?;
        Ok(ComplaintPipeline {
            retriever,
            generator,
            options: self.options,
        })
    }
}

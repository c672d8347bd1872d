/*!
 * Completion engine
 *
 * Ties the pieces together:
 * - classifying the typed text
 * - matching static vocabulary
 * - resolving identifiers against the background-loaded catalog
 */

use super::catalog::Catalog;
use super::context::{CandidatePool, ContextClassifier};
use super::error::CompletionError;
use super::loader::CatalogLoader;
use super::provider::CapabilityProvider;
use super::resolver::IdentifierResolver;
use super::suggestion::{emit_identifiers, emit_vocabulary, Candidate, Choices};
use super::vocabulary::{Vocabulary, VocabularyExtensions};
use std::sync::Arc;

pub struct CompletionEngine {
    loader: Arc<CatalogLoader>,
    classifier: ContextClassifier,
    vocabulary: Vocabulary,
}

impl CompletionEngine {
    /// Create the engine and start loading the catalog in the background.
    pub fn new(provider: Arc<dyn CapabilityProvider>, extensions: VocabularyExtensions) -> Self {
        let classifier = ContextClassifier::new(provider.sql_dialect());
        let loader = Arc::new(CatalogLoader::new(provider));
        loader.spawn_background();

        Self {
            loader,
            classifier,
            vocabulary: Vocabulary::new(extensions),
        }
    }

    /// Candidates for the text typed so far.
    ///
    /// Never fails and never waits for the background load: until the
    /// catalog is ready, identifier positions simply produce nothing.
    pub fn get_choices(&self, partial_text: &str) -> Choices<'_> {
        match self.classifier.classify(partial_text) {
            CandidatePool::Empty => Box::new(std::iter::empty::<Candidate>()),
            CandidatePool::Actions(word) => Box::new(emit_vocabulary(
                self.vocabulary.actions.iter().map(String::as_str),
                word,
            )),
            CandidatePool::AllVocabulary(word) => {
                Box::new(emit_vocabulary(self.vocabulary.all(), word))
            }
            CandidatePool::Identifiers(token) => {
                let catalog = self.loader.current();
                let provider = self.loader.provider();
                let resolution = IdentifierResolver::new(provider).resolve(token, catalog);
                Box::new(emit_identifiers(resolution, provider))
            }
        }
    }

    /// Rebuild the catalog on the calling thread.
    pub fn force_reload(&self) -> Result<Arc<Catalog>, CompletionError> {
        self.loader.load(true)
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.loader.snapshot()
    }

    pub fn db_support(&self) -> Option<bool> {
        self.loader.db_support()
    }

    /// Whether the initial background load has run (successfully or not).
    pub fn catalog_ready(&self) -> bool {
        self.loader.background_finished()
    }

    pub fn users(&self) -> anyhow::Result<Vec<String>> {
        self.loader.provider().fetch_users()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

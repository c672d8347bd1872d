/*!
 * SQL shell - context-aware completion module
 *
 * Suggests completions for partially typed SQL:
 * - statement-starting actions for the first word
 * - keywords, objects and functions elsewhere
 * - database, schema, table, column and index names for (dotted) identifiers,
 *   resolved against a catalog loaded in the background
 */

pub mod catalog;
pub mod context;
pub mod engine;
pub mod error;
pub mod helper;
pub mod loader;
pub mod provider;
pub mod resolver;
pub mod suggestion;
pub mod vocabulary;


// Re-export main interfaces
pub use engine::CompletionEngine;
pub use helper::SqlHelper;
pub use provider::CapabilityProvider;
pub use vocabulary::VocabularyExtensions;

/*!
 * Input context classification
 *
 * Decides which candidate pool applies to the text typed so far:
 * - a lone first word starts a new statement (actions only)
 * - a trailing identifier reference goes to the catalog
 * - anything else gets the whole vocabulary
 */

use super::error::CompletionError;
use sqlparser::dialect::Dialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};
use tracing::debug;

/// Which candidates to offer, and for which typed word.
#[derive(Debug, PartialEq, Eq)]
pub enum CandidatePool<'t> {
    Empty,
    /// Statement-starting actions, matched against the lone first word
    Actions(&'t str),
    /// Actions, objects, functions and keywords
    AllVocabulary(&'t str),
    /// Catalog names for a possibly dotted identifier
    Identifiers(&'t str),
}

/// Shape of the end of the last statement.
#[derive(Debug, PartialEq, Eq)]
pub enum StatementTail {
    /// Whitespace or a comment
    Blank,
    /// `*`
    Wildcard,
    /// `name`, `name.sub`, `db.schema.name`, possibly ending in `.`
    Identifier,
    Other,
}

pub struct ContextClassifier {
    dialect: Box<dyn Dialect>,
}

impl ContextClassifier {
    pub fn new(dialect: Box<dyn Dialect>) -> Self {
        Self { dialect }
    }

    pub fn classify<'t>(&self, text: &'t str) -> CandidatePool<'t> {
        let text = text.trim();
        let current_word = match text.split_whitespace().next_back() {
            Some(word) => word,
            None => return CandidatePool::Empty,
        };

        if current_word == text {
            return CandidatePool::Actions(current_word);
        }

        match statement_tail(self.dialect.as_ref(), text) {
            Ok(StatementTail::Blank | StatementTail::Wildcard) => CandidatePool::Empty,
            Ok(StatementTail::Identifier) => CandidatePool::Identifiers(current_word),
            Ok(StatementTail::Other) => CandidatePool::AllVocabulary(current_word),
            Err(e) => {
                debug!(error = %e, "no completion for untokenizable input");
                CandidatePool::Empty
            }
        }
    }
}

/// Tokenize `text` and describe how its last statement ends.
pub fn statement_tail(dialect: &dyn Dialect, text: &str) -> Result<StatementTail, CompletionError> {
    let tokens = Tokenizer::new(dialect, text)
        .tokenize()
        .map_err(|e| CompletionError::MalformedInput(e.to_string()))?;

    let statement = match tokens.iter().rposition(|t| *t == Token::SemiColon) {
        Some(i) => &tokens[i + 1..],
        None => &tokens[..],
    };

    let tail = match statement.last() {
        Some(Token::Whitespace(_)) => StatementTail::Blank,
        Some(Token::Mul) => StatementTail::Wildcard,
        Some(_) if ends_in_identifier(statement) => StatementTail::Identifier,
        _ => StatementTail::Other,
    };
    Ok(tail)
}

/// A run of words joined by periods, optionally ending in a period. A single
/// bare word only counts when it is quoted or not a keyword.
fn ends_in_identifier(statement: &[Token]) -> bool {
    let mut rest = statement;
    let mut dotted = false;

    if let [head @ .., Token::Period] = rest {
        rest = head;
        dotted = true;
    }

    let mut last_word = None;
    while let [head @ .., Token::Word(word)] = rest {
        last_word.get_or_insert(word);
        match head {
            [before @ .., Token::Period] => {
                rest = before;
                dotted = true;
            }
            _ => break,
        }
    }

    match last_word {
        Some(_) if dotted => true,
        Some(word) => word.quote_style.is_some() || word.keyword == Keyword::NoKeyword,
        None => false,
    }
}

/*!
 * Line editor helper
 *
 * Plugs the completion engine into rustyline: Tab completion, inline hints,
 * keyword highlighting and bracket validation.
 */

use super::engine::CompletionEngine;
use super::suggestion::Candidate;
use regex::Regex;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{Highlighter, MatchingBracketHighlighter};
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::validate::{self, MatchingBracketValidator, Validator};
use rustyline::Context;
use std::borrow::Cow;
use std::collections::HashSet;

/// Byte offset in `text` where a candidate replacing the last `chars`
/// characters starts.
pub fn replacement_start(text: &str, chars: usize) -> usize {
    if chars == 0 {
        return text.len();
    }
    text.char_indices()
        .nth_back(chars - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Keyword pattern for the highlighter; single upper-case words only.
fn keyword_pattern(engine: &CompletionEngine) -> Option<Regex> {
    let mut words: Vec<&str> = engine
        .vocabulary()
        .all()
        .filter(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_uppercase() || c == '_'))
        .collect();
    if words.is_empty() {
        return None;
    }
    words.sort_unstable();
    words.dedup();

    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{})\b", alternation)).ok()
}

/// SQL shell helper
pub struct SqlHelper {
    engine: CompletionEngine,
    keywords: Option<Regex>,
    highlighter: MatchingBracketHighlighter,
    validator: MatchingBracketValidator,
    hinter: HistoryHinter,
}

impl SqlHelper {
    pub fn new(engine: CompletionEngine) -> Self {
        let keywords = keyword_pattern(&engine);
        Self {
            engine,
            keywords,
            highlighter: MatchingBracketHighlighter::new(),
            validator: MatchingBracketValidator::new(),
            hinter: HistoryHinter::new(),
        }
    }

    pub fn engine(&self) -> &CompletionEngine {
        &self.engine
    }

    /// Deduplicated candidates for the text before the cursor, and where
    /// they start. Nothing is offered right after whitespace.
    pub fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<Candidate>) {
        let text = &line[..pos];
        if text.chars().last().map_or(true, char::is_whitespace) {
            return (pos, Vec::new());
        }

        let mut seen = HashSet::new();
        let mut replaces = 0;
        let mut candidates = Vec::new();
        for candidate in self.engine.get_choices(text) {
            replaces = candidate.replaces();
            if seen.insert(candidate.text.clone()) {
                candidates.push(candidate);
            }
        }

        (replacement_start(text, replaces), candidates)
    }
}

impl Completer for SqlHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let (start, candidates) = self.candidates(line, pos);
        let pairs = candidates
            .into_iter()
            .map(|c| Pair {
                display: c.text.clone(),
                replacement: c.text,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for SqlHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        if let Some(history_hint) = self.hinter.hint(line, pos, ctx) {
            return Some(history_hint);
        }

        if pos < line.len() {
            return None;
        }

        // Show the rest of the top candidate when it extends what was typed
        let (start, candidates) = self.candidates(line, pos);
        let typed = &line[start..pos];
        let top = candidates.first()?;
        if typed.is_empty() || !top.text.to_lowercase().starts_with(&typed.to_lowercase()) {
            return None;
        }
        top.text
            .get(typed.len()..)
            .filter(|rest| !rest.is_empty())
            .map(str::to_string)
    }
}

impl Highlighter for SqlHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        match &self.keywords {
            Some(re) => re.replace_all(line, "\x1b[1m$0\x1b[0m"),
            None => Cow::Borrowed(line),
        }
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Cow::Borrowed(prompt)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{}\x1b[0m", hint))
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: bool) -> bool {
        self.keywords.is_some() || self.highlighter.highlight_char(line, pos, forced)
    }
}

impl Validator for SqlHelper {
    fn validate(
        &self,
        ctx: &mut validate::ValidationContext,
    ) -> Result<validate::ValidationResult, ReadlineError> {
        self.validator.validate(ctx)
    }

    fn validate_while_typing(&self) -> bool {
        self.validator.validate_while_typing()
    }
}

impl rustyline::Helper for SqlHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::provider::CapabilityProvider;
    use crate::completion::vocabulary::VocabularyExtensions;
    use std::sync::Arc;

    struct NoCatalog;

    impl CapabilityProvider for NoCatalog {}

    fn helper() -> SqlHelper {
        SqlHelper::new(CompletionEngine::new(
            Arc::new(NoCatalog),
            VocabularyExtensions::default(),
        ))
    }

    #[test]
    fn test_replacement_start() {
        assert_eq!(replacement_start("SELECT us", 2), 7);
        assert_eq!(replacement_start("SELECT us", 0), 9);
        assert_eq!(replacement_start("größe", 3), 2);
        assert_eq!(replacement_start("ab", 5), 0);
    }

    #[test]
    fn test_candidates_replace_typed_word() {
        let h = helper();
        let line = "sel";
        let (start, candidates) = h.candidates(line, line.len());
        assert_eq!(start, 0);
        assert_eq!(candidates.len(), 4);

        let line = "SELECT id FROM users order";
        let (start, candidates) = h.candidates(line, line.len());
        assert_eq!(&line[start..], "order");
        assert_eq!(candidates, vec![Candidate::new("ORDER BY", -5)]);
    }

    #[test]
    fn test_no_candidates_after_whitespace() {
        let h = helper();
        assert!(h.candidates("sel ", 4).1.is_empty());
        assert!(h.candidates("", 0).1.is_empty());
    }

    #[test]
    fn test_highlight_bolds_keywords() {
        let h = helper();
        let out = h.highlight("SELECT name FROM users", 0);
        assert_eq!(out, "\x1b[1mSELECT\x1b[0m name \x1b[1mFROM\x1b[0m users");
        assert_eq!(h.highlight("select", 0), "select");
    }
}

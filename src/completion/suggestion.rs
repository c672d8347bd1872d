/*!
 * Completion candidates
 *
 * Turns a vocabulary list or resolved catalog names into a lazy stream of
 * weighted candidates. Nothing here does I/O.
 */

use super::provider::CapabilityProvider;
use super::resolver::Resolution;
use super::vocabulary::vocabulary_matches;

/// One completion candidate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Text to insert
    pub text: String,
    /// Negative length (in characters) of the typed prefix it replaces
    pub weight: i32,
}

impl Candidate {
    pub fn new(text: impl Into<String>, weight: i32) -> Self {
        Self {
            text: text.into(),
            weight,
        }
    }

    /// Number of characters before the cursor this candidate replaces.
    pub fn replaces(&self) -> usize {
        self.weight.unsigned_abs() as usize
    }
}

/// Lazy, single-use candidate stream
pub type Choices<'a> = Box<dyn Iterator<Item = Candidate> + 'a>;

pub fn weight_for(prefix: &str) -> i32 {
    -(prefix.chars().count() as i32)
}

/// Words matching `prefix` under the vocabulary rule, in declared order.
pub fn emit_vocabulary<'a, I>(words: I, prefix: &str) -> impl Iterator<Item = Candidate> + 'a
where
    I: Iterator<Item = &'a str> + 'a,
{
    let weight = weight_for(prefix);
    let prefix = prefix.to_string();
    words
        .filter(move |word| vocabulary_matches(word, &prefix))
        .map(move |word| Candidate::new(word, weight))
}

/// Resolved names, quoted by the dialect.
pub fn emit_identifiers<'a>(
    resolution: Resolution,
    provider: &'a dyn CapabilityProvider,
) -> impl Iterator<Item = Candidate> + 'a {
    let weight = weight_for(&resolution.prefix);
    resolution
        .names
        .into_iter()
        .map(move |name| Candidate::new(provider.quote_name(&name), weight))
}

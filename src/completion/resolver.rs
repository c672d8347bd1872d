/*!
 * Identifier resolution
 *
 * Narrows a partially typed, dot-qualified name against the catalog:
 * - `pre`            anything in the catalog starting with `pre`
 * - `name.pre`       anything below a node keyed `name`
 * - `db.schema.pre`  anything below `schema` inside database `db`
 *
 * Deeper qualification resolves to nothing.
 */

use super::catalog::{Catalog, Names};
use super::provider::CapabilityProvider;
use std::sync::Arc;
use tracing::trace;

/// Names found for a token, produced on demand, plus the (unquoted) prefix
/// they were matched against.
#[derive(Debug, Default)]
pub struct Resolution {
    pub names: Names,
    pub prefix: String,
}

pub struct IdentifierResolver<'a> {
    provider: &'a dyn CapabilityProvider,
}

impl<'a> IdentifierResolver<'a> {
    pub fn new(provider: &'a dyn CapabilityProvider) -> Self {
        Self { provider }
    }

    pub fn resolve(&self, token: &str, catalog: Arc<Catalog>) -> Resolution {
        let parts: Vec<&str> = token.split('.').collect();

        match parts.as_slice() {
            [prefix] => Resolution {
                names: Names::matching(catalog, prefix),
                prefix: prefix.to_string(),
            },
            [name, sub] => {
                let name = self.provider.unquote_name(name);
                let sub = self.provider.unquote_name(sub);
                Resolution {
                    names: Names::under(catalog, &name, &sub),
                    prefix: sub,
                }
            }
            [db, schema, name] if catalog.db_support() => {
                let db = self.provider.unquote_name(db);
                let schema = self.provider.unquote_name(schema);
                let name = self.provider.unquote_name(name);
                Resolution {
                    names: Names::under_database(catalog, &db, &schema, &name),
                    prefix: name,
                }
            }
            _ => {
                trace!(token, "qualification too deep for this catalog");
                Resolution::default()
            }
        }
    }
}

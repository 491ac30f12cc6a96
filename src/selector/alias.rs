use std::collections::HashMap;

use tracing::{debug, trace};

use super::query::{ElementQuery, Strategy};
use crate::error::SelectorError;

/// Alias name -> resolved query. Scoped to one suite run.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, ElementQuery>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) an alias.
    pub fn register(&mut self, name: impl Into<String>, query: ElementQuery) {
        let name = name.into();
        debug!(target: "uidsl::selector", alias = %name, query = %query, "Registered alias");
        self.entries.insert(name, query);
    }

    pub fn get(&self, name: &str) -> Option<&ElementQuery> {
        self.entries.get(name)
    }

    /// Replace an alias reference with the query it names. An index on the reference
    /// overrides the stored one. Other queries pass through unchanged.
    pub fn resolve(&self, query: &ElementQuery) -> Result<ElementQuery, SelectorError> {
        let Strategy::Alias(name) = &query.strategy else {
            return Ok(query.clone());
        };
        let stored = self
            .get(name)
            .ok_or_else(|| SelectorError::AliasNotFound(name.clone()))?;
        trace!(target: "uidsl::selector", alias = %name, query = %stored, "Resolved alias");
        Ok(match query.index {
            Some(index) => stored.clone().with_index(Some(index)),
            None => stored.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!(target: "uidsl::selector", count = self.entries.len(), "Clearing aliases");
        }
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_alias_is_an_error() {
        let table = AliasTable::new();
        assert_eq!(
            table.resolve(&ElementQuery::parse("alias:acct")),
            Err(SelectorError::AliasNotFound("acct".into()))
        );
    }

    #[test]
    fn registered_alias_resolves_and_index_overrides() {
        let mut table = AliasTable::new();
        table.register("acct", ElementQuery::parse("label:Account"));
        assert_eq!(
            table.resolve(&ElementQuery::parse("alias:acct")).unwrap(),
            ElementQuery::parse("label:Account")
        );
        assert_eq!(
            table.resolve(&ElementQuery::parse("alias:acct[2]")).unwrap().index,
            Some(2)
        );
        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn non_alias_queries_pass_through() {
        let table = AliasTable::new();
        let q = ElementQuery::parse("key:go");
        assert_eq!(table.resolve(&q).unwrap(), q);
    }
}

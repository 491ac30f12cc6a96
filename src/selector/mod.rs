//! Selector resolver: parses selector strings into typed element queries, keeps the alias
//! table, and matches queries against a surface's element tree.
//!
//! Parsing happens once per step; everything downstream works on `ElementQuery`.

pub mod alias;
pub mod matcher;
pub mod query;

pub use alias::AliasTable;
pub use matcher::find_matches;
pub use query::{ElementQuery, Strategy};

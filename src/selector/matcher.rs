use super::query::{ElementQuery, Strategy};
use crate::surface::{ElementNode, walk};

/// All elements matching the query's strategy, in document order. The index is not applied.
pub fn find_matches<'a>(roots: &'a [ElementNode], query: &ElementQuery) -> Vec<&'a ElementNode> {
    let mut out = Vec::new();
    walk(roots, &mut |node: &'a ElementNode| {
        if matches(node, &query.strategy) {
            out.push(node);
        }
    });
    out
}

fn matches(node: &ElementNode, strategy: &Strategy) -> bool {
    match strategy {
        Strategy::ExactText(v) => node.own_text().is_some_and(|t| t == *v),
        Strategy::ContainsText(v) => node.own_text().is_some_and(|t| t.contains(v.as_str())),
        Strategy::Key(v) => node.key.as_deref() == Some(v.as_str()),
        Strategy::Label(v) => node.label.as_deref() == Some(v.as_str()),
        Strategy::Type(kind) => node.kind == *kind,
        // Unresolved aliases never match; callers resolve them first.
        Strategy::UnknownType(_) | Strategy::Alias(_) => false,
    }
}

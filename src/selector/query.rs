use std::fmt;

use tracing::warn;

use crate::surface::ElementKind;

/// How a selector locates elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Element text equals the value.
    ExactText(String),
    /// Element text contains the value.
    ContainsText(String),
    /// Developer-assigned key / id.
    Key(String),
    /// Semantic (accessibility) label.
    Label(String),
    /// Element category from the friendly type-name allow-list.
    Type(ElementKind),
    /// A type name outside the allow-list. Matches nothing.
    UnknownType(String),
    /// Reference to a previously registered alias.
    Alias(String),
}

/// A parsed, strategy-tagged selector plus an optional zero-based occurrence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementQuery {
    pub strategy: Strategy,
    pub index: Option<usize>,
}

impl ElementQuery {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            index: None,
        }
    }

    pub fn exact_text(text: impl Into<String>) -> Self {
        Self::new(Strategy::ExactText(text.into()))
    }

    /// Any element that accepts text input.
    pub fn text_input() -> Self {
        Self::new(Strategy::Type(ElementKind::TextInput))
    }

    pub fn with_index(mut self, index: Option<usize>) -> Self {
        self.index = index;
        self
    }

    /// Parse a selector string.
    ///
    /// Grammar: `<text>`, `text:<t>`, `contains:<t>`, `key:<id>` / `id:<id>`, `label:<t>`,
    /// `type:<name>`, `alias:<name>`, each optionally suffixed with `[n]`. Only the first colon
    /// separates strategy from value. An unrecognized strategy token is treated as exact
    /// text over the whole selector.
    pub fn parse(raw: &str) -> Self {
        let (body, index) = split_index(raw);
        let Some((token, value)) = body.split_once(':') else {
            return Self::exact_text(body).with_index(index);
        };

        let strategy = match token.trim() {
            "text" => Strategy::ExactText(value.to_string()),
            "contains" => Strategy::ContainsText(value.to_string()),
            "key" | "id" => Strategy::Key(value.trim().to_string()),
            "label" => Strategy::Label(value.to_string()),
            "type" => {
                let name = value.trim();
                match ElementKind::from_type_name(name) {
                    Some(kind) => Strategy::Type(kind),
                    None => {
                        warn!(
                            target: "uidsl::selector",
                            type_name = %name,
                            "Unknown widget type; selector will match nothing"
                        );
                        Strategy::UnknownType(name.to_string())
                    }
                }
            }
            "alias" => Strategy::Alias(value.trim().to_string()),
            other => {
                warn!(
                    target: "uidsl::selector",
                    strategy = %other,
                    selector = %body,
                    "Unknown selector strategy; matching the whole selector as exact text"
                );
                Strategy::ExactText(body.to_string())
            }
        };
        Self::new(strategy).with_index(index)
    }
}

/// Strip a trailing `[n]` suffix, returning the remaining selector and `n`.
fn split_index(raw: &str) -> (&str, Option<usize>) {
    let Some(inner) = raw.strip_suffix(']') else {
        return (raw, None);
    };
    let Some(open) = inner.rfind('[') else {
        return (raw, None);
    };
    let digits = &inner[open + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return (raw, None);
    }
    match digits.parse::<usize>() {
        Ok(n) => (&inner[..open], Some(n)),
        Err(_) => (raw, None),
    }
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.strategy {
            Strategy::ExactText(v) => write!(f, "{v}")?,
            Strategy::ContainsText(v) => write!(f, "contains:{v}")?,
            Strategy::Key(v) => write!(f, "key:{v}")?,
            Strategy::Label(v) => write!(f, "label:{v}")?,
            Strategy::Type(kind) => write!(f, "type:{kind:?}")?,
            Strategy::UnknownType(v) => write!(f, "type:{v}")?,
            Strategy::Alias(v) => write!(f, "alias:{v}")?,
        }
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_exact() {
        assert_eq!(ElementQuery::parse("Sign in"), ElementQuery::exact_text("Sign in"));
    }

    #[test]
    fn index_suffix_is_split_off() {
        for raw in ["Item", "contains:Item", "key:row", "label:Account", "type:Button"] {
            let plain = ElementQuery::parse(raw);
            let indexed = ElementQuery::parse(&format!("{raw}[3]"));
            assert_eq!(indexed.strategy, plain.strategy, "{raw}");
            assert_eq!(indexed.index, Some(3));
            assert_eq!(plain.index, None);
        }
    }

    #[test]
    fn malformed_index_stays_in_text() {
        assert_eq!(ElementQuery::parse("Item[x]"), ElementQuery::exact_text("Item[x]"));
        assert_eq!(ElementQuery::parse("Item[]"), ElementQuery::exact_text("Item[]"));
    }

    #[test]
    fn value_keeps_later_colons() {
        assert_eq!(
            ElementQuery::parse("contains:Time: 10:30").strategy,
            Strategy::ContainsText("Time: 10:30".into())
        );
    }

    #[test]
    fn unknown_strategy_matches_whole_string() {
        assert_eq!(
            ElementQuery::parse("Note: saved[1]"),
            ElementQuery::exact_text("Note: saved").with_index(Some(1))
        );
    }

    #[test]
    fn type_names() {
        assert_eq!(
            ElementQuery::parse("type:TextField").strategy,
            Strategy::Type(ElementKind::TextInput)
        );
        assert_eq!(
            ElementQuery::parse("type:UnknownWidget").strategy,
            Strategy::UnknownType("UnknownWidget".into())
        );
    }

    #[test]
    fn key_and_alias() {
        assert_eq!(ElementQuery::parse("id:submit").strategy, Strategy::Key("submit".into()));
        assert_eq!(
            ElementQuery::parse("alias:acct[0]"),
            ElementQuery::new(Strategy::Alias("acct".into())).with_index(Some(0))
        );
    }

    #[test]
    fn display_round_trips_common_forms() {
        for raw in ["contains:Item[1]", "key:go", "label:Account", "alias:acct", "Done"] {
            assert_eq!(ElementQuery::parse(raw).to_string(), raw);
        }
    }
}

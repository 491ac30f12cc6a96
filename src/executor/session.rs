use crate::selector::AliasTable;

/// Mutable state shared by the steps of one suite run.
///
/// Passed by reference into the runner and executor; `reset` is called at suite boundaries
/// (each interactive payload starts with a fresh alias scope).
#[derive(Debug, Default)]
pub struct TestSession {
    pub aliases: AliasTable,
}

impl TestSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.aliases.clear();
    }
}

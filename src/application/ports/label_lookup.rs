#[cfg(test)]
use mockall::{automock, predicate::*};

/// Port for annotating a character code with a human-readable label
#[cfg_attr(test, automock)]
pub trait LabelLookup: Send + Sync {
    fn label(&self, code: u16) -> Option<String>;
}

/// Lookup that knows no labels; every record gets an empty label
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLabels;

impl LabelLookup for NoLabels {
    fn label(&self, _code: u16) -> Option<String> {
        None
    }
}

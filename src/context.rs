use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Normalized bibliographic fields, keyed by field name.
pub type Data = serde_json::Map<String, serde_json::Value>;

/// Accumulator for one fetch: merged metadata plus paths of downloaded files.
///
/// The files listed here belong to the caller once `fetch` returns; nothing in this
/// crate removes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub data: Data,
    pub files: Vec<PathBuf>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `delta` into `data`. Keys already present are overwritten.
    pub fn merge(&mut self, delta: Data) {
        self.data.extend(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_existing_keys() {
        let mut ctx = Context::new();
        ctx.data.insert("title".into(), json!("Old"));
        ctx.data.insert("year".into(), json!("1999"));

        let mut delta = Data::new();
        delta.insert("title".into(), json!("New"));
        ctx.merge(delta);

        assert_eq!(ctx.data["title"], json!("New"));
        assert_eq!(ctx.data["year"], json!("1999"));
        assert!(ctx.files.is_empty());
    }
}

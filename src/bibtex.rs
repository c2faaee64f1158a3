use biblatex::{Bibliography, ChunksExt, Entry};
use serde_json::Value;

use crate::{
    context::Data,
    error::{Error, Result},
};

/// Parse raw bibtex into one field mapping per entry, in source order.
///
/// Every mapping carries the entry type under `type` and the citation key under `ref`,
/// next to the entry's own fields.
pub fn bibtex_to_data(raw: &str) -> Result<Vec<Data>> {
    let bib = Bibliography::parse(raw).map_err(|e| Error::Bibtex(e.to_string()))?;
    Ok(bib.iter().map(entry_to_data).collect())
}

fn entry_to_data(entry: &Entry) -> Data {
    let mut data = Data::new();
    data.insert("type".into(), Value::String(entry.entry_type.to_string()));
    data.insert("ref".into(), Value::String(entry.key.clone()));
    for (name, chunks) in &entry.fields {
        data.insert(
            name.to_lowercase(),
            Value::String(chunks.format_verbatim()),
        );
    }
    data
}

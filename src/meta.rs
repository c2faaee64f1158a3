//! Bibliographic fields from HTML `<meta>` tags (Highwire `citation_*`, Dublin Core,
//! OpenGraph).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::{
    author::{Author, AuthorFormat, format_author_list},
    context::Data,
};

/// Lowercase meta identifier → field name.
///
/// Several identifiers share a field; the last matching tag in the page wins.
pub static EQUIVALENCES: &[(&str, &str)] = &[
    ("og:type", "type"),
    ("og:title", "title"),
    ("og:url", "url"),
    ("description", "abstract"),
    ("citation_doi", "doi"),
    ("citation_firstpage", "firstpage"),
    ("citation_lastpage", "lastpage"),
    ("citation_fulltext_html_url", "url"),
    ("citation_pdf_url", "pdf_url"),
    ("citation_issn", "issn"),
    ("citation_issue", "issue"),
    ("citation_journal_abbrev", "journal_abbrev"),
    ("citation_journal_title", "journal"),
    ("citation_language", "language"),
    ("citation_online_date", "online_date"),
    ("citation_publication_date", "publication_date"),
    ("citation_publisher", "publisher"),
    ("citation_title", "title"),
    ("citation_volume", "volume"),
    ("dc.publisher", "publisher"),
    ("dc.date", "date"),
    ("dc.language", "language"),
    ("dc.subject", "subject"),
    ("dc.title", "title"),
    ("keywords", "keywords"),
    ("dc.type", "type"),
    ("dc.description", "description"),
];

static META: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").unwrap());
static CITATION_AUTHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="citation_author"]"#).unwrap());
static CITATION_AUTHOR_INSTITUTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="citation_author_institution"]"#).unwrap());

/// Extract known fields from `document`, with `extra` equivalences overriding or
/// extending [`EQUIVALENCES`]. Authors are formatted with the default format.
pub fn parse_meta_headers(document: &Html, extra: &[(&str, &str)]) -> Data {
    parse_meta_headers_with(document, extra, &AuthorFormat::default())
}

pub fn parse_meta_headers_with(
    document: &Html,
    extra: &[(&str, &str)],
    format: &AuthorFormat,
) -> Data {
    let mut table: HashMap<String, &str> = EQUIVALENCES
        .iter()
        .map(|(tag, field)| (tag.to_string(), *field))
        .collect();
    table.extend(
        extra
            .iter()
            .map(|(tag, field)| (tag.to_lowercase(), *field)),
    );

    let mut data = Data::new();
    for meta in document.select(&META) {
        let attrs = meta.value();
        let Some(ident) = attrs
            .attr("name")
            .filter(|n| !n.is_empty())
            .or_else(|| attrs.attr("property"))
        else {
            continue;
        };
        if let Some(field) = table.get(&ident.to_lowercase())
            && let Some(content) = attrs.attr("content")
        {
            data.insert(field.to_string(), Value::String(content.to_string()));
        }
    }

    let authors = parse_meta_authors(document);
    if !authors.is_empty() {
        data.insert(
            "author".into(),
            Value::String(format_author_list(&authors, format)),
        );
        if let Ok(list) = serde_json::to_value(&authors) {
            data.insert("author_list".into(), list);
        }
    }

    data
}

/// Authors from `citation_author` tags, paired by position with
/// `citation_author_institution` tags when the page has any.
///
/// Mismatched counts are paired up to the shorter list.
pub fn parse_meta_authors(document: &Html) -> Vec<Author> {
    let content = |sel: &Selector| -> Vec<String> {
        document
            .select(sel)
            .map(|m| m.value().attr("content").unwrap_or_default().to_string())
            .collect()
    };
    let authors = content(&CITATION_AUTHOR);
    let institutions = content(&CITATION_AUTHOR_INSTITUTION);

    if institutions.is_empty() {
        return authors
            .iter()
            .map(|name| Author::from_full_name(name, None))
            .collect();
    }

    if authors.len() != institutions.len() {
        tracing::warn!(
            authors = authors.len(),
            institutions = institutions.len(),
            "author and institution counts differ; pairing up to the shorter list"
        );
    }
    authors
        .iter()
        .zip(&institutions)
        .map(|(name, inst)| Author::from_full_name(name, Some(inst.as_str())))
        .collect()
}

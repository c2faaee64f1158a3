use once_cell::unsync::OnceCell;
use scraper::Html;
use url::Url;

use crate::{
    author::AuthorFormat,
    config::Settings,
    context::Data,
    downloader::{Capabilities, Site, Target},
    error::Result,
    meta::parse_meta_headers_with,
    site::Recognise,
    sniff::Expected,
};

/// A generic, last-resort site for HTTP(S) pages, driven by the page's embedded
/// `<meta>` tags.
pub struct EmbeddedSite {
    url: Url,
    authors: AuthorFormat,
    page: OnceCell<Data>,
}

impl EmbeddedSite {
    pub fn new(url: Url, authors: AuthorFormat) -> Self {
        EmbeddedSite {
            url,
            authors,
            page: OnceCell::new(),
        }
    }

    fn page(&self, target: &Target<'_>) -> Result<&Data> {
        self.page.get_or_try_init(|| {
            tracing::info!(downloader = self.name(), url = %self.url, "downloading page");
            let body = target.session.get_body(self.url.as_str())?;
            let html = Html::parse_document(&body);
            Ok(parse_meta_headers_with(&html, &[], &self.authors))
        })
    }
}

impl Recognise for EmbeddedSite {
    fn recognise(uri: &str, settings: &Settings) -> Option<Self> {
        let url = Url::parse(uri).ok()?;
        match url.scheme() {
            "http" | "https" => {}
            _ => return None,
        }
        Some(EmbeddedSite::new(url, settings.authors.clone()))
    }
}

impl Site for EmbeddedSite {
    fn name(&self) -> &str {
        "embedded"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::DATA | Capabilities::DOCUMENT
    }

    /// Any http(s) URL matches, so more specific sites go first.
    fn priority(&self) -> u8 {
        0
    }

    fn expected_document_extension(&self) -> Option<Expected> {
        Some(Expected::from("pdf"))
    }

    fn get_data(&mut self, target: &Target<'_>) -> Result<Data> {
        self.page(target).cloned()
    }

    fn get_document_url(&mut self, target: &Target<'_>) -> Result<Option<String>> {
        let base = self.url.clone();
        let pdf_url = self
            .page(target)?
            .get("pdf_url")
            .and_then(|v| v.as_str())
            .and_then(|href| absolutise(&base, href));
        Ok(pdf_url.map(String::from))
    }
}

fn absolutise(base: &Url, cand: &str) -> Option<Url> {
    match Url::parse(cand) {
        Ok(u) => Some(u),
        Err(_) => base.join(cand).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_only_http() {
        let settings = Settings::default();
        assert!(EmbeddedSite::recognise("https://example.com/a", &settings).is_some());
        assert!(EmbeddedSite::recognise("http://example.com/a", &settings).is_some());
        assert!(EmbeddedSite::recognise("ftp://example.com/a", &settings).is_none());
        assert!(EmbeddedSite::recognise("not a url", &settings).is_none());
    }

    #[test]
    fn absolutise_relative_and_absolute() {
        let base = Url::parse("https://example.com/articles/1/").unwrap();
        assert_eq!(
            absolutise(&base, "paper.pdf").unwrap().as_str(),
            "https://example.com/articles/1/paper.pdf"
        );
        assert_eq!(
            absolutise(&base, "/files/p.pdf").unwrap().as_str(),
            "https://example.com/files/p.pdf"
        );
        assert_eq!(
            absolutise(&base, "https://cdn.example.org/p.pdf").unwrap().as_str(),
            "https://cdn.example.org/p.pdf"
        );
    }

    #[test]
    fn document_url_comes_from_cached_page() {
        let url = Url::parse("https://example.com/articles/1").unwrap();
        let mut site = EmbeddedSite::new(url, AuthorFormat::default());
        let html = Html::parse_document(
            r#"<html><head>
                <meta name="citation_title" content="Cached">
                <meta name="citation_pdf_url" content="/pdf/1.pdf">
            </head></html>"#,
        );
        let _ = site.page.set(parse_meta_headers_with(&html, &[], &site.authors));

        let session = crate::session::Session::new(&Settings::default()).unwrap();
        let target = Target {
            uri: "https://example.com/articles/1",
            session: &session,
        };
        assert_eq!(site.get_data(&target).unwrap()["title"], "Cached");
        assert_eq!(
            site.get_document_url(&target).unwrap().as_deref(),
            Some("https://example.com/pdf/1.pdf")
        );
    }
}

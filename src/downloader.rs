use std::{fmt, io::Write, path::PathBuf};

use bitflags::bitflags;
use once_cell::unsync::OnceCell;

use crate::{
    bibtex,
    config::Settings,
    context::{Context, Data},
    error::{Error, Result},
    session::Session,
    sniff::{self, Expected},
    site,
};

bitflags! {
    /// Acquisition strategies a site supports. Stages whose flag is missing are
    /// skipped by [`Downloader::fetch`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const DATA = 1 << 0;
        const BIBTEX = 1 << 1;
        const DOI = 1 << 2;
        const DOCUMENT = 1 << 3;
    }
}

/// What a site needs to reach its page: the URI being fetched and the session to do it
/// with.
pub struct Target<'a> {
    pub uri: &'a str,
    pub session: &'a Session,
}

/// A site-specific strategy for one kind of URI.
///
/// Implementors declare their [`Capabilities`] and provide the matching methods; the
/// defaults fail with [`Error::NotImplemented`].
pub trait Site {
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// Preference when several sites recognise the same URI; higher wins.
    fn priority(&self) -> u8 {
        1
    }

    /// Document types accepted by the format check; `None` accepts anything.
    fn expected_document_extension(&self) -> Option<Expected> {
        None
    }

    fn get_data(&mut self, _target: &Target<'_>) -> Result<Data> {
        Err(Error::NotImplemented("get_data"))
    }

    fn get_doi(&mut self, _target: &Target<'_>) -> Result<String> {
        Err(Error::NotImplemented("get_doi"))
    }

    /// Where to download bibtex from; `Ok(None)` when this page has none.
    fn get_bibtex_url(&mut self, _target: &Target<'_>) -> Result<Option<String>> {
        Err(Error::NotImplemented("get_bibtex_url"))
    }

    /// Where to download the document from; `Ok(None)` when this page has none.
    fn get_document_url(&mut self, _target: &Target<'_>) -> Result<Option<String>> {
        Err(Error::NotImplemented("get_document_url"))
    }

    fn download_bibtex(&mut self, target: &Target<'_>) -> Result<Option<String>> {
        let Some(url) = self.get_bibtex_url(target)? else {
            return Ok(None);
        };
        tracing::info!(downloader = self.name(), %url, "downloading bibtex");
        target.session.get_text(&url).map(Some)
    }

    fn download_document(&mut self, target: &Target<'_>) -> Result<Option<Vec<u8>>> {
        let Some(url) = self.get_document_url(target)? else {
            return Ok(None);
        };
        tracing::info!(downloader = self.name(), %url, "downloading file");
        target.session.get_bytes(&url).map(Some)
    }
}

/// Runs a [`Site`] against one URI and collects the results into a [`Context`].
pub struct Downloader {
    uri: String,
    name: String,
    site: Box<dyn Site>,
    session: Session,
    expected_document_extension: Option<Expected>,
    bibtex_data: OnceCell<Option<String>>,
    document_data: OnceCell<Option<Vec<u8>>>,
    ctx: Context,
}

impl Downloader {
    pub fn new(
        uri: impl Into<String>,
        site: impl Site + 'static,
        settings: &Settings,
    ) -> Result<Self> {
        Self::from_boxed(uri.into(), Box::new(site), settings)
    }

    /// Pick the first built-in site that recognises `uri`.
    pub fn for_uri(uri: &str, settings: &Settings) -> Result<Self> {
        let site = site::resolve(uri, settings)
            .ok_or_else(|| Error::UnrecognisedUri(uri.to_string()))?;
        Self::from_boxed(uri.to_string(), site, settings)
    }

    fn from_boxed(uri: String, site: Box<dyn Site>, settings: &Settings) -> Result<Self> {
        let name = site.name().to_string();
        tracing::debug!(downloader = %name, %uri, "new downloader");
        Ok(Downloader {
            expected_document_extension: site.expected_document_extension(),
            session: Session::new(settings)?,
            uri,
            name,
            site,
            bibtex_data: OnceCell::new(),
            document_data: OnceCell::new(),
            ctx: Context::default(),
        })
    }

    pub fn with_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_expected_document_extension(mut self, expected: Option<Expected>) -> Self {
        self.expected_document_extension = expected;
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> u8 {
        self.site.priority()
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn into_context(self) -> Context {
        self.ctx
    }

    /// Run every stage the site supports, in order: structured data, bibtex, DOI,
    /// document. Each stage overwrites fields set by the ones before it.
    ///
    /// Any failure aborts the remaining stages; fields merged so far are kept.
    pub fn fetch(&mut self) -> Result<()> {
        let caps = self.site.capabilities();

        if caps.contains(Capabilities::DATA) {
            let delta = self.data_stage()?;
            self.ctx.merge(delta);
        } else {
            self.skip("data");
        }

        if caps.contains(Capabilities::BIBTEX) {
            if let Some(delta) = self.bibtex_stage()? {
                self.ctx.merge(delta);
            }
        } else {
            self.skip("bibtex");
        }

        if caps.contains(Capabilities::DOI) {
            let doi = self.doi_stage()?;
            self.ctx.data.insert("doi".into(), doi.into());
        } else {
            self.skip("doi");
        }

        if caps.contains(Capabilities::DOCUMENT) {
            if let Some(path) = self.document_stage()? {
                self.ctx.files.push(path);
            }
        } else {
            self.skip("document");
        }

        Ok(())
    }

    fn skip(&self, stage: &str) {
        tracing::debug!(downloader = %self.name, stage, "not supported, skipping");
    }

    fn data_stage(&mut self) -> Result<Data> {
        let target = Target {
            uri: &self.uri,
            session: &self.session,
        };
        self.site.get_data(&target)
    }

    fn bibtex_stage(&mut self) -> Result<Option<Data>> {
        let entries = match self.get_bibtex_data()? {
            Some(raw) if !raw.is_empty() => bibtex::bibtex_to_data(raw)?,
            _ => return Ok(None),
        };
        Ok(entries.into_iter().next())
    }

    fn doi_stage(&mut self) -> Result<String> {
        let target = Target {
            uri: &self.uri,
            session: &self.session,
        };
        self.site.get_doi(&target)
    }

    fn document_stage(&mut self) -> Result<Option<PathBuf>> {
        self.load_document()?;
        let Some(bytes) = self.document_bytes().filter(|d| !d.is_empty()) else {
            return Ok(None);
        };
        if !self.format_matches(Some(bytes)) {
            return Ok(None);
        }

        let mut file = tempfile::Builder::new().prefix("bibfetch-").tempfile()?;
        file.write_all(bytes)?;
        let (_, path) = file.keep().map_err(|e| e.error)?;
        tracing::info!(downloader = %self.name, path = %path.display(), "saved downloaded file");
        Ok(Some(path))
    }

    /// Bibtex text for this URI, downloaded on first use and reused afterwards.
    pub fn get_bibtex_data(&mut self) -> Result<Option<&str>> {
        let target = Target {
            uri: &self.uri,
            session: &self.session,
        };
        let site = &mut self.site;
        let data = self
            .bibtex_data
            .get_or_try_init(|| site.download_bibtex(&target))?;
        Ok(data.as_deref())
    }

    /// Document bytes for this URI, downloaded on first use and reused afterwards.
    pub fn get_document_data(&mut self) -> Result<Option<&[u8]>> {
        self.load_document()?;
        Ok(self.document_bytes())
    }

    fn load_document(&mut self) -> Result<()> {
        let target = Target {
            uri: &self.uri,
            session: &self.session,
        };
        let site = &mut self.site;
        self.document_data
            .get_or_try_init(|| site.download_document(&target))?;
        Ok(())
    }

    fn document_bytes(&self) -> Option<&[u8]> {
        self.document_data.get().and_then(|d| d.as_deref())
    }

    /// Whether the downloaded document has a type this downloader accepts.
    ///
    /// Without an expected type anything passes, since there is nothing to compare
    /// against. Otherwise the bytes are sniffed by content.
    pub fn check_document_format(&mut self) -> Result<bool> {
        if self.expected_document_extension.is_none() {
            return Ok(true);
        }
        self.load_document()?;
        Ok(self.format_matches(self.document_bytes()))
    }

    fn format_matches(&self, bytes: Option<&[u8]>) -> bool {
        let Some(expected) = &self.expected_document_extension else {
            return true;
        };
        let Some(kind) = bytes.and_then(sniff::guess) else {
            self.warn_format(expected);
            return false;
        };
        tracing::debug!(downloader = %self.name, mime = kind.mime, "retrieved document kind");

        let accepted = expected.accepts(&kind);
        if !accepted {
            self.warn_format(expected);
        }
        accepted
    }

    fn warn_format(&self, expected: &Expected) {
        tracing::warn!(
            downloader = %self.name,
            expected = %expected,
            "the downloaded data does not seem to be of the correct type"
        );
    }
}

impl fmt::Display for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Downloader({}, uri={})", self.name, self.uri)
    }
}

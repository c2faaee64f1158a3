use std::fmt;

use once_cell::sync::Lazy;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;
use url::Url;

use crate::{
    config::Settings,
    downloader::{Capabilities, Site, Target},
    error::Result,
    site::Recognise,
};

const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const BIBTEX_MIME: &str = "application/x-bibtex";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doi {
    prefix: String,
    suffix: String,
}

impl Doi {
    /// Find a DOI in `identifier`: bare, with a `doi:`/`urn:doi:` prefix, as a doi.org
    /// URL or embedded in surrounding text.
    pub fn parse(identifier: &str) -> Option<Self> {
        static DOI_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(?i)\b(10\.\d{4,9})/([-._;()/:A-Z0-9]+)\b").unwrap());

        let mut s = identifier.trim();
        for scheme in ["doi:", "urn:doi:"] {
            if s.get(..scheme.len()).is_some_and(|p| p.eq_ignore_ascii_case(scheme)) {
                s = s[scheme.len()..].trim_start();
            }
        }
        let s = s.split(['?', '#']).next().unwrap_or_default();
        let s = s.trim_end_matches(['.', ',', ';', ':', ')', ']', '}', '"', '\'']);

        let caps = DOI_RE.captures(s)?;
        Some(Doi {
            prefix: caps[1].to_string(),
            suffix: caps[2].to_string(),
        })
    }

    pub fn to_url(&self) -> Url {
        let enc_suffix = utf8_percent_encode(&self.suffix, PATH_SEGMENT_ENCODE_SET).to_string();
        let mut url = Url::parse("https://doi.org/").expect("static base URL");
        url.set_path(&format!("{}/{}", self.prefix, enc_suffix));
        url
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.suffix)
    }
}

/// Resolves a DOI through doi.org content negotiation.
pub struct DoiSite {
    doi: Doi,
}

impl DoiSite {
    pub fn new(doi: Doi) -> Self {
        DoiSite { doi }
    }
}

impl Recognise for DoiSite {
    fn recognise(uri: &str, _settings: &Settings) -> Option<Self> {
        Doi::parse(uri).map(DoiSite::new)
    }
}

impl Site for DoiSite {
    fn name(&self) -> &str {
        "doi"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::BIBTEX | Capabilities::DOI
    }

    fn get_doi(&mut self, _target: &Target<'_>) -> Result<String> {
        Ok(self.doi.to_string())
    }

    fn get_bibtex_url(&mut self, _target: &Target<'_>) -> Result<Option<String>> {
        Ok(Some(self.doi.to_url().to_string()))
    }

    fn download_bibtex(&mut self, target: &Target<'_>) -> Result<Option<String>> {
        let Some(url) = self.get_bibtex_url(target)? else {
            return Ok(None);
        };
        tracing::info!(downloader = self.name(), %url, "downloading bibtex");
        target.session.get_text_accepting(&url, BIBTEX_MIME).map(Some)
    }
}

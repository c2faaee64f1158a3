//! Site-specific downloaders for bibliographic metadata and documents.
//!
//! A [`Downloader`] binds a URI to a [`Site`]. Calling [`Downloader::fetch`] runs the
//! site's supported stages (structured data, bibtex, DOI, document) and collects the
//! merged fields and downloaded files into a [`Context`].

pub mod author;
pub mod bibtex;
pub mod config;
pub mod context;
pub mod downloader;
pub mod error;
pub mod meta;
pub mod session;
pub mod site;
pub mod sniff;

pub use config::Settings;
pub use context::{Context, Data};
pub use downloader::{Capabilities, Downloader, Site, Target};
pub use error::{Error, Result};

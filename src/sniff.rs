//! Content-based file type detection.
//!
//! Only magic numbers are inspected; URL extensions and declared content types are
//! never consulted.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kind {
    pub extension: &'static str,
    pub mime: &'static str,
}

impl Kind {
    const fn new(extension: &'static str, mime: &'static str) -> Self {
        Kind { extension, mime }
    }
}

pub const PDF: Kind = Kind::new("pdf", "application/pdf");
pub const EPUB: Kind = Kind::new("epub", "application/epub+zip");
pub const ZIP: Kind = Kind::new("zip", "application/zip");
pub const DJVU: Kind = Kind::new("djvu", "image/vnd.djvu");
pub const PS: Kind = Kind::new("ps", "application/postscript");
pub const RTF: Kind = Kind::new("rtf", "application/rtf");
pub const MOBI: Kind = Kind::new("mobi", "application/x-mobipocket-ebook");
pub const GZ: Kind = Kind::new("gz", "application/gzip");
pub const BZ2: Kind = Kind::new("bz2", "application/x-bzip2");
pub const XZ: Kind = Kind::new("xz", "application/x-xz");
pub const PNG: Kind = Kind::new("png", "image/png");
pub const JPG: Kind = Kind::new("jpg", "image/jpeg");
pub const GIF: Kind = Kind::new("gif", "image/gif");
pub const TIF: Kind = Kind::new("tif", "image/tiff");

pub fn guess(data: &[u8]) -> Option<Kind> {
    match data {
        [b'%', b'P', b'D', b'F', ..] => Some(PDF),
        [0x50, 0x4B, 0x03, 0x04, ..] if is_epub(data) => Some(EPUB),
        [0x50, 0x4B, 0x03, 0x04, ..] => Some(ZIP),
        [b'A', b'T', b'&', b'T', b'F', b'O', b'R', b'M', _, _, _, _, form @ ..]
            if matches!(form, [b'D', b'J', b'V', b'U' | b'M', ..]) =>
        {
            Some(DJVU)
        }
        [b'%', b'!', ..] => Some(PS),
        [b'{', b'\\', b'r', b't', b'f', ..] => Some(RTF),
        [0x1F, 0x8B, ..] => Some(GZ),
        [b'B', b'Z', b'h', ..] => Some(BZ2),
        [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00, ..] => Some(XZ),
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(PNG),
        [0xFF, 0xD8, 0xFF, ..] => Some(JPG),
        [b'G', b'I', b'F', b'8', ..] => Some(GIF),
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some(TIF),
        _ if is_mobi(data) => Some(MOBI),
        _ => None,
    }
}

// The OCF container stores an uncompressed `mimetype` entry first.
fn is_epub(data: &[u8]) -> bool {
    data.get(30..58) == Some(b"mimetypeapplication/epub+zip".as_slice())
}

fn is_mobi(data: &[u8]) -> bool {
    data.get(60..68) == Some(b"BOOKMOBI".as_slice())
}

/// The document type(s) a downloader is willing to accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    One(String),
    AnyOf(Vec<String>),
}

impl Expected {
    /// Acceptable extensions; a single tag is promoted to a one-element set.
    pub fn extensions(&self) -> Vec<&str> {
        match self {
            Expected::One(ext) => vec![ext.as_str()],
            Expected::AnyOf(exts) => exts.iter().map(String::as_str).collect(),
        }
    }

    pub fn accepts(&self, kind: &Kind) -> bool {
        self.extensions().contains(&kind.extension)
    }
}

impl From<&str> for Expected {
    fn from(ext: &str) -> Self {
        Expected::One(ext.to_string())
    }
}

impl<S: Into<String>> FromIterator<S> for Expected {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Expected::AnyOf(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extensions().join(", "))
    }
}

#[cfg(test)]
mod fixtures {
    pub fn pdf() -> Vec<u8> {
        b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<<>>\nendobj\n".to_vec()
    }

    pub fn epub() -> Vec<u8> {
        let mut data = vec![0x50, 0x4B, 0x03, 0x04];
        data.resize(30, 0);
        data.extend_from_slice(b"mimetypeapplication/epub+zip");
        data.extend_from_slice(b"PK\x03\x04 rest of the archive");
        data
    }
}

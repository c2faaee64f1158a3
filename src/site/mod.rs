use crate::{config::Settings, downloader::Site};

pub mod doi;
pub mod embedded;

/// A site that can tell from the URI alone whether it handles it.
pub trait Recognise: Site + Sized + 'static {
    fn recognise(uri: &str, settings: &Settings) -> Option<Self>;
}

type RecogniserFn = fn(&str, &Settings) -> Option<Box<dyn Site>>;

/// Recognisers to try. Ties in [`Site::priority`] go to the earlier entry.
static RECOGNISERS: &[RecogniserFn] = &[erase::<doi::DoiSite>, erase::<embedded::EmbeddedSite>];

fn erase<S: Recognise>(uri: &str, settings: &Settings) -> Option<Box<dyn Site>> {
    S::recognise(uri, settings).map(|s| Box::new(s) as Box<dyn Site>)
}

/// The built-in site with the highest priority among those recognising `uri`.
pub fn resolve(uri: &str, settings: &Settings) -> Option<Box<dyn Site>> {
    RECOGNISERS
        .iter()
        .filter_map(|f| f(uri, settings))
        .fold(None, |best: Option<Box<dyn Site>>, site| match best {
            Some(b) if b.priority() >= site.priority() => Some(b),
            _ => Some(site),
        })
}

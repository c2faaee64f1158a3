use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliation {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub given: String,
    pub family: String,
    pub affiliation: Vec<Affiliation>,
}

impl Author {
    /// Split a full name on runs of whitespace: the first token is the given name and
    /// the rest, joined by single spaces, is the family name.
    pub fn from_full_name(full: &str, affiliation: Option<&str>) -> Self {
        let mut tokens = full.split_whitespace();
        let given = tokens.next().unwrap_or_default().to_string();
        let family = tokens.collect::<Vec<_>>().join(" ");
        Author {
            given,
            family,
            affiliation: affiliation
                .map(|name| {
                    vec![Affiliation {
                        name: name.to_string(),
                    }]
                })
                .unwrap_or_default(),
        }
    }
}

/// How a list of authors is rendered into the single `author` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorFormat {
    /// Placed between two rendered authors
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Template with `{given}` and `{family}` placeholders
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for AuthorFormat {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            format: default_format(),
        }
    }
}

fn default_separator() -> String {
    " and ".to_string()
}

fn default_format() -> String {
    "{family}, {given}".to_string()
}

impl AuthorFormat {
    pub fn render(&self, author: &Author) -> String {
        let out = self
            .format
            .replace("{family}", &author.family)
            .replace("{given}", &author.given);
        // An empty name part leaves the template's punctuation dangling.
        out.trim_matches(|c: char| c == ',' || c.is_whitespace())
            .to_string()
    }
}

pub fn format_author_list(authors: &[Author], format: &AuthorFormat) -> String {
    authors
        .iter()
        .map(|a| format.render(a))
        .collect::<Vec<_>>()
        .join(&format.separator)
}

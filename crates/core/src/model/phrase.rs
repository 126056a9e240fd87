use serde::{Deserialize, Serialize};

use crate::model::catalog::Catalog;
use crate::model::ids::ImageId;

/// One slot on the sentence strip: either a word card or a picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum PhraseElement {
    Text(String),
    Image(ImageId),
}

impl PhraseElement {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub fn image(id: impl Into<String>) -> Self {
        Self::Image(ImageId::new(id))
    }

    /// The words this slot contributes. Unknown pictures read as empty.
    #[must_use]
    pub fn spoken<'a>(&'a self, catalog: &'a Catalog) -> &'a str {
        match self {
            PhraseElement::Text(text) => text.as_str(),
            PhraseElement::Image(id) => catalog.image(id).map_or("", |img| img.name.as_str()),
        }
    }
}

/// Reads a sentence strip aloud: slots joined by single spaces.
#[must_use]
pub fn render_phrase(elements: &[PhraseElement], catalog: &Catalog) -> String {
    elements
        .iter()
        .map(|el| el.spoken(catalog))
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize(phrase: &str) -> String {
    phrase.trim().to_lowercase()
}

/// Case-insensitive comparison of two phrases, ignoring surrounding whitespace.
#[must_use]
pub fn phrases_match(left: &str, right: &str) -> bool {
    normalize(left) == normalize(right)
}

/// Case-insensitive substring test used for open-ended comments.
#[must_use]
pub fn phrase_contains(phrase: &str, fragment: &str) -> bool {
    normalize(phrase).contains(&normalize(fragment))
}

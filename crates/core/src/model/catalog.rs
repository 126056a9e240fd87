use serde::{Deserialize, Serialize};

use crate::model::ids::ImageId;
use crate::model::phase::PhaseId;

/// Broad grouping used to pick look-alike distractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageCategory {
    Food,
    Toys,
    Activities,
    People,
    Places,
    Emotions,
    Actions,
    Objects,
}

/// A picture card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogImage {
    pub id: ImageId,
    /// Word spoken or read when the picture is used in a sentence.
    pub name: String,
    /// Emoji standing in for the picture.
    pub symbol: String,
    pub category: ImageCategory,
    pub description: String,
}

/// A word card on the sentence strip ("I want", "and", ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseWord {
    pub id: String,
    pub text: String,
    pub symbol: String,
}

/// Static description of a curriculum phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseInfo {
    pub id: PhaseId,
    pub name: String,
    pub description: String,
    pub instructions: String,
}

/// The pictures, sentence words and phase descriptions shipped with the tutor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    images: Vec<CatalogImage>,
    starters: Vec<PhraseWord>,
    connectors: Vec<PhraseWord>,
    phases: Vec<PhaseInfo>,
}

const IMAGES: &[(&str, &str, &str, ImageCategory, &str)] = &[
    ("food_apple", "apple", "🍎", ImageCategory::Food, "A red apple"),
    ("food_banana", "banana", "🍌", ImageCategory::Food, "A yellow banana"),
    ("food_cookie", "cookie", "🍪", ImageCategory::Food, "A sweet cookie"),
    ("food_milk", "milk", "🥛", ImageCategory::Food, "A glass of milk"),
    ("food_sandwich", "sandwich", "🥪", ImageCategory::Food, "A sandwich"),
    ("food_water", "water", "💧", ImageCategory::Food, "Water to drink"),
    ("toy_ball", "ball", "⚽", ImageCategory::Toys, "A ball to play with"),
    ("toy_car", "car", "🚗", ImageCategory::Toys, "A toy car"),
    ("toy_puzzle", "puzzle", "🧩", ImageCategory::Toys, "A jigsaw puzzle"),
    ("toy_teddy", "teddy", "🧸", ImageCategory::Toys, "A teddy bear"),
    ("toy_blocks", "blocks", "🧱", ImageCategory::Toys, "Building blocks"),
    ("activity_play", "play", "🎮", ImageCategory::Activities, "Playing a game"),
    ("activity_read", "read", "📚", ImageCategory::Activities, "Reading a book"),
    ("activity_music", "music", "🎵", ImageCategory::Activities, "Listening to music"),
    ("activity_draw", "draw", "🎨", ImageCategory::Activities, "Drawing a picture"),
    ("activity_walk", "walk", "🚶", ImageCategory::Activities, "Going for a walk"),
    ("people_mom", "mom", "👩", ImageCategory::People, "Mom"),
    ("people_dad", "dad", "👨", ImageCategory::People, "Dad"),
    ("people_teacher", "teacher", "👩‍🏫", ImageCategory::People, "The teacher"),
    ("people_friend", "friend", "👦", ImageCategory::People, "A friend"),
    ("emotion_happy", "happy", "😊", ImageCategory::Emotions, "Feeling happy"),
    ("emotion_sad", "sad", "😢", ImageCategory::Emotions, "Feeling sad"),
    ("emotion_angry", "angry", "😠", ImageCategory::Emotions, "Feeling angry"),
    ("emotion_tired", "tired", "😴", ImageCategory::Emotions, "Feeling tired"),
    ("action_eat", "eat", "🍽️", ImageCategory::Actions, "Eating"),
    ("action_drink", "drink", "🥤", ImageCategory::Actions, "Drinking"),
    ("action_sleep", "sleep", "💤", ImageCategory::Actions, "Sleeping"),
    ("action_help", "help", "🤝", ImageCategory::Actions, "Helping"),
];

const STARTERS: &[(&str, &str, &str)] = &[
    ("want", "I want", "🙋"),
    ("see", "I see", "👀"),
    ("feel", "I feel", "💭"),
    ("need", "I need", "🆘"),
    ("like", "I like", "❤️"),
];

const CONNECTORS: &[(&str, &str, &str)] = &[
    ("and", "and", "➕"),
    ("with", "with", "🤝"),
    ("more", "more", "⬆️"),
];

const PHASES: &[(&str, &str, &str)] = &[
    (
        "Picture Exchange",
        "Learn to hand over a picture of a wanted item",
        "Pick the picture of the item you want and give it to your communication partner.",
    ),
    (
        "Distance and Persistence",
        "Fetch pictures from different places and deliver them",
        "Find the right picture wherever it is and bring it to your partner, even from afar.",
    ),
    (
        "Picture Discrimination",
        "Choose the right picture among several",
        "Look at all the pictures and choose the one that shows what you want.",
    ),
    (
        "Sentence Structure",
        "Build simple sentences on a sentence strip",
        "Combine 'I want' with a picture to build a request.",
    ),
    (
        "Answering Questions",
        "Answer questions with the sentence strip",
        "Use the sentence strip to answer questions such as 'What do you want?'.",
    ),
    (
        "Commenting",
        "Make comments and use other communicative functions",
        "Comment on what you see, hear and feel using the sentence strip.",
    ),
];

fn word((id, text, symbol): &(&str, &str, &str)) -> PhraseWord {
    PhraseWord {
        id: (*id).to_string(),
        text: (*text).to_string(),
        symbol: (*symbol).to_string(),
    }
}

impl Catalog {
    /// The built-in picture set.
    #[must_use]
    pub fn builtin() -> Self {
        let images = IMAGES
            .iter()
            .map(|(id, name, symbol, category, description)| CatalogImage {
                id: ImageId::new(*id),
                name: (*name).to_string(),
                symbol: (*symbol).to_string(),
                category: *category,
                description: (*description).to_string(),
            })
            .collect();
        let phases = PhaseId::all()
            .zip(PHASES.iter())
            .map(|(id, (name, description, instructions))| PhaseInfo {
                id,
                name: (*name).to_string(),
                description: (*description).to_string(),
                instructions: (*instructions).to_string(),
            })
            .collect();

        Self {
            images,
            starters: STARTERS.iter().map(word).collect(),
            connectors: CONNECTORS.iter().map(word).collect(),
            phases,
        }
    }

    /// Build a catalog from custom data, e.g. a localized picture set.
    #[must_use]
    pub fn new(
        images: Vec<CatalogImage>,
        starters: Vec<PhraseWord>,
        connectors: Vec<PhraseWord>,
        phases: Vec<PhaseInfo>,
    ) -> Self {
        Self {
            images,
            starters,
            connectors,
            phases,
        }
    }

    #[must_use]
    pub fn images(&self) -> &[CatalogImage] {
        &self.images
    }

    #[must_use]
    pub fn image(&self, id: &ImageId) -> Option<&CatalogImage> {
        self.images.iter().find(|img| &img.id == id)
    }

    pub fn images_in(&self, category: ImageCategory) -> impl Iterator<Item = &CatalogImage> {
        self.images.iter().filter(move |img| img.category == category)
    }

    #[must_use]
    pub fn starters(&self) -> &[PhraseWord] {
        &self.starters
    }

    #[must_use]
    pub fn starter(&self, id: &str) -> Option<&PhraseWord> {
        self.starters.iter().find(|w| w.id == id)
    }

    #[must_use]
    pub fn connectors(&self) -> &[PhraseWord] {
        &self.connectors
    }

    #[must_use]
    pub fn phases(&self) -> &[PhaseInfo] {
        &self.phases
    }

    #[must_use]
    pub fn phase(&self, id: PhaseId) -> Option<&PhaseInfo> {
        self.phases.iter().find(|p| p.id == id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_ids_are_unique() {
        let catalog = Catalog::builtin();
        let ids: HashSet<_> = catalog.images().iter().map(|i| i.id.clone()).collect();
        assert_eq!(ids.len(), catalog.images().len());
    }

    #[test]
    fn every_phase_has_a_description() {
        let catalog = Catalog::builtin();
        for phase in PhaseId::all() {
            assert!(catalog.phase(phase).is_some(), "missing phase {phase}");
        }
    }

    #[test]
    fn lookups_by_id_and_category() {
        let catalog = Catalog::builtin();
        let apple = catalog.image(&ImageId::new("food_apple")).unwrap();
        assert_eq!(apple.name, "apple");
        assert_eq!(catalog.images_in(ImageCategory::Emotions).count(), 4);
        assert_eq!(catalog.starter("want").unwrap().text, "I want");
        assert!(catalog.image(&ImageId::new("nope")).is_none());
    }
}

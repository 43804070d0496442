use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexicon::{DesignLanguage, Energy, Piece};

/// The three choices a card is generated from. Values travel as raw labels;
/// anything outside the known sets simply finds no phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub energy: String,
    pub design_language: String,
    pub piece: String,
}

impl Selection {
    pub fn new(energy: Energy, design_language: DesignLanguage, piece: Piece) -> Self {
        Selection {
            energy: energy.label().to_string(),
            design_language: design_language.label().to_string(),
            piece: piece.label().to_string(),
        }
    }

    /// True when every value belongs to its closed set.
    pub fn is_known(&self) -> bool {
        self.energy.parse::<Energy>().is_ok()
            && self.design_language.parse::<DesignLanguage>().is_ok()
            && self.piece.parse::<Piece>().is_ok()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.energy, self.design_language, self.piece)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// `data:<mime>;base64,...` or empty when no artwork came back.
    pub image: String,
    pub note: String,
}

impl GenerationResult {
    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_uses_camel_case_on_the_wire() {
        let selection = Selection::new(Energy::Devoted, DesignLanguage::Sparkle, Piece::GeometricHoop);
        let value = serde_json::to_value(&selection).unwrap();
        assert_eq!(value["designLanguage"], "Sparkle");
        assert!(selection.is_known());
    }

    #[test]
    fn unknown_values_are_accepted_but_flagged() {
        let selection: Selection = serde_json::from_str(
            r#"{"energy":"Sleepy","designLanguage":"Details","piece":"Geometric Hoop"}"#,
        )
        .unwrap();
        assert!(!selection.is_known());
    }
}

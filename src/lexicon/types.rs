use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown {category} value: {value}")]
pub struct UnknownOption {
    pub category: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Energy {
    Devoted,
    Mysterious,
    Playful,
    Dramatic,
    Minimalist,
    #[serde(rename = "Old-School Romantic")]
    OldSchoolRomantic,
    Modernist,
    #[serde(rename = "Quietly Obsessed")]
    QuietlyObsessed,
}

impl Energy {
    pub const ALL: [Energy; 8] = [
        Energy::Devoted,
        Energy::Mysterious,
        Energy::Playful,
        Energy::Dramatic,
        Energy::Minimalist,
        Energy::OldSchoolRomantic,
        Energy::Modernist,
        Energy::QuietlyObsessed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Energy::Devoted => "Devoted",
            Energy::Mysterious => "Mysterious",
            Energy::Playful => "Playful",
            Energy::Dramatic => "Dramatic",
            Energy::Minimalist => "Minimalist",
            Energy::OldSchoolRomantic => "Old-School Romantic",
            Energy::Modernist => "Modernist",
            Energy::QuietlyObsessed => "Quietly Obsessed",
        }
    }

    /// Short line shown under the option in the wizard.
    pub fn description(self) -> &'static str {
        match self {
            Energy::Devoted => "Warm, unwavering, close",
            Energy::Mysterious => "Layered, veiled, magnetic",
            Energy::Playful => "Bright, dynamic, unexpected",
            Energy::Dramatic => "Bold, contrasted, theatrical",
            Energy::Minimalist => "Clean, precise, essential",
            Energy::OldSchoolRomantic => "Classic, soft, timeless",
            Energy::Modernist => "Geometric, sharp, current",
            Energy::QuietlyObsessed => "Intimate, focused, persistent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DesignLanguage {
    Details,
    #[serde(rename = "Bold Gestures")]
    BoldGestures,
    Patience,
    Sparkle,
    Precision,
    Surprise,
    Craft,
    Timing,
}

impl DesignLanguage {
    pub const ALL: [DesignLanguage; 8] = [
        DesignLanguage::Details,
        DesignLanguage::BoldGestures,
        DesignLanguage::Patience,
        DesignLanguage::Sparkle,
        DesignLanguage::Precision,
        DesignLanguage::Surprise,
        DesignLanguage::Craft,
        DesignLanguage::Timing,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DesignLanguage::Details => "Details",
            DesignLanguage::BoldGestures => "Bold Gestures",
            DesignLanguage::Patience => "Patience",
            DesignLanguage::Sparkle => "Sparkle",
            DesignLanguage::Precision => "Precision",
            DesignLanguage::Surprise => "Surprise",
            DesignLanguage::Craft => "Craft",
            DesignLanguage::Timing => "Timing",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DesignLanguage::Details => "Look closer",
            DesignLanguage::BoldGestures => "Say it large",
            DesignLanguage::Patience => "Let it build",
            DesignLanguage::Sparkle => "Catch the light",
            DesignLanguage::Precision => "Every line matters",
            DesignLanguage::Surprise => "Where you least expect",
            DesignLanguage::Craft => "Made by hand",
            DesignLanguage::Timing => "The right moment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Piece {
    #[serde(rename = "Sculptural Gold Cuff")]
    SculpturalGoldCuff,
    #[serde(rename = "Diamond Line Necklace")]
    DiamondLineNecklace,
    #[serde(rename = "Geometric Hoop")]
    GeometricHoop,
    #[serde(rename = "Delicate Chain Bracelet")]
    DelicateChainBracelet,
    #[serde(rename = "Architectural Ring")]
    ArchitecturalRing,
}

impl Piece {
    pub const ALL: [Piece; 5] = [
        Piece::SculpturalGoldCuff,
        Piece::DiamondLineNecklace,
        Piece::GeometricHoop,
        Piece::DelicateChainBracelet,
        Piece::ArchitecturalRing,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Piece::SculpturalGoldCuff => "Sculptural Gold Cuff",
            Piece::DiamondLineNecklace => "Diamond Line Necklace",
            Piece::GeometricHoop => "Geometric Hoop",
            Piece::DelicateChainBracelet => "Delicate Chain Bracelet",
            Piece::ArchitecturalRing => "Architectural Ring",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Piece::SculpturalGoldCuff => "Architectural gold, bold and curved",
            Piece::DiamondLineNecklace => "Linear brilliance, point by point",
            Piece::GeometricHoop => "Perfect circles, modern metal",
            Piece::DelicateChainBracelet => "Fine links, quiet connections",
            Piece::ArchitecturalRing => "Structured geometry, statement form",
        }
    }
}

macro_rules! impl_label_traits {
    ($ty:ty, $category:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownOption;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let trimmed = value.trim();
                <$ty>::ALL
                    .into_iter()
                    .find(|option| option.label().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| UnknownOption {
                        category: $category,
                        value: value.to_string(),
                    })
            }
        }
    };
}

impl_label_traits!(Energy, "energy");
impl_label_traits!(DesignLanguage, "design language");
impl_label_traits!(Piece, "piece");

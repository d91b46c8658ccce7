//! Canned editing instructions offered as one-click shortcuts.

use crate::error::EditError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A quick-action preset that submits a fixed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuickAction {
    /// Cut the product out onto a clean white background.
    RemoveBackground,
    /// Studio lighting with soft shadows.
    StudioLighting,
    /// Dust removal and color enhancement.
    Polish,
    /// Place the product in a lifestyle scene.
    Lifestyle,
}

impl QuickAction {
    /// All presets, in display order.
    pub const ALL: [QuickAction; 4] = [
        Self::RemoveBackground,
        Self::StudioLighting,
        Self::Polish,
        Self::Lifestyle,
    ];

    /// The instruction submitted for this preset.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::RemoveBackground => "Remove background and make it clean white",
            Self::StudioLighting => "Add soft studio lighting and subtle shadows",
            Self::Polish => "Clean up the product, remove dust, and enhance colors",
            Self::Lifestyle => "Place this product in a high-end minimalist lifestyle setting",
        }
    }

    /// Command-line name of this preset.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RemoveBackground => "remove-background",
            Self::StudioLighting => "studio-lighting",
            Self::Polish => "polish",
            Self::Lifestyle => "lifestyle",
        }
    }

    /// Short button label: the first two words of the instruction.
    pub fn label(&self) -> String {
        let words: Vec<&str> = self.instruction().split_whitespace().take(2).collect();
        format!("{}...", words.join(" "))
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QuickAction {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|action| action.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|a| a.name()).collect();
                EditError::InvalidRequest(format!(
                    "unknown quick action `{}` (expected one of: {})",
                    s.trim(),
                    names.join(", ")
                ))
            })
    }
}

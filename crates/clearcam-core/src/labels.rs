//! Per-frame label selection.
//!
//! The taxonomy itself (which sublabels exist) is owned elsewhere; this
//! module only holds what is selected for one bucket. Sublabels refine the
//! dirty label, so picking one forces the primary label to dirty. Removing
//! sublabels never changes the primary label back.

use crate::outcome::Rejection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level frame classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryLabel {
    #[default]
    Clean,
    Dirty,
}

impl PrimaryLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimaryLabel::Clean => "clean",
            PrimaryLabel::Dirty => "dirty",
        }
    }
}

impl fmt::Display for PrimaryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimaryLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clean" => Ok(PrimaryLabel::Clean),
            "dirty" => Ok(PrimaryLabel::Dirty),
            other => Err(format!("Unknown label: {other}")),
        }
    }
}

/// Label selection for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelection {
    pub primary_label: PrimaryLabel,
    /// Selected sublabels in the order they were picked.
    pub sublabels: Vec<String>,
}

impl LabelSelection {
    /// Build a selection, enforcing that sublabels only accompany `Dirty`.
    pub fn new(primary_label: PrimaryLabel, sublabels: Vec<String>) -> Result<Self, Rejection> {
        if primary_label != PrimaryLabel::Dirty && !sublabels.is_empty() {
            return Err(Rejection::SublabelsRequireDirty);
        }
        let mut deduped: Vec<String> = Vec::with_capacity(sublabels.len());
        for sublabel in sublabels {
            if !deduped.contains(&sublabel) {
                deduped.push(sublabel);
            }
        }
        Ok(Self {
            primary_label,
            sublabels: deduped,
        })
    }

    pub fn clean() -> Self {
        Self::default()
    }

    pub fn has_sublabel(&self, name: &str) -> bool {
        self.sublabels.iter().any(|s| s == name)
    }

    /// Toggle a sublabel. Turning one on makes the selection dirty.
    pub fn toggle_sublabel(&mut self, name: &str) {
        if let Some(pos) = self.sublabels.iter().position(|s| s == name) {
            self.sublabels.remove(pos);
        } else {
            self.sublabels.push(name.to_string());
            self.primary_label = PrimaryLabel::Dirty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_with_sublabels_rejected() {
        let result = LabelSelection::new(PrimaryLabel::Clean, vec!["Blood".into()]);
        assert_eq!(result, Err(Rejection::SublabelsRequireDirty));
    }

    #[test]
    fn test_dedup_preserves_order() {
        let sel = LabelSelection::new(
            PrimaryLabel::Dirty,
            vec!["Smoke".into(), "Blood".into(), "Smoke".into()],
        )
        .unwrap();
        assert_eq!(sel.sublabels, vec!["Smoke".to_string(), "Blood".to_string()]);
    }

    #[test]
    fn test_toggle_is_one_way() {
        let mut sel = LabelSelection::clean();
        sel.toggle_sublabel("Blood");
        assert_eq!(sel.primary_label, PrimaryLabel::Dirty);
        assert!(sel.has_sublabel("Blood"));

        sel.toggle_sublabel("Blood");
        assert!(sel.sublabels.is_empty());
        assert_eq!(sel.primary_label, PrimaryLabel::Dirty);
    }

    #[test]
    fn test_parse_and_serialize() {
        assert_eq!(" Dirty ".parse::<PrimaryLabel>(), Ok(PrimaryLabel::Dirty));
        assert!("muddy".parse::<PrimaryLabel>().is_err());
        let json = serde_json::to_string(&LabelSelection::clean()).unwrap();
        assert_eq!(json, r#"{"primaryLabel":"clean","sublabels":[]}"#);
    }
}

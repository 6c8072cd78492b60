use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised atom scheme '{0}' (expected 'all' or 'backbone')")]
pub struct ParseAtomSchemeError(String);

/// Which atoms of a residue a selection returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AtomScheme {
    #[default]
    All,
    Backbone,
}

const BACKBONE_ATOMS: [&str; 4] = ["N", "H", "C", "O"];

impl AtomScheme {
    pub fn includes(self, atom_name: &str) -> bool {
        match self {
            AtomScheme::All => true,
            AtomScheme::Backbone => BACKBONE_ATOMS.contains(&atom_name.trim()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AtomScheme::All => "all",
            AtomScheme::Backbone => "backbone",
        }
    }
}

impl fmt::Display for AtomScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AtomScheme {
    type Err = ParseAtomSchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(AtomScheme::All),
            "backbone" | "bb" => Ok(AtomScheme::Backbone),
            _ => Err(ParseAtomSchemeError(s.to_string())),
        }
    }
}

//! # Encoding Selector
//!
//! Chooses the optimization encoding for a query and resolves its ASP source.
//!
//! | mode    | host present | encoding                    |
//! |---------|--------------|-----------------------------|
//! | soup    | any          | `community_soup`            |
//! | minexch | true         | `community_minexch`         |
//! | minexch | false        | `community_minexch_nohost`  |
//!
//! Scope, focus and dead-end queries each have a single encoding.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::FactModel;
use crate::types::SymbiotaError;

// =============================================================================
// TOPOLOGY MODE
// =============================================================================

/// How organisms share metabolites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyMode {
    /// One undifferentiated pool.
    Soup,
    /// One compartment per organism with explicit exchanges.
    Minexch,
}

impl FromStr for TopologyMode {
    type Err = SymbiotaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "soup" => Ok(Self::Soup),
            "minexch" => Ok(Self::Minexch),
            other => Err(SymbiotaError::InvalidOption(format!(
                "unknown topology mode '{other}', expected 'soup' or 'minexch'"
            ))),
        }
    }
}

impl fmt::Display for TopologyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soup => f.write_str("soup"),
            Self::Minexch => f.write_str("minexch"),
        }
    }
}

// =============================================================================
// ENCODING IDS
// =============================================================================

/// Identifier of a versioned encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EncodingId {
    CommunitySoup,
    CommunityMinexch,
    CommunityMinexchNoHost,
    Scopes,
    Focus,
    Deadends,
}

impl EncodingId {
    /// All encodings, in catalog order.
    pub const ALL: [Self; 6] = [
        Self::CommunitySoup,
        Self::CommunityMinexch,
        Self::CommunityMinexchNoHost,
        Self::Scopes,
        Self::Focus,
        Self::Deadends,
    ];

    /// File name of the encoding inside an encodings directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::CommunitySoup => "community_soup.lp",
            Self::CommunityMinexch => "community_minexch.lp",
            Self::CommunityMinexchNoHost => "community_minexch_nohost.lp",
            Self::Scopes => "scopes.lp",
            Self::Focus => "iscope_in_community.lp",
            Self::Deadends => "deadends.lp",
        }
    }

    /// True for the optimizing community-selection encodings.
    #[must_use]
    pub const fn is_selection(self) -> bool {
        matches!(
            self,
            Self::CommunitySoup | Self::CommunityMinexch | Self::CommunityMinexchNoHost
        )
    }

    /// True for encodings that track explicit exchanges.
    #[must_use]
    pub const fn tracks_exchanges(self) -> bool {
        matches!(self, Self::CommunityMinexch | Self::CommunityMinexchNoHost)
    }

    const fn embedded(self) -> &'static str {
        match self {
            Self::CommunitySoup => include_str!("../encodings/community_soup.lp"),
            Self::CommunityMinexch => include_str!("../encodings/community_minexch.lp"),
            Self::CommunityMinexchNoHost => {
                include_str!("../encodings/community_minexch_nohost.lp")
            }
            Self::Scopes => include_str!("../encodings/scopes.lp"),
            Self::Focus => include_str!("../encodings/iscope_in_community.lp"),
            Self::Deadends => include_str!("../encodings/deadends.lp"),
        }
    }
}

impl fmt::Display for EncodingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name().trim_end_matches(".lp"))
    }
}

// =============================================================================
// SELECTION
// =============================================================================

/// Pick the community-selection encoding.
#[must_use]
pub const fn select(mode: TopologyMode, host_present: bool) -> EncodingId {
    match (mode, host_present) {
        (TopologyMode::Soup, _) => EncodingId::CommunitySoup,
        (TopologyMode::Minexch, true) => EncodingId::CommunityMinexch,
        (TopologyMode::Minexch, false) => EncodingId::CommunityMinexchNoHost,
    }
}

/// Pick the encoding for a model, inferring host presence from a `draft` fact.
///
/// Must run before the model is moved into grounding.
#[must_use]
pub fn select_for(mode: TopologyMode, model: &FactModel) -> EncodingId {
    select(mode, model.has_draft())
}

// =============================================================================
// CATALOG
// =============================================================================

/// Source of encoding text: the copies compiled into the crate, or a directory.
#[derive(Debug, Clone, Default)]
pub struct EncodingCatalog {
    dir: Option<PathBuf>,
}

impl EncodingCatalog {
    /// Catalog of the compiled-in encodings.
    #[must_use]
    pub fn embedded() -> Self {
        Self { dir: None }
    }

    /// Catalog reading `<dir>/<file_name>`.
    pub fn from_dir(dir: &Path) -> Result<Self, SymbiotaError> {
        if !dir.is_dir() {
            return Err(SymbiotaError::not_found(dir, "Encodings directory"));
        }
        Ok(Self {
            dir: Some(dir.to_path_buf()),
        })
    }

    /// ASP source of an encoding.
    pub fn source(&self, id: EncodingId) -> Result<String, SymbiotaError> {
        match &self.dir {
            None => Ok(id.embedded().to_string()),
            Some(dir) => {
                let path = dir.join(id.file_name());
                fs::read_to_string(&path).map_err(|e| SymbiotaError::io(&path, &e))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

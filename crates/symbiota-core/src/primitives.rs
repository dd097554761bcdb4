//! # Innate Primitives
//!
//! Hardcoded constants for the Symbiota CORE.
//!
//! These are compiled into the binary and are immutable at runtime:
//! 1. **Vocabulary**: the closed set of predicate names exchanged with encodings.
//! 2. **Naming**: the organism name given to the host network.
//! 3. **Limits**: bounds that keep parsing and searching computationally bounded.

/// Organism name under which host facts are recorded.
///
/// Symbiont names are file stems, so a symbiont file named
/// `host_metab_mod.xml` collides with the host and is rejected by the builder.
pub const HOST_ORGANISM: &str = "host_metab_mod";

/// File extension of persisted instance files.
pub const INSTANCE_EXTENSION: &str = "lp";

/// Prefix of temporary instance and grounding files.
pub const TEMP_PREFIX: &str = "symbiota_";

/// Compartment reported for an exchange whose receiving organism does not
/// declare the metabolite as a species.
pub const UNKNOWN_COMPARTMENT: &str = "-";

/// Maximum accepted size for a single network file, in bytes.
///
/// Rejects absurd inputs before the XML reader buffers them.
pub const MAX_NETWORK_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Maximum number of exchange candidates the embedded solver will subset-search
/// for a single community before reporting the instance as too large.
pub const MAX_EXCHANGE_CANDIDATES: usize = 64;

/// Interval, in loop iterations, between deadline checks in the embedded solver.
pub const DEADLINE_CHECK_INTERVAL: usize = 256;

// =============================================================================
// PREDICATE VOCABULARY
// =============================================================================

/// Predicate names shared between the fact model, the encodings and the
/// result extractor.
pub mod predicates {
    // Instance vocabulary
    pub const REACTION: &str = "reaction";
    pub const REVERSIBLE: &str = "reversible";
    pub const REACTANT: &str = "reactant";
    pub const PRODUCT: &str = "product";
    pub const SPECIES: &str = "species";
    pub const BACTERIA: &str = "bacteria";
    pub const DRAFT: &str = "draft";
    pub const SEED: &str = "seed";
    pub const TARGET: &str = "target";
    pub const TARGET_SPECIES: &str = "target_species";

    // Community selection answers
    pub const CHOSEN_BACTERIA: &str = "chosen_bacteria";
    pub const EXCHANGED: &str = "exchanged";
    pub const NEWLY_PRODUCIBLE_TARGET: &str = "newly_producible_target";
    pub const UNPRODUCIBLE_TARGET: &str = "unproducible_target";
    pub const PRODUCIBLE_TARGET: &str = "producible_target";
    pub const TARGET_PRODUCER_SELECTED: &str = "target_producer_coop_selectedcom";

    // Scope answers
    pub const DSCOPE: &str = "dscope";
    pub const DPRODUCIBLE: &str = "dproducible";
    pub const DUNPRODUCIBLE: &str = "dunproducible";
    pub const NEWSCOPE_MICROBIOME: &str = "newscope_microbiome";
    pub const NEWSCOPE_WITH_HOST: &str = "newscope_with_host";
    pub const NEWLYPRODUCIBLE: &str = "newlyproducible";
    pub const AUNPRODUCIBLE: &str = "aunproducible";
    pub const TARGET_PRODUCER_INITIAL: &str = "target_producer_coop_initcom";

    // Focus answers
    pub const IPRODUCED: &str = "iproduced";
    pub const CPRODUCED: &str = "cproduced";

    // Dead-end answers
    pub const DEADEND_NP: &str = "deadend_np";
    pub const DEADEND_NC: &str = "deadend_nc";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_name_is_not_a_plausible_file_stem_clash() {
        assert!(!HOST_ORGANISM.contains('.'));
        assert!(!HOST_ORGANISM.is_empty());
    }

    #[test]
    fn limits_are_positive() {
        assert!(MAX_NETWORK_FILE_SIZE > 0);
        assert!(MAX_EXCHANGE_CANDIDATES > 0);
        assert!(DEADLINE_CHECK_INTERVAL > 0);
    }
}

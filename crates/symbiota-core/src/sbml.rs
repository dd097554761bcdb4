//! # SBML Reader
//!
//! Streaming extraction of network facts from SBML documents.
//!
//! Produces, for an organism `org`:
//! - `reaction(r, org)` for every `<reaction id="r">`
//! - `reversible(r, org)` when `reversible="true"`
//! - `reactant(m, r, org)` / `product(m, r, org)` from `<speciesReference species="m">`
//! - `species(m, name, compartment, org)` for every `<species>`
//!
//! Seed and target files are SBML documents whose `<listOfSpecies>` names the
//! compounds; only the species ids are read.
//!
//! Errors:
//! - `NotFound`: the file does not exist
//! - `MalformedInput`: XML syntax errors, no `<model>`, no required list
//! - `MissingField`: a required attribute is absent

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::primitives::MAX_NETWORK_FILE_SIZE;
use crate::types::{CompoundRole, Fact, NetworkReader, SymbiotaError};

/// SBML implementation of [`NetworkReader`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SbmlReader;

impl SbmlReader {
    /// Create a reader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn load(path: &Path) -> Result<String, SymbiotaError> {
        let meta = fs::metadata(path).map_err(|e| SymbiotaError::io(path, &e))?;
        if !meta.is_file() {
            return Err(SymbiotaError::not_found(path, "SBML file"));
        }
        if meta.len() > MAX_NETWORK_FILE_SIZE {
            return Err(SymbiotaError::malformed(
                path,
                format!("file size {} exceeds limit", meta.len()),
            ));
        }
        let bytes = fs::read(path).map_err(|e| SymbiotaError::io(path, &e))?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(_) => Err(SymbiotaError::malformed(path, "file is not valid UTF-8")),
        }
    }

    /// Parse network text. Exposed for callers holding the document in memory.
    pub fn parse_network(
        path: &Path,
        text: &str,
        organism: &str,
    ) -> Result<Vec<Fact>, SymbiotaError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut facts = Vec::new();
        let mut seen_model = false;
        let mut seen_reactions = false;
        let mut section = Section::Outside;
        let mut reaction: Option<String> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                SymbiotaError::malformed(
                    path,
                    format!("XML error at byte {}: {e}", reader.buffer_position()),
                )
            })?;

            let (e, empty) = match event {
                Event::Eof => break,
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::End(e) => {
                    match e.local_name().as_ref() {
                        b"listOfSpecies" | b"listOfReactions" => section = Section::Outside,
                        b"listOfReactants" | b"listOfProducts" => section = Section::Reactions,
                        b"reaction" => reaction = None,
                        _ => {}
                    }
                    continue;
                }
                _ => continue,
            };

            match e.local_name().as_ref() {
                b"model" => seen_model = true,
                b"listOfSpecies" if !empty => section = Section::Species,
                b"listOfReactions" => {
                    seen_reactions = true;
                    if !empty {
                        section = Section::Reactions;
                    }
                }
                b"listOfReactants" if !empty && reaction.is_some() => {
                    section = Section::Reactants;
                }
                b"listOfProducts" if !empty && reaction.is_some() => section = Section::Products,
                b"species" if section == Section::Species => {
                    let id = required(path, &e, "species", "id")?;
                    let compartment = required(path, &e, "species", "compartment")?;
                    let name = attribute(path, &e, "name")?.unwrap_or_else(|| id.clone());
                    facts.push(Fact::species(&id, &name, &compartment, organism));
                }
                b"reaction" if section == Section::Reactions => {
                    let id = required(path, &e, "reaction", "id")?;
                    facts.push(Fact::reaction(&id, organism));
                    if attribute(path, &e, "reversible")?.as_deref() == Some("true") {
                        facts.push(Fact::reversible(&id, organism));
                    }
                    reaction = if empty { None } else { Some(id) };
                }
                b"speciesReference" => {
                    if let Some(rid) = &reaction {
                        let metabolite = required(path, &e, "speciesReference", "species")?;
                        match section {
                            Section::Reactants => {
                                facts.push(Fact::reactant(&metabolite, rid, organism));
                            }
                            Section::Products => {
                                facts.push(Fact::product(&metabolite, rid, organism));
                            }
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }

        if !seen_model {
            return Err(SymbiotaError::malformed(path, "no <model> element"));
        }
        if !seen_reactions {
            return Err(SymbiotaError::malformed(path, "no <listOfReactions> element"));
        }
        Ok(facts)
    }

    /// Parse a compound list document.
    pub fn parse_compounds(
        path: &Path,
        text: &str,
        role: CompoundRole,
    ) -> Result<Vec<Fact>, SymbiotaError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut facts = Vec::new();
        let mut seen_list = false;
        let mut in_list = false;

        loop {
            let event = reader.read_event().map_err(|e| {
                SymbiotaError::malformed(
                    path,
                    format!("XML error at byte {}: {e}", reader.buffer_position()),
                )
            })?;

            match event {
                Event::Eof => break,
                Event::Start(e) if e.local_name().as_ref() == b"listOfSpecies" => {
                    seen_list = true;
                    in_list = true;
                }
                // An empty list has no body; species after it are outside.
                Event::Empty(e) if e.local_name().as_ref() == b"listOfSpecies" => seen_list = true,
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"species" if in_list => {
                        let id = required(path, &e, "species", "id")?;
                        facts.push(role.fact(&id));
                    }
                    _ => {}
                },
                Event::End(e) if e.local_name().as_ref() == b"listOfSpecies" => in_list = false,
                _ => {}
            }
        }

        if !seen_list {
            return Err(SymbiotaError::malformed(
                path,
                format!("no <listOfSpecies> element in {role} file"),
            ));
        }
        Ok(facts)
    }
}

impl NetworkReader for SbmlReader {
    fn read_network(&self, path: &Path, organism: &str) -> Result<Vec<Fact>, SymbiotaError> {
        let text = Self::load(path)?;
        Self::parse_network(path, &text, organism)
    }

    fn read_compounds(&self, path: &Path, role: CompoundRole) -> Result<Vec<Fact>, SymbiotaError> {
        let text = Self::load(path)?;
        Self::parse_compounds(path, &text, role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Species,
    Reactions,
    Reactants,
    Products,
}

fn attribute(path: &Path, e: &BytesStart<'_>, key: &str) -> Result<Option<String>, SymbiotaError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| SymbiotaError::malformed(path, format!("bad attribute: {err}")))?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            let value: Cow<'_, str> = attr
                .unescape_value()
                .map_err(|err| SymbiotaError::malformed(path, format!("bad attribute value: {err}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required(
    path: &Path,
    e: &BytesStart<'_>,
    element: &str,
    key: &str,
) -> Result<String, SymbiotaError> {
    match attribute(path, e, key)? {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(SymbiotaError::MissingField {
            path: path.to_path_buf(),
            element: element.to_string(),
            field: key.to_string(),
        }),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const NETWORK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sbml xmlns="http://www.sbml.org/sbml/level2">
  <model id="toy">
    <listOfSpecies>
      <species id="M_a" name="a" compartment="c"/>
      <species id="M_b" compartment="c"/>
    </listOfSpecies>
    <listOfReactions>
      <reaction id="R1" name="first" reversible="true">
        <listOfReactants>
          <speciesReference species="M_a" stoichiometry="1"/>
        </listOfReactants>
        <listOfProducts>
          <speciesReference species="M_b" stoichiometry="1"/>
        </listOfProducts>
      </reaction>
      <reaction id="R2" reversible="false">
        <listOfReactants><speciesReference species="M_b"/></listOfReactants>
        <listOfProducts/>
      </reaction>
    </listOfReactions>
  </model>
</sbml>"#;

    fn path() -> &'static Path {
        Path::new("toy.xml")
    }

    #[test]
    fn network_facts_are_extracted() {
        let facts = SbmlReader::parse_network(path(), NETWORK, "orgX").expect("parse");
        assert!(facts.contains(&Fact::reaction("R1", "orgX")));
        assert!(facts.contains(&Fact::reversible("R1", "orgX")));
        assert!(!facts.contains(&Fact::reversible("R2", "orgX")));
        assert!(facts.contains(&Fact::reactant("M_a", "R1", "orgX")));
        assert!(facts.contains(&Fact::product("M_b", "R1", "orgX")));
        assert!(facts.contains(&Fact::reactant("M_b", "R2", "orgX")));
        assert!(facts.contains(&Fact::species("M_a", "a", "c", "orgX")));
    }

    #[test]
    fn species_name_falls_back_to_id() {
        let facts = SbmlReader::parse_network(path(), NETWORK, "orgX").expect("parse");
        assert!(facts.contains(&Fact::species("M_b", "M_b", "c", "orgX")));
    }

    #[test]
    fn missing_compartment_is_missing_field() {
        let text = NETWORK.replace(r#"<species id="M_b" compartment="c"/>"#, r#"<species id="M_b"/>"#);
        let err = SbmlReader::parse_network(path(), &text, "orgX").expect_err("must fail");
        assert!(matches!(err, SymbiotaError::MissingField { ref field, .. } if field == "compartment"));
    }

    #[test]
    fn missing_reaction_id_is_missing_field() {
        let text = NETWORK.replace(r#"<reaction id="R2" reversible="false">"#, "<reaction>");
        let err = SbmlReader::parse_network(path(), &text, "orgX").expect_err("must fail");
        assert!(matches!(err, SymbiotaError::MissingField { ref element, .. } if element == "reaction"));
    }

    #[test]
    fn broken_xml_is_malformed() {
        let text = NETWORK.replace("</listOfReactions>", "</listOfReaction>");
        let err = SbmlReader::parse_network(path(), &text, "orgX").expect_err("must fail");
        assert!(matches!(err, SymbiotaError::MalformedInput { .. }));
    }

    #[test]
    fn network_without_reactions_is_malformed() {
        let text = r#"<sbml><model id="x"><listOfSpecies/></model></sbml>"#;
        let err = SbmlReader::parse_network(path(), text, "orgX").expect_err("must fail");
        assert!(matches!(err, SymbiotaError::MalformedInput { .. }));
    }

    #[test]
    fn compound_lists_become_seed_or_target_facts() {
        let seeds = SbmlReader::parse_compounds(path(), NETWORK, CompoundRole::Seed).expect("parse");
        assert_eq!(seeds, vec![Fact::seed("M_a"), Fact::seed("M_b")]);

        let targets =
            SbmlReader::parse_compounds(path(), NETWORK, CompoundRole::Target).expect("parse");
        assert_eq!(targets.len(), 2);
        assert!(targets.contains(&Fact::target("M_b")));
    }

    #[test]
    fn compound_file_without_species_list_is_malformed() {
        let text = r#"<sbml><model id="x"/></sbml>"#;
        let err = SbmlReader::parse_compounds(path(), text, CompoundRole::Seed).expect_err("must fail");
        assert!(matches!(err, SymbiotaError::MalformedInput { .. }));
    }

    #[test]
    fn empty_species_list_does_not_capture_later_species() {
        let text = r#"<sbml><model id="x">
            <listOfSpecies/>
            <listOfCompartments><species id="M_stray" compartment="c"/></listOfCompartments>
        </model></sbml>"#;
        let seeds = SbmlReader::parse_compounds(path(), text, CompoundRole::Seed).expect("parse");
        assert!(seeds.is_empty());
    }

    #[test]
    fn absent_file_is_not_found() {
        let err = SbmlReader::new()
            .read_network(Path::new("/no/such/network.xml"), "orgX")
            .expect_err("must fail");
        assert!(matches!(err, SymbiotaError::NotFound { .. }));
    }
}

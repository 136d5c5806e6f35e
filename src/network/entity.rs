//! Entities of a metabolic network.
//!
//! The structures in this module mirror the biochemical entities found in genome-scale
//! metabolic reconstructions: compartments, metabolites, reactions, genes, proteins,
//! enzyme complexes and pathways. All of them share a common set of attributes (id,
//! name, cross-references, free-text notes and RDF annotation, SBO term) which is exposed
//! through the [`Entity`] trait.
//!
//! Entities never own each other. Relations between entities (a reaction's participants,
//! a complex's components, a protein's gene) are expressed through ids which are resolved
//! against the owning [`BioNetwork`](crate::network::graph::BioNetwork).

use std::collections::BTreeSet;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use variantly::Variantly;

use crate::network::refs::Refs;

/// Common capabilities of every network entity.
pub trait Entity {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn refs(&self) -> &Refs;
    fn refs_mut(&mut self) -> &mut Refs;
    fn notes(&self) -> Option<&str>;
    fn set_notes(&mut self, notes: Option<String>);
    fn annotation(&self) -> Option<&str>;
    fn set_annotation(&mut self, annotation: Option<String>);
    fn sbo_term(&self) -> Option<&str>;

    /// The name if one is set, the id otherwise.
    fn display_name(&self) -> &str {
        if self.name().is_empty() {
            self.id()
        } else {
            self.name()
        }
    }
}

macro_rules! impl_entity {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> &str {
                    &self.id
                }

                fn name(&self) -> &str {
                    &self.name
                }

                fn refs(&self) -> &Refs {
                    &self.refs
                }

                fn refs_mut(&mut self) -> &mut Refs {
                    &mut self.refs
                }

                fn notes(&self) -> Option<&str> {
                    self.notes.as_deref()
                }

                fn set_notes(&mut self, notes: Option<String>) {
                    self.notes = notes;
                }

                fn annotation(&self) -> Option<&str> {
                    self.annotation.as_deref()
                }

                fn set_annotation(&mut self, annotation: Option<String>) {
                    self.annotation = annotation;
                }

                fn sbo_term(&self) -> Option<&str> {
                    self.sbo_term.as_deref()
                }
            }
        )+
    };
}

impl_entity!(Compartment, Metabolite, Gene, Protein, Complex, Pathway, Reaction);

/// A cellular compartment.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
pub struct Compartment {
    #[builder(setter(into))]
    pub id: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub name: String,

    /// Id of the enclosing compartment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub outside: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub size: Option<f64>,

    /// Id of the unit definition of `size`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub units: Option<String>,

    #[serde(default)]
    #[builder(default = "true")]
    pub constant: bool,

    #[serde(default)]
    #[builder(default)]
    pub refs: Refs,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub annotation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub sbo_term: Option<String>,
}

impl Compartment {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            constant: true,
            ..Default::default()
        }
    }
}

/// A small molecule taking part in reactions.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
pub struct Metabolite {
    #[builder(setter(into))]
    pub id: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub name: String,

    /// Id of the compartment holding this metabolite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub compartment: Option<String>,

    /// Chemical formula, e.g. `C6H12O6`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub formula: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub molecular_weight: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub charge: Option<i32>,

    /// Whether the metabolite lies on the system boundary.
    #[serde(default)]
    #[builder(default)]
    pub boundary_condition: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub inchi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub inchikey: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub smiles: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub initial_amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub initial_concentration: Option<f64>,

    #[serde(default)]
    #[builder(default)]
    pub has_only_substance_units: bool,

    #[serde(default)]
    #[builder(default)]
    pub constant: bool,

    #[serde(default)]
    #[builder(default)]
    pub refs: Refs,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub annotation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub sbo_term: Option<String>,
}

impl Metabolite {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A gene of the modelled organism.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
pub struct Gene {
    #[builder(setter(into))]
    pub id: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub name: String,

    #[serde(default)]
    #[builder(default)]
    pub refs: Refs,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub annotation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub sbo_term: Option<String>,
}

impl Gene {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A gene product. Many proteins may be encoded by the same gene.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
pub struct Protein {
    #[builder(setter(into))]
    pub id: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub name: String,

    /// Id of the encoding gene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub gene: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub compartment: Option<String>,

    #[serde(default)]
    #[builder(default)]
    pub boundary_condition: bool,

    /// Set on proteins synthesized from a gene association because the source had no
    /// explicit species for them.
    #[serde(default)]
    #[builder(default)]
    pub theoretical: bool,

    #[serde(default)]
    #[builder(default)]
    pub refs: Refs,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub annotation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub sbo_term: Option<String>,
}

impl Protein {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Reference to an enzyme, which is either a single protein or a complex.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Variantly,
)]
#[serde(tag = "kind", content = "id")]
pub enum EnzymeRef {
    Protein(String),
    Complex(String),
}

impl EnzymeRef {
    pub fn id(&self) -> &str {
        match self {
            EnzymeRef::Protein(id) | EnzymeRef::Complex(id) => id,
        }
    }

    /// The same kind of reference pointing at a different id.
    pub fn with_id(&self, id: String) -> Self {
        match self {
            EnzymeRef::Protein(_) => EnzymeRef::Protein(id),
            EnzymeRef::Complex(_) => EnzymeRef::Complex(id),
        }
    }
}

/// One component of a complex with its optional stoichiometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplexComponent {
    pub enzyme: EnzymeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stoichiometry: Option<f64>,
}

impl ComplexComponent {
    pub fn new(enzyme: EnzymeRef) -> Self {
        Self {
            enzyme,
            stoichiometry: None,
        }
    }
}

/// An enzyme complex made of proteins and possibly other complexes.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
pub struct Complex {
    #[builder(setter(into))]
    pub id: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub name: String,

    #[serde(default)]
    #[builder(default, setter(into, each(name = "component")))]
    pub components: Vec<ComplexComponent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub compartment: Option<String>,

    #[serde(default)]
    #[builder(default)]
    pub boundary_condition: bool,

    #[serde(default)]
    #[builder(default)]
    pub refs: Refs,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub annotation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub sbo_term: Option<String>,
}

impl Complex {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Ids of the direct components, ignoring stoichiometry.
    pub fn component_ids(&self) -> BTreeSet<&str> {
        self.components.iter().map(|c| c.enzyme.id()).collect()
    }
}

/// A metabolic pathway. Its member reactions are derived from
/// [`Reaction::pathways`] and not stored here.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
pub struct Pathway {
    #[builder(setter(into))]
    pub id: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub name: String,

    #[serde(default)]
    #[builder(default)]
    pub refs: Refs,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub annotation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub sbo_term: Option<String>,
}

impl Pathway {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A species taking part in a reaction side.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, PartialEq)]
pub struct Participant {
    /// Id of the metabolite.
    #[builder(setter(into))]
    pub species: String,

    #[serde(default = "default_coefficient")]
    #[builder(default = "1.0")]
    pub coefficient: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub compartment: Option<String>,
}

fn default_coefficient() -> f64 {
    1.0
}

impl Participant {
    pub fn new(species: impl Into<String>, coefficient: f64) -> Self {
        Self {
            species: species.into(),
            coefficient,
            compartment: None,
        }
    }
}

/// A flux bound value together with the id of its unit definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FluxBound {
    pub value: f64,
    pub unit: String,
}

impl FluxBound {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

/// A biochemical reaction.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
pub struct Reaction {
    #[builder(setter(into))]
    pub id: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub name: String,

    /// Substrates.
    #[serde(default)]
    #[builder(default, setter(into, each(name = "substrate")))]
    pub left: Vec<Participant>,

    /// Products.
    #[serde(default)]
    #[builder(default, setter(into, each(name = "product")))]
    pub right: Vec<Participant>,

    #[serde(default)]
    #[builder(default)]
    pub reversible: bool,

    /// Kinetic law formula in infix notation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub kinetic_formula: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub lower_bound: Option<FluxBound>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub upper_bound: Option<FluxBound>,

    /// Coefficient of this reaction in the flux objective.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub objective_coefficient: Option<f64>,

    /// Catalysing proteins and complexes.
    #[serde(default)]
    #[builder(default)]
    pub enzymes: BTreeSet<EnzymeRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub ec_number: Option<String>,

    /// Ids of the pathways this reaction belongs to.
    #[serde(default)]
    #[builder(default)]
    pub pathways: BTreeSet<String>,

    #[serde(default)]
    #[builder(default)]
    pub pmids: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub score: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub comment: Option<String>,

    /// Metabolite ids flagged as side compounds.
    #[serde(default)]
    #[builder(default)]
    pub side_compounds: BTreeSet<String>,

    /// Metabolite ids flagged as cofactors.
    #[serde(default)]
    #[builder(default)]
    pub cofactors: BTreeSet<String>,

    #[serde(default)]
    #[builder(default)]
    pub refs: Refs,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub annotation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub sbo_term: Option<String>,
}

impl Reaction {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Ids of all substrates and products.
    pub fn species_ids(&self) -> impl Iterator<Item = &str> {
        self.left
            .iter()
            .chain(self.right.iter())
            .map(|p| p.species.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_default_optional_fields() {
        let metabolite = MetaboliteBuilder::default()
            .id("glc__D_c")
            .name("D-Glucose")
            .formula("C6H12O6")
            .charge(0)
            .build()
            .expect("Failed to build metabolite");

        assert_eq!(metabolite.formula.as_deref(), Some("C6H12O6"));
        assert_eq!(metabolite.charge, Some(0));
        assert!(metabolite.compartment.is_none());
        assert!(!metabolite.boundary_condition);

        let reaction = ReactionBuilder::default()
            .id("PGI")
            .substrate(Participant::new("g6p_c", 1.0))
            .product(Participant::new("f6p_c", 1.0))
            .reversible(true)
            .build()
            .expect("Failed to build reaction");

        assert_eq!(reaction.species_ids().collect::<Vec<_>>(), ["g6p_c", "f6p_c"]);
        assert_eq!(reaction.display_name(), "PGI");
    }

    #[test]
    fn test_enzyme_ref_variants() {
        let protein = EnzymeRef::Protein("b0001".to_string());
        let complex = EnzymeRef::Complex("b0001__AND__b0002".to_string());

        assert!(protein.is_protein());
        assert!(complex.is_complex());
        assert_eq!(complex.id(), "b0001__AND__b0002");
        assert_eq!(protein.with_id("x".into()), EnzymeRef::Protein("x".into()));
    }
}

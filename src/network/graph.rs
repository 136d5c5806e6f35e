//! The [`BioNetwork`] aggregate.
//!
//! A network owns one insertion-ordered map per entity kind. Cross-entity relations are
//! stored as ids, so every operation that follows a relation resolves it against these
//! maps. Complex composition is walked through [`BioNetwork::enzyme_tree`], which guards
//! against cyclic or absurdly deep complexes instead of assuming the source data is a tree.

use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::network::{
    entity::{
        Compartment, Complex, ComplexComponent, EnzymeRef, FluxBound, Gene, Metabolite,
        Participant, Pathway, Protein, Reaction,
    },
    error::NetworkError,
    units::{UnitDefinition, FLUX_UNIT_ID, LEGACY_FLUX_UNIT_ID},
};

/// Maximum nesting of complexes followed during traversal.
pub const MAX_COMPLEX_DEPTH: usize = 64;

/// In-memory representation of one metabolic network.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BioNetwork {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// SBML level of the document this network was read from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbml_level: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbml_version: Option<u32>,

    #[serde(default)]
    pub unit_definitions: IndexMap<String, UnitDefinition>,

    #[serde(default)]
    pub compartments: IndexMap<String, Compartment>,

    #[serde(default)]
    pub metabolites: IndexMap<String, Metabolite>,

    #[serde(default)]
    pub genes: IndexMap<String, Gene>,

    #[serde(default)]
    pub proteins: IndexMap<String, Protein>,

    #[serde(default)]
    pub complexes: IndexMap<String, Complex>,

    #[serde(default)]
    pub pathways: IndexMap<String, Pathway>,

    #[serde(default)]
    pub reactions: IndexMap<String, Reaction>,

    /// Every enzyme catalysing at least one reaction.
    #[serde(default)]
    pub enzymes: IndexSet<EnzymeRef>,

    /// Raw SBML sub-trees with no counterpart in the object model, keyed by the
    /// section element name (e.g. `listOfEvents`).
    #[serde(default)]
    pub preserved: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// A resolved enzyme with its full composition.
#[derive(Debug, Clone, PartialEq)]
pub enum EnzymeTree<'a> {
    Protein(&'a Protein),
    Complex {
        complex: &'a Complex,
        components: Vec<EnzymeTree<'a>>,
    },
}

impl<'a> EnzymeTree<'a> {
    /// All proteins at the leaves of the tree, in traversal order.
    pub fn proteins(&self) -> Vec<&'a Protein> {
        match self {
            EnzymeTree::Protein(protein) => vec![*protein],
            EnzymeTree::Complex { components, .. } => {
                components.iter().flat_map(EnzymeTree::proteins).collect()
            }
        }
    }
}

macro_rules! entity_accessors {
    ($add:ident, $get:ident, $contains:ident, $field:ident, $ty:ty, $kind:literal) => {
        /// Adds an entity, failing if its id is already taken.
        pub fn $add(&mut self, entity: $ty) -> Result<(), NetworkError> {
            if self.$field.contains_key(&entity.id) {
                return Err(NetworkError::DuplicateId {
                    kind: $kind,
                    id: entity.id.clone(),
                });
            }
            self.$field.insert(entity.id.clone(), entity);
            Ok(())
        }

        pub fn $get(&self, id: &str) -> Option<&$ty> {
            self.$field.get(id)
        }

        pub fn $contains(&self, id: &str) -> bool {
            self.$field.contains_key(id)
        }
    };
}

impl BioNetwork {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    entity_accessors!(
        add_unit_definition,
        get_unit_definition,
        contains_unit_definition,
        unit_definitions,
        UnitDefinition,
        "unit definition"
    );
    entity_accessors!(
        add_compartment,
        get_compartment,
        contains_compartment,
        compartments,
        Compartment,
        "compartment"
    );
    entity_accessors!(
        add_metabolite,
        get_metabolite,
        contains_metabolite,
        metabolites,
        Metabolite,
        "metabolite"
    );
    entity_accessors!(
        add_gene,
        get_gene,
        contains_gene,
        genes,
        Gene,
        "gene"
    );
    entity_accessors!(
        add_protein,
        get_protein,
        contains_protein,
        proteins,
        Protein,
        "protein"
    );
    entity_accessors!(
        add_complex,
        get_complex,
        contains_complex,
        complexes,
        Complex,
        "complex"
    );
    entity_accessors!(
        add_pathway,
        get_pathway,
        contains_pathway,
        pathways,
        Pathway,
        "pathway"
    );
    entity_accessors!(
        add_reaction,
        get_reaction,
        contains_reaction,
        reactions,
        Reaction,
        "reaction"
    );

    /// Whether the referenced protein or complex exists.
    pub fn contains_enzyme(&self, enzyme: &EnzymeRef) -> bool {
        match enzyme {
            EnzymeRef::Protein(id) => self.proteins.contains_key(id),
            EnzymeRef::Complex(id) => self.complexes.contains_key(id),
        }
    }

    /// Attaches an enzyme to a reaction and to the network-wide enzyme index.
    pub fn affect_enzyme(
        &mut self,
        reaction_id: &str,
        enzyme: EnzymeRef,
    ) -> Result<(), NetworkError> {
        if !self.contains_enzyme(&enzyme) {
            return Err(NetworkError::UnknownEntity {
                kind: "enzyme",
                id: enzyme.id().to_string(),
            });
        }

        let reaction =
            self.reactions
                .get_mut(reaction_id)
                .ok_or_else(|| NetworkError::UnknownEntity {
                    kind: "reaction",
                    id: reaction_id.to_string(),
                })?;

        reaction.enzymes.insert(enzyme.clone());
        self.enzymes.insert(enzyme);
        Ok(())
    }

    /// Resolves an enzyme reference into its composition tree.
    ///
    /// Sub-complexes shared between branches are allowed; a complex appearing on its own
    /// path is reported as [`NetworkError::ComplexCycle`].
    pub fn enzyme_tree(&self, enzyme: &EnzymeRef) -> Result<EnzymeTree<'_>, NetworkError> {
        let mut path = Vec::new();
        self.enzyme_tree_inner(enzyme, &mut path)
    }

    fn enzyme_tree_inner<'a>(
        &'a self,
        enzyme: &EnzymeRef,
        path: &mut Vec<&'a str>,
    ) -> Result<EnzymeTree<'a>, NetworkError> {
        match enzyme {
            EnzymeRef::Protein(id) => self
                .proteins
                .get(id)
                .map(EnzymeTree::Protein)
                .ok_or_else(|| NetworkError::UnknownEntity {
                    kind: "protein",
                    id: id.clone(),
                }),
            EnzymeRef::Complex(id) => {
                let complex =
                    self.complexes
                        .get(id)
                        .ok_or_else(|| NetworkError::UnknownEntity {
                            kind: "complex",
                            id: id.clone(),
                        })?;

                if path.contains(&complex.id.as_str()) {
                    return Err(NetworkError::ComplexCycle(complex.id.clone()));
                }
                if path.len() >= MAX_COMPLEX_DEPTH {
                    return Err(NetworkError::ComplexTooDeep(
                        complex.id.clone(),
                        MAX_COMPLEX_DEPTH,
                    ));
                }

                path.push(complex.id.as_str());
                let components = complex
                    .components
                    .iter()
                    .map(|component| self.enzyme_tree_inner(&component.enzyme, path))
                    .collect::<Result<Vec<_>, _>>();
                path.pop();

                Ok(EnzymeTree::Complex {
                    complex,
                    components: components?,
                })
            }
        }
    }

    /// Proteins making up an enzyme.
    pub fn proteins_of(&self, enzyme: &EnzymeRef) -> Result<Vec<&Protein>, NetworkError> {
        Ok(self.enzyme_tree(enzyme)?.proteins())
    }

    /// Ids of the genes encoding an enzyme. Proteins without a gene are skipped.
    pub fn genes_of(&self, enzyme: &EnzymeRef) -> Result<BTreeSet<&str>, NetworkError> {
        Ok(self
            .proteins_of(enzyme)?
            .into_iter()
            .filter_map(|protein| protein.gene.as_deref())
            .collect())
    }

    /// Reactions belonging to a pathway, computed from [`Reaction::pathways`].
    pub fn pathway_reactions(&self, pathway_id: &str) -> Vec<&Reaction> {
        self.reactions
            .values()
            .filter(|reaction| reaction.pathways.contains(pathway_id))
            .collect()
    }

    /// Reactions consuming or producing a metabolite.
    pub fn reactions_of_metabolite(&self, metabolite_id: &str) -> Vec<&Reaction> {
        self.reactions
            .values()
            .filter(|reaction| reaction.species_ids().any(|id| id == metabolite_id))
            .collect()
    }

    /// Returns the id of the flux unit, adding the default one if the network has none.
    ///
    /// `mmol_per_gDW_per_hr` is preferred over the legacy `FLUX_UNIT` id.
    pub fn ensure_flux_unit(&mut self) -> String {
        if let Some(id) = self.flux_unit() {
            return id.to_string();
        }

        let unit = UnitDefinition::flux_default();
        let id = unit.id.clone();
        self.unit_definitions.insert(id.clone(), unit);
        id
    }

    /// The id of an existing flux unit, if the network defines one.
    pub fn flux_unit(&self) -> Option<&str> {
        [FLUX_UNIT_ID, LEGACY_FLUX_UNIT_ID]
            .into_iter()
            .find(|id| self.unit_definitions.contains_key(*id))
    }

    /// Returns a copy of the network in which every entity id, and every reference to
    /// one, has been passed through `rename`.
    ///
    /// Preserved raw SBML sections are copied untouched.
    pub fn renumber_ids<F>(&self, rename: F) -> BioNetwork
    where
        F: Fn(&str) -> String,
    {
        let opt = |id: &Option<String>| id.as_deref().map(&rename);
        let set = |ids: &BTreeSet<String>| -> BTreeSet<String> {
            ids.iter().map(|id| rename(id)).collect()
        };
        let participants = |side: &[Participant]| {
            side.iter()
                .map(|p| Participant {
                    species: rename(&p.species),
                    coefficient: p.coefficient,
                    compartment: opt(&p.compartment),
                })
                .collect::<Vec<_>>()
        };
        let bound = |bound: &Option<FluxBound>| {
            bound.as_ref().map(|b| FluxBound {
                value: b.value,
                unit: rename(&b.unit),
            })
        };
        let enzyme = |e: &EnzymeRef| e.with_id(rename(e.id()));

        let unit_definitions = self
            .unit_definitions
            .values()
            .map(|unit| {
                let id = rename(&unit.id);
                (id.clone(), UnitDefinition { id, ..unit.clone() })
            })
            .collect();

        let compartments = self
            .compartments
            .values()
            .map(|c| {
                let id = rename(&c.id);
                let renamed = Compartment {
                    id: id.clone(),
                    outside: opt(&c.outside),
                    units: opt(&c.units),
                    ..c.clone()
                };
                (id, renamed)
            })
            .collect();

        let metabolites = self
            .metabolites
            .values()
            .map(|m| {
                let id = rename(&m.id);
                let renamed = Metabolite {
                    id: id.clone(),
                    compartment: opt(&m.compartment),
                    ..m.clone()
                };
                (id, renamed)
            })
            .collect();

        let genes = self
            .genes
            .values()
            .map(|g| {
                let id = rename(&g.id);
                (id.clone(), Gene { id, ..g.clone() })
            })
            .collect();

        let proteins = self
            .proteins
            .values()
            .map(|p| {
                let id = rename(&p.id);
                let renamed = Protein {
                    id: id.clone(),
                    gene: opt(&p.gene),
                    compartment: opt(&p.compartment),
                    ..p.clone()
                };
                (id, renamed)
            })
            .collect();

        let complexes = self
            .complexes
            .values()
            .map(|c| {
                let id = rename(&c.id);
                let renamed = Complex {
                    id: id.clone(),
                    compartment: opt(&c.compartment),
                    components: c
                        .components
                        .iter()
                        .map(|component| ComplexComponent {
                            enzyme: enzyme(&component.enzyme),
                            stoichiometry: component.stoichiometry,
                        })
                        .collect(),
                    ..c.clone()
                };
                (id, renamed)
            })
            .collect();

        let pathways = self
            .pathways
            .values()
            .map(|p| {
                let id = rename(&p.id);
                (id.clone(), Pathway { id, ..p.clone() })
            })
            .collect();

        let reactions = self
            .reactions
            .values()
            .map(|r| {
                let id = rename(&r.id);
                let renamed = Reaction {
                    id: id.clone(),
                    left: participants(&r.left),
                    right: participants(&r.right),
                    lower_bound: bound(&r.lower_bound),
                    upper_bound: bound(&r.upper_bound),
                    enzymes: r.enzymes.iter().map(enzyme).collect(),
                    pathways: set(&r.pathways),
                    side_compounds: set(&r.side_compounds),
                    cofactors: set(&r.cofactors),
                    ..r.clone()
                };
                (id, renamed)
            })
            .collect();

        BioNetwork {
            id: rename(&self.id),
            unit_definitions,
            compartments,
            metabolites,
            genes,
            proteins,
            complexes,
            pathways,
            reactions,
            enzymes: self.enzymes.iter().map(enzyme).collect(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::entity::ComplexBuilder;

    fn network_with_complex() -> BioNetwork {
        let mut network = BioNetwork::new("test", "Test network");
        network.add_gene(Gene::new("gA", "gene A")).unwrap();
        network.add_gene(Gene::new("gB", "gene B")).unwrap();

        let mut protein_a = Protein::new("pA", "protein A");
        protein_a.gene = Some("gA".to_string());
        let mut protein_b = Protein::new("pB", "protein B");
        protein_b.gene = Some("gB".to_string());
        network.add_protein(protein_a).unwrap();
        network.add_protein(protein_b).unwrap();

        let complex = ComplexBuilder::default()
            .id("cAB")
            .component(ComplexComponent::new(EnzymeRef::Protein("pA".into())))
            .component(ComplexComponent::new(EnzymeRef::Protein("pB".into())))
            .build()
            .unwrap();
        network.add_complex(complex).unwrap();

        let mut reaction = Reaction::new("R1", "reaction 1");
        reaction.left.push(Participant::new("A", 1.0));
        reaction.right.push(Participant::new("B", 1.0));
        reaction.pathways.insert("glycolysis".to_string());
        network.add_reaction(reaction).unwrap();
        network
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut network = network_with_complex();
        let err = network.add_gene(Gene::new("gA", "")).unwrap_err();
        assert_eq!(
            err,
            NetworkError::DuplicateId {
                kind: "gene",
                id: "gA".to_string()
            }
        );
    }

    #[test]
    fn test_lookup_by_kind() {
        let network = network_with_complex();
        assert_eq!(
            network.get_protein("pA").and_then(|p| p.gene.as_deref()),
            Some("gA")
        );
        assert!(network.contains_complex("cAB"));
        assert!(!network.contains_protein("cAB"));
        assert!(network.get_metabolite("A").is_none());
    }

    #[test]
    fn test_affect_enzyme_updates_reaction_and_index() {
        let mut network = network_with_complex();
        let enzyme = EnzymeRef::Complex("cAB".to_string());
        network.affect_enzyme("R1", enzyme.clone()).unwrap();

        assert!(network.reactions["R1"].enzymes.contains(&enzyme));
        assert!(network.enzymes.contains(&enzyme));

        let missing = network.affect_enzyme("R1", EnzymeRef::Protein("nope".into()));
        assert!(missing.is_err());
    }

    #[test]
    fn test_genes_of_complex() {
        let network = network_with_complex();
        let genes = network
            .genes_of(&EnzymeRef::Complex("cAB".to_string()))
            .unwrap();
        assert_eq!(genes.into_iter().collect::<Vec<_>>(), ["gA", "gB"]);
    }

    #[test]
    fn test_cyclic_complex_is_detected() {
        let mut network = network_with_complex();
        network
            .complexes
            .get_mut("cAB")
            .unwrap()
            .components
            .push(ComplexComponent::new(EnzymeRef::Complex("cAB".into())));

        let result = network.enzyme_tree(&EnzymeRef::Complex("cAB".to_string()));
        assert_eq!(
            result.unwrap_err(),
            NetworkError::ComplexCycle("cAB".to_string())
        );
    }

    #[test]
    fn test_shared_subcomplex_is_not_a_cycle() {
        let mut network = network_with_complex();
        let outer = ComplexBuilder::default()
            .id("outer")
            .component(ComplexComponent::new(EnzymeRef::Complex("cAB".into())))
            .component(ComplexComponent::new(EnzymeRef::Complex("cAB".into())))
            .build()
            .unwrap();
        network.add_complex(outer).unwrap();

        let proteins = network
            .proteins_of(&EnzymeRef::Complex("outer".into()))
            .unwrap();
        assert_eq!(proteins.len(), 4);
    }

    #[test]
    fn test_pathway_reactions_are_computed() {
        let network = network_with_complex();
        let reactions = network.pathway_reactions("glycolysis");
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].id, "R1");
        assert!(network.pathway_reactions("tca").is_empty());
    }

    #[test]
    fn test_ensure_flux_unit_prefers_existing() {
        let mut network = network_with_complex();
        network
            .add_unit_definition(UnitDefinition {
                id: LEGACY_FLUX_UNIT_ID.to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(network.ensure_flux_unit(), LEGACY_FLUX_UNIT_ID);

        let mut empty = BioNetwork::default();
        assert_eq!(empty.ensure_flux_unit(), FLUX_UNIT_ID);
        assert!(empty.unit_definitions.contains_key(FLUX_UNIT_ID));
    }

    #[test]
    fn test_renumber_ids_rewrites_references() {
        let mut network = network_with_complex();
        network
            .affect_enzyme("R1", EnzymeRef::Complex("cAB".to_string()))
            .unwrap();

        let renamed = network.renumber_ids(|id| format!("x_{id}"));

        assert!(renamed.reactions.contains_key("x_R1"));
        let reaction = &renamed.reactions["x_R1"];
        assert_eq!(reaction.left[0].species, "x_A");
        assert!(reaction.pathways.contains("x_glycolysis"));
        assert!(reaction
            .enzymes
            .contains(&EnzymeRef::Complex("x_cAB".to_string())));
        assert_eq!(renamed.proteins["x_pA"].gene.as_deref(), Some("x_gA"));
        assert_eq!(
            renamed.complexes["x_cAB"].components[1].enzyme,
            EnzymeRef::Protein("x_pB".to_string())
        );

        // the source network is left untouched
        assert!(network.reactions.contains_key("R1"));
    }
}

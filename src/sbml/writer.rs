//! BioNetwork to SBML writer
//!
//! This module serializes a [`BioNetwork`] into an SBML document of Level 1, 2 or 3. It is
//! the mirror of the [reader](crate::sbml::reader): every section the reader consumes is
//! written back in the order SBML requires.
//!
//! ## Conversion Process
//!
//! 1. **Reconciliation**: structured attributes (formula, charge, EC number, pathways,
//!    gene association, ...) are written into the notes of their entity, and
//!    cross-references are merged into the RDF annotation
//! 2. **Identifier encoding**: every id is passed once through the SId codec, on a
//!    renumbered copy of the network
//! 3. **Emission**: unit definitions, compartments, species (metabolites, then proteins,
//!    then complexes), flux bound parameters, reactions, and the `fbc` and `groups`
//!    package lists
//! 4. **Preserved sections**: raw SBML sub-trees stashed by the reader are put back at
//!    their position in the model
//!
//! ## Flux Bounds
//!
//! For Level 3 with the `fbc` package, bounds become global parameters referenced by
//! `fbc:lowerFluxBound`/`fbc:upperFluxBound` and enzymes become a
//! `fbc:geneProductAssociation`. Otherwise bounds and objective coefficients are written
//! as kinetic-law parameters (`LOWER_BOUND`, `UPPER_BOUND`, `OBJECTIVE_COEFFICIENT`)
//! and the gene association is only kept in the notes.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use derive_builder::Builder;
use indexmap::IndexMap;

use crate::{
    gpr::{
        expr::GprExpr,
        resolver::{association_for_reaction, SBO_COMPLEX, SBO_PROTEIN},
    },
    network::{
        entity::{Compartment, Complex, Entity, Gene, Metabolite, Pathway, Protein, Reaction},
        graph::BioNetwork,
    },
    sbml::{
        annotation::merge_cv_terms,
        error::SBMLError,
        notes::{notes_for_metabolite, notes_for_reaction},
        sid,
        units::{format_number, unit_definition_to_xml},
        xml::{parse_fragment, parse_fragment_keeping, XmlElement, XmlNode},
    },
    warning::Warnings,
};

pub const FBC_NS: &str = "http://www.sbml.org/sbml/level3/version1/fbc/version2";
pub const GROUPS_NS: &str = "http://www.sbml.org/sbml/level3/version1/groups/version1";
pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

/// Placeholder rate of kinetic laws written only to carry flux parameters.
pub const FLUX_VALUE: &str = "FLUX_VALUE";

const SBO_FLUX_BOUND: &str = "SBO:0000625";
const SBO_GENE: &str = "SBO:0000243";
const SBO_PATHWAY: &str = "SBO:0000633";

const OBJECTIVE_ID: &str = "obj";
const DEFAULT_COMPARTMENT: &str = "default";
const GENE_PRODUCT_PREFIX: &str = "G_";
const METAID_PREFIX: &str = "meta_";

/// Core model lists in the order SBML requires them.
const MODEL_SECTIONS: &[&str] = &[
    "listOfFunctionDefinitions",
    "listOfUnitDefinitions",
    "listOfCompartmentTypes",
    "listOfSpeciesTypes",
    "listOfCompartments",
    "listOfSpecies",
    "listOfParameters",
    "listOfInitialAssignments",
    "listOfRules",
    "listOfConstraints",
    "listOfReactions",
    "listOfEvents",
];

/// Options of the SBML writer.
#[derive(Debug, Clone, Builder)]
pub struct WriterConfig {
    #[builder(default = "3")]
    pub level: u32,

    #[builder(default = "1")]
    pub version: u32,

    /// Write flux bounds, gene products and objectives with the `fbc` package (Level 3)
    #[builder(default = "true")]
    pub fbc: bool,

    /// Write pathways as `groups` (Level 3)
    #[builder(default = "true")]
    pub groups: bool,

    /// Escape identifiers that are not valid SIds
    #[builder(default = "true")]
    pub encode_ids: bool,

    /// Inject structured attributes into the notes
    #[builder(default = "true")]
    pub write_notes: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            level: 3,
            version: 1,
            fbc: true,
            groups: true,
            encode_ids: true,
            write_notes: true,
        }
    }
}

/// Result of writing a network.
#[derive(Debug, Clone)]
pub struct SbmlExport {
    pub xml: String,
    /// Recoverable issues found while writing
    pub warnings: Warnings,
}

/// Writes networks as SBML documents.
#[derive(Debug, Clone, Default)]
pub struct SbmlWriter {
    config: WriterConfig,
}

impl SbmlWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    /// Serializes a network into an SBML string.
    pub fn write_string(&self, network: &BioNetwork) -> Result<String, SBMLError> {
        Ok(self.export(network)?.xml)
    }

    /// Writes a network to an SBML file.
    ///
    /// # Arguments
    /// * `network` - The network to write
    /// * `path` - Destination of the SBML file
    ///
    /// # Returns
    /// * `Result<Warnings, SBMLError>` - The warnings raised while writing
    pub fn write_path(
        &self,
        network: &BioNetwork,
        path: impl AsRef<Path>,
    ) -> Result<Warnings, SBMLError> {
        let export = self.export(network)?;
        std::fs::write(path, export.xml)?;
        Ok(export.warnings)
    }

    /// Serializes a network, returning the document together with the warnings.
    ///
    /// # Errors
    /// Returns `SBMLError::UnsupportedLevel` for a level/version pair that does not
    /// exist, and `SBMLError::MalformedXml` if stored notes, annotations or preserved
    /// sections are not well-formed.
    pub fn export(&self, network: &BioNetwork) -> Result<SbmlExport, SBMLError> {
        let namespace = core_namespace(self.config.level, self.config.version)?;
        let mut warnings = Warnings::default();

        let state = WriteState::prepare(&self.config, network, &mut warnings);
        let document = state.document(namespace)?;

        Ok(SbmlExport {
            xml: format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}\n",
                document.to_xml_string()
            ),
            warnings,
        })
    }
}

/// Namespace of the SBML core for a level and version.
pub fn core_namespace(level: u32, version: u32) -> Result<String, SBMLError> {
    match (level, version) {
        (1, 1 | 2) => Ok("http://www.sbml.org/sbml/level1".to_string()),
        (2, 1) => Ok("http://www.sbml.org/sbml/level2".to_string()),
        (2, 2..=5) => Ok(format!("http://www.sbml.org/sbml/level2/version{version}")),
        (3, 1 | 2) => Ok(format!(
            "http://www.sbml.org/sbml/level3/version{version}/core"
        )),
        _ => Err(SBMLError::UnsupportedLevel(level, version)),
    }
}

/// Places every species without a compartment into the first compartment of the
/// network, since SBML requires one. A `default` compartment is created when the
/// network has none.
fn assign_default_compartment(network: &mut BioNetwork, warnings: &mut Warnings) {
    let homeless = network.metabolites.values().any(|m| m.compartment.is_none())
        || network.proteins.values().any(|p| p.compartment.is_none())
        || network.complexes.values().any(|c| c.compartment.is_none());
    if !homeless {
        return;
    }

    let default = match network.compartments.keys().next() {
        Some(id) => id.clone(),
        None => {
            warnings.document(format!(
                "Network has no compartment, species are written into '{DEFAULT_COMPARTMENT}'"
            ));
            network.compartments.insert(
                DEFAULT_COMPARTMENT.to_string(),
                Compartment::new(DEFAULT_COMPARTMENT),
            );
            DEFAULT_COMPARTMENT.to_string()
        }
    };

    let slots = network
        .metabolites
        .values_mut()
        .map(|m| (&m.id, &mut m.compartment))
        .chain(
            network
                .proteins
                .values_mut()
                .map(|p| (&p.id, &mut p.compartment)),
        )
        .chain(
            network
                .complexes
                .values_mut()
                .map(|c| (&c.id, &mut c.compartment)),
        );
    for (id, compartment) in slots {
        if compartment.is_none() {
            log::debug!("Species {id} has no compartment, writing it into {default}");
            *compartment = Some(default.clone());
        }
    }
}

/// Wraps an XML fragment into a new element.
fn wrap(name: &str, content: &str) -> Result<XmlElement, SBMLError> {
    let mut element = XmlElement::new(name);
    element.children = parse_fragment(content)?;
    Ok(element)
}

fn bool_value(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn bound_parameter_id(reaction_id: &str, upper: bool) -> String {
    if upper {
        format!("{reaction_id}_upper_bound")
    } else {
        format!("{reaction_id}_lower_bound")
    }
}

struct WriteState<'a> {
    config: &'a WriterConfig,
    network: BioNetwork,
    /// Gene associations by (encoded) reaction id, over raw gene ids
    associations: HashMap<String, GprExpr>,
    /// Gene product SIds by raw gene id
    gene_products: IndexMap<String, String>,
    /// Raw genes, written as gene products
    genes: Vec<Gene>,
}

impl<'a> WriteState<'a> {
    fn prepare(config: &'a WriterConfig, raw: &BioNetwork, warnings: &mut Warnings) -> Self {
        let encode = |id: &str| {
            if config.encode_ids {
                sid::encode(id)
            } else {
                id.to_string()
            }
        };

        let mut source = raw.clone();
        let mut associations = HashMap::new();
        for reaction in raw.reactions.values() {
            let association = association_for_reaction(raw, reaction, warnings);

            if config.write_notes {
                let text = association.as_ref().map(GprExpr::to_string);
                if let Some(notes) = notes_for_reaction(raw, reaction, text.as_deref()) {
                    if let Some(target) = source.reactions.get_mut(&reaction.id) {
                        target.notes = Some(notes.into_inner());
                    }
                }
            }

            if let Some(association) = association {
                associations.insert(encode(&reaction.id), association);
            }
        }

        if config.write_notes {
            for metabolite in raw.metabolites.values() {
                if let Some(notes) = notes_for_metabolite(metabolite) {
                    if let Some(target) = source.metabolites.get_mut(&metabolite.id) {
                        target.notes = Some(notes.into_inner());
                    }
                }
            }
        }

        let mut network = if config.encode_ids {
            source.renumber_ids(sid::encode)
        } else {
            source
        };
        assign_default_compartment(&mut network, warnings);

        let mut taken: HashSet<&str> = HashSet::new();
        taken.extend(network.unit_definitions.keys().map(String::as_str));
        taken.extend(network.compartments.keys().map(String::as_str));
        taken.extend(network.metabolites.keys().map(String::as_str));
        taken.extend(network.proteins.keys().map(String::as_str));
        taken.extend(network.complexes.keys().map(String::as_str));
        taken.extend(network.reactions.keys().map(String::as_str));
        taken.extend(network.pathways.keys().map(String::as_str));

        let mut genes: Vec<_> = raw.genes.values().cloned().collect();
        for association in associations.values() {
            for gene in association.genes() {
                if !genes.iter().any(|g| g.id == gene) {
                    genes.push(Gene::new(gene, ""));
                }
            }
        }

        let mut gene_products = IndexMap::new();
        for gene in &genes {
            let encoded = encode(&gene.id);
            let id = if taken.contains(encoded.as_str()) {
                format!("{GENE_PRODUCT_PREFIX}{encoded}")
            } else {
                encoded
            };
            gene_products.insert(gene.id.clone(), id);
        }

        Self {
            config,
            network,
            associations,
            gene_products,
            genes,
        }
    }

    fn level(&self) -> u32 {
        self.config.level
    }

    /// Level 1 Version 1 spells species `specie`.
    fn specie_spelling(&self) -> bool {
        self.level() == 1 && self.config.version == 1
    }

    fn fbc(&self) -> bool {
        self.level() >= 3 && self.config.fbc
    }

    fn groups(&self) -> bool {
        self.level() >= 3 && self.config.groups
    }

    fn supports_sbo(&self) -> bool {
        self.level() >= 3 || (self.level() == 2 && self.config.version >= 2)
    }

    fn set_sbo(&self, element: &mut XmlElement, sbo_term: Option<&str>) {
        if let Some(sbo_term) = sbo_term.filter(|_| self.supports_sbo()) {
            element.set_attr("sboTerm", sbo_term);
        }
    }

    /// Adds notes and annotation of an entity under the given SId.
    fn decorate<E: Entity>(
        &self,
        element: &mut XmlElement,
        sid: &str,
        entity: &E,
    ) -> Result<(), SBMLError> {
        if let Some(notes) = entity.notes().filter(|n| !n.trim().is_empty()) {
            element.push_child(XmlElement::verbatim("notes", notes)?);
        }

        let annotation = if self.level() >= 2 {
            let metaid = format!("{METAID_PREFIX}{sid}");
            let merged = merge_cv_terms(entity.annotation(), &metaid, entity.refs())?;
            if merged.is_some() {
                element.set_attr("metaid", metaid);
            }
            merged
        } else {
            entity.annotation().map(String::from)
        };

        if let Some(annotation) = annotation.filter(|a| !a.trim().is_empty()) {
            element.push_child(wrap("annotation", &annotation)?);
        }
        Ok(())
    }

    fn document(&self, namespace: String) -> Result<XmlElement, SBMLError> {
        let mut root = XmlElement::new("sbml")
            .with_attr("xmlns", namespace)
            .with_attr("level", self.level().to_string())
            .with_attr("version", self.config.version.to_string());
        if self.fbc() {
            root.set_attr("xmlns:fbc", FBC_NS);
            root.set_attr("fbc:required", "false");
        }
        if self.groups() {
            root.set_attr("xmlns:groups", GROUPS_NS);
            root.set_attr("groups:required", "false");
        }

        root.push_child(self.model()?);
        Ok(root)
    }

    fn model(&self) -> Result<XmlElement, SBMLError> {
        let network = &self.network;
        let mut model = XmlElement::new("model");
        if !network.id.is_empty() {
            model.set_attr("id", &network.id);
        }
        if !network.name.is_empty() {
            model.set_attr("name", &network.name);
        }
        if self.fbc() {
            model.set_attr("fbc:strict", "false");
        }

        if let Some(notes) = network.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            model.push_child(XmlElement::verbatim("notes", notes)?);
        }
        if let Some(annotation) = network.annotation.as_deref().filter(|a| !a.trim().is_empty()) {
            model.push_child(wrap("annotation", annotation)?);
        }

        let mut sections: HashMap<&str, XmlElement> = HashMap::new();
        for (name, raw) in &network.preserved {
            let nodes = parse_fragment_keeping(raw, &[name.as_str()])?;
            let element = nodes.into_iter().find_map(|node| match node {
                XmlNode::Element(element) => Some(element),
                _ => None,
            });
            match element {
                Some(element) => {
                    sections.insert(name.as_str(), element);
                }
                None => log::warn!("Preserved section {name} is empty, skipping it"),
            }
        }

        sections.insert("listOfUnitDefinitions", self.unit_definitions());
        sections.insert("listOfCompartments", self.compartments()?);
        sections.insert("listOfSpecies", self.species()?);
        if let Some(parameters) = self.flux_parameters() {
            sections.insert("listOfParameters", parameters);
        }
        sections.insert("listOfReactions", self.reactions()?);

        for name in MODEL_SECTIONS {
            if let Some(section) = sections.remove(name) {
                model.push_child(section);
            }
        }
        for (name, _) in sections {
            log::warn!("Preserved section {name} has no place in an SBML model, skipping it");
        }

        if self.fbc() {
            if let Some(objectives) = self.objectives() {
                model.push_child(objectives);
            }
            if let Some(gene_products) = self.gene_products()? {
                model.push_child(gene_products);
            }
        }
        if self.groups() {
            if let Some(groups) = self.pathway_groups()? {
                model.push_child(groups);
            }
        }

        Ok(model)
    }

    fn unit_definitions(&self) -> XmlElement {
        let mut list = XmlElement::new("listOfUnitDefinitions");
        for unit in self.network.unit_definitions.values() {
            list.push_child(unit_definition_to_xml(unit, self.level()));
        }
        list
    }

    fn compartments(&self) -> Result<XmlElement, SBMLError> {
        let mut list = XmlElement::new("listOfCompartments");
        for compartment in self.network.compartments.values() {
            list.push_child(self.compartment(compartment)?);
        }
        Ok(list)
    }

    fn compartment(&self, compartment: &Compartment) -> Result<XmlElement, SBMLError> {
        let mut element = XmlElement::new("compartment").with_attr("id", &compartment.id);
        if !compartment.name.is_empty() {
            element.set_attr("name", &compartment.name);
        }
        if let Some(outside) = &compartment.outside {
            element.set_attr("outside", outside);
        }
        if let Some(size) = compartment.size {
            let attribute = if self.level() == 1 { "volume" } else { "size" };
            element.set_attr(attribute, format_number(size));
        }
        if let Some(units) = &compartment.units {
            element.set_attr("units", units);
        }
        if self.level() >= 2 {
            element.set_attr("constant", bool_value(compartment.constant));
        }
        self.set_sbo(&mut element, compartment.sbo_term.as_deref());
        self.decorate(&mut element, &compartment.id, compartment)?;
        Ok(element)
    }

    /// Attributes shared by every kind of species.
    fn species_element(
        &self,
        id: &str,
        name: &str,
        compartment: Option<&str>,
        boundary: bool,
    ) -> XmlElement {
        let tag = if self.specie_spelling() { "specie" } else { "species" };
        let mut element = XmlElement::new(tag).with_attr("id", id);
        if !name.is_empty() {
            element.set_attr("name", name);
        }
        if let Some(compartment) = compartment {
            element.set_attr("compartment", compartment);
        }
        if self.level() == 1 {
            element.set_attr("initialAmount", "0");
        }
        if self.level() >= 2 {
            element.set_attr("hasOnlySubstanceUnits", "false");
        }
        element.set_attr("boundaryCondition", bool_value(boundary));
        if self.level() >= 2 {
            element.set_attr("constant", "false");
        }
        element
    }

    fn species(&self) -> Result<XmlElement, SBMLError> {
        let mut list = XmlElement::new("listOfSpecies");
        let mut emitted: HashSet<&str> = HashSet::new();

        for metabolite in self.network.metabolites.values() {
            if emitted.insert(&metabolite.id) {
                list.push_child(self.metabolite(metabolite)?);
            }
        }
        for protein in self.network.proteins.values() {
            if emitted.insert(&protein.id) {
                list.push_child(self.protein(protein)?);
            } else {
                log::debug!("Protein {} shares its id with another species", protein.id);
            }
        }
        for complex in self.network.complexes.values() {
            if emitted.insert(&complex.id) {
                list.push_child(self.complex(complex)?);
            } else {
                log::debug!("Complex {} shares its id with another species", complex.id);
            }
        }

        Ok(list)
    }

    fn metabolite(&self, metabolite: &Metabolite) -> Result<XmlElement, SBMLError> {
        let mut element = self.species_element(
            &metabolite.id,
            &metabolite.name,
            metabolite.compartment.as_deref(),
            metabolite.boundary_condition,
        );

        if let Some(amount) = metabolite.initial_amount {
            element.set_attr("initialAmount", format_number(amount));
        }
        if self.level() >= 2 {
            if let Some(concentration) = metabolite.initial_concentration {
                element.set_attr("initialConcentration", format_number(concentration));
            }
            element.set_attr(
                "hasOnlySubstanceUnits",
                bool_value(metabolite.has_only_substance_units),
            );
            element.set_attr("constant", bool_value(metabolite.constant));
        }

        if self.fbc() {
            if let Some(charge) = metabolite.charge {
                element.set_attr("fbc:charge", charge.to_string());
            }
            if let Some(formula) = &metabolite.formula {
                element.set_attr("fbc:chemicalFormula", formula);
            }
        } else if self.level() < 3 {
            if let Some(charge) = metabolite.charge {
                element.set_attr("charge", charge.to_string());
            }
        }

        self.set_sbo(&mut element, metabolite.sbo_term.as_deref());
        self.decorate(&mut element, &metabolite.id, metabolite)?;
        Ok(element)
    }

    fn protein(&self, protein: &Protein) -> Result<XmlElement, SBMLError> {
        let mut element = self.species_element(
            &protein.id,
            &protein.name,
            protein.compartment.as_deref(),
            protein.boundary_condition || protein.theoretical,
        );
        self.set_sbo(
            &mut element,
            Some(protein.sbo_term.as_deref().unwrap_or(SBO_PROTEIN)),
        );
        self.decorate(&mut element, &protein.id, protein)?;
        Ok(element)
    }

    fn complex(&self, complex: &Complex) -> Result<XmlElement, SBMLError> {
        let mut element = self.species_element(
            &complex.id,
            &complex.name,
            complex.compartment.as_deref(),
            complex.boundary_condition,
        );
        self.set_sbo(
            &mut element,
            Some(complex.sbo_term.as_deref().unwrap_or(SBO_COMPLEX)),
        );
        self.decorate(&mut element, &complex.id, complex)?;
        Ok(element)
    }

    /// Global parameters holding the flux bounds (Level 3 with `fbc`).
    fn flux_parameters(&self) -> Option<XmlElement> {
        if !self.fbc() {
            return None;
        }

        let mut list = XmlElement::new("listOfParameters");
        for reaction in self.network.reactions.values() {
            for (bound, upper) in [(&reaction.lower_bound, false), (&reaction.upper_bound, true)] {
                let Some(bound) = bound else {
                    continue;
                };
                list.push_child(
                    XmlElement::new("parameter")
                        .with_attr("id", bound_parameter_id(&reaction.id, upper))
                        .with_attr("value", format_number(bound.value))
                        .with_attr("units", &bound.unit)
                        .with_attr("constant", "true")
                        .with_attr("sboTerm", SBO_FLUX_BOUND),
                );
            }
        }

        (!list.children.is_empty()).then_some(list)
    }

    fn reactions(&self) -> Result<XmlElement, SBMLError> {
        let mut list = XmlElement::new("listOfReactions");
        for reaction in self.network.reactions.values() {
            list.push_child(self.reaction(reaction)?);
        }
        Ok(list)
    }

    fn species_references(
        &self,
        name: &str,
        reaction: &Reaction,
        upper: bool,
    ) -> Option<XmlElement> {
        let participants = if upper { &reaction.right } else { &reaction.left };
        if participants.is_empty() {
            return None;
        }

        let mut list = XmlElement::new(name);
        for participant in participants {
            let (tag, attribute) = if self.specie_spelling() {
                ("specieReference", "specie")
            } else {
                ("speciesReference", "species")
            };
            let mut reference = XmlElement::new(tag)
                .with_attr(attribute, &participant.species)
                .with_attr("stoichiometry", format_number(participant.coefficient));
            if self.level() >= 3 {
                reference.set_attr("constant", "true");
            }
            list.push_child(reference);
        }
        Some(list)
    }

    fn reaction(&self, reaction: &Reaction) -> Result<XmlElement, SBMLError> {
        let mut element = XmlElement::new("reaction").with_attr("id", &reaction.id);
        if !reaction.name.is_empty() {
            element.set_attr("name", &reaction.name);
        }
        element.set_attr("reversible", bool_value(reaction.reversible));
        if self.level() >= 3 {
            element.set_attr("fast", "false");
        }
        self.set_sbo(&mut element, reaction.sbo_term.as_deref());

        if self.fbc() {
            if reaction.lower_bound.is_some() {
                element.set_attr("fbc:lowerFluxBound", bound_parameter_id(&reaction.id, false));
            }
            if reaction.upper_bound.is_some() {
                element.set_attr("fbc:upperFluxBound", bound_parameter_id(&reaction.id, true));
            }
        }

        self.decorate(&mut element, &reaction.id, reaction)?;

        if let Some(reactants) = self.species_references("listOfReactants", reaction, false) {
            element.push_child(reactants);
        }
        if let Some(products) = self.species_references("listOfProducts", reaction, true) {
            element.push_child(products);
        }

        if self.level() >= 2 && !reaction.enzymes.is_empty() {
            let mut modifiers = XmlElement::new("listOfModifiers");
            for enzyme in &reaction.enzymes {
                modifiers.push_child(
                    XmlElement::new("modifierSpeciesReference").with_attr("species", enzyme.id()),
                );
            }
            element.push_child(modifiers);
        }

        if let Some(law) = self.kinetic_law(reaction)? {
            element.push_child(law);
        }

        if self.fbc() {
            if let Some(association) = self.associations.get(&reaction.id) {
                element.push_child(
                    XmlElement::new("fbc:geneProductAssociation")
                        .with_child(self.association(association)),
                );
            }
        }

        Ok(element)
    }

    fn kinetic_law(&self, reaction: &Reaction) -> Result<Option<XmlElement>, SBMLError> {
        let mut parameters: Vec<(&str, f64, Option<&str>)> = Vec::new();
        if !self.fbc() {
            if let Some(bound) = &reaction.lower_bound {
                parameters.push(("LOWER_BOUND", bound.value, Some(bound.unit.as_str())));
            }
            if let Some(bound) = &reaction.upper_bound {
                parameters.push(("UPPER_BOUND", bound.value, Some(bound.unit.as_str())));
            }
            if let Some(coefficient) = reaction.objective_coefficient {
                parameters.push(("OBJECTIVE_COEFFICIENT", coefficient, Some("dimensionless")));
            }
        }

        let formula = reaction.kinetic_formula.as_deref();
        if parameters.is_empty() && formula.is_none() {
            return Ok(None);
        }

        let mut law = XmlElement::new("kineticLaw");
        let math = formula.filter(|f| f.trim_start().starts_with('<'));

        if self.level() == 1 {
            let infix = formula.filter(|_| math.is_none()).unwrap_or(FLUX_VALUE);
            law.set_attr("formula", infix);
        } else {
            match math {
                Some(math) => law.children.extend(parse_fragment(math)?),
                None => {
                    if let Some(formula) = formula {
                        log::debug!(
                            "Kinetic law '{formula}' of {} is not MathML, writing {FLUX_VALUE}",
                            reaction.id
                        );
                    }
                    law.push_child(
                        XmlElement::new("math")
                            .with_attr("xmlns", MATHML_NS)
                            .with_child(XmlElement::new("ci").with_text(FLUX_VALUE)),
                    );
                }
            }
        }
        if math.is_none() {
            parameters.push((FLUX_VALUE, 0.0, self.network.flux_unit()));
        }

        let (list_name, parameter_name) = if self.level() >= 3 {
            ("listOfLocalParameters", "localParameter")
        } else {
            ("listOfParameters", "parameter")
        };
        let key = if self.level() == 1 { "name" } else { "id" };

        let mut list = XmlElement::new(list_name);
        for (name, value, units) in parameters {
            let mut parameter = XmlElement::new(parameter_name)
                .with_attr(key, name)
                .with_attr("value", format_number(value));
            if let Some(units) = units {
                parameter.set_attr("units", units);
            }
            list.push_child(parameter);
        }
        law.push_child(list);

        Ok(Some(law))
    }

    fn gene_product_id(&self, gene: &str) -> String {
        self.gene_products
            .get(gene)
            .cloned()
            .unwrap_or_else(|| sid::encode(gene))
    }

    fn association(&self, expr: &GprExpr) -> XmlElement {
        let (name, operands) = match expr {
            GprExpr::Gene(gene) => {
                return XmlElement::new("fbc:geneProductRef")
                    .with_attr("fbc:geneProduct", self.gene_product_id(gene));
            }
            GprExpr::And(operands) => ("fbc:and", operands),
            GprExpr::Or(operands) => ("fbc:or", operands),
        };

        operands
            .iter()
            .fold(XmlElement::new(name), |element, operand| {
                element.with_child(self.association(operand))
            })
    }

    fn objectives(&self) -> Option<XmlElement> {
        let mut flux_objectives = XmlElement::new("fbc:listOfFluxObjectives");
        for reaction in self.network.reactions.values() {
            if let Some(coefficient) = reaction.objective_coefficient {
                flux_objectives.push_child(
                    XmlElement::new("fbc:fluxObjective")
                        .with_attr("fbc:reaction", &reaction.id)
                        .with_attr("fbc:coefficient", format_number(coefficient)),
                );
            }
        }
        if flux_objectives.children.is_empty() {
            return None;
        }

        let objective = XmlElement::new("fbc:objective")
            .with_attr("fbc:id", OBJECTIVE_ID)
            .with_attr("fbc:type", "maximize")
            .with_child(flux_objectives);
        Some(
            XmlElement::new("fbc:listOfObjectives")
                .with_attr("fbc:activeObjective", OBJECTIVE_ID)
                .with_child(objective),
        )
    }

    fn gene_products(&self) -> Result<Option<XmlElement>, SBMLError> {
        if self.genes.is_empty() {
            return Ok(None);
        }

        let mut list = XmlElement::new("fbc:listOfGeneProducts");
        for gene in &self.genes {
            let id = self.gene_product_id(&gene.id);
            let mut element = XmlElement::new("fbc:geneProduct")
                .with_attr("fbc:id", &id)
                .with_attr("fbc:label", &gene.id);
            if !gene.name.is_empty() {
                element.set_attr("fbc:name", &gene.name);
            }
            self.set_sbo(&mut element, Some(gene.sbo_term.as_deref().unwrap_or(SBO_GENE)));
            self.decorate(&mut element, &id, gene)?;
            list.push_child(element);
        }
        Ok(Some(list))
    }

    fn pathway_group(&self, pathway: &Pathway) -> Result<XmlElement, SBMLError> {
        let mut element = XmlElement::new("groups:group")
            .with_attr("groups:id", &pathway.id)
            .with_attr("groups:kind", "partonomy");
        if !pathway.name.is_empty() {
            element.set_attr("groups:name", &pathway.name);
        }
        self.set_sbo(
            &mut element,
            Some(pathway.sbo_term.as_deref().unwrap_or(SBO_PATHWAY)),
        );
        self.decorate(&mut element, &pathway.id, pathway)?;

        let members = self.network.pathway_reactions(&pathway.id);
        if !members.is_empty() {
            let list = members
                .into_iter()
                .fold(XmlElement::new("groups:listOfMembers"), |list, reaction| {
                    list.with_child(
                        XmlElement::new("groups:member").with_attr("groups:idRef", &reaction.id),
                    )
                });
            element.push_child(list);
        }
        Ok(element)
    }

    fn pathway_groups(&self) -> Result<Option<XmlElement>, SBMLError> {
        if self.network.pathways.is_empty() {
            return Ok(None);
        }

        let mut list = XmlElement::new("groups:listOfGroups");
        for pathway in self.network.pathways.values() {
            list.push_child(self.pathway_group(pathway)?);
        }
        Ok(Some(list))
    }
}

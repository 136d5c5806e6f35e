//! SBML to BioNetwork reader
//!
//! This module reads SBML documents of Levels 1 to 3 into a [`BioNetwork`], including the
//! `fbc` (flux bounds, gene products, objectives) and `groups` (pathways) packages and the
//! legacy "extended SBML" reaction tags (`<enzyme>`, `<gene>`, `<pathway>`, ...).
//!
//! ## Conversion Process
//!
//! Sections are read in dependency order:
//!
//! 1. **Unit definitions**, so that flux bounds can refer to them
//! 2. **Compartments**
//! 3. **Reactions**, pulling in every species they reference (participants and
//!    modifiers) together with the proteins and complexes those species stand for
//! 4. **Unused species**, so that proteins or complexes not catalysing any reaction
//!    are kept as well
//! 5. **Preserved sections** without a counterpart in the object model
//!
//! Notes and RDF annotations are reconciled with the structured attributes along the
//! way, structured data taking precedence.
//!
//! ## Error Handling
//!
//! A missing or duplicated `listOfCompartments`, `listOfSpecies` or `listOfReactions`
//! aborts the conversion with an [`SBMLError`]. Everything else that is malformed is
//! skipped and reported in [`SbmlImport::warnings`].

use std::{collections::HashMap, path::Path};

use derive_builder::Builder;
use indexmap::IndexMap;

use crate::{
    gpr::{
        expr::{parse_gpr, GprExpr},
        resolver::{clause_count, EnzymeResolver, COMPLEX_SEPARATOR},
    },
    network::{
        entity::{
            Compartment, Complex, ComplexComponent, Entity, EnzymeRef, FluxBound, Gene,
            Metabolite, Participant, Pathway, Protein, Reaction,
        },
        graph::{BioNetwork, MAX_COMPLEX_DEPTH},
        units::UnitDefinition,
    },
    sbml::{
        annotation::parse_cv_terms,
        error::SBMLError,
        notes::{apply_references, apply_to_gene, apply_to_metabolite, apply_to_reaction, Notes},
        sid,
        speciestype::{normalize_sbo, SpeciesType},
        writer::FLUX_VALUE,
        xml::{parse_document_keeping, XmlElement},
    },
    warning::Warnings,
};

/// Model sections kept verbatim because the object model has no counterpart for them.
pub const PRESERVED_SECTIONS: &[&str] = &[
    "listOfFunctionDefinitions",
    "listOfCompartmentTypes",
    "listOfSpeciesTypes",
    "listOfInitialAssignments",
    "listOfRules",
    "listOfConstraints",
    "listOfEvents",
];

const REQUIRED_LISTS: [&str; 3] = ["listOfCompartments", "listOfSpecies", "listOfReactions"];

const LOWER_BOUND: &str = "LOWER_BOUND";
const UPPER_BOUND: &str = "UPPER_BOUND";
const OBJECTIVE_COEFFICIENT: &str = "OBJECTIVE_COEFFICIENT";

/// Options of the SBML reader.
#[derive(Debug, Clone, Builder)]
pub struct ReaderConfig {
    /// Decode `__<code>__` escapes in identifiers
    #[builder(default = "true")]
    pub decode_ids: bool,

    /// Fill unset attributes from `KEY: value` lines of the notes
    #[builder(default = "true")]
    pub parse_notes: bool,

    /// Turn RDF annotations into cross-references
    #[builder(default = "true")]
    pub parse_annotations: bool,

    /// Separator between component ids in complex species ids
    #[builder(default = "COMPLEX_SEPARATOR.to_string()", setter(into))]
    pub complex_separator: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            decode_ids: true,
            parse_notes: true,
            parse_annotations: true,
            complex_separator: COMPLEX_SEPARATOR.to_string(),
        }
    }
}

/// Result of reading an SBML document.
#[derive(Debug, Clone)]
pub struct SbmlImport {
    pub network: BioNetwork,
    /// Recoverable issues found while reading
    pub warnings: Warnings,
}

/// Reads SBML documents into networks.
#[derive(Debug, Clone, Default)]
pub struct SbmlReader {
    config: ReaderConfig,
}

impl SbmlReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Reads an SBML file.
    ///
    /// # Arguments
    /// * `path` - Path to the SBML file
    ///
    /// # Returns
    /// * `Result<SbmlImport, SBMLError>` - The network and the warnings raised while reading
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<SbmlImport, SBMLError> {
        let xml = std::fs::read_to_string(path)?;
        self.read_str(&xml)
    }

    /// Reads an SBML document from a string.
    ///
    /// # Errors
    /// Returns `SBMLError` if:
    /// - the XML is malformed or the root element is not `<sbml>`
    /// - the document has no model
    /// - a required list of the model is missing or duplicated
    pub fn read_str(&self, xml: &str) -> Result<SbmlImport, SBMLError> {
        let verbatim: Vec<&str> = std::iter::once("notes")
            .chain(PRESERVED_SECTIONS.iter().copied())
            .collect();
        let root = parse_document_keeping(xml, &verbatim)?;
        if root.local_name() != "sbml" {
            return Err(SBMLError::NotSBML(root.name.clone()));
        }

        let model = root.child("model").ok_or(SBMLError::MissingModel)?;
        for list in REQUIRED_LISTS {
            match model.children_named(list).count() {
                0 => return Err(SBMLError::MissingList(list)),
                1 => {}
                _ => return Err(SBMLError::DuplicateList(list)),
            }
        }

        let level = parse_attr::<u32>(&root, "level").unwrap_or(3);
        let version = parse_attr::<u32>(&root, "version").unwrap_or(1);
        log::debug!("Reading SBML level {level} version {version}");

        let mut state = ReadState::new(&self.config, model);
        state.network.sbml_level = Some(level);
        state.network.sbml_version = Some(version);
        state.read()?;

        Ok(SbmlImport {
            network: state.network,
            warnings: state.warnings,
        })
    }
}

fn parse_attr<T: std::str::FromStr>(element: &XmlElement, name: &str) -> Option<T> {
    element
        .attr_local(name)
        .and_then(|value| value.trim().parse().ok())
}

/// Parses an SBML boolean (`true`/`false`, `1`/`0`).
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Parses an SBML double, including `INF`, `-INF` and `NaN`.
fn parse_double(value: &str) -> Option<f64> {
    match value.trim() {
        "INF" | "inf" | "Infinity" => Some(f64::INFINITY),
        "-INF" | "-inf" | "-Infinity" => Some(f64::NEG_INFINITY),
        other => other.parse().ok(),
    }
}

/// Role under which a species is first encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Participant,
    Modifier,
    Component,
    Unused,
}

/// What a species id was resolved to.
#[derive(Debug, Clone, PartialEq)]
enum SpeciesKind {
    Metabolite,
    Enzyme(EnzymeRef),
}

/// A flux parameter (`fbc` v2 global parameter or v1 flux bound).
#[derive(Debug, Clone)]
struct FluxParameter {
    value: f64,
    units: Option<String>,
}

struct ReadState<'a> {
    config: &'a ReaderConfig,
    model: &'a XmlElement,
    resolver: EnzymeResolver,
    network: BioNetwork,
    warnings: Warnings,
    species: IndexMap<String, &'a XmlElement>,
    in_progress: Vec<String>,
    gene_products: HashMap<String, String>,
    group_members: HashMap<String, Vec<String>>,
    parameters: HashMap<String, FluxParameter>,
    v1_bounds: HashMap<String, (Option<FluxParameter>, Option<FluxParameter>)>,
    objectives: HashMap<String, f64>,
}

impl<'a> ReadState<'a> {
    fn new(config: &'a ReaderConfig, model: &'a XmlElement) -> Self {
        let resolver = EnzymeResolver {
            separator: config.complex_separator.clone(),
        };

        Self {
            config,
            model,
            resolver,
            network: BioNetwork::default(),
            warnings: Warnings::default(),
            species: IndexMap::new(),
            in_progress: Vec::new(),
            gene_products: HashMap::new(),
            group_members: HashMap::new(),
            parameters: HashMap::new(),
            v1_bounds: HashMap::new(),
            objectives: HashMap::new(),
        }
    }

    fn id(&self, raw: &str) -> String {
        if self.config.decode_ids {
            sid::decode_owned(raw.trim())
        } else {
            raw.trim().to_string()
        }
    }

    fn opt_id(&self, raw: Option<&str>) -> Option<String> {
        raw.filter(|v| !v.trim().is_empty()).map(|v| self.id(v))
    }

    /// Elements of a model list, empty if the list is absent.
    fn list(&self, name: &str) -> Vec<&'a XmlElement> {
        let model = self.model;
        model
            .child(name)
            .map(|list| list.elements().collect())
            .unwrap_or_default()
    }

    fn read(&mut self) -> Result<(), SBMLError> {
        let model = self.model;
        let id = model
            .attr_local("id")
            .map(|id| self.id(id))
            .unwrap_or_default();
        self.network.id = id;
        self.network.name = model.attr_local("name").unwrap_or_default().to_string();
        self.network.notes = model.child("notes").map(XmlElement::inner_xml);
        self.network.annotation = model.child("annotation").map(XmlElement::inner_xml);

        self.read_unit_definitions();
        self.read_compartments();

        self.index_species();
        self.read_gene_products();
        self.read_groups();
        self.read_flux_parameters();
        self.read_objectives();

        let reactions = self.list("listOfReactions");
        for reaction in reactions {
            self.read_reaction(reaction);
        }

        let unused: Vec<String> = self
            .species
            .keys()
            .filter(|id| self.kind_of(id).is_none())
            .cloned()
            .collect();
        for id in unused {
            self.ensure_species(&id, Role::Unused, 0);
        }

        for section in PRESERVED_SECTIONS {
            if let Some(element) = model.child(section) {
                self.network
                    .preserved
                    .insert(section.to_string(), element.to_xml_string());
            }
        }

        log::debug!(
            "Read {} compartments, {} metabolites, {} reactions, {} genes, {} proteins, {} complexes",
            self.network.compartments.len(),
            self.network.metabolites.len(),
            self.network.reactions.len(),
            self.network.genes.len(),
            self.network.proteins.len(),
            self.network.complexes.len(),
        );

        Ok(())
    }

    /// Reads notes and annotation common to every entity.
    fn read_common<E: Entity>(&mut self, element: &XmlElement, entity: &mut E) {
        let notes = element.child("notes").map(XmlElement::inner_xml);
        let annotation = element.child("annotation").map(XmlElement::inner_xml);

        if self.config.parse_annotations {
            if let Some(annotation) = &annotation {
                match parse_cv_terms(annotation) {
                    Ok(references) => {
                        for reference in references {
                            entity.refs_mut().add(reference);
                        }
                    }
                    Err(err) => self.warnings.element(
                        entity.id(),
                        format!("Ignoring unreadable annotation: {err}"),
                    ),
                }
            }
        }

        entity.set_notes(notes);
        entity.set_annotation(annotation);
    }

    fn sbo_term(element: &XmlElement) -> Option<String> {
        element.attr_local("sboTerm").and_then(normalize_sbo)
    }

    fn double(&mut self, element: &XmlElement, owner: &str, name: &str) -> Option<f64> {
        let raw = element.attr_local(name)?;
        let value = parse_double(raw);
        if value.is_none() {
            self.warnings
                .element(owner, format!("Ignoring unparseable {name} '{raw}'"));
        }
        value
    }

    fn bool_attr(&mut self, element: &XmlElement, owner: &str, name: &str) -> Option<bool> {
        let raw = element.attr_local(name)?;
        let value = parse_bool(raw);
        if value.is_none() {
            self.warnings
                .element(owner, format!("Ignoring unparseable {name} '{raw}'"));
        }
        value
    }

    fn read_unit_definitions(&mut self) {
        let lists = self.model.children_named("listOfUnitDefinitions").count();
        if lists == 0 {
            self.warnings
                .document("SBML model has no listOfUnitDefinitions");
            return;
        }

        let definitions = self.list("listOfUnitDefinitions");
        for element in definitions {
            match UnitDefinition::try_from(element) {
                Ok(mut unit) => {
                    unit.id = self.id(&unit.id);
                    let id = unit.id.clone();
                    if let Err(err) = self.network.add_unit_definition(unit) {
                        self.warnings.element(id, err.to_string());
                    }
                }
                Err(err) => self.warnings.element(
                    element.attr_local("id").unwrap_or_default(),
                    format!("Skipping unit definition: {err}"),
                ),
            }
        }
    }

    fn read_compartments(&mut self) {
        let compartments = self.list("listOfCompartments");
        for element in compartments {
            let Some(raw_id) = element.attr_non_empty("id") else {
                self.warnings.document("Skipping compartment without id");
                continue;
            };
            let id = self.id(raw_id);

            let mut compartment = Compartment::new(id.clone());
            compartment.name = element.attr_local("name").unwrap_or_default().to_string();
            compartment.outside = self.opt_id(element.attr_local("outside"));
            compartment.size = self
                .double(element, &id, "size")
                .or_else(|| element.attr_local("volume").and_then(parse_double));
            compartment.units = self.opt_id(element.attr_local("units"));
            if let Some(constant) = self.bool_attr(element, &id, "constant") {
                compartment.constant = constant;
            }
            compartment.sbo_term = Self::sbo_term(element);
            self.read_common(element, &mut compartment);

            if let Err(err) = self.network.add_compartment(compartment) {
                self.warnings.element(id, err.to_string());
            }
        }

        let dangling: Vec<(String, String)> = self
            .network
            .compartments
            .values()
            .filter_map(|c| {
                let outside = c.outside.as_ref()?;
                (!self.network.compartments.contains_key(outside))
                    .then(|| (c.id.clone(), outside.clone()))
            })
            .collect();
        for (id, outside) in dangling {
            self.warnings
                .element(&id, format!("Unknown outside compartment {outside}"));
            if let Some(compartment) = self.network.compartments.get_mut(&id) {
                compartment.outside = None;
            }
        }
    }

    fn index_species(&mut self) {
        let species = self.list("listOfSpecies");
        for element in species {
            match element.attr_non_empty("id") {
                Some(raw) => {
                    let id = self.id(raw);
                    if self.species.insert(id.clone(), element).is_some() {
                        self.warnings
                            .element(id, "Duplicate species id, keeping the last one");
                    }
                }
                None => self.warnings.document("Skipping species without id"),
            }
        }
    }

    fn read_gene_products(&mut self) {
        for element in self.list("listOfGeneProducts") {
            let Some(raw_id) = element.attr_non_empty("id") else {
                self.warnings.document("Skipping gene product without id");
                continue;
            };
            let sbml_id = self.id(raw_id);
            let gene_id = element
                .attr_non_empty("label")
                .map(|label| label.trim().to_string())
                .unwrap_or_else(|| sbml_id.clone());

            self.gene_products.insert(sbml_id, gene_id.clone());
            if self.network.genes.contains_key(&gene_id) {
                continue;
            }

            let mut gene = Gene::new(
                gene_id.clone(),
                element.attr_local("name").unwrap_or_default(),
            );
            gene.sbo_term = Self::sbo_term(element);
            self.read_common(element, &mut gene);
            if self.config.parse_notes {
                if let Some(notes) = gene.notes.clone() {
                    apply_to_gene(&Notes::from(notes), &mut gene);
                }
            }

            if let Err(err) = self.network.add_gene(gene) {
                self.warnings.element(gene_id, err.to_string());
            }
        }
    }

    fn read_groups(&mut self) {
        for element in self.list("listOfGroups") {
            let id = element
                .attr_non_empty("id")
                .or_else(|| element.attr_non_empty("name"))
                .map(|id| self.id(id));
            let Some(id) = id else {
                self.warnings.document("Skipping group without id or name");
                continue;
            };

            if !self.network.pathways.contains_key(&id) {
                let mut pathway = Pathway::new(
                    id.clone(),
                    element.attr_local("name").unwrap_or_default(),
                );
                pathway.sbo_term = Self::sbo_term(element);
                self.read_common(element, &mut pathway);
                if let Err(err) = self.network.add_pathway(pathway) {
                    self.warnings.element(&id, err.to_string());
                }
            }

            let members = element
                .child("listOfMembers")
                .map(|list| list.elements().collect::<Vec<_>>())
                .unwrap_or_default();
            for member in members {
                if let Some(reference) = member.attr_non_empty("idRef") {
                    let reaction = self.id(reference);
                    self.group_members
                        .entry(reaction)
                        .or_default()
                        .push(id.clone());
                }
            }
        }
    }

    fn flux_parameter(&mut self, element: &XmlElement, owner: &str) -> Option<FluxParameter> {
        let value = self.double(element, owner, "value")?;
        Some(FluxParameter {
            value,
            units: self.opt_id(element.attr_local("units")),
        })
    }

    fn read_flux_parameters(&mut self) {
        let parameters = self.list("listOfParameters");
        for element in parameters {
            if let Some(raw) = element.attr_non_empty("id") {
                let id = self.id(raw);
                if let Some(parameter) = self.flux_parameter(element, &id) {
                    self.parameters.insert(id, parameter);
                }
            }
        }

        // fbc version 1
        for element in self.list("listOfFluxBounds") {
            let Some(reaction) = element.attr_non_empty("reaction").map(|r| self.id(r)) else {
                continue;
            };
            let operation = element.attr_local("operation").unwrap_or_default().to_string();
            let Some(bound) = self.flux_parameter(element, &reaction) else {
                continue;
            };

            let entry = self.v1_bounds.entry(reaction.clone()).or_default();
            match operation.as_str() {
                "greaterEqual" | "greater" => entry.0 = Some(bound),
                "lessEqual" | "less" => entry.1 = Some(bound),
                "equal" => {
                    entry.0 = Some(bound.clone());
                    entry.1 = Some(bound);
                }
                other => self
                    .warnings
                    .element(reaction, format!("Unknown flux bound operation '{other}'")),
            }
        }
    }

    fn read_objectives(&mut self) {
        let model = self.model;
        let Some(list) = model.child("listOfObjectives") else {
            return;
        };
        let active = list.attr_local("activeObjective");
        let objective = list
            .elements()
            .find(|o| active.is_some() && o.attr_local("id") == active)
            .or_else(|| list.elements().next());

        let Some(objective) = objective else {
            return;
        };
        let flux_objectives = objective
            .child("listOfFluxObjectives")
            .map(|l| l.elements().collect::<Vec<_>>())
            .unwrap_or_default();
        for flux_objective in flux_objectives {
            let Some(reaction) = flux_objective.attr_non_empty("reaction").map(|r| self.id(r))
            else {
                continue;
            };
            if let Some(coefficient) = self.double(flux_objective, &reaction, "coefficient") {
                self.objectives.insert(reaction, coefficient);
            }
        }
    }

    fn kind_of(&self, id: &str) -> Option<SpeciesKind> {
        if self.network.metabolites.contains_key(id) {
            Some(SpeciesKind::Metabolite)
        } else if self.network.proteins.contains_key(id) {
            Some(SpeciesKind::Enzyme(EnzymeRef::Protein(id.to_string())))
        } else if self.network.complexes.contains_key(id) {
            Some(SpeciesKind::Enzyme(EnzymeRef::Complex(id.to_string())))
        } else {
            None
        }
    }

    fn classify(&self, id: &str, element: &XmlElement, role: Role) -> SpeciesType {
        if let Some(kind) = element.attr_local("sboTerm").and_then(SpeciesType::from_sbo) {
            return kind;
        }

        let composite = self.resolver.complex_parts(id).len() > 1;
        match role {
            _ if composite => SpeciesType::Complex,
            Role::Modifier | Role::Component => SpeciesType::Protein,
            Role::Participant | Role::Unused => SpeciesType::Metabolite,
        }
    }

    /// Creates the entity behind a species id on first use.
    fn ensure_species(&mut self, id: &str, role: Role, depth: usize) -> Option<SpeciesKind> {
        if let Some(kind) = self.kind_of(id) {
            return Some(kind);
        }

        if self.in_progress.iter().any(|p| p == id) {
            self.warnings
                .element(id, "Complex species contains itself, ignoring the cycle");
            return None;
        }
        if depth > MAX_COMPLEX_DEPTH {
            self.warnings.element(
                id,
                format!("Complex nesting deeper than {MAX_COMPLEX_DEPTH} levels"),
            );
            return None;
        }

        let Some(element) = self.species.get(id).copied() else {
            return self.undeclared_species(id, role);
        };

        self.in_progress.push(id.to_string());
        let kind = match self.classify(id, element, role) {
            SpeciesType::Metabolite => self.read_metabolite(id, element),
            SpeciesType::Protein => self.read_protein(id, element),
            SpeciesType::Complex => self.read_complex(id, element, depth),
        };
        self.in_progress.pop();

        kind
    }

    fn undeclared_species(&mut self, id: &str, role: Role) -> Option<SpeciesKind> {
        self.warnings
            .element(id, "Species is referenced but not declared");

        match role {
            Role::Modifier | Role::Component => {
                match self.resolver.resolve_species_enzyme(&mut self.network, id) {
                    Ok(enzyme) => Some(SpeciesKind::Enzyme(enzyme)),
                    Err(err) => {
                        self.warnings.element(id, err.to_string());
                        None
                    }
                }
            }
            Role::Participant | Role::Unused => {
                let metabolite = Metabolite::new(id, id);
                match self.network.add_metabolite(metabolite) {
                    Ok(()) => Some(SpeciesKind::Metabolite),
                    Err(err) => {
                        self.warnings.element(id, err.to_string());
                        None
                    }
                }
            }
        }
    }

    fn read_metabolite(&mut self, id: &str, element: &XmlElement) -> Option<SpeciesKind> {
        let mut metabolite = Metabolite::new(id, element.attr_local("name").unwrap_or_default());
        metabolite.compartment = self.opt_id(element.attr_local("compartment"));
        metabolite.formula = element
            .attr_non_empty("chemicalFormula")
            .map(|f| f.trim().to_string());
        if let Some(charge) = element.attr_local("charge") {
            match charge.trim().parse::<f64>() {
                Ok(value) if value.fract() == 0.0 => metabolite.charge = Some(value as i32),
                _ => self
                    .warnings
                    .element(id, format!("Ignoring unparseable charge '{charge}'")),
            }
        }
        if let Some(boundary) = self.bool_attr(element, id, "boundaryCondition") {
            metabolite.boundary_condition = boundary;
        }
        if let Some(has_only) = self.bool_attr(element, id, "hasOnlySubstanceUnits") {
            metabolite.has_only_substance_units = has_only;
        }
        if let Some(constant) = self.bool_attr(element, id, "constant") {
            metabolite.constant = constant;
        }
        metabolite.initial_amount = self.double(element, id, "initialAmount");
        metabolite.initial_concentration = self.double(element, id, "initialConcentration");
        metabolite.sbo_term = Self::sbo_term(element);
        self.check_compartment(id, &metabolite.compartment);

        self.read_common(element, &mut metabolite);
        if self.config.parse_notes {
            if let Some(notes) = metabolite.notes.clone() {
                apply_to_metabolite(&Notes::from(notes), &mut metabolite, &mut self.warnings);
            }
        }

        match self.network.add_metabolite(metabolite) {
            Ok(()) => Some(SpeciesKind::Metabolite),
            Err(err) => {
                self.warnings.element(id, err.to_string());
                None
            }
        }
    }

    fn check_compartment(&mut self, id: &str, compartment: &Option<String>) {
        if let Some(compartment) = compartment {
            if !self.network.compartments.contains_key(compartment) {
                self.warnings
                    .element(id, format!("Unknown compartment {compartment}"));
            }
        }
    }

    fn read_protein(&mut self, id: &str, element: &XmlElement) -> Option<SpeciesKind> {
        let mut protein = Protein::new(id, element.attr_local("name").unwrap_or_default());
        protein.compartment = self.opt_id(element.attr_local("compartment"));
        if let Some(boundary) = self.bool_attr(element, id, "boundaryCondition") {
            protein.boundary_condition = boundary;
        }
        protein.sbo_term = Self::sbo_term(element);
        self.check_compartment(id, &protein.compartment);

        self.read_common(element, &mut protein);
        if self.config.parse_notes {
            if let Some(notes) = protein.notes.clone() {
                apply_references(&Notes::from(notes), &mut protein);
            }
        }

        match self.network.add_protein(protein) {
            Ok(()) => Some(SpeciesKind::Enzyme(EnzymeRef::Protein(id.to_string()))),
            Err(err) => {
                self.warnings.element(id, err.to_string());
                None
            }
        }
    }

    fn read_complex(
        &mut self,
        id: &str,
        element: &XmlElement,
        depth: usize,
    ) -> Option<SpeciesKind> {
        let parts: Vec<String> = self
            .resolver
            .complex_parts(id)
            .into_iter()
            .map(String::from)
            .collect();
        if parts.len() < 2 {
            self.warnings
                .element(id, "Complex id does not name its components");
        }

        let mut components = Vec::with_capacity(parts.len());
        if parts.len() > 1 {
            for part in &parts {
                let enzyme = if self.species.contains_key(part) {
                    match self.ensure_species(part, Role::Component, depth + 1) {
                        Some(SpeciesKind::Enzyme(enzyme)) => enzyme,
                        Some(SpeciesKind::Metabolite) => {
                            self.warnings.element(
                                id,
                                format!("Complex component {part} is a metabolite, skipping it"),
                            );
                            continue;
                        }
                        None => continue,
                    }
                } else {
                    match self.resolver.resolve_species_enzyme(&mut self.network, part) {
                        Ok(enzyme) => enzyme,
                        Err(err) => {
                            self.warnings.element(id, err.to_string());
                            continue;
                        }
                    }
                };
                components.push(ComplexComponent::new(enzyme));
            }
        }

        let mut complex = Complex::new(id, element.attr_local("name").unwrap_or_default());
        complex.components = components;
        complex.compartment = self.opt_id(element.attr_local("compartment"));
        if let Some(boundary) = self.bool_attr(element, id, "boundaryCondition") {
            complex.boundary_condition = boundary;
        }
        complex.sbo_term = Self::sbo_term(element);
        self.check_compartment(id, &complex.compartment);

        self.read_common(element, &mut complex);
        if self.config.parse_notes {
            if let Some(notes) = complex.notes.clone() {
                apply_references(&Notes::from(notes), &mut complex);
            }
        }

        match self.network.add_complex(complex) {
            Ok(()) => Some(SpeciesKind::Enzyme(EnzymeRef::Complex(id.to_string()))),
            Err(err) => {
                self.warnings.element(id, err.to_string());
                None
            }
        }
    }

    fn participants(
        &mut self,
        reaction_id: &str,
        element: &XmlElement,
        list: &str,
    ) -> Vec<Participant> {
        let references = element
            .child(list)
            .map(|l| l.elements().collect::<Vec<_>>())
            .unwrap_or_default();

        let mut participants = Vec::with_capacity(references.len());
        for reference in references {
            // level 1 uses `specie`
            let Some(raw) = reference
                .attr_non_empty("species")
                .or_else(|| reference.attr_non_empty("specie"))
            else {
                self.warnings
                    .element(reaction_id, format!("Skipping {list} entry without species"));
                continue;
            };
            let species = self.id(raw);
            if self.ensure_species(&species, Role::Participant, 0).is_none() {
                continue;
            }

            let coefficient = self
                .double(reference, reaction_id, "stoichiometry")
                .unwrap_or(1.0);
            let compartment = self
                .network
                .metabolites
                .get(&species)
                .and_then(|m| m.compartment.clone());

            participants.push(Participant {
                species,
                coefficient,
                compartment,
            });
        }
        participants
    }

    fn read_reaction(&mut self, element: &'a XmlElement) {
        let Some(raw_id) = element.attr_non_empty("id") else {
            self.warnings.document("Skipping reaction without id");
            return;
        };
        let id = self.id(raw_id);
        if self.network.reactions.contains_key(&id) {
            self.warnings.element(&id, "Duplicate reaction id, skipping");
            return;
        }

        let mut reaction =
            Reaction::new(id.clone(), element.attr_local("name").unwrap_or_default());
        reaction.reversible = self
            .bool_attr(element, &id, "reversible")
            .unwrap_or(true);
        reaction.sbo_term = Self::sbo_term(element);
        reaction.left = self.participants(&id, element, "listOfReactants");
        reaction.right = self.participants(&id, element, "listOfProducts");
        reaction.objective_coefficient = self.objectives.get(&id).copied();

        if let Some(pathways) = self.group_members.get(&id) {
            reaction.pathways.extend(pathways.iter().cloned());
        }

        self.read_fbc_bounds(element, &mut reaction);
        self.read_kinetic_law(element, &mut reaction);
        self.read_legacy_fields(element, &mut reaction);

        self.read_common(element, &mut reaction);
        let notes_association = reaction
            .notes
            .clone()
            .filter(|_| self.config.parse_notes)
            .and_then(|notes| apply_to_reaction(&Notes::from(notes), &mut reaction));

        let pathways: Vec<String> = reaction.pathways.iter().cloned().collect();
        if let Err(err) = self.network.add_reaction(reaction) {
            self.warnings.element(&id, err.to_string());
            return;
        }
        for pathway in pathways {
            if !self.network.pathways.contains_key(&pathway) {
                log::debug!("Creating pathway {pathway} referenced by reaction {id}");
                if let Err(err) = self.network.add_pathway(Pathway::new(pathway.clone(), pathway)) {
                    self.warnings.element(&id, err.to_string());
                }
            }
        }

        self.read_modifiers(&id, element);
        self.read_legacy_enzymes(&id, element);
        self.read_gene_product_association(&id, element);

        if let Some(text) = notes_association {
            self.read_notes_association(&id, &text);
        }
    }

    fn read_modifiers(&mut self, reaction_id: &str, element: &XmlElement) {
        let modifiers = element
            .child("listOfModifiers")
            .map(|l| l.elements().collect::<Vec<_>>())
            .unwrap_or_default();

        for modifier in modifiers {
            let Some(raw) = modifier.attr_non_empty("species") else {
                continue;
            };
            let species = self.id(raw);
            match self.ensure_species(&species, Role::Modifier, 0) {
                Some(SpeciesKind::Enzyme(enzyme)) => self.attach_enzyme(reaction_id, enzyme),
                Some(SpeciesKind::Metabolite) => log::debug!(
                    "Modifier {species} of reaction {reaction_id} is a metabolite, not an enzyme"
                ),
                None => {}
            }
        }
    }

    fn attach_enzyme(&mut self, reaction_id: &str, enzyme: EnzymeRef) {
        if let Err(err) = self.network.affect_enzyme(reaction_id, enzyme) {
            self.warnings.element(reaction_id, err.to_string());
        }
    }

    fn association_from_xml(&self, element: &XmlElement) -> Option<GprExpr> {
        match element.local_name() {
            "geneProductRef" => {
                let raw = element.attr_non_empty("geneProduct")?;
                let sbml_id = self.id(raw);
                let gene = self
                    .gene_products
                    .get(&sbml_id)
                    .cloned()
                    .unwrap_or(sbml_id);
                Some(GprExpr::Gene(gene))
            }
            "and" | "or" => {
                let operands: Vec<GprExpr> = element
                    .elements()
                    .filter_map(|child| self.association_from_xml(child))
                    .collect();
                if operands.is_empty() {
                    None
                } else if element.local_name() == "and" {
                    Some(GprExpr::and(operands))
                } else {
                    Some(GprExpr::or(operands))
                }
            }
            _ => None,
        }
    }

    fn read_gene_product_association(&mut self, reaction_id: &str, element: &XmlElement) {
        let Some(association) = element.child("geneProductAssociation") else {
            return;
        };
        let Some(expr) = association
            .elements()
            .find_map(|child| self.association_from_xml(child))
        else {
            self.warnings
                .element(reaction_id, "Empty gene product association");
            return;
        };

        if let Err(err) =
            self.resolver
                .resolve_clauses(&mut self.network, reaction_id, &expr.to_dnf())
        {
            self.warnings.element(reaction_id, err.to_string());
        }
    }

    /// Uses the notes gene association only if it names more enzymes than are known.
    fn read_notes_association(&mut self, reaction_id: &str, text: &str) {
        let expr = match parse_gpr(text) {
            Ok(expr) => expr,
            Err(err) => {
                self.warnings.element(
                    reaction_id,
                    format!("Ignoring gene association '{text}': {err}"),
                );
                return;
            }
        };

        let known = self
            .network
            .reactions
            .get(reaction_id)
            .map(|r| r.enzymes.len())
            .unwrap_or_default();
        if clause_count(&expr) <= known {
            return;
        }

        if let Err(err) =
            self.resolver
                .resolve_clauses(&mut self.network, reaction_id, &expr.to_dnf())
        {
            self.warnings.element(reaction_id, err.to_string());
        }
    }

    /// Unit of a flux bound, falling back to the network's flux unit.
    fn flux_unit(&mut self, declared: Option<&str>) -> String {
        if let Some(unit) = declared {
            if self.network.unit_definitions.contains_key(unit) {
                return unit.to_string();
            }
        }
        self.network.ensure_flux_unit()
    }

    fn bound(&mut self, parameter: &FluxParameter) -> FluxBound {
        let unit = self.flux_unit(parameter.units.as_deref());
        FluxBound::new(parameter.value, unit)
    }

    fn read_fbc_bounds(&mut self, element: &XmlElement, reaction: &mut Reaction) {
        for (attribute, upper) in [("lowerFluxBound", false), ("upperFluxBound", true)] {
            let Some(raw) = element.attr_non_empty(attribute) else {
                continue;
            };
            let parameter_id = self.id(raw);
            let Some(parameter) = self.parameters.get(&parameter_id).cloned() else {
                self.warnings.element(
                    &reaction.id,
                    format!("Unknown flux bound parameter {parameter_id}"),
                );
                continue;
            };

            let bound = self.bound(&parameter);
            if upper {
                reaction.upper_bound = Some(bound);
            } else {
                reaction.lower_bound = Some(bound);
            }
        }

        if let Some((lower, upper)) = self.v1_bounds.get(&reaction.id).cloned() {
            if reaction.lower_bound.is_none() {
                reaction.lower_bound = lower.map(|p| self.bound(&p));
            }
            if reaction.upper_bound.is_none() {
                reaction.upper_bound = upper.map(|p| self.bound(&p));
            }
        }
    }

    fn read_kinetic_law(&mut self, element: &XmlElement, reaction: &mut Reaction) {
        let Some(law) = element.child("kineticLaw") else {
            return;
        };

        let is_placeholder = |text: &str| text.trim() == FLUX_VALUE;
        reaction.kinetic_formula = law
            .child("math")
            .filter(|math| !is_placeholder(&math.text()))
            .map(XmlElement::to_xml_string)
            .or_else(|| {
                law.attr_non_empty("formula")
                    .filter(|formula| !is_placeholder(formula))
                    .map(String::from)
            });

        let parameters: Vec<&XmlElement> = ["listOfParameters", "listOfLocalParameters"]
            .iter()
            .filter_map(|list| law.child(list))
            .flat_map(|list| list.elements())
            .collect();

        for parameter in parameters {
            let names = [parameter.attr_local("id"), parameter.attr_local("name")];
            let is = |expected: &str| {
                names
                    .iter()
                    .flatten()
                    .any(|name| name.trim().eq_ignore_ascii_case(expected))
            };

            let Some(value) = self.double(parameter, &reaction.id, "value") else {
                continue;
            };
            let units = self.opt_id(parameter.attr_local("units"));

            if is(LOWER_BOUND) && reaction.lower_bound.is_none() {
                let unit = self.flux_unit(units.as_deref());
                reaction.lower_bound = Some(FluxBound::new(value, unit));
            } else if is(UPPER_BOUND) && reaction.upper_bound.is_none() {
                let unit = self.flux_unit(units.as_deref());
                reaction.upper_bound = Some(FluxBound::new(value, unit));
            } else if is(OBJECTIVE_COEFFICIENT) && reaction.objective_coefficient.is_none() {
                reaction.objective_coefficient = Some(value);
            }
        }
    }

    /// Values of a legacy tag: child ids, an `id` attribute, or comma separated text.
    fn legacy_values(&self, element: &XmlElement) -> Vec<String> {
        let children: Vec<String> = element
            .elements()
            .filter_map(|child| {
                child
                    .attr_non_empty("id")
                    .map(String::from)
                    .or_else(|| Some(child.text().trim().to_string()).filter(|t| !t.is_empty()))
            })
            .collect();
        if !children.is_empty() {
            return children;
        }

        if let Some(id) = element.attr_non_empty("id") {
            return vec![id.trim().to_string()];
        }

        element
            .text()
            .split([',', ';'])
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    }

    fn read_legacy_fields(&mut self, element: &XmlElement, reaction: &mut Reaction) {
        for child in element.elements() {
            let text = child.text().trim().to_string();
            match child.local_name() {
                "comment" if !text.is_empty() => reaction.comment = Some(text),
                "score" if !text.is_empty() => reaction.score = Some(text),
                "status" if !text.is_empty() => reaction.status = Some(text),
                "pmid" => reaction.pmids.extend(self.legacy_values(child)),
                "pathway" => {
                    for pathway in self.legacy_values(child) {
                        reaction.pathways.insert(self.id(&pathway));
                    }
                }
                "side-compounds" => {
                    for species in self.legacy_values(child) {
                        reaction.side_compounds.insert(self.id(&species));
                    }
                }
                "cofactors" => {
                    for species in self.legacy_values(child) {
                        reaction.cofactors.insert(self.id(&species));
                    }
                }
                _ => {}
            }
        }
    }

    fn read_legacy_enzymes(&mut self, reaction_id: &str, element: &XmlElement) {
        for child in element.elements() {
            let role = child.local_name();
            if !matches!(role, "enzyme" | "protein" | "gene") {
                continue;
            }

            for value in self.legacy_values(child) {
                let id = self.id(&value);
                let enzyme = if role == "gene" {
                    self.resolver
                        .resolve_clause(&mut self.network, &[id.clone()])
                        .map(|enzyme| enzyme.map(SpeciesKind::Enzyme))
                        .map_err(|err| err.to_string())
                } else if self.species.contains_key(&id) {
                    Ok(self.ensure_species(&id, Role::Modifier, 0))
                } else {
                    self.resolver
                        .resolve_species_enzyme(&mut self.network, &id)
                        .map(|enzyme| Some(SpeciesKind::Enzyme(enzyme)))
                        .map_err(|err| err.to_string())
                };

                match enzyme {
                    Ok(Some(SpeciesKind::Enzyme(enzyme))) => {
                        self.attach_enzyme(reaction_id, enzyme)
                    }
                    Ok(_) => {}
                    Err(err) => self.warnings.element(reaction_id, err),
                }
            }
        }
    }
}

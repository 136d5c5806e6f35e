//! Resolution of gene associations and enzyme species into network entities.
//!
//! Every alternative (clause) of a gene association becomes one enzyme of the reaction:
//! a bare [`Protein`] for a single gene, a [`Complex`] of proteins otherwise. Proteins and
//! complexes already in the network are reused; genes without any protein get a
//! placeholder ("theoretical") protein so that the association can still be represented.

use derive_builder::Builder;
use regex::Regex;

use crate::{
    gpr::{
        error::GprError,
        expr::{parse_gpr, GprExpr, ELLIPSIS},
    },
    network::{
        entity::{Complex, ComplexComponent, EnzymeRef, Gene, Protein, Reaction},
        graph::BioNetwork,
    },
    warning::Warnings,
};

/// Separator joining component ids into a complex id.
pub const COMPLEX_SEPARATOR: &str = "__AND__";

/// SBO term of proteins (polypeptide chain).
pub const SBO_PROTEIN: &str = "SBO:0000252";

/// SBO term of protein complexes.
pub const SBO_COMPLEX: &str = "SBO:0000297";

/// Resolves genes, proteins and complexes against a network.
#[derive(Debug, Clone, Builder)]
pub struct EnzymeResolver {
    /// Separator between component ids in complex ids
    #[builder(default = "COMPLEX_SEPARATOR.to_string()", setter(into))]
    pub separator: String,
}

impl Default for EnzymeResolver {
    fn default() -> Self {
        Self {
            separator: COMPLEX_SEPARATOR.to_string(),
        }
    }
}

impl EnzymeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits a complex id into its component ids.
    pub fn complex_parts<'a>(&self, id: &'a str) -> Vec<&'a str> {
        id.split(self.separator.as_str())
            .filter(|part| !part.is_empty())
            .collect()
    }

    /// Id of an existing protein standing for `gene`.
    ///
    /// Looked up, in order, by identical id, by gene link, and by id up to a short
    /// prefix and compartment suffix (`b0001` matches `M_b0001` or `b0001_c`). The first
    /// protein found wins.
    pub fn find_protein(&self, network: &BioNetwork, gene: &str) -> Option<String> {
        if network.proteins.contains_key(gene) {
            return Some(gene.to_string());
        }

        if let Some(protein) = network
            .proteins
            .values()
            .find(|protein| protein.gene.as_deref() == Some(gene))
        {
            return Some(protein.id.clone());
        }

        let pattern = format!(
            r"^(?:[A-Za-z]{{1,2}}_)?{}(?:_[A-Za-z0-9]{{1,3}})?$",
            regex::escape(gene)
        );
        let pattern = Regex::new(&pattern).ok()?;
        network
            .proteins
            .keys()
            .find(|id| pattern.is_match(id))
            .cloned()
    }

    /// Id of the protein encoded by `gene`, creating the gene and a placeholder protein
    /// when needed.
    ///
    /// An existing protein without a gene link is linked to `gene`.
    pub fn protein_for_gene(
        &self,
        network: &mut BioNetwork,
        gene: &str,
    ) -> Result<String, GprError> {
        let existing = self.find_protein(network, gene);

        let needs_gene = match &existing {
            Some(id) => network.proteins[id].gene.is_none(),
            None => true,
        };
        if needs_gene && !network.genes.contains_key(gene) {
            network.add_gene(Gene::new(gene, gene))?;
        }

        if let Some(id) = existing {
            if let Some(protein) = network.proteins.get_mut(&id) {
                if protein.gene.is_none() {
                    protein.gene = Some(gene.to_string());
                }
            }
            return Ok(id);
        }

        log::debug!("Creating theoretical protein for gene {gene}");
        let mut protein = Protein::new(gene, gene);
        protein.gene = Some(gene.to_string());
        protein.theoretical = true;
        protein.boundary_condition = true;
        protein.sbo_term = Some(SBO_PROTEIN.to_string());
        network.add_protein(protein)?;

        Ok(gene.to_string())
    }

    /// An existing complex made of exactly the given proteins.
    fn find_complex(&self, network: &BioNetwork, id: &str, proteins: &[String]) -> Option<String> {
        if network.complexes.contains_key(id) {
            return Some(id.to_string());
        }

        network
            .complexes
            .values()
            .find(|complex| {
                complex.components.len() == proteins.len()
                    && complex.components.iter().all(|component| {
                        component.enzyme.is_protein()
                            && proteins.iter().any(|p| p == component.enzyme.id())
                    })
            })
            .map(|complex| complex.id.clone())
    }

    /// Resolves one clause of a gene association into an enzyme.
    ///
    /// Returns `None` for an empty clause and for a clause containing `...`.
    pub fn resolve_clause(
        &self,
        network: &mut BioNetwork,
        clause: &[String],
    ) -> Result<Option<EnzymeRef>, GprError> {
        if clause.is_empty() || clause.iter().any(|gene| gene == ELLIPSIS) {
            log::debug!("Skipping incomplete gene association clause {clause:?}");
            return Ok(None);
        }

        let mut proteins: Vec<String> = Vec::with_capacity(clause.len());
        for gene in clause {
            let protein = self.protein_for_gene(network, gene)?;
            if !proteins.contains(&protein) {
                proteins.push(protein);
            }
        }

        if let [protein] = proteins.as_slice() {
            return Ok(Some(EnzymeRef::Protein(protein.clone())));
        }

        let id = proteins.join(self.separator.as_str());
        if let Some(existing) = self.find_complex(network, &id, &proteins) {
            return Ok(Some(EnzymeRef::Complex(existing)));
        }

        let mut complex = Complex::new(id.clone(), id.clone());
        complex.sbo_term = Some(SBO_COMPLEX.to_string());
        complex.components = proteins
            .into_iter()
            .map(|protein| ComplexComponent::new(EnzymeRef::Protein(protein)))
            .collect();
        network.add_complex(complex)?;

        Ok(Some(EnzymeRef::Complex(id)))
    }

    /// Resolves the clauses of a gene association and attaches the enzymes to a reaction.
    pub fn resolve_clauses(
        &self,
        network: &mut BioNetwork,
        reaction_id: &str,
        clauses: &[Vec<String>],
    ) -> Result<Vec<EnzymeRef>, GprError> {
        let mut enzymes = Vec::new();
        for clause in clauses {
            if let Some(enzyme) = self.resolve_clause(network, clause)? {
                network.affect_enzyme(reaction_id, enzyme.clone())?;
                if !enzymes.contains(&enzyme) {
                    enzymes.push(enzyme);
                }
            }
        }
        Ok(enzymes)
    }

    /// Parses a textual gene association and attaches its enzymes to a reaction.
    pub fn resolve_gene_association(
        &self,
        network: &mut BioNetwork,
        reaction_id: &str,
        text: &str,
    ) -> Result<Vec<EnzymeRef>, GprError> {
        let expr = parse_gpr(text)?;
        self.resolve_clauses(network, reaction_id, &expr.to_dnf())
    }

    /// Resolves the id of an enzyme species.
    ///
    /// Existing proteins and complexes are returned as is. An unknown id made of several
    /// components becomes a complex of the resolved components; any other unknown id
    /// becomes a placeholder protein.
    pub fn resolve_species_enzyme(
        &self,
        network: &mut BioNetwork,
        species_id: &str,
    ) -> Result<EnzymeRef, GprError> {
        if network.proteins.contains_key(species_id) {
            return Ok(EnzymeRef::Protein(species_id.to_string()));
        }
        if network.complexes.contains_key(species_id) {
            return Ok(EnzymeRef::Complex(species_id.to_string()));
        }

        let parts = self.complex_parts(species_id);
        if parts.len() < 2 {
            return Ok(EnzymeRef::Protein(
                self.protein_for_gene(network, species_id)?,
            ));
        }

        let mut components = Vec::with_capacity(parts.len());
        for part in parts {
            let enzyme = if network.complexes.contains_key(part) {
                EnzymeRef::Complex(part.to_string())
            } else if network.proteins.contains_key(part) {
                EnzymeRef::Protein(part.to_string())
            } else {
                EnzymeRef::Protein(self.protein_for_gene(network, part)?)
            };
            components.push(ComplexComponent::new(enzyme));
        }

        let mut complex = Complex::new(species_id, species_id);
        complex.sbo_term = Some(SBO_COMPLEX.to_string());
        complex.components = components;
        network.add_complex(complex)?;

        Ok(EnzymeRef::Complex(species_id.to_string()))
    }
}

/// Number of usable alternatives in a gene association, ignoring incomplete clauses.
pub fn clause_count(expr: &GprExpr) -> usize {
    expr.to_dnf()
        .iter()
        .filter(|clause| !clause.iter().any(|gene| gene == ELLIPSIS))
        .count()
}

/// Gene association of a reaction, derived from its enzymes.
///
/// Each enzyme contributes the conjunction of the genes of its proteins. Proteins without
/// a gene are left out with a warning, and an enzyme that cannot be resolved is skipped.
pub fn association_for_reaction(
    network: &BioNetwork,
    reaction: &Reaction,
    warnings: &mut Warnings,
) -> Option<GprExpr> {
    let mut alternatives: Vec<GprExpr> = Vec::new();

    for enzyme in &reaction.enzymes {
        let proteins = match network.proteins_of(enzyme) {
            Ok(proteins) => proteins,
            Err(err) => {
                warnings.element(&reaction.id, format!("Skipping enzyme {}: {err}", enzyme.id()));
                continue;
            }
        };

        let mut genes: Vec<&str> = Vec::new();
        for protein in proteins {
            match protein.gene.as_deref() {
                Some(gene) if !genes.contains(&gene) => genes.push(gene),
                Some(_) => {}
                None => warnings.element(
                    &protein.id,
                    format!(
                        "Protein has no gene and is left out of the gene association of {}",
                        reaction.id
                    ),
                ),
            }
        }

        if genes.is_empty() {
            continue;
        }
        let alternative = GprExpr::and(genes.into_iter().map(GprExpr::gene).collect());
        if !alternatives.contains(&alternative) {
            alternatives.push(alternative);
        }
    }

    (!alternatives.is_empty()).then(|| GprExpr::or(alternatives))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use super::*;

    fn network_with_reaction() -> BioNetwork {
        let mut network = BioNetwork::new("net", "");
        network.add_reaction(Reaction::new("R1", "")).unwrap();
        network
    }

    #[test]
    fn test_complex_and_isozyme_from_text() {
        let mut network = network_with_reaction();
        let resolver = EnzymeResolver::new();
        let enzymes = resolver
            .resolve_gene_association(&mut network, "R1", "(geneA and geneB) or (geneC)")
            .unwrap();

        assert_eq!(
            enzymes,
            vec![
                EnzymeRef::Complex("geneA__AND__geneB".to_string()),
                EnzymeRef::Protein("geneC".to_string()),
            ]
        );
        assert_eq!(network.reactions["R1"].enzymes.len(), 2);
        assert_eq!(network.enzymes.len(), 2);

        let complex = &network.complexes["geneA__AND__geneB"];
        assert_eq!(
            complex.component_ids(),
            BTreeSet::from(["geneA", "geneB"])
        );

        let protein = &network.proteins["geneC"];
        assert!(protein.theoretical);
        assert!(protein.boundary_condition);
        assert_eq!(protein.gene.as_deref(), Some("geneC"));
        assert!(network.genes.contains_key("geneA"));
    }

    #[test]
    fn test_existing_protein_is_reused_by_suffix() {
        let mut network = network_with_reaction();
        network.add_protein(Protein::new("b0001_c", "thrL")).unwrap();

        let resolver = EnzymeResolver::new();
        resolver
            .resolve_gene_association(&mut network, "R1", "b0001")
            .unwrap();

        assert_eq!(network.proteins.len(), 1);
        assert_eq!(network.proteins["b0001_c"].gene.as_deref(), Some("b0001"));
        assert!(network.reactions["R1"]
            .enzymes
            .contains(&EnzymeRef::Protein("b0001_c".to_string())));
    }

    #[test]
    fn test_existing_complex_is_matched_structurally() {
        let mut network = network_with_reaction();
        for id in ["pA", "pB"] {
            let mut protein = Protein::new(id, id);
            protein.gene = Some(format!("g{}", &id[1..]));
            network.add_protein(protein).unwrap();
        }
        let mut complex = Complex::new("my_complex", "");
        complex.components = vec![
            ComplexComponent::new(EnzymeRef::Protein("pB".into())),
            ComplexComponent::new(EnzymeRef::Protein("pA".into())),
        ];
        network.add_complex(complex).unwrap();

        let enzymes = EnzymeResolver::new()
            .resolve_gene_association(&mut network, "R1", "gA and gB")
            .unwrap();

        assert_eq!(enzymes, vec![EnzymeRef::Complex("my_complex".to_string())]);
        assert_eq!(network.complexes.len(), 1);
    }

    #[test]
    fn test_ellipsis_clause_is_skipped() {
        let mut network = network_with_reaction();
        let enzymes = EnzymeResolver::new()
            .resolve_gene_association(&mut network, "R1", "(g1 and ...) or g2")
            .unwrap();

        assert_eq!(enzymes, vec![EnzymeRef::Protein("g2".to_string())]);
        assert!(!network.genes.contains_key("g1"));
        assert_eq!(clause_count(&parse_gpr("(g1 and ...) or g2").unwrap()), 1);
    }

    #[test]
    fn test_species_enzyme_from_complex_id() {
        let mut network = BioNetwork::default();
        network.add_protein(Protein::new("pA", "")).unwrap();

        let enzyme = EnzymeResolver::new()
            .resolve_species_enzyme(&mut network, "pA__AND__pB")
            .unwrap();

        assert_eq!(enzyme, EnzymeRef::Complex("pA__AND__pB".to_string()));
        assert!(network.proteins["pB"].theoretical);
        assert!(!network.proteins["pA"].theoretical);
        assert_eq!(network.complexes["pA__AND__pB"].components.len(), 2);
    }

    #[test]
    fn test_association_round_trip() {
        let mut network = network_with_reaction();
        let resolver = EnzymeResolver::new();
        resolver
            .resolve_gene_association(&mut network, "R1", "(geneA and geneB) or geneC")
            .unwrap();

        let mut warnings = Warnings::default();
        let expr =
            association_for_reaction(&network, &network.reactions["R1"], &mut warnings).unwrap();

        let mut clauses = expr.to_dnf();
        clauses.sort();
        assert_eq!(
            clauses,
            vec![
                vec!["geneA".to_string(), "geneB".to_string()],
                vec!["geneC".to_string()],
            ]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_protein_without_gene_is_left_out() {
        let mut network = network_with_reaction();
        network.add_protein(Protein::new("orphan", "")).unwrap();
        network
            .affect_enzyme("R1", EnzymeRef::Protein("orphan".into()))
            .unwrap();

        let mut warnings = Warnings::default();
        let expr = association_for_reaction(&network, &network.reactions["R1"], &mut warnings);

        assert_eq!(expr, None);
        assert_eq!(warnings.len(), 1);
    }
}

#[cfg(test)]
mod test_sbml {
    use std::collections::BTreeSet;

    use approx::assert_relative_eq;
    use bionet::prelude::*;
    use bionet::sbml::xml::{parse_document, XmlElement};
    use pretty_assertions::assert_eq;

    const FBC_MODEL: &str = "tests/data/fbc_model.xml";
    const LEVEL2_MODEL: &str = "tests/data/level2_model.xml";
    const LEGACY_MODEL: &str = "tests/data/legacy_model.xml";

    fn read(path: &str) -> SbmlImport {
        SbmlReader::default()
            .read_path(path)
            .expect("Failed to read SBML fixture")
    }

    fn ids<T>(map: &indexmap::IndexMap<String, T>) -> BTreeSet<&str> {
        map.keys().map(String::as_str).collect()
    }

    /// Reads an SBML Level 3 model with `fbc` and `groups` and checks that every
    /// structured part ends up in the network.
    #[test]
    fn test_read_fbc_model() {
        // ACT
        let import = read(FBC_MODEL);
        let network = &import.network;

        // ASSERT
        assert_eq!(network.id, "e_coli_mini");
        assert_eq!(network.sbml_level, Some(3));
        assert_eq!(network.metabolites.len(), 5);
        assert_eq!(
            ids(&network.genes),
            BTreeSet::from(["b1817", "b2388", "b2415", "b2416"])
        );
        assert_eq!(network.genes["b2415"].name, "ptsH");

        // unused species with a protein SBO term
        assert!(network.proteins.contains_key("chaperone"));
        assert!(!network.metabolites.contains_key("chaperone"));

        let glucose = &network.metabolites["glc__D_e"];
        assert_eq!(glucose.formula.as_deref(), Some("C6H12O6"));
        assert_eq!(glucose.charge, Some(0));
        assert_eq!(network.metabolites["atp_c"].charge, Some(-4));

        let transport = &network.reactions["GLCpts"];
        assert!(!transport.reversible);
        assert_eq!(
            transport.enzymes,
            BTreeSet::from([
                EnzymeRef::Protein("b1817".to_string()),
                EnzymeRef::Complex("b2415__AND__b2416".to_string()),
            ])
        );
        let lower = transport.lower_bound.as_ref().unwrap();
        assert_relative_eq!(lower.value, 0.0);
        assert_eq!(lower.unit, "mmol_per_gDW_per_hr");
        assert_relative_eq!(transport.upper_bound.as_ref().unwrap().value, 1000.0);
        assert_eq!(transport.objective_coefficient, None);

        let hexokinase = &network.reactions["HEX1"];
        assert_eq!(hexokinase.objective_coefficient, Some(1.0));
        assert_eq!(
            hexokinase.pathways,
            BTreeSet::from(["glycolysis".to_string()])
        );
        assert_eq!(
            network.pathways["glycolysis"].name,
            "Glycolysis/Gluconeogenesis"
        );

        let complex = &network.complexes["b2415__AND__b2416"];
        assert_eq!(
            complex.component_ids(),
            BTreeSet::from(["b2415", "b2416"])
        );
        assert!(network.proteins["b2415"].theoretical);
        assert_eq!(network.proteins["b2415"].gene.as_deref(), Some("b2415"));

        assert!(import.warnings.is_empty(), "{:?}", import.warnings);
    }

    /// Writes the `fbc` model back to SBML Level 3 and reads it again.
    #[test]
    fn test_fbc_round_trip() {
        // ARRANGE
        let original = read(FBC_MODEL).network;

        // ACT
        let xml = SbmlWriter::default()
            .write_string(&original)
            .expect("Failed to write SBML");
        let import = SbmlReader::default()
            .read_str(&xml)
            .expect("Failed to read written SBML");
        let copy = &import.network;

        // ASSERT
        assert_eq!(ids(&copy.metabolites), ids(&original.metabolites));
        assert_eq!(ids(&copy.proteins), ids(&original.proteins));
        assert_eq!(ids(&copy.complexes), ids(&original.complexes));
        assert_eq!(ids(&copy.genes), ids(&original.genes));
        assert_eq!(ids(&copy.pathways), ids(&original.pathways));

        for (id, metabolite) in &original.metabolites {
            let other = &copy.metabolites[id];
            assert_eq!(other.name, metabolite.name);
            assert_eq!(other.compartment, metabolite.compartment);
            assert_eq!(other.formula, metabolite.formula);
            assert_eq!(other.charge, metabolite.charge);
        }

        for (id, reaction) in &original.reactions {
            let other = &copy.reactions[id];
            assert_eq!(other.left, reaction.left);
            assert_eq!(other.right, reaction.right);
            assert_eq!(other.reversible, reaction.reversible);
            assert_eq!(other.lower_bound, reaction.lower_bound);
            assert_eq!(other.upper_bound, reaction.upper_bound);
            assert_eq!(other.objective_coefficient, reaction.objective_coefficient);
            assert_eq!(other.enzymes, reaction.enzymes);
            assert_eq!(other.pathways, reaction.pathways);
        }

        for (id, gene) in &original.genes {
            assert_eq!(copy.genes[id].name, gene.name);
        }
        assert_eq!(
            copy.pathways["glycolysis"].name,
            original.pathways["glycolysis"].name
        );
    }

    /// Reads a Level 2 model whose bounds live in kinetic laws and whose gene
    /// association only exists in the notes.
    #[test]
    fn test_read_level2_model() {
        // ACT
        let import = read(LEVEL2_MODEL);
        let network = &import.network;

        // ASSERT
        assert_eq!(network.sbml_level, Some(2));
        assert!(network.metabolites.contains_key("M_C-x_c"));

        // the charge attribute wins over the notes
        let acetate = &network.metabolites["M_A_c"];
        assert_eq!(acetate.charge, Some(-1));
        assert_eq!(acetate.formula.as_deref(), Some("C2H3O2"));
        assert!(acetate.refs.contains("kegg", "C00033"));

        let reaction = &network.reactions["R_AB"];
        assert_eq!(reaction.objective_coefficient, Some(1.0));
        assert_eq!(reaction.ec_number.as_deref(), Some("1.1.1.1"));
        assert!(reaction.pathways.contains("Glycolysis"));
        assert!(network.pathways.contains_key("Glycolysis"));
        assert_eq!(reaction.kinetic_formula, None);

        // empty units fall back to the flux unit of the model
        let lower = reaction.lower_bound.as_ref().unwrap();
        assert_eq!(lower.unit, "mmol_per_gDW_per_hr");
        assert_relative_eq!(reaction.upper_bound.as_ref().unwrap().value, 1000.0);

        assert_eq!(
            reaction.enzymes,
            BTreeSet::from([
                EnzymeRef::Protein("geneC".to_string()),
                EnzymeRef::Complex("geneA__AND__geneB".to_string()),
            ])
        );
        assert_eq!(network.genes.len(), 3);

        // an undefined unit falls back as well
        let reverse = &network.reactions["R_BC"];
        assert!(reverse.reversible);
        assert_eq!(reverse.right[0].species, "M_C-x_c");
        assert_eq!(
            reverse.lower_bound.as_ref().map(|b| b.unit.as_str()),
            Some("mmol_per_gDW_per_hr")
        );
        assert_relative_eq!(reverse.left[0].coefficient, 2.0);
    }

    fn gene_product_refs(element: &XmlElement, refs: &mut Vec<String>) {
        if element.local_name() == "geneProductRef" {
            if let Some(id) = element.attr_local("geneProduct") {
                refs.push(id.to_string());
            }
        }
        for child in element.elements() {
            gene_product_refs(child, refs);
        }
    }

    /// A gene association read from Level 2 notes is written as an `fbc` association
    /// when the network is exported to Level 3.
    #[test]
    fn test_level2_association_written_as_fbc() {
        // ARRANGE
        let network = read(LEVEL2_MODEL).network;

        // ACT
        let xml = SbmlWriter::default()
            .write_string(&network)
            .expect("Failed to write SBML");
        let root = parse_document(&xml).unwrap();

        // ASSERT
        let reaction = root
            .child("model")
            .and_then(|model| model.child("listOfReactions"))
            .and_then(|list| list.elements().find(|r| r.attr("id") == Some("R_AB")))
            .expect("Reaction R_AB is missing");
        let association = reaction
            .child("geneProductAssociation")
            .expect("Missing gene product association");

        let or = association.child("or").expect("Expected an or association");
        assert_eq!(or.elements().count(), 2);
        assert!(or.child("and").is_some());

        let mut refs = Vec::new();
        gene_product_refs(association, &mut refs);
        refs.sort();
        assert_eq!(refs, vec!["G_geneA", "G_geneB", "G_geneC"]);

        // the written notes describe the same association
        assert!(xml.contains("geneC or (geneA and geneB)"));
    }

    /// Writes the Level 2 model to a file in Level 2 and reads it back.
    #[test]
    fn test_level2_file_round_trip() {
        // ARRANGE
        let network = read(LEVEL2_MODEL).network;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.xml");
        let config = WriterConfigBuilder::default()
            .level(2)
            .version(4)
            .build()
            .unwrap();

        // ACT
        SbmlWriter::new(config)
            .write_path(&network, &path)
            .expect("Failed to write SBML");
        let copy = SbmlReader::default().read_path(&path).unwrap().network;

        // ASSERT
        assert_eq!(ids(&copy.metabolites), ids(&network.metabolites));
        let reaction = &copy.reactions["R_AB"];
        assert_eq!(reaction.lower_bound, network.reactions["R_AB"].lower_bound);
        assert_eq!(reaction.objective_coefficient, Some(1.0));
        assert_eq!(reaction.enzymes, network.reactions["R_AB"].enzymes);
        assert_eq!(copy.metabolites["M_A_c"].charge, Some(-1));
    }

    /// Reads the pre-`fbc` reaction tags that older tools wrote directly inside
    /// `<reaction>`.
    #[test]
    fn test_read_legacy_reaction_tags() {
        // ACT
        let import = read(LEGACY_MODEL);
        let network = &import.network;

        // ASSERT
        let reaction = &network.reactions["R1"];
        assert_eq!(
            reaction.enzymes,
            BTreeSet::from([
                EnzymeRef::Protein("g9".to_string()),
                EnzymeRef::Complex("p1__AND__p2".to_string()),
            ])
        );
        assert!(network.genes.contains_key("g9"));
        assert_eq!(
            network.complexes["p1__AND__p2"].component_ids(),
            BTreeSet::from(["p1", "p2"])
        );

        assert_eq!(reaction.pathways, BTreeSet::from(["pw1".to_string()]));
        assert!(network.pathways.contains_key("pw1"));
        assert_eq!(
            reaction.pmids,
            BTreeSet::from(["123".to_string(), "456".to_string()])
        );
        assert_eq!(reaction.score.as_deref(), Some("3"));
        assert_eq!(reaction.side_compounds, BTreeSet::from(["A".to_string()]));
        assert_eq!(reaction.cofactors, BTreeSet::from(["NADH".to_string()]));

        // the cofactor is not a participant but still a species of the model
        assert!(network.metabolites.contains_key("NADH"));
        assert_eq!(network.metabolites["A"].formula.as_deref(), Some("C2H4O2"));
    }

    /// Model sections without a counterpart in the network are kept as read and
    /// written back at their place in the model.
    #[test]
    fn test_unhandled_sections_round_trip() {
        // ARRANGE
        let original = read(LEGACY_MODEL).network;
        let config = WriterConfigBuilder::default()
            .level(2)
            .version(4)
            .build()
            .unwrap();

        // ACT
        let xml = SbmlWriter::new(config)
            .write_string(&original)
            .expect("Failed to write SBML");
        let copy = SbmlReader::default()
            .read_str(&xml)
            .expect("Failed to read written SBML")
            .network;

        // ASSERT
        assert_eq!(
            original.preserved.keys().map(String::as_str).collect::<Vec<_>>(),
            vec![
                "listOfFunctionDefinitions",
                "listOfInitialAssignments",
                "listOfRules",
                "listOfEvents",
            ]
        );
        assert!(original.preserved["listOfRules"].contains("<apply><ci> twice </ci><ci> A </ci></apply>"));
        assert_eq!(copy.preserved, original.preserved);

        let root = parse_document(&xml).unwrap();
        let expected = [
            "listOfFunctionDefinitions",
            "listOfCompartments",
            "listOfSpecies",
            "listOfInitialAssignments",
            "listOfRules",
            "listOfReactions",
            "listOfEvents",
        ];
        let order: Vec<&str> = root
            .child("model")
            .unwrap()
            .elements()
            .map(|e| e.local_name())
            .filter(|name| expected.contains(name))
            .collect();
        assert_eq!(order, expected);
    }

    /// Notes are written back exactly as read, including the whitespace of mixed
    /// XHTML content.
    #[test]
    fn test_mixed_content_notes_round_trip() {
        // ARRANGE
        let original = read(LEGACY_MODEL).network;
        let notes = original.metabolites["A"].notes.clone().unwrap();
        assert!(notes.contains("<p>See <b>Smith</b> <i>et al.</i>, 2004</p>"));

        // ACT
        let xml = SbmlWriter::default()
            .write_string(&original)
            .expect("Failed to write SBML");
        let copy = SbmlReader::default().read_str(&xml).unwrap().network;

        // ASSERT
        assert_eq!(copy.metabolites["A"].notes.as_deref(), Some(notes.as_str()));
    }

    #[test]
    fn test_unsupported_level() {
        // ARRANGE
        let network = read(FBC_MODEL).network;
        let config = WriterConfigBuilder::default()
            .level(2)
            .version(9)
            .build()
            .unwrap();

        // ACT
        let result = SbmlWriter::new(config).write_string(&network);

        // ASSERT
        assert!(matches!(result, Err(SBMLError::UnsupportedLevel(2, 9))));
    }

    #[test]
    fn test_json_round_trip() {
        // ARRANGE
        let network = read(FBC_MODEL).network;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");

        // ACT
        save_network(&path, &network).expect("Failed to save network");
        let loaded = load_network(&path).expect("Failed to load network");

        // ASSERT
        assert_eq!(loaded, network);
    }
}

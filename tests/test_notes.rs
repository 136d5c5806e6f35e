#[cfg(test)]
mod test_notes {
    use bionet::prelude::*;
    use bionet::sbml::notes::{notes_for_metabolite, Notes};
    use pretty_assertions::assert_eq;

    const LEVEL2_MODEL: &str = "tests/data/level2_model.xml";

    fn level2_writer() -> SbmlWriter {
        let config = WriterConfigBuilder::default()
            .level(2)
            .version(4)
            .build()
            .unwrap();
        SbmlWriter::new(config)
    }

    fn notes_of(notes: &Option<String>) -> Notes {
        Notes::from(notes.clone().expect("Entity has no notes"))
    }

    /// Structured values are written back into the existing notes lines, so the keys
    /// of the notes stay the same through a write and read cycle.
    #[test]
    fn test_notes_survive_round_trip() {
        // ARRANGE
        let network = SbmlReader::default()
            .read_path(LEVEL2_MODEL)
            .unwrap()
            .network;

        // ACT
        let xml = level2_writer().write_string(&network).unwrap();
        let copy = SbmlReader::default().read_str(&xml).unwrap().network;

        // ASSERT
        let notes = notes_of(&copy.metabolites["M_A_c"].notes);
        assert_eq!(notes.keys(), vec!["FORMULA", "CHARGE", "KEGG"]);
        // the stale notes charge is replaced by the attribute value
        assert_eq!(notes.value_of("CHARGE").as_deref(), Some("-1"));
        assert_eq!(notes.value_of("formula").as_deref(), Some("C2H3O2"));

        let notes = notes_of(&copy.reactions["R_AB"].notes);
        assert_eq!(
            notes.keys(),
            vec!["GENE ASSOCIATION", "SUBSYSTEM", "EC NUMBER"]
        );
        assert_eq!(
            notes.value_of("GENE_ASSOCIATION").as_deref(),
            Some("geneC or (geneA and geneB)")
        );
        assert_eq!(notes.value_of("Subsystem").as_deref(), Some("Glycolysis"));
    }

    /// Injecting the structured values into notes that already hold them changes
    /// nothing.
    #[test]
    fn test_metabolite_notes_are_idempotent() {
        // ARRANGE
        let network = SbmlReader::default()
            .read_path(LEVEL2_MODEL)
            .unwrap()
            .network;
        let mut metabolite = network.metabolites["M_A_c"].clone();

        // ACT
        let first = notes_for_metabolite(&metabolite).unwrap();
        metabolite.notes = Some(first.as_str().to_string());
        let second = notes_for_metabolite(&metabolite).unwrap();

        // ASSERT
        assert_eq!(first, second);
        assert_eq!(second.values_of("KEGG"), vec!["C00033"]);
    }

    /// Attributes already set on an entity are never replaced by notes values.
    #[test]
    fn test_notes_do_not_clobber_attributes() {
        // ARRANGE
        let notes = Notes::from(
            "<body xmlns=\"http://www.w3.org/1999/xhtml\">\
             <p>FORMULA: C6H12O6</p><p>CHARGE: 2</p><p>INCHI: NA</p></body>",
        );
        let mut metabolite = Metabolite::new("glc", "glucose");
        metabolite.charge = Some(0);
        let mut warnings = Warnings::default();

        // ACT
        bionet::sbml::notes::apply_to_metabolite(&notes, &mut metabolite, &mut warnings);

        // ASSERT
        assert_eq!(metabolite.charge, Some(0));
        assert_eq!(metabolite.formula.as_deref(), Some("C6H12O6"));
        assert_eq!(metabolite.inchi, None);
        assert!(warnings.is_empty());
    }
}

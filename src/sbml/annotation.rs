//! MIRIAM cross-references stored as RDF controlled-vocabulary terms.
//!
//! SBML elements annotate themselves with blocks such as
//!
//! ```xml
//! <rdf:RDF>
//!   <rdf:Description rdf:about="#meta_glc">
//!     <bqbiol:is>
//!       <rdf:Bag>
//!         <rdf:li rdf:resource="https://identifiers.org/chebi/CHEBI:4167"/>
//!       </rdf:Bag>
//!     </bqbiol:is>
//!   </rdf:Description>
//! </rdf:RDF>
//! ```
//!
//! Each `rdf:li` becomes one [`BioRef`] tagged with the enclosing qualifier. When writing,
//! references are grouped so that every qualifier appears once, and an existing qualifier
//! bag is extended with the missing resources instead of being replaced.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    network::refs::{BioRef, Refs, Relation, ORIGIN_ANNOTATION},
    sbml::{
        error::SBMLError,
        xml::{fragment_to_string, parse_fragment, XmlElement, XmlNode},
    },
};

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const BQBIOL_NS: &str = "http://biomodels.net/biology-qualifiers/";
pub const BQMODEL_NS: &str = "http://biomodels.net/model-qualifiers/";

const IDENTIFIERS_ORG: &str = "https://identifiers.org/";

/// Database name used for resources that are not MIRIAM URIs.
pub const RAW_URI_DB: &str = "uri";

/// Splits a MIRIAM resource into database and identifier.
///
/// Both `identifiers.org` URLs (`https://identifiers.org/chebi/CHEBI:4167`, or the
/// compact `https://identifiers.org/CHEBI:4167`) and URNs (`urn:miriam:chebi:CHEBI%3A4167`)
/// are understood.
pub fn parse_resource(resource: &str) -> Option<(String, String)> {
    let resource = resource.trim();

    if let Some(rest) = resource.strip_prefix("urn:miriam:") {
        let (db, id) = rest.split_once(':')?;
        return Some((db.to_string(), id.replace("%3A", ":").replace("%3a", ":")));
    }

    let rest = ["https://identifiers.org/", "http://identifiers.org/"]
        .iter()
        .find_map(|prefix| resource.strip_prefix(prefix))?;

    match rest.split_once('/') {
        Some((db, id)) if !db.is_empty() && !id.is_empty() => {
            Some((db.to_string(), id.to_string()))
        }
        _ => {
            let (prefix, _) = rest.split_once(':')?;
            Some((prefix.to_lowercase(), rest.to_string()))
        }
    }
}

/// The resource URI written for a reference.
pub fn resource_for(reference: &BioRef) -> String {
    if reference.db == RAW_URI_DB {
        reference.id.clone()
    } else {
        format!("{IDENTIFIERS_ORG}{}/{}", reference.db, reference.id)
    }
}

fn is_qualifier(element: &XmlElement) -> bool {
    element.name.starts_with("bqbiol:") || element.name.starts_with("bqmodel:")
}

fn collect_qualifiers<'a>(element: &'a XmlElement, found: &mut Vec<&'a XmlElement>) {
    for child in element.elements() {
        if is_qualifier(child) {
            found.push(child);
        } else {
            collect_qualifiers(child, found);
        }
    }
}

fn resources_of(qualifier: &XmlElement) -> Vec<String> {
    let mut resources = Vec::new();
    collect_resources(qualifier, &mut resources);
    resources
}

fn collect_resources(element: &XmlElement, resources: &mut Vec<String>) {
    for child in element.elements() {
        if child.local_name() == "li" {
            if let Some(resource) = child.attr_non_empty("resource") {
                resources.push(resource.to_string());
            }
        }
        collect_resources(child, resources);
    }
}

/// Extracts the cross-references of an annotation block.
pub fn parse_cv_terms(annotation: &str) -> Result<Vec<BioRef>, SBMLError> {
    let nodes = parse_fragment(annotation)?;
    let mut qualifiers = Vec::new();
    for node in &nodes {
        if let XmlNode::Element(element) = node {
            if is_qualifier(element) {
                qualifiers.push(element);
            } else {
                collect_qualifiers(element, &mut qualifiers);
            }
        }
    }

    let mut references = Vec::new();
    for qualifier in qualifiers {
        let relation: Relation = qualifier
            .local_name()
            .parse()
            .unwrap_or_default();

        for resource in resources_of(qualifier) {
            let (db, id) = parse_resource(&resource)
                .unwrap_or_else(|| (RAW_URI_DB.to_string(), resource.clone()));
            references.push(BioRef::new(db, id, ORIGIN_ANNOTATION, relation.clone()));
        }
    }

    Ok(references)
}

fn known_pair(resource: &str) -> (String, String) {
    parse_resource(resource).unwrap_or_else(|| (RAW_URI_DB.to_string(), resource.to_string()))
}

/// Runs `update` on the first element of `nodes` matching `predicate`, or on a new
/// element from `create` which is then appended to `nodes`.
fn update_or_insert<T>(
    nodes: &mut Vec<XmlNode>,
    predicate: impl Fn(&XmlElement) -> bool,
    create: impl FnOnce() -> XmlElement,
    update: impl FnOnce(&mut XmlElement) -> T,
) -> T {
    let found = nodes.iter_mut().find_map(|node| match node {
        XmlNode::Element(element) if predicate(element) => Some(element),
        _ => None,
    });

    match found {
        Some(element) => update(element),
        None => {
            let mut element = create();
            let result = update(&mut element);
            nodes.push(XmlNode::Element(element));
            result
        }
    }
}

/// Adds the references of an entity to its annotation.
///
/// References are grouped by qualifier. A qualifier already present in `existing` is
/// extended with the resources it lacks; resources already listed (in any URI form) are
/// not repeated. Content of the annotation that is not RDF is kept as is. Returns `None`
/// only when there is neither an existing annotation nor a reference to write.
pub fn merge_cv_terms(
    existing: Option<&str>,
    metaid: &str,
    refs: &Refs,
) -> Result<Option<String>, SBMLError> {
    if refs.is_empty() {
        return Ok(existing.map(String::from));
    }

    let mut nodes = match existing {
        Some(annotation) if !annotation.trim().is_empty() => parse_fragment(annotation)?,
        _ => Vec::new(),
    };

    let mut grouped: BTreeMap<&Relation, Vec<&BioRef>> = BTreeMap::new();
    for reference in refs.iter() {
        grouped.entry(&reference.relation).or_default().push(reference);
    }

    update_or_insert(
        &mut nodes,
        |e| e.name == "rdf:RDF",
        || XmlElement::new("rdf:RDF"),
        |rdf| {
            for (prefix, namespace) in [
                ("xmlns:rdf", RDF_NS),
                ("xmlns:bqbiol", BQBIOL_NS),
                ("xmlns:bqmodel", BQMODEL_NS),
            ] {
                if rdf.attr(prefix).is_none() {
                    rdf.set_attr(prefix, namespace);
                }
            }

            update_or_insert(
                &mut rdf.children,
                |e| e.name == "rdf:Description",
                || XmlElement::new("rdf:Description"),
                |description| merge_description(description, metaid, grouped),
            );
        },
    );

    Ok(Some(fragment_to_string(&nodes)))
}

fn merge_description(
    description: &mut XmlElement,
    metaid: &str,
    grouped: BTreeMap<&Relation, Vec<&BioRef>>,
) {
    // the description must follow the metaid of the element it is written on
    description.set_attr("rdf:about", format!("#{metaid}"));

    for (relation, references) in grouped {
        let tag = relation.tag().to_string();
        update_or_insert(
            &mut description.children,
            |e| is_qualifier(e) && e.local_name() == tag,
            || XmlElement::new(format!("bqbiol:{tag}")),
            |qualifier| merge_qualifier(qualifier, &references),
        );
    }
}

fn merge_qualifier(qualifier: &mut XmlElement, references: &[&BioRef]) {
    let mut present: BTreeSet<(String, String)> = resources_of(qualifier)
        .iter()
        .map(|resource| known_pair(resource))
        .collect();

    update_or_insert(
        &mut qualifier.children,
        |e| e.name == "rdf:Bag",
        || XmlElement::new("rdf:Bag"),
        |bag| {
            for reference in references {
                let pair = (reference.db.clone(), reference.id.clone());
                if present.insert(pair) {
                    bag.push_child(
                        XmlElement::new("rdf:li")
                            .with_attr("rdf:resource", resource_for(reference)),
                    );
                }
            }
        },
    );
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const ANNOTATION: &str = r##"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:bqbiol="http://biomodels.net/biology-qualifiers/">
  <rdf:Description rdf:about="#meta_glc">
    <bqbiol:is>
      <rdf:Bag>
        <rdf:li rdf:resource="https://identifiers.org/chebi/CHEBI:4167"/>
        <rdf:li rdf:resource="urn:miriam:kegg.compound:C00031"/>
      </rdf:Bag>
    </bqbiol:is>
    <bqbiol:isDescribedBy>
      <rdf:Bag>
        <rdf:li rdf:resource="http://identifiers.org/pubmed/12345"/>
      </rdf:Bag>
    </bqbiol:isDescribedBy>
  </rdf:Description>
</rdf:RDF>"##;

    #[test]
    fn test_parse_resource() {
        assert_eq!(
            parse_resource("https://identifiers.org/kegg.compound/C00031"),
            Some(("kegg.compound".to_string(), "C00031".to_string()))
        );
        assert_eq!(
            parse_resource("urn:miriam:chebi:CHEBI%3A4167"),
            Some(("chebi".to_string(), "CHEBI:4167".to_string()))
        );
        assert_eq!(
            parse_resource("https://identifiers.org/CHEBI:4167"),
            Some(("chebi".to_string(), "CHEBI:4167".to_string()))
        );
        assert_eq!(parse_resource("http://example.org/x"), None);
    }

    #[test]
    fn test_parse_cv_terms() {
        let refs = parse_cv_terms(ANNOTATION).unwrap();
        let found = refs
            .iter()
            .map(|r| (r.db.as_str(), r.id.as_str(), r.relation.tag()))
            .collect::<Vec<_>>();

        assert_eq!(
            found,
            vec![
                ("chebi", "CHEBI:4167", "is"),
                ("kegg.compound", "C00031", "is"),
                ("pubmed", "12345", "isDescribedBy"),
            ]
        );
        assert!(refs.iter().all(|r| r.origin == ORIGIN_ANNOTATION));
    }

    #[test]
    fn test_merge_groups_by_qualifier() {
        let refs: Refs = [
            BioRef::new("chebi", "CHEBI:1", ORIGIN_ANNOTATION, Relation::Is),
            BioRef::new("kegg.compound", "C1", ORIGIN_ANNOTATION, Relation::Is),
            BioRef::new("pubmed", "1", ORIGIN_ANNOTATION, Relation::IsDescribedBy),
        ]
        .into_iter()
        .collect();

        let merged = merge_cv_terms(None, "meta_m1", &refs).unwrap().unwrap();
        assert_eq!(merged.matches("<bqbiol:is>").count(), 1);
        assert_eq!(merged.matches("<bqbiol:isDescribedBy>").count(), 1);
        assert!(merged.contains(r##"rdf:about="#meta_m1""##));

        let reparsed = parse_cv_terms(&merged).unwrap();
        assert_eq!(reparsed.len(), 3);
    }

    #[test]
    fn test_merge_extends_existing_bag() {
        let refs: Refs = [
            // already present as a URN
            BioRef::new("kegg.compound", "C00031", ORIGIN_ANNOTATION, Relation::Is),
            BioRef::new("metanetx.chemical", "MNXM41", ORIGIN_ANNOTATION, Relation::Is),
        ]
        .into_iter()
        .collect();

        let merged = merge_cv_terms(Some(ANNOTATION), "meta_glc", &refs)
            .unwrap()
            .unwrap();

        assert_eq!(merged.matches("<bqbiol:is>").count(), 1);
        assert_eq!(merged.matches("C00031").count(), 1);
        assert!(merged.contains("https://identifiers.org/metanetx.chemical/MNXM41"));
        assert_eq!(parse_cv_terms(&merged).unwrap().len(), 4);

        let again = merge_cv_terms(Some(&merged), "meta_glc", &refs)
            .unwrap()
            .unwrap();
        assert_eq!(again, merged);
    }

    #[test]
    fn test_merge_creates_missing_levels_next_to_foreign_content() {
        let refs: Refs = [BioRef::new("chebi", "CHEBI:1", ORIGIN_ANNOTATION, Relation::Is)]
            .into_iter()
            .collect();
        let existing = r#"<tool:data xmlns:tool="urn:tool">keep</tool:data>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"/>"#;

        let merged = merge_cv_terms(Some(existing), "meta_x", &refs)
            .unwrap()
            .unwrap();

        assert!(merged.starts_with("<tool:data xmlns:tool=\"urn:tool\">keep</tool:data>"));
        assert_eq!(merged.matches("<rdf:RDF").count(), 1);
        assert_eq!(merged.matches("<rdf:Description").count(), 1);
        assert_eq!(merged.matches("<rdf:Bag>").count(), 1);
        let reparsed = parse_cv_terms(&merged).unwrap();
        assert_eq!(reparsed.len(), 1);
        assert_eq!(reparsed[0].id, "CHEBI:1");
    }

    #[test]
    fn test_merge_without_refs_keeps_annotation() {
        let refs = Refs::default();
        assert_eq!(merge_cv_terms(None, "m", &refs).unwrap(), None);
        assert_eq!(
            merge_cv_terms(Some("<foo/>"), "m", &refs).unwrap().as_deref(),
            Some("<foo/>")
        );
    }
}

//! Cross-references to external databases.
//!
//! Every entity of a [`BioNetwork`](crate::network::graph::BioNetwork) carries a set of
//! [`BioRef`] records grouped by database name. A reference knows where it came from
//! (`origin`), how much it is trusted (`confidence`) and how it relates to the entity
//! (`relation`, a BioModels qualifier such as `is` or `isDescribedBy`).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Origin tag used for references extracted from SBML notes.
pub const ORIGIN_NOTES: &str = "SBML notes";

/// Origin tag used for references extracted from SBML RDF annotations.
pub const ORIGIN_ANNOTATION: &str = "SBML annotation";

/// BioModels qualifier linking an entity to an external resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[default]
    Is,
    IsDescribedBy,
    IsVersionOf,
    HasVersion,
    HasPart,
    IsPartOf,
    IsHomologTo,
    IsEncodedBy,
    Encodes,
    OccursIn,
    HasProperty,
    Other(String),
}

impl Relation {
    /// The local name used in `bqbiol:<relation>` tags.
    pub fn tag(&self) -> &str {
        match self {
            Relation::Is => "is",
            Relation::IsDescribedBy => "isDescribedBy",
            Relation::IsVersionOf => "isVersionOf",
            Relation::HasVersion => "hasVersion",
            Relation::HasPart => "hasPart",
            Relation::IsPartOf => "isPartOf",
            Relation::IsHomologTo => "isHomologTo",
            Relation::IsEncodedBy => "isEncodedBy",
            Relation::Encodes => "encodes",
            Relation::OccursIn => "occursIn",
            Relation::HasProperty => "hasProperty",
            Relation::Other(tag) => tag,
        }
    }
}

impl FromStr for Relation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "is" => Relation::Is,
            "isDescribedBy" => Relation::IsDescribedBy,
            "isVersionOf" => Relation::IsVersionOf,
            "hasVersion" => Relation::HasVersion,
            "hasPart" => Relation::HasPart,
            "isPartOf" => Relation::IsPartOf,
            "isHomologTo" => Relation::IsHomologTo,
            "isEncodedBy" => Relation::IsEncodedBy,
            "encodes" => Relation::Encodes,
            "occursIn" => Relation::OccursIn,
            "hasProperty" => Relation::HasProperty,
            other => Relation::Other(other.to_string()),
        })
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A single cross-reference record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BioRef {
    /// Database name, e.g. `kegg.compound` or `chebi`.
    pub db: String,
    /// Identifier within the database.
    pub id: String,
    /// Confidence score, higher is better.
    pub confidence: i32,
    /// Where the reference was found.
    pub origin: String,
    /// Qualifier relating the entity to the resource.
    pub relation: Relation,
}

impl BioRef {
    pub fn new(
        db: impl Into<String>,
        id: impl Into<String>,
        origin: impl Into<String>,
        relation: Relation,
    ) -> Self {
        Self {
            db: db.into(),
            id: id.into(),
            confidence: 1,
            origin: origin.into(),
            relation,
        }
    }
}

/// Cross-references grouped by database name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Refs(BTreeMap<String, BTreeSet<BioRef>>);

impl Refs {
    /// Adds a reference. Returns `false` if the same database/id pair was already known.
    pub fn add(&mut self, reference: BioRef) -> bool {
        let entry = self.0.entry(reference.db.clone()).or_default();
        if entry.iter().any(|r| r.id == reference.id) {
            return false;
        }
        entry.insert(reference)
    }

    pub fn contains(&self, db: &str, id: &str) -> bool {
        self.0
            .get(db)
            .map(|set| set.iter().any(|r| r.id == id))
            .unwrap_or(false)
    }

    /// References of one database.
    pub fn get(&self, db: &str) -> impl Iterator<Item = &BioRef> {
        self.0.get(db).into_iter().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BioRef> {
        self.0.values().flatten()
    }

    pub fn databases(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> IntoIterator for &'a Refs {
    type Item = &'a BioRef;
    type IntoIter = Box<dyn Iterator<Item = &'a BioRef> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl FromIterator<BioRef> for Refs {
    fn from_iter<T: IntoIterator<Item = BioRef>>(iter: T) -> Self {
        let mut refs = Refs::default();
        for reference in iter {
            refs.add(reference);
        }
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_deduplicates_by_db_and_id() {
        let mut refs = Refs::default();
        assert!(refs.add(BioRef::new("chebi", "CHEBI:17234", ORIGIN_NOTES, Relation::Is)));
        assert!(!refs.add(BioRef::new(
            "chebi",
            "CHEBI:17234",
            ORIGIN_ANNOTATION,
            Relation::IsVersionOf
        )));
        assert!(refs.add(BioRef::new("kegg.compound", "C00031", ORIGIN_NOTES, Relation::Is)));
        assert_eq!(refs.len(), 2);
        assert!(refs.contains("kegg.compound", "C00031"));
    }

    #[test]
    fn test_relation_round_trip() {
        for tag in ["is", "isDescribedBy", "hasPart", "occursIn", "somethingElse"] {
            let relation: Relation = tag.parse().unwrap();
            assert_eq!(relation.tag(), tag);
        }
    }
}

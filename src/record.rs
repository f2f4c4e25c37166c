//! Serde model for the wire documents owned by the content service: the
//! collection document (an ordered sequence of records) and the
//! publications document (a map from year to citation strings). Field
//! names on the wire are the content service's camelCase.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::filter::Tagged;

/// One record in a collection document.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Record {
    /// The record's stable identifier; detail page URLs and lookups key
    /// off of it.
    pub slug: String,

    /// The record's display name.
    pub name: String,

    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub description: String,

    /// The record's facet tags. Plain strings; deduplication and matching
    /// are [`crate::filter::TagFilterSet`]'s business.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Whether the record appears in the frontpage grids.
    #[serde(default, rename = "showOnFrontpage")]
    pub show_on_frontpage: bool,

    /// Document path of the record's markdown body, relative to the
    /// content root. Records without one have no detail page body.
    #[serde(default, rename = "mdFile")]
    pub md_file: Option<String>,

    /// The record's header image URL, if the content author supplied one.
    #[serde(default, rename = "headerImage")]
    pub header_image: Option<String>,
}

impl Tagged for Record {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// The publications document: year → citations. A [`BTreeMap`] so
/// consumers can walk years in order (the frontpage walks them
/// newest-first).
pub type Publications = BTreeMap<String, Vec<String>>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deserialize_collection_document() {
        let records: Vec<Record> = serde_json::from_str(
            r#"[
                {
                    "slug": "vr-sim",
                    "name": "VR Simulator",
                    "date": "2021-03-01",
                    "description": "A motion simulation rig",
                    "tags": ["vr", "unity"],
                    "showOnFrontpage": true,
                    "mdFile": "projects/vr-sim.md",
                    "headerImage": "https://cdn.example.org/vr-sim.png"
                },
                {
                    "slug": "tiny-thing",
                    "name": "Tiny Thing"
                }
            ]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].slug, "vr-sim");
        assert_eq!(records[0].tags, vec!["vr", "unity"]);
        assert!(records[0].show_on_frontpage);
        assert_eq!(records[0].md_file.as_deref(), Some("projects/vr-sim.md"));

        // Everything beyond slug and name is optional on the wire.
        assert_eq!(records[1].description, "");
        assert!(records[1].tags.is_empty());
        assert!(!records[1].show_on_frontpage);
        assert_eq!(records[1].md_file, None);
        assert_eq!(records[1].header_image, None);
    }

    #[test]
    fn test_deserialize_publications_document() {
        let publications: Publications = serde_json::from_str(
            r#"{
                "2019": ["Paper A", "Paper B"],
                "2021": ["Paper C"]
            }"#,
        )
        .unwrap();

        let years: Vec<&String> = publications.keys().rev().collect();
        assert_eq!(years, vec!["2021", "2019"]);
        assert_eq!(publications["2019"].len(), 2);
    }
}

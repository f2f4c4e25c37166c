//! Conversions from records and view models into [`gtmpl::Value`]s so the
//! theme templates can render them.

use std::collections::HashMap;

use gtmpl::Value;

use crate::record::{Publications, Record};

impl From<&Record> for Value {
    /// Converts a [`Record`] into a [`Value`] for templating. Context the
    /// record doesn't carry itself (its page URL, its resolved image) is
    /// inserted by the writer on top of this object.
    fn from(record: &Record) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("slug".to_owned(), Value::String(record.slug.clone()));
        m.insert("name".to_owned(), Value::String(record.name.clone()));
        m.insert("date".to_owned(), Value::String(record.date.clone()));
        m.insert(
            "description".to_owned(),
            Value::String(record.description.clone()),
        );
        m.insert("tags".to_owned(), strings(record.tags.iter()));
        m.insert(
            "show_on_frontpage".to_owned(),
            Value::Bool(record.show_on_frontpage),
        );
        m.insert(
            "header_image".to_owned(),
            match &record.header_image {
                Some(image) => Value::String(image.clone()),
                None => Value::Nil,
            },
        );
        Value::Object(m)
    }
}

/// Converts the publications document into a [`Value`]: an array of
/// `{year, citations}` objects, newest year first, matching how the
/// frontpage lists them.
pub fn publications(publications: &Publications) -> Value {
    Value::Array(
        publications
            .iter()
            .rev()
            .map(|(year, citations)| {
                let mut m: HashMap<String, Value> = HashMap::new();
                m.insert("year".to_owned(), Value::String(year.clone()));
                m.insert("citations".to_owned(), strings(citations.iter()));
                Value::Object(m)
            })
            .collect(),
    )
}

/// Converts any sequence of strings into a [`Value::Array`] of strings.
pub fn strings<'a, I: Iterator<Item = &'a String>>(iter: I) -> Value {
    Value::Array(iter.map(|s| Value::String(s.clone())).collect())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_record_to_value() {
        let record = Record {
            slug: String::from("vr-sim"),
            name: String::from("VR Simulator"),
            date: String::from("2021-03-01"),
            description: String::from("A motion simulation rig"),
            tags: vec![String::from("vr")],
            show_on_frontpage: true,
            md_file: Some(String::from("projects/vr-sim.md")),
            header_image: None,
        };

        match Value::from(&record) {
            Value::Object(m) => {
                assert_eq!(m["slug"], Value::String(String::from("vr-sim")));
                assert_eq!(m["show_on_frontpage"], Value::Bool(true));
                assert_eq!(
                    m["tags"],
                    Value::Array(vec![Value::String(String::from("vr"))]),
                );
                assert_eq!(m["header_image"], Value::Nil);
            }
            other => panic!("expected an object, got {:?}", other),
        }
    }

    #[test]
    fn test_publications_newest_first() {
        let mut document = Publications::new();
        document.insert(String::from("2019"), vec![String::from("Paper A")]);
        document.insert(String::from("2021"), vec![String::from("Paper C")]);

        match publications(&document) {
            Value::Array(years) => {
                assert_eq!(years.len(), 2);
                match &years[0] {
                    Value::Object(m) => {
                        assert_eq!(m["year"], Value::String(String::from("2021")))
                    }
                    other => panic!("expected an object, got {:?}", other),
                }
            }
            other => panic!("expected an array, got {:?}", other),
        }
    }
}

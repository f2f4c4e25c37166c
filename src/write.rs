//! Responsible for templating view models and writing the output HTML
//! tree to disk.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::Path;

use gtmpl::{Template, Value};
use url::Url;

use crate::record::Record;
use crate::value;
use crate::views::{self, Detail, Frontpage, Listing};

/// Renders view models through the theme templates and writes the results
/// under the output directory: `index.html` for the frontpage,
/// `{collection}/index.html` for list pages, and
/// `{collection}/{slug}.html` for detail pages.
pub struct Writer<'a> {
    /// The template for the frontpage.
    pub frontpage_template: &'a Template,

    /// The template for collection list pages.
    pub list_template: &'a Template,

    /// The template for record detail pages.
    pub detail_template: &'a Template,

    /// The site's root URL; record cells link relative to it and every
    /// template gets it for the site-header link.
    pub site_root: &'a Url,

    /// The root output directory for the rendered site.
    pub output_directory: &'a Path,

    /// The rotation counter for placeholder imagery on records without a
    /// header image.
    pub placeholder_rotation: usize,
}

impl Writer<'_> {
    /// Renders the frontpage to `index.html`: the featured slice of each
    /// collection, full-collection counts, and the publications list.
    pub fn write_frontpage(&self, frontpage: &Frontpage) -> Result<()> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "projects".to_owned(),
            self.cells(frontpage.featured_projects(), "projects")?,
        );
        m.insert(
            "project_count".to_owned(),
            Value::from(frontpage.projects.len() as u64),
        );
        m.insert(
            "posts".to_owned(),
            self.cells(frontpage.featured_posts(), "posts")?,
        );
        m.insert(
            "post_count".to_owned(),
            Value::from(frontpage.posts.len() as u64),
        );
        m.insert(
            "publications".to_owned(),
            value::publications(&frontpage.publications),
        );
        self.write_page(
            self.frontpage_template,
            &self.output_directory.join("index.html"),
            Value::Object(m),
        )
    }

    /// Renders a collection's list page to `{name}/index.html`, showing
    /// only the records that pass the listing's tag filter.
    pub fn write_listing(&self, name: &str, listing: &Listing) -> Result<()> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), Value::String(name.to_owned()));
        m.insert("records".to_owned(), self.cells(listing.visible(), name)?);
        m.insert(
            "count".to_owned(),
            Value::from(listing.records.len() as u64),
        );
        m.insert(
            "all_tags".to_owned(),
            value::strings(listing.filter.all_tags().iter()),
        );
        m.insert(
            "active_tags".to_owned(),
            value::strings(listing.filter.active().iter()),
        );
        self.write_page(
            self.list_template,
            &self.output_directory.join(name).join("index.html"),
            Value::Object(m),
        )
    }

    /// Renders a record's detail page to `{name}/{slug}.html`. The body
    /// arrives already rendered to HTML.
    pub fn write_detail(&self, name: &str, detail: &Detail, body_html: String) -> Result<()> {
        let mut value = Value::from(&detail.record);
        if let Value::Object(m) = &mut value {
            m.insert("body".to_owned(), Value::String(body_html));
            m.insert(
                "image".to_owned(),
                Value::String(self.image(&detail.record, 0)),
            );
        }
        let file_name = format!("{}.html", slug::slugify(&detail.record.slug));
        self.write_page(
            self.detail_template,
            &self.output_directory.join(name).join(file_name),
            value,
        )
    }

    /// Converts records into grid-cell values: the record itself plus its
    /// page URL and resolved image.
    fn cells<'r>(
        &self,
        records: impl Iterator<Item = &'r Record>,
        base: &str,
    ) -> Result<Value> {
        records
            .enumerate()
            .map(|(index, record)| self.cell(record, index, base))
            .collect::<Result<Vec<Value>>>()
            .map(Value::Array)
    }

    fn cell(&self, record: &Record, index: usize, base: &str) -> Result<Value> {
        let mut value = Value::from(record);
        if let Value::Object(m) = &mut value {
            m.insert(
                "url".to_owned(),
                Value::String(
                    self.site_root
                        .join(&format!("{}/{}.html", base, slug::slugify(&record.slug)))?
                        .to_string(),
                ),
            );
            m.insert("image".to_owned(), Value::String(self.image(record, index)));
        }
        Ok(value)
    }

    /// The record's own header image, or a placeholder derived from the
    /// injected rotation counter.
    fn image(&self, record: &Record, index: usize) -> String {
        match &record.header_image {
            Some(image) => image.clone(),
            None => views::placeholder_image(self.placeholder_rotation, index),
        }
    }

    /// Takes a single page value, templates it, and writes it to disk,
    /// creating parent directories as needed.
    fn write_page(&self, template: &Template, file_path: &Path, mut value: Value) -> Result<()> {
        if let Some(dir) = file_path.parent() {
            fs::create_dir_all(dir)?;
        }
        if let Value::Object(m) = &mut value {
            m.insert(
                "site_root".to_owned(),
                Value::String(self.site_root.to_string()),
            );
        }
        template.execute(
            &mut File::create(file_path)?,
            &gtmpl::Context::from(value)?,
        )?;
        Ok(())
    }
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error writing the output files.
    Io(io::Error),

    /// An error building a page URL.
    UrlParse(url::ParseError),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`].
    /// This allows us to use the `?` operator for fallible template
    /// operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. This allows us to
    /// use the `?` operator when building page URLs.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Io(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

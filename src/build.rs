//! Exports the [`build_site`] function which stitches together the
//! high-level steps of building the output site: parsing the theme
//! templates, driving each view through its own [`Loader`] against the
//! content service, and rendering the resulting models to disk
//! ([`crate::write`]).
//!
//! Views translate to the build like so: a view that comes back
//! [`ViewState::Ready`] is rendered; one that comes back
//! [`ViewState::Failed`] aborts the build (the builder's equivalent of
//! the failure screen); one still [`ViewState::Pending`] after being
//! driven indicates a registration that was never awaited and also
//! aborts.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use gtmpl::Template;

use crate::config::Config;
use crate::loader::{http_client, Loader};
use crate::markdown;
use crate::views::{self, ViewState};
use crate::write::{Error as WriteError, Writer};

/// Builds the site from a [`Config`] object. `active_tags` are toggled
/// into each list page's tag filter.
pub async fn build_site(config: &Config, active_tags: &[String]) -> Result<()> {
    // Parse the template files.
    let frontpage_template = parse_template(config.frontpage_template.iter())?;
    let list_template = parse_template(config.list_template.iter())?;
    let detail_template = parse_template(config.detail_template.iter())?;

    let collections = [
        ("projects", config.projects_path.as_str()),
        ("posts", config.posts_path.as_str()),
    ];

    // Blow away the old collection directories so renamed records don't
    // leave orphaned pages behind. The root output directory itself is
    // left alone in case the user accidentally passed the wrong one.
    for &(name, _) in &collections {
        rmdir(&config.output_directory.join(name))?;
    }

    let client = http_client();
    let writer = Writer {
        frontpage_template: &frontpage_template,
        list_template: &list_template,
        detail_template: &detail_template,
        site_root: &config.site_root,
        output_directory: &config.output_directory,
        placeholder_rotation: config.placeholder_rotation,
    };

    // The frontpage: three documents through one barrier.
    let loader = Loader::new(client.clone(), config.content_root.clone());
    let frontpage = resolve(
        views::frontpage(
            &loader,
            &config.projects_path,
            &config.posts_path,
            &config.publications_path,
        )
        .await,
        "frontpage",
    )?;
    writer.write_frontpage(&frontpage)?;

    for &(name, path) in &collections {
        let loader = Loader::new(client.clone(), config.content_root.clone());
        let listing = resolve(views::listing(&loader, name, path, active_tags).await, name)?;
        writer.write_listing(name, &listing)?;
        tracing::info!(
            "rendered {} of {} `{}` records",
            listing.visible().count(),
            listing.records.len(),
            name,
        );

        // Every record gets a detail view with its own loader, driven
        // concurrently. Each re-fetches the collection document, the same
        // way the interactive site does on every navigation.
        let details = join_all(listing.records.iter().map(|record| {
            let loader = Loader::new(client.clone(), config.content_root.clone());
            async move {
                let state = views::detail(&loader, name, path, &record.slug).await;
                (record.slug.clone(), state)
            }
        }))
        .await;

        for (slug, state) in details {
            let detail = resolve(state, &format!("{}/{}", name, slug))?;
            let body = markdown::to_html(&detail.body, &detail.body_url)?;
            writer.write_detail(name, &detail, body)?;
        }
    }

    Ok(())
}

/// Translates a driven view's state into the build's terms. Only a ready
/// view lets the build continue.
fn resolve<T>(state: ViewState<T>, view: &str) -> Result<T> {
    match state {
        ViewState::Ready(model) => Ok(model),
        ViewState::Failed => Err(Error::ViewFailed(view.to_owned())),
        ViewState::Pending => Err(Error::ViewPending(view.to_owned())),
    }
}

// Loads the template file contents, appends them to one another, and
// parses the result into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during view loading,
/// markdown rendering, writing pages, cleaning output directories,
/// parsing template files, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned when a view's loader reports failure. The build stops
    /// rather than writing partial output.
    ViewFailed(String),

    /// Returned when a fully driven view still reports pending.
    ViewPending(String),

    /// Returned for errors rendering markdown bodies.
    Markdown(markdown::Error),

    /// Returned for errors templating or writing pages.
    Write(WriteError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ViewFailed(view) => {
                write!(f, "Building view '{}': content failed to load", view)
            }
            Error::ViewPending(view) => {
                write!(f, "Building view '{}': loads still pending", view)
            }
            Error::Markdown(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ViewFailed(_) => None,
            Error::ViewPending(_) => None,
            Error::Markdown(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<markdown::Error> for Error {
    /// Converts [`markdown::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: markdown::Error) -> Error {
        Error::Markdown(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

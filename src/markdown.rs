use std::fmt;

use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag};
use url::{ParseError as UrlParseError, Url};

/// Converts a remote markdown body to HTML.
///
/// * [`markdown`] is the raw body as fetched from the content service.
/// * [`document_url`] is the URL the body was fetched from. Relative links
///   and images inside the body are absolutized against it, since the
///   rendered page does not live at the document's own location.
pub fn to_html(markdown: &str, document_url: &Url) -> Result<String> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let converter = EventConverter { base: document_url };
    let events = Parser::new_ext(markdown, options)
        .map(|ev| converter.convert(ev))
        .collect::<Result<Vec<Event>>>()?;

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    Ok(out)
}

struct EventConverter<'a> {
    base: &'a Url,
}

impl EventConverter<'_> {
    fn convert_url(&self, url: &str) -> Result<String> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute.to_string()),
            Err(UrlParseError::RelativeUrlWithoutBase) => {
                Ok(self.base.join(url)?.to_string())
            }
            Err(err) => Err(Error::UrlParse(err)),
        }
    }

    fn convert_tag<'b>(&self, tag: Tag<'b>) -> Result<Tag<'b>> {
        Ok(match tag {
            // The headings in the body need to be demoted twice to sit
            // below both the site title (h1) and the record name (h2), so
            // `#` becomes h3 instead of h1. Start and End events both
            // carry the tag, so the close tag demotes to match.
            Tag::Heading(level) => Tag::Heading(level + 2),

            // Content authors write links relative to where the document
            // lives on the content service.
            Tag::Link(link_type, url, title) if link_type != LinkType::Email => Tag::Link(
                link_type,
                CowStr::Boxed(self.convert_url(&url)?.into_boxed_str()),
                title,
            ),
            Tag::Image(link_type, url, title) => Tag::Image(
                link_type,
                CowStr::Boxed(self.convert_url(&url)?.into_boxed_str()),
                title,
            ),
            _ => tag,
        })
    }

    fn convert<'b>(&self, ev: Event<'b>) -> Result<Event<'b>> {
        Ok(match ev {
            Event::Start(tag) => Event::Start(self.convert_tag(tag)?),
            Event::End(tag) => Event::End(self.convert_tag(tag)?),
            _ => ev,
        })
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents an error converting a markdown body to HTML.
#[derive(Debug)]
pub enum Error {
    /// Returned when a link target inside the body can't be parsed or
    /// resolved as a URL.
    UrlParse(UrlParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<UrlParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. This allows us to
    /// use the `?` operator for URL parsing and joining functions.
    fn from(err: UrlParseError) -> Error {
        Error::UrlParse(err)
    }
}

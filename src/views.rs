//! Assembles view models from remotely loaded content. Each function here
//! mirrors one page of the site: it borrows a fresh [`Loader`], registers
//! the page's fetches, drives them to completion, and only then reads the
//! consolidated flags and payloads. Views share loading behavior by all
//! composing over the same loader value rather than inheriting it.

use serde::de::DeserializeOwned;
use url::Url;

use crate::filter::TagFilterSet;
use crate::loader::Loader;
use crate::record::{Publications, Record};

const PROJECTS_KEY: &str = "projects";
const POSTS_KEY: &str = "posts";
const PUBLICATIONS_KEY: &str = "publications";
const BODY_KEY: &str = "body";

/// What a consumer is allowed to render for a view: an explicit pending
/// state until the barrier releases, an explicit failure state once the
/// sticky flag trips, and the assembled model only after both checks pass.
/// Reading partial data out of a loader that isn't ready is a contract
/// violation, so the model only exists inside [`ViewState::Ready`].
#[derive(Debug)]
pub enum ViewState<T> {
    Pending,
    Failed,
    Ready(T),
}

/// The frontpage model: all three collection documents, loaded through one
/// barrier.
#[derive(Debug)]
pub struct Frontpage {
    pub projects: Vec<Record>,
    pub posts: Vec<Record>,
    pub publications: Publications,
}

impl Frontpage {
    /// The project records the frontpage grid shows. Totals still come
    /// from the full vectors (the "show all N" links).
    pub fn featured_projects(&self) -> impl Iterator<Item = &Record> {
        self.projects.iter().filter(|record| record.show_on_frontpage)
    }

    /// The post records the frontpage grid shows.
    pub fn featured_posts(&self) -> impl Iterator<Item = &Record> {
        self.posts.iter().filter(|record| record.show_on_frontpage)
    }
}

/// Loads the frontpage: three independent collection documents fetched
/// concurrently through one barrier. The loader counts all three before
/// the first can resolve, so readiness means all of them.
pub async fn frontpage(
    loader: &Loader,
    projects_path: &str,
    posts_path: &str,
    publications_path: &str,
) -> ViewState<Frontpage> {
    tokio::join!(
        loader.load_json(PROJECTS_KEY, projects_path),
        loader.load_json(POSTS_KEY, posts_path),
        loader.load_json(PUBLICATIONS_KEY, publications_path),
    );

    if loader.has_failed() {
        return ViewState::Failed;
    }
    if !loader.is_ready() {
        return ViewState::Pending;
    }

    let projects = match decode(loader, PROJECTS_KEY) {
        Some(records) => records,
        None => return ViewState::Failed,
    };
    let posts = match decode(loader, POSTS_KEY) {
        Some(records) => records,
        None => return ViewState::Failed,
    };
    let publications = match decode(loader, PUBLICATIONS_KEY) {
        Some(publications) => publications,
        None => return ViewState::Failed,
    };

    ViewState::Ready(Frontpage {
        projects,
        posts,
        publications,
    })
}

/// A list page: the full collection plus the facet filter derived from it,
/// with the caller's chosen tags already toggled in.
#[derive(Debug)]
pub struct Listing {
    pub records: Vec<Record>,
    pub filter: TagFilterSet,
}

impl Listing {
    /// The records the page shows, in collection order.
    pub fn visible(&self) -> impl Iterator<Item = &Record> {
        self.filter.apply(&self.records)
    }
}

/// Loads a collection list page. `key` doubles as the loader key and the
/// collection's name in logs.
pub async fn listing(
    loader: &Loader,
    key: &str,
    path: &str,
    active_tags: &[String],
) -> ViewState<Listing> {
    loader.load_json(key, path).await;

    if loader.has_failed() {
        return ViewState::Failed;
    }
    if !loader.is_ready() {
        return ViewState::Pending;
    }

    let records: Vec<Record> = match decode(loader, key) {
        Some(records) => records,
        None => return ViewState::Failed,
    };

    let mut filter = TagFilterSet::new();
    filter.recompute(&records);
    for tag in active_tags {
        filter.toggle(tag);
    }

    ViewState::Ready(Listing { records, filter })
}

/// A detail page: the record itself, its raw markdown body, and the URL
/// the body was fetched from (which markdown rendering resolves relative
/// links against).
#[derive(Debug)]
pub struct Detail {
    pub record: Record,
    pub body: String,
    pub body_url: Url,
}

/// Loads a detail page: the collection document first, then the record's
/// markdown body. The two fetches are sequential because the second's
/// location comes out of the first.
pub async fn detail(loader: &Loader, key: &str, path: &str, slug: &str) -> ViewState<Detail> {
    loader.load_json(key, path).await;
    if loader.has_failed() {
        return ViewState::Failed;
    }

    let records: Vec<Record> = match decode(loader, key) {
        Some(records) => records,
        None => return ViewState::Failed,
    };

    // A slug missing from an otherwise-good collection is this view's
    // failure, not the loader's; the loader state stays successful.
    let record = match records.into_iter().find(|record| record.slug == slug) {
        Some(record) => record,
        None => {
            tracing::warn!("no record with slug `{}` in `{}`", slug, key);
            return ViewState::Failed;
        }
    };
    let md_file = match &record.md_file {
        Some(md_file) => md_file.clone(),
        None => {
            tracing::warn!("record `{}` has no body document", slug);
            return ViewState::Failed;
        }
    };

    loader.load_text(BODY_KEY, &md_file).await;
    if loader.has_failed() {
        return ViewState::Failed;
    }
    if !loader.is_ready() {
        return ViewState::Pending;
    }

    let body = match loader.text(BODY_KEY) {
        Some(body) => body,
        None => return ViewState::Failed,
    };
    let body_url = match loader.content_root().join(&md_file) {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!("resolving body document for `{}`: {}", slug, err);
            return ViewState::Failed;
        }
    };

    ViewState::Ready(Detail {
        record,
        body,
        body_url,
    })
}

/// Builds the placeholder image URL for a record without a header image.
/// `rotation` is injected configuration (whatever invokes the build
/// persists it between runs); `index` is the record's position in its
/// grid, so adjacent cells don't repeat an image.
pub fn placeholder_image(rotation: usize, index: usize) -> String {
    format!("https://picsum.photos/400/300?{}", rotation + index)
}

/// Decodes a payload stored under `key` into the document type the view
/// expects. [`None`] means the payload is absent or doesn't match the
/// expected shape; either way the view can't be assembled.
fn decode<T: DeserializeOwned>(loader: &Loader, key: &str) -> Option<T> {
    let value = loader.json(key)?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::warn!("decoding `{}`: {}", key, err);
            None
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::loader::http_client;

    use super::*;

    async fn mock_json(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mock_text(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    fn loader(server: &MockServer) -> Loader {
        Loader::new(http_client(), Url::parse(&server.uri()).unwrap())
    }

    fn collection() -> serde_json::Value {
        json!([
            {
                "slug": "vr-sim",
                "name": "VR Simulator",
                "tags": ["vr", "unity"],
                "showOnFrontpage": true,
                "mdFile": "projects/vr-sim.md"
            },
            {
                "slug": "guitar-tuner",
                "name": "Guitar Tuner",
                "tags": ["audio"]
            }
        ])
    }

    #[tokio::test]
    async fn test_frontpage_assembles_all_three_documents() {
        let server = MockServer::start().await;
        mock_json(&server, "/projects/projects.json", collection()).await;
        mock_json(&server, "/posts/posts.json", json!([])).await;
        mock_json(&server, "/publications.json", json!({"2021": ["Paper C"]})).await;
        let loader = loader(&server);

        let state = frontpage(
            &loader,
            "projects/projects.json",
            "posts/posts.json",
            "publications.json",
        )
        .await;

        match state {
            ViewState::Ready(model) => {
                assert_eq!(model.projects.len(), 2);
                assert_eq!(model.featured_projects().count(), 1);
                assert_eq!(model.posts.len(), 0);
                assert_eq!(model.publications["2021"], vec!["Paper C"]);
            }
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_frontpage_fails_when_any_document_fails() {
        let server = MockServer::start().await;
        mock_json(&server, "/projects/projects.json", collection()).await;
        mock_json(&server, "/posts/posts.json", json!([])).await;
        // publications.json has no mock and 404s.
        let loader = loader(&server);

        let state = frontpage(
            &loader,
            "projects/projects.json",
            "posts/posts.json",
            "publications.json",
        )
        .await;

        assert!(matches!(state, ViewState::Failed));
        assert!(loader.has_failed());
        // The healthy siblings still ran to completion.
        assert!(loader.is_ready());
        assert!(loader.json("projects").is_some());
    }

    #[tokio::test]
    async fn test_listing_applies_toggled_tags() {
        let server = MockServer::start().await;
        mock_json(&server, "/projects/projects.json", collection()).await;
        let loader = loader(&server);

        let state = listing(
            &loader,
            "projects",
            "projects/projects.json",
            &[String::from("audio")],
        )
        .await;

        match state {
            ViewState::Ready(model) => {
                assert_eq!(model.records.len(), 2);
                let visible: Vec<&Record> = model.visible().collect();
                assert_eq!(visible.len(), 1);
                assert_eq!(visible[0].slug, "guitar-tuner");
            }
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_detail_loads_record_and_body() {
        let server = MockServer::start().await;
        mock_json(&server, "/projects/projects.json", collection()).await;
        mock_text(&server, "/projects/vr-sim.md", "# The Rig\n").await;
        let loader = loader(&server);

        let state = detail(&loader, "projects", "projects/projects.json", "vr-sim").await;

        match state {
            ViewState::Ready(model) => {
                assert_eq!(model.record.name, "VR Simulator");
                assert_eq!(model.body, "# The Rig\n");
                assert!(model.body_url.as_str().ends_with("/projects/vr-sim.md"));
            }
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_detail_missing_slug_is_a_view_failure() {
        let server = MockServer::start().await;
        mock_json(&server, "/projects/projects.json", collection()).await;
        let loader = loader(&server);

        let state = detail(&loader, "projects", "projects/projects.json", "no-such").await;

        assert!(matches!(state, ViewState::Failed));
        // The collection load itself succeeded; the loader is clean.
        assert!(!loader.has_failed());
        assert!(loader.is_ready());
    }

    #[tokio::test]
    async fn test_detail_body_fetch_failure_is_sticky() {
        let server = MockServer::start().await;
        mock_json(&server, "/projects/projects.json", collection()).await;
        // projects/vr-sim.md has no mock and 404s.
        let loader = loader(&server);

        let state = detail(&loader, "projects", "projects/projects.json", "vr-sim").await;

        assert!(matches!(state, ViewState::Failed));
        assert!(loader.has_failed());
    }

    #[tokio::test]
    async fn test_malformed_collection_is_a_view_failure() {
        let server = MockServer::start().await;
        mock_json(&server, "/projects/projects.json", json!({"not": "a list"})).await;
        let loader = loader(&server);

        let state = listing(&loader, "projects", "projects/projects.json", &[]).await;

        assert!(matches!(state, ViewState::Failed));
        // The transport succeeded; only the shape was wrong.
        assert!(!loader.has_failed());
    }
}

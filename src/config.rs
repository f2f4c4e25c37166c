use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::Deserialize;
use url::Url;

#[derive(Deserialize)]
struct Rotation(usize);
impl Default for Rotation {
    fn default() -> Self {
        Rotation(0)
    }
}

#[derive(Deserialize)]
struct Project {
    site_root: Url,
    content_root: Url,

    projects_path: String,
    posts_path: String,
    publications_path: String,

    #[serde(default)]
    placeholder_rotation: Rotation,
}

#[derive(Deserialize)]
struct Theme {
    frontpage_template: Vec<PathBuf>,
    list_template: Vec<PathBuf>,
    detail_template: Vec<PathBuf>,
}

pub struct Config {
    pub site_root: Url,
    pub content_root: Url,
    pub projects_path: String,
    pub posts_path: String,
    pub publications_path: String,
    pub placeholder_rotation: usize,
    pub frontpage_template: Vec<PathBuf>,
    pub list_template: Vec<PathBuf>,
    pub detail_template: Vec<PathBuf>,
    pub output_directory: PathBuf,
}

impl Config {
    pub fn from_directory(
        dir: &Path,
        output_directory: &Path,
        rotation: Option<usize>,
    ) -> Result<Config> {
        let path = dir.join("hord.yaml");
        if path.exists() {
            match Config::from_project_file(&path, output_directory, rotation) {
                Ok(config) => Ok(config),
                Err(e) => Err(anyhow!("Loading configuration: {:?}", e)),
            }
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory, rotation),
                None => Err(anyhow!(
                    "Could not find `hord.yaml` in any parent directory"
                )),
            }
        }
    }

    pub fn from_project_file(
        path: &Path,
        output_directory: &Path,
        rotation: Option<usize>,
    ) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;

        // Both roots are join bases; without the trailing slash, `Url::join`
        // would drop their last path segment.
        for (name, root) in &[
            ("site_root", &project.site_root),
            ("content_root", &project.content_root),
        ] {
            if !root.path().ends_with('/') {
                return Err(anyhow!("`{}` must end with a trailing slash", name));
            }
        }

        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => {
                let theme_dir = project_root.join("theme");
                let theme_file = open(&theme_dir.join("theme.yaml"), "theme")?;
                let theme: Theme = serde_yaml::from_reader(theme_file)?;
                Ok(Config {
                    site_root: project.site_root,
                    content_root: project.content_root,
                    projects_path: project.projects_path,
                    posts_path: project.posts_path,
                    publications_path: project.publications_path,
                    placeholder_rotation: match rotation {
                        None => project.placeholder_rotation.0,
                        Some(rotation) => rotation,
                    },
                    frontpage_template: theme
                        .frontpage_template
                        .iter()
                        .map(|relpath| theme_dir.join(relpath))
                        .collect(),
                    list_template: theme
                        .list_template
                        .iter()
                        .map(|relpath| theme_dir.join(relpath))
                        .collect(),
                    detail_template: theme
                        .detail_template
                        .iter()
                        .map(|relpath| theme_dir.join(relpath))
                        .collect(),
                    output_directory: output_directory.to_owned(),
                })
            }
        }
    }
}

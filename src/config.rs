//! Loads the project configuration from a `folio.yaml` file. The file is
//! looked up in the starting directory and then in each of its ancestors;
//! relative paths inside it are resolved against the file's own directory.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file.
pub const PROJECT_FILE: &str = "folio.yaml";

const DEFAULT_ARTICLES_DIRECTORY: &str = "articles";
const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    #[serde(default = "default_articles_directory")]
    articles_directory: PathBuf,

    #[serde(default = "default_listen")]
    listen: String,
}

fn default_articles_directory() -> PathBuf {
    PathBuf::from(DEFAULT_ARTICLES_DIRECTORY)
}

fn default_listen() -> String {
    String::from(DEFAULT_LISTEN)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The directory holding the `.md` articles.
    pub articles_directory: PathBuf,

    /// The address the HTTP endpoint binds to.
    pub listen: String,
}

impl Config {
    /// The configuration used when no project file exists: articles in
    /// `{dir}/articles`, listening on localhost.
    pub fn defaults(dir: &Path) -> Config {
        Config {
            articles_directory: dir.join(DEFAULT_ARTICLES_DIRECTORY),
            listen: default_listen(),
        }
    }

    /// Searches `dir` and its ancestors for a [`PROJECT_FILE`] and loads the
    /// first one found. Falls back to [`Config::defaults`] for `dir`.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(candidate) = current {
            let path = candidate.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path);
            }
            current = candidate.parent();
        }
        tracing::debug!("no `{}` found above {:?}; using defaults", PROJECT_FILE, dir);
        Ok(Config::defaults(dir))
    }

    /// Loads a specific project file.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        let file = File::open(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)
            .with_context(|| format!("Loading configuration from `{}`", path.display()))?;

        tracing::debug!("loaded configuration from {:?}", path);
        Ok(Config {
            articles_directory: project_root.join(project.articles_directory),
            listen: project.listen,
        })
    }
}

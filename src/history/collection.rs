use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionTag {
    Demo,
    Templates,
}

impl CollectionTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Demo => "demo",
            Self::Templates => "templates",
        }
    }
}

impl fmt::Display for CollectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingConvention {
    Default,
    Dos,
}

impl NamingConvention {
    /// DOS naming applies to the early releases, recognised by the archive stem.
    pub fn for_archive(stem: &str, dos_key_prefixes: &[String]) -> Self {
        let stem = stem.to_lowercase();
        if dos_key_prefixes.iter().any(|p| stem.starts_with(p.as_str())) {
            Self::Dos
        } else {
            Self::Default
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dos => "dos",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionNaming {
    /// Use whatever convention the archive selects.
    FollowArchive,
    /// Always use the default convention.
    AlwaysDefault,
}

#[derive(Debug, Clone)]
pub struct Collection {
    pub tag: CollectionTag,
    pub human_name: String,
    pub repo_dir: PathBuf,
    pub live_dir_name: String,
    pub readme_source: PathBuf,
    pub naming: CollectionNaming,
}

impl Collection {
    pub fn live_dir(&self) -> PathBuf {
        self.repo_dir.join(&self.live_dir_name)
    }

    pub fn naming_for(&self, archive: NamingConvention) -> NamingConvention {
        match self.naming {
            CollectionNaming::FollowArchive => archive,
            CollectionNaming::AlwaysDefault => NamingConvention::Default,
        }
    }
}

pub fn default_collections(
    demo_repo: &Path,
    templates_repo: &Path,
    demo_readme: &Path,
    templates_readme: &Path,
) -> Vec<Collection> {
    vec![
        Collection {
            tag: CollectionTag::Demo,
            human_name: "Demo Quest".to_string(),
            repo_dir: demo_repo.to_path_buf(),
            live_dir_name: "DemoQuest".to_string(),
            readme_source: demo_readme.to_path_buf(),
            naming: CollectionNaming::FollowArchive,
        },
        Collection {
            tag: CollectionTag::Templates,
            human_name: "Templates".to_string(),
            repo_dir: templates_repo.to_path_buf(),
            live_dir_name: "Templates".to_string(),
            readme_source: templates_readme.to_path_buf(),
            naming: CollectionNaming::AlwaysDefault,
        },
    ]
}

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::Path;

use thiserror::Error;

// Embedded reference table, replaced at startup when OSTEO_DATASET points to another file
const BUILTIN_DATASET: &str = include_str!("../../data/anatomy.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to open dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("dataset contains no bone groups")]
    Empty,
    #[error("bone group with an empty name")]
    BlankName,
    #[error("bone group '{0}' is declared twice")]
    DuplicateGroup(String),
    #[error("bone group '{name}' has {views} views but {images} images")]
    ViewImageMismatch {
        name: String,
        views: usize,
        images: usize,
    },
    #[error("bone group '{0}' has no structures")]
    NoStructures(String),
    #[error("bone group '{0}' uses structure number 0")]
    ZeroStructure(String),
}

/// A bone (or pair of bones) with its numbered structures and reference images.
///
/// `views` and `images` are parallel: `images[i]` shows the bone from `views[i]`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoneGroup {
    pub name: String,
    pub title: String,
    pub views: Vec<String>,
    pub images: Vec<String>,
    pub structures: BTreeMap<u32, String>,
}

impl BoneGroup {
    pub fn structure(&self, number: u32) -> Option<&str> {
        self.structures.get(&number).map(String::as_str)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::BlankName);
        }
        if self.views.len() != self.images.len() {
            return Err(CatalogError::ViewImageMismatch {
                name: self.name.clone(),
                views: self.views.len(),
                images: self.images.len(),
            });
        }
        if self.structures.is_empty() {
            return Err(CatalogError::NoStructures(self.name.clone()));
        }
        if self.structures.contains_key(&0) {
            return Err(CatalogError::ZeroStructure(self.name.clone()));
        }
        Ok(())
    }
}

/// Validated, read-only table of every bone group the quiz can ask about.
#[derive(Debug, Clone)]
pub struct Catalog {
    groups: Vec<BoneGroup>,
}

impl Catalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_DATASET)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let groups: Vec<BoneGroup> = serde_json::from_reader(File::open(path)?)?;
        Self::new(groups)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let groups: Vec<BoneGroup> = serde_json::from_str(json)?;
        Self::new(groups)
    }

    pub fn new(groups: Vec<BoneGroup>) -> Result<Self, CatalogError> {
        if groups.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for group in &groups {
            group.validate()?;
            if !seen.insert(group.name.as_str()) {
                return Err(CatalogError::DuplicateGroup(group.name.clone()));
            }
        }
        Ok(Self { groups })
    }

    pub fn get(&self, name: &str) -> Option<&BoneGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn groups(&self) -> &[BoneGroup] {
        &self.groups
    }

    /// Group names in dataset order.
    pub fn names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }

    pub fn structure_count(&self) -> usize {
        self.groups.iter().map(|g| g.structures.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str) -> BoneGroup {
        BoneGroup {
            name: name.to_string(),
            title: format!("{name} de cheval"),
            views: vec!["Latérale".to_string()],
            images: vec![format!("{}_laterale.png", name.to_lowercase())],
            structures: BTreeMap::from([(1, "Tête".to_string()), (2, "Col".to_string())]),
        }
    }

    #[test]
    fn builtin_dataset_is_valid() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.groups().len(), 9);
        assert_eq!(catalog.names()[0], "Scapula");

        let scapula = catalog.get("Scapula").unwrap();
        assert_eq!(scapula.title, "Scapula gauche de cheval");
        assert_eq!(scapula.structures.len(), 24);
        assert_eq!(scapula.structure(14), Some("Col de la scapula"));

        let cervical = catalog.get("Vertèbres Cervicales").unwrap();
        assert_eq!(cervical.structure(8), Some("Tête de la vertèbre"));
        assert_eq!(cervical.views.len(), cervical.images.len());
    }

    #[test]
    fn rejects_mismatched_views_and_images() {
        let mut broken = group("Carpe");
        broken.views.push("Médiale".to_string());
        let err = Catalog::new(vec![broken]).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::ViewImageMismatch {
                views: 2,
                images: 1,
                ..
            }
        ));
    }

    #[test]
    fn rejects_group_without_structures() {
        let mut broken = group("Fémur");
        broken.structures.clear();
        let err = Catalog::new(vec![group("Carpe"), broken]).unwrap_err();
        assert!(matches!(err, CatalogError::NoStructures(name) if name == "Fémur"));
    }

    #[test]
    fn rejects_duplicates_zero_numbers_and_empty_tables() {
        let err = Catalog::new(vec![group("Carpe"), group("Carpe")]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateGroup(_)));

        let mut zero = group("Carpe");
        zero.structures.insert(0, "Rien".to_string());
        assert!(matches!(
            Catalog::new(vec![zero]).unwrap_err(),
            CatalogError::ZeroStructure(_)
        ));

        assert!(matches!(Catalog::new(vec![]).unwrap_err(), CatalogError::Empty));
    }

    #[test]
    fn parses_string_keyed_structures() {
        let json = r#"[{"name":"Os","title":"Os de cheval","views":[],"images":[],
            "structures":{"3":"Trois","1":"Un"}}]"#;
        let catalog = Catalog::from_json(json).unwrap();
        let os = catalog.get("Os").unwrap();
        assert_eq!(os.structures.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert!(Catalog::from_json("{not json").is_err());
    }
}

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::anatomy::BoneGroup;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("image directory '{}' not found", .0.display())]
    DirectoryMissing(PathBuf),
}

/// One reference picture of a bone group, resolved against the image directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewImage<'a> {
    pub view: &'a str,
    pub file: &'a str,
    pub path: PathBuf,
    pub present: bool,
}

impl ViewImage<'_> {
    pub fn caption(&self, group: &BoneGroup) -> String {
        format!("{} - {}", group.title, self.view)
    }
}

/// Resolves every view of `group`. A missing file is reported per image,
/// a missing directory fails the whole panel.
pub fn locate<'a>(dir: &Path, group: &'a BoneGroup) -> Result<Vec<ViewImage<'a>>, ImageError> {
    if !dir.is_dir() {
        return Err(ImageError::DirectoryMissing(dir.to_path_buf()));
    }

    Ok(group
        .views
        .iter()
        .zip(&group.images)
        .map(|(view, file)| {
            let path = dir.join(file);
            let present = path.is_file();
            ViewImage {
                view: view.as_str(),
                file: file.as_str(),
                path,
                present,
            }
        })
        .collect())
}

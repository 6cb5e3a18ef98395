pub mod anatomy;
pub mod images;
pub mod matcher;
pub mod session;
pub mod stats;
pub mod store;

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use thiserror::Error;

use anatomy::Catalog;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("no bone group is selected")]
    EmptySelection,
    #[error("unknown bone group '{0}'")]
    UnknownGroup(String),
    #[error("bone group '{0}' has no structures")]
    NoStructures(String),
    #[error("the answer is empty")]
    EmptyAnswer,
    #[error("the current question has not been answered yet")]
    AnswerPending,
    #[error("no question is waiting for an answer")]
    NoPendingQuestion,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub bone_group: String,
    pub structure_number: u32,
    pub correct_answer: String,
    pub bone_title: String,
}

impl Question {
    pub fn prompt(&self) -> String {
        format!(
            "Quelle est la structure numéro {} ?",
            self.structure_number
        )
    }
}

/// Picks a bone group uniformly among `selection`, then one of its structures.
pub fn generate_question<R: Rng + ?Sized>(
    catalog: &Catalog,
    selection: &[String],
    rng: &mut R,
) -> Result<Question, QuizError> {
    let name = selection.choose(rng).ok_or(QuizError::EmptySelection)?;
    let group = catalog
        .get(name)
        .ok_or_else(|| QuizError::UnknownGroup(name.clone()))?;
    let (&number, answer) = group
        .structures
        .iter()
        .choose(rng)
        .ok_or_else(|| QuizError::NoStructures(name.clone()))?;

    Ok(Question {
        bone_group: group.name.clone(),
        structure_number: number,
        correct_answer: answer.clone(),
        bone_title: group.title.clone(),
    })
}

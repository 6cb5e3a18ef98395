//! One learner action applied to the quiz state, independent of Telegram.

use rand::Rng;
use teloxide::utils::html;

use crate::keyboard::Action;
use crate::quiz::anatomy::Catalog;
use crate::quiz::session::{AnswerOutcome, Phase, QuizSession, Verdict};
use crate::quiz::stats::{self, Celebration, MILESTONE_STREAK};
use crate::quiz::store::StatsStore;
use crate::quiz::{Question, QuizError};

pub const NO_SELECTION_TEXT: &str =
    "⚠️ Veuillez sélectionner au moins un groupe d'os pour commencer.";
pub const ANSWER_PENDING_TEXT: &str =
    "Répondez d'abord à la question en cours, ou passez-la.";
pub const NO_QUESTION_TEXT: &str = "👆 Cliquez sur « Nouvelle question » pour commencer le quiz !";
pub const EMPTY_ANSWER_TEXT: &str = "Veuillez entrer une réponse avant de valider.";
pub const GROUPS_TEXT: &str = "Sélectionnez les groupes d'os à étudier :";
pub const RESET_TEXT: &str = "🔄 Statistiques de la session remises à zéro.";
pub const UNKNOWN_COMMAND_TEXT: &str = "Tapez /help pour la liste des commandes.";
const NOT_SAVED_TEXT: &str = "⚠️ Les statistiques n'ont pas pu être enregistrées.";

/// What to send back after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A new question: images of its bone group, then the prompt.
    Question(Question),
    Outcome(AnswerOutcome),
    /// Plain message shown with the keyboard of the current phase.
    Notice(String),
    /// Message shown with the group selection keyboard.
    Groups(String),
}

pub fn step<R: Rng + ?Sized>(
    session: &mut QuizSession,
    action: Action,
    catalog: &Catalog,
    store: &mut StatsStore,
    rng: &mut R,
) -> Reply {
    let result = match action {
        Action::NewQuestion | Action::Next => session
            .request_question(catalog, rng)
            .map(|q| Reply::Question(q.clone())),
        Action::Answer(text) => session.submit(&text, store).map(Reply::Outcome),
        Action::Skip => session.skip(store).map(Reply::Outcome),
        Action::Stats => Ok(Reply::Notice(stats::render_panel(
            session.stats(),
            store.stats(),
        ))),
        Action::Structures => Ok(Reply::Notice(
            session
                .structures_listing(catalog)
                .unwrap_or_else(|| NO_QUESTION_TEXT.to_string()),
        )),
        Action::Reset => {
            session.reset();
            Ok(Reply::Notice(RESET_TEXT.to_string()))
        }
        Action::Groups => Ok(Reply::Groups(GROUPS_TEXT.to_string())),
        Action::SelectAll => {
            session.select_all(catalog);
            Ok(Reply::Groups(selection_summary(session)))
        }
        Action::SelectNone => {
            session.select_none();
            Ok(Reply::Groups(selection_summary(session)))
        }
        Action::Toggle(name) => session.toggle_group(catalog, &name).map(|selected| {
            let verb = if selected { "ajouté" } else { "retiré" };
            Reply::Groups(format!("{name} {verb}. {}", selection_summary(session)))
        }),
        Action::Back => Ok(Reply::Notice(phase_hint(session.phase()))),
        Action::UnknownCommand(command) => Ok(Reply::Notice(format!(
            "Commande inconnue : {command}. {UNKNOWN_COMMAND_TEXT}"
        ))),
    };

    result.unwrap_or_else(|e| error_reply(&e))
}

fn error_reply(error: &QuizError) -> Reply {
    match error {
        QuizError::EmptySelection => Reply::Groups(NO_SELECTION_TEXT.to_string()),
        QuizError::AnswerPending => Reply::Notice(ANSWER_PENDING_TEXT.to_string()),
        QuizError::NoPendingQuestion => Reply::Notice(NO_QUESTION_TEXT.to_string()),
        QuizError::EmptyAnswer => Reply::Notice(EMPTY_ANSWER_TEXT.to_string()),
        QuizError::UnknownGroup(name) | QuizError::NoStructures(name) => {
            log::warn!("Bone group '{}' cannot be used: {}", name, error);
            Reply::Groups(format!("Groupe d'os inconnu : {name}"))
        }
    }
}

fn selection_summary(session: &QuizSession) -> String {
    match session.selection().len() {
        0 => NO_SELECTION_TEXT.to_string(),
        1 => "1 groupe sélectionné.".to_string(),
        n => format!("{n} groupes sélectionnés."),
    }
}

pub fn phase_hint(phase: &Phase) -> String {
    match phase {
        Phase::NoQuestion => NO_QUESTION_TEXT.to_string(),
        Phase::AwaitingAnswer(question) => question.prompt(),
        Phase::AnswerShown(_) => "➡️ Passez à la question suivante quand vous êtes prêt.".to_string(),
    }
}

/// Feedback for an answered or skipped question, in Telegram HTML.
pub fn outcome_text(outcome: &AnswerOutcome) -> String {
    let answer = html::escape(&outcome.correct_answer);
    let mut text = match &outcome.verdict {
        Verdict::Correct(celebration) => {
            let mut text = format!("🎉 Correct ! La réponse était : <b>{answer}</b>");
            match celebration {
                Celebration::Correct => {}
                Celebration::Streak(n) => {
                    text.push_str(&format!("\n🎈 Série de {n} bonnes réponses !"))
                }
                Celebration::Milestone => text.push_str(&format!(
                    "\n🏆 Bravo ! {MILESTONE_STREAK} bonnes réponses d'affilée !"
                )),
            }
            text
        }
        Verdict::Incorrect { given } => format!(
            "❌ Incorrect. La bonne réponse était : <b>{answer}</b>\nVotre réponse : <i>{}</i>",
            html::escape(given)
        ),
        Verdict::Skipped => format!("⏭️ Question passée. La réponse était : <b>{answer}</b>"),
    };
    if !outcome.saved {
        text.push_str("\n\n");
        text.push_str(NOT_SAVED_TEXT);
    }
    text
}

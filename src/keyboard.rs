use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::quiz::anatomy::Catalog;
use crate::quiz::session::{Phase, QuizSession};

pub const NEW_QUESTION: &str = "🎲 Nouvelle question";
pub const SKIP: &str = "⏭️ Passer";
pub const NEXT: &str = "➡️ Question suivante";
pub const STATS: &str = "📊 Statistiques";
pub const GROUPS: &str = "🦴 Groupes d'os";
pub const STRUCTURES: &str = "📚 Structures";
pub const RESET: &str = "🔄 Réinitialiser";
pub const SELECT_ALL: &str = "Tout sélectionner";
pub const SELECT_NONE: &str = "Tout désélectionner";
pub const BACK: &str = "↩️ Retour au quiz";

const SELECTED_MARK: &str = "✅ ";
const UNSELECTED_MARK: &str = "⬜ ";

/// Everything a learner can ask for with one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    NewQuestion,
    Skip,
    Next,
    Stats,
    Groups,
    Structures,
    Reset,
    SelectAll,
    SelectNone,
    Back,
    Toggle(String),
    /// A `/command` the bot does not know.
    UnknownCommand(String),
    Answer(String),
}

/// Maps a text message to an action. Anything that is not a button label or a command
/// is an answer.
pub fn parse_action(text: &str) -> Action {
    match text.trim() {
        command if command.starts_with('/') => Action::UnknownCommand(command.to_string()),
        NEW_QUESTION => Action::NewQuestion,
        SKIP => Action::Skip,
        NEXT => Action::Next,
        STATS => Action::Stats,
        GROUPS => Action::Groups,
        STRUCTURES => Action::Structures,
        RESET => Action::Reset,
        SELECT_ALL => Action::SelectAll,
        SELECT_NONE => Action::SelectNone,
        BACK => Action::Back,
        other => match parse_group_button(other) {
            Some(name) => Action::Toggle(name),
            None => Action::Answer(text.to_string()),
        },
    }
}

/// "✅ Scapula (24)" for a selected group, "⬜ Scapula (24)" otherwise.
pub fn group_button(name: &str, structures: usize, selected: bool) -> String {
    let mark = if selected { SELECTED_MARK } else { UNSELECTED_MARK };
    format!("{mark}{name} ({structures})")
}

fn parse_group_button(text: &str) -> Option<String> {
    let rest = text
        .strip_prefix(SELECTED_MARK)
        .or_else(|| text.strip_prefix(UNSELECTED_MARK))?;
    let (name, _count) = rest.rsplit_once(" (")?;
    Some(name.to_string())
}

fn markup(rows: Vec<Vec<&str>>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
    )
}

pub fn quiz_keyboard(phase: &Phase) -> KeyboardMarkup {
    match phase {
        Phase::NoQuestion => markup(vec![vec![NEW_QUESTION], vec![GROUPS, STATS, RESET]]),
        Phase::AwaitingAnswer(_) => markup(vec![vec![SKIP], vec![STATS]]),
        Phase::AnswerShown(_) => markup(vec![
            vec![NEXT],
            vec![STRUCTURES, STATS],
            vec![GROUPS, RESET],
        ]),
    }
}

pub fn groups_keyboard(catalog: &Catalog, session: &QuizSession) -> KeyboardMarkup {
    let buttons: Vec<String> = catalog
        .groups()
        .iter()
        .map(|g| group_button(&g.name, g.structures.len(), session.is_selected(&g.name)))
        .collect();

    let mut rows = vec![vec![SELECT_ALL, SELECT_NONE]];
    rows.extend(buttons.iter().map(|b| vec![b.as_str()]));
    rows.push(vec![BACK]);
    markup(rows)
}

use std::fmt::Write;

/// Streak that earns the special celebration.
pub const MILESTONE_STREAK: u32 = 5;

/// Counters for the current session. Zeroed at session start and on reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionStats {
    pub score: u32,
    pub total_questions: u32,
    pub streak: u32,
    pub best_streak: u32,
}

impl SessionStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn accuracy(&self) -> Option<f64> {
        accuracy(self.score, self.total_questions)
    }
}

/// Lifetime counters, persisted after every change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PersistentStats {
    pub total_score: u32,
    pub total_questions: u32,
    pub best_streak_ever: u32,
    pub sessions_played: u32,
    pub last_celebration_streak: u32,
}

impl PersistentStats {
    pub fn accuracy(&self) -> Option<f64> {
        accuracy(self.total_score, self.total_questions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Celebration {
    /// Plain correct answer.
    Correct,
    /// Correct answer extending a streak of two or more.
    Streak(u32),
    /// First time the streak reaches [`MILESTONE_STREAK`] since it was last below it.
    Milestone,
}

/// Applies a judged answer to both records.
///
/// Returns the celebration earned by a correct answer, `None` otherwise.
pub fn record_answer(
    session: &mut SessionStats,
    lifetime: &mut PersistentStats,
    correct: bool,
) -> Option<Celebration> {
    session.total_questions += 1;
    lifetime.total_questions += 1;

    if !correct {
        break_streak(session, lifetime);
        return None;
    }

    session.score += 1;
    lifetime.total_score += 1;
    session.streak += 1;
    session.best_streak = session.best_streak.max(session.streak);
    lifetime.best_streak_ever = lifetime.best_streak_ever.max(session.streak);

    // any run below the milestone re-arms it, resets and new sessions included
    if session.streak < MILESTONE_STREAK {
        lifetime.last_celebration_streak = 0;
    }

    if session.streak == MILESTONE_STREAK && lifetime.last_celebration_streak != MILESTONE_STREAK {
        lifetime.last_celebration_streak = MILESTONE_STREAK;
        Some(Celebration::Milestone)
    } else if session.streak > 1 {
        Some(Celebration::Streak(session.streak))
    } else {
        Some(Celebration::Correct)
    }
}

/// A skipped question counts as asked, never as scored.
pub fn record_skip(session: &mut SessionStats, lifetime: &mut PersistentStats) {
    session.total_questions += 1;
    lifetime.total_questions += 1;
    break_streak(session, lifetime);
}

fn break_streak(session: &mut SessionStats, lifetime: &mut PersistentStats) {
    session.streak = 0;
    // re-arms the milestone for the next run
    lifetime.last_celebration_streak = 0;
}

fn accuracy(score: u32, total: u32) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(f64::from(score) * 100.0 / f64::from(total))
    }
}

/// Text of the statistics panel.
pub fn render_panel(session: &SessionStats, lifetime: &PersistentStats) -> String {
    let mut panel = String::from("📊 Statistiques de la session\n");
    match session.accuracy() {
        Some(accuracy) => {
            let _ = writeln!(panel, "Précision : {accuracy:.1} %");
            let _ = writeln!(
                panel,
                "Score : {}/{}",
                session.score, session.total_questions
            );
            let _ = writeln!(panel, "Série actuelle : {}", session.streak);
            let _ = writeln!(panel, "Meilleure série : {}", session.best_streak);
        }
        None => panel.push_str("Commencez le quiz pour voir vos statistiques !\n"),
    }

    panel.push_str("\n🏆 Depuis le début\n");
    match lifetime.accuracy() {
        Some(accuracy) => {
            let _ = writeln!(panel, "Précision : {accuracy:.1} %");
            let _ = writeln!(
                panel,
                "Score : {}/{}",
                lifetime.total_score, lifetime.total_questions
            );
        }
        None => panel.push_str("Aucune réponse enregistrée pour l'instant.\n"),
    }
    let _ = writeln!(panel, "Meilleure série : {}", lifetime.best_streak_ever);
    let _ = write!(panel, "Sessions jouées : {}", lifetime.sessions_played);
    panel
}

use std::fmt::Write;

use rand::Rng;

use super::anatomy::Catalog;
use super::matcher;
use super::stats::{self, Celebration, SessionStats};
use super::store::StatsStore;
use super::{generate_question, Question, QuizError};

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    #[default]
    NoQuestion,
    AwaitingAnswer(Question),
    AnswerShown(Question),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Correct(Celebration),
    Incorrect { given: String },
    Skipped,
}

/// What happened to the question that was just answered or skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub verdict: Verdict,
    pub correct_answer: String,
    /// False when the lifetime stats could not be written to disk.
    pub saved: bool,
}

/// State of one learner's quiz: selected groups, the question in flight and session counters.
///
/// Lifetime counters live in the [`StatsStore`] passed to the answering methods.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizSession {
    selection: Vec<String>,
    phase: Phase,
    stats: SessionStats,
}

impl QuizSession {
    /// Fresh session with every bone group selected.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            selection: catalog.names(),
            phase: Phase::NoQuestion,
            stats: SessionStats::default(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn question(&self) -> Option<&Question> {
        match &self.phase {
            Phase::NoQuestion => None,
            Phase::AwaitingAnswer(question) | Phase::AnswerShown(question) => Some(question),
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selection.iter().any(|n| n == name)
    }

    /// Flips one group in or out of the selection. Returns whether it is now selected.
    ///
    /// Selection changes only apply to the next generated question.
    pub fn toggle_group(&mut self, catalog: &Catalog, name: &str) -> Result<bool, QuizError> {
        if catalog.get(name).is_none() {
            return Err(QuizError::UnknownGroup(name.to_string()));
        }
        let selected = !self.is_selected(name);
        // keep dataset order
        self.selection = catalog
            .names()
            .into_iter()
            .filter(|n| if n == name { selected } else { self.is_selected(n) })
            .collect();
        Ok(selected)
    }

    pub fn select_all(&mut self, catalog: &Catalog) {
        self.selection = catalog.names();
    }

    pub fn select_none(&mut self) {
        self.selection.clear();
    }

    /// Asks a fresh question, either the first one or the next after an answer.
    ///
    /// Fails without touching the state when no group is selected or when the
    /// current question still waits for an answer.
    pub fn request_question<R: Rng + ?Sized>(
        &mut self,
        catalog: &Catalog,
        rng: &mut R,
    ) -> Result<&Question, QuizError> {
        if let Phase::AwaitingAnswer(_) = self.phase {
            return Err(QuizError::AnswerPending);
        }
        let question = generate_question(catalog, &self.selection, rng)?;
        self.phase = Phase::AwaitingAnswer(question);
        self.pending()
    }

    pub fn submit(&mut self, answer: &str, store: &mut StatsStore) -> Result<AnswerOutcome, QuizError> {
        let question = self.pending()?.clone();
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(QuizError::EmptyAnswer);
        }

        let correct = matcher::matches(answer, &question.correct_answer);
        log::debug!(
            "Answer '{}' for {} #{}: {}",
            matcher::normalize(answer),
            question.bone_group,
            question.structure_number,
            if correct { "correct" } else { "incorrect" }
        );

        let (celebration, saved) =
            store.update(|lifetime| stats::record_answer(&mut self.stats, lifetime, correct));
        let verdict = match celebration {
            Some(celebration) => Verdict::Correct(celebration),
            None => Verdict::Incorrect {
                given: answer.to_string(),
            },
        };
        Ok(self.show_answer(question, verdict, saved))
    }

    pub fn skip(&mut self, store: &mut StatsStore) -> Result<AnswerOutcome, QuizError> {
        let question = self.pending()?.clone();
        let ((), saved) = store.update(|lifetime| stats::record_skip(&mut self.stats, lifetime));
        Ok(self.show_answer(question, Verdict::Skipped, saved))
    }

    /// Zeroes the session counters and drops the current question. Lifetime stats are kept.
    pub fn reset(&mut self) {
        self.stats.reset();
        self.phase = Phase::NoQuestion;
    }

    /// Numbered list of the current group's structures, marking the one asked.
    pub fn structures_listing(&self, catalog: &Catalog) -> Option<String> {
        let question = self.question()?;
        let group = catalog.get(&question.bone_group)?;

        let mut listing = format!("📚 Structures : {}\n", group.title);
        for (number, name) in &group.structures {
            if *number == question.structure_number {
                let _ = write!(listing, "\n▶️ {number}. {name} ← question actuelle");
            } else {
                let _ = write!(listing, "\n{number}. {name}");
            }
        }
        Some(listing)
    }

    fn pending(&self) -> Result<&Question, QuizError> {
        match &self.phase {
            Phase::AwaitingAnswer(question) => Ok(question),
            _ => Err(QuizError::NoPendingQuestion),
        }
    }

    fn show_answer(&mut self, question: Question, verdict: Verdict, saved: bool) -> AnswerOutcome {
        let correct_answer = question.correct_answer.clone();
        self.phase = Phase::AnswerShown(question);
        AnswerOutcome {
            verdict,
            correct_answer,
            saved,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    use super::*;
    use crate::quiz::stats::{PersistentStats, MILESTONE_STREAK};

    struct Fixture {
        catalog: Catalog,
        session: QuizSession,
        store: StatsStore,
        rng: StdRng,
        _dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::builtin().unwrap();
        let session = QuizSession::new(&catalog);
        Fixture {
            store: StatsStore::open(dir.path().join("stats.json")),
            catalog,
            session,
            rng: StdRng::seed_from_u64(3),
            _dir: dir,
        }
    }

    impl Fixture {
        fn ask(&mut self) -> Question {
            self.session
                .request_question(&self.catalog, &mut self.rng)
                .unwrap()
                .clone()
        }

        fn answer(&mut self, correct: bool) -> AnswerOutcome {
            let question = self.ask();
            let text = if correct {
                question.correct_answer.as_str()
            } else {
                "xyz"
            };
            self.session.submit(text, &mut self.store).unwrap()
        }
    }

    #[test]
    fn new_session_selects_every_group() {
        let f = fixture();
        assert_eq!(f.session.selection(), f.catalog.names().as_slice());
        assert_eq!(f.session.phase(), &Phase::NoQuestion);
        assert_eq!(f.session.stats(), &SessionStats::default());
    }

    #[test]
    fn question_cycle_follows_the_phases() {
        let mut f = fixture();
        let question = f.ask();
        assert_eq!(f.session.phase(), &Phase::AwaitingAnswer(question.clone()));

        let outcome = f
            .session
            .submit(&question.correct_answer.to_uppercase(), &mut f.store)
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Correct(Celebration::Correct));
        assert_eq!(outcome.correct_answer, question.correct_answer);
        assert!(outcome.saved);
        assert_eq!(f.session.phase(), &Phase::AnswerShown(question));

        let next = f.ask();
        assert_eq!(f.session.phase(), &Phase::AwaitingAnswer(next));
    }

    #[test]
    fn blank_answer_reprompts_without_counting() {
        let mut f = fixture();
        let question = f.ask();
        assert_eq!(
            f.session.submit("   ", &mut f.store),
            Err(QuizError::EmptyAnswer)
        );
        assert_eq!(f.session.phase(), &Phase::AwaitingAnswer(question));
        assert_eq!(f.session.stats().total_questions, 0);
        assert_eq!(f.store.stats().total_questions, 0);
    }

    #[test]
    fn out_of_phase_actions_are_rejected() {
        let mut f = fixture();
        assert_eq!(
            f.session.submit("Col", &mut f.store),
            Err(QuizError::NoPendingQuestion)
        );
        assert_eq!(f.session.skip(&mut f.store), Err(QuizError::NoPendingQuestion));

        let question = f.ask();
        assert_eq!(
            f.session
                .request_question(&f.catalog, &mut f.rng)
                .unwrap_err(),
            QuizError::AnswerPending
        );
        assert_eq!(f.session.question(), Some(&question));

        f.session.skip(&mut f.store).unwrap();
        assert_eq!(f.session.skip(&mut f.store), Err(QuizError::NoPendingQuestion));
    }

    #[test]
    fn wrong_answer_and_skip_are_counted_without_score() {
        let mut f = fixture();
        let outcome = f.answer(false);
        assert_eq!(
            outcome.verdict,
            Verdict::Incorrect {
                given: "xyz".to_string()
            }
        );

        f.ask();
        let outcome = f.session.skip(&mut f.store).unwrap();
        assert_eq!(outcome.verdict, Verdict::Skipped);

        let stats = f.session.stats();
        assert_eq!((stats.score, stats.total_questions, stats.streak), (0, 2, 0));
        assert_eq!(f.store.stats().total_questions, 2);
        assert_eq!(f.store.stats().total_score, 0);
    }

    #[test]
    fn score_tracks_correct_submissions() {
        let mut f = fixture();
        let pattern = [true, true, false, true, false, true, true, true];
        for &correct in &pattern {
            f.answer(correct);
            let stats = f.session.stats();
            assert!(stats.score <= stats.total_questions);
        }
        let stats = f.session.stats();
        assert_eq!(stats.score, 5);
        assert_eq!(stats.total_questions, 8);
        assert_eq!(stats.streak, 3);
        assert_eq!(stats.best_streak, 3);
        assert_eq!(f.store.stats().total_score, 5);
        assert_eq!(f.store.stats().best_streak_ever, 3);
    }

    #[test]
    fn milestone_is_reported_once() {
        let mut f = fixture();
        let verdicts: Vec<Verdict> = (0..10).map(|_| f.answer(true).verdict).collect();
        assert_eq!(verdicts[4], Verdict::Correct(Celebration::Milestone));
        let milestones = verdicts
            .iter()
            .filter(|v| **v == Verdict::Correct(Celebration::Milestone))
            .count();
        assert_eq!(milestones, 1);
        assert_eq!(f.store.stats().last_celebration_streak, MILESTONE_STREAK);
    }

    #[test]
    fn milestone_is_reported_again_after_reset() {
        let mut f = fixture();
        for _ in 0..6 {
            f.answer(true);
        }
        f.session.reset();
        let verdicts: Vec<Verdict> = (0..5).map(|_| f.answer(true).verdict).collect();
        assert_eq!(verdicts[4], Verdict::Correct(Celebration::Milestone));
        assert_eq!(
            StatsStore::read(f.store.path())
                .unwrap()
                .map(|s| s.last_celebration_streak),
            Some(MILESTONE_STREAK)
        );
    }

    #[test]
    fn empty_selection_keeps_the_current_question() {
        let mut f = fixture();
        f.session.select_none();
        assert_eq!(
            f.session
                .request_question(&f.catalog, &mut f.rng)
                .unwrap_err(),
            QuizError::EmptySelection
        );
        assert_eq!(f.session.phase(), &Phase::NoQuestion);

        f.session.select_all(&f.catalog);
        let question = f.ask();
        f.session.skip(&mut f.store).unwrap();
        f.session.select_none();
        assert!(f.session.request_question(&f.catalog, &mut f.rng).is_err());
        assert_eq!(f.session.phase(), &Phase::AnswerShown(question));
    }

    #[test]
    fn selection_changes_wait_for_the_next_question() {
        let mut f = fixture();
        f.session.select_none();
        assert_eq!(f.session.toggle_group(&f.catalog, "Carpe"), Ok(true));
        let question = f.ask();
        assert_eq!(question.bone_group, "Carpe");

        assert_eq!(f.session.toggle_group(&f.catalog, "Fémur"), Ok(true));
        assert_eq!(f.session.toggle_group(&f.catalog, "Carpe"), Ok(false));
        assert_eq!(f.session.question(), Some(&question));
        assert_eq!(f.session.selection(), ["Fémur".to_string()]);

        f.session.skip(&mut f.store).unwrap();
        assert_eq!(f.ask().bone_group, "Fémur");

        assert_eq!(
            f.session.toggle_group(&f.catalog, "Crâne"),
            Err(QuizError::UnknownGroup("Crâne".to_string()))
        );
    }

    #[test]
    fn toggling_keeps_dataset_order() {
        let mut f = fixture();
        f.session.select_none();
        f.session.toggle_group(&f.catalog, "Fémur").unwrap();
        f.session.toggle_group(&f.catalog, "Scapula").unwrap();
        assert_eq!(
            f.session.selection(),
            ["Scapula".to_string(), "Fémur".to_string()]
        );
    }

    #[test]
    fn reset_only_touches_the_session() {
        let mut f = fixture();
        f.answer(true);
        f.answer(true);
        f.answer(false);
        let lifetime: PersistentStats = *f.store.stats();

        f.session.reset();
        assert_eq!(f.session.stats(), &SessionStats::default());
        assert_eq!(f.session.phase(), &Phase::NoQuestion);
        assert_eq!(*f.store.stats(), lifetime);
        assert_eq!(StatsStore::read(f.store.path()).unwrap(), Some(lifetime));
    }

    #[test]
    fn structures_listing_marks_the_question() {
        let mut f = fixture();
        assert_eq!(f.session.structures_listing(&f.catalog), None);

        let question = f.ask();
        let listing = f.session.structures_listing(&f.catalog).unwrap();
        let marked = format!(
            "▶️ {}. {} ← question actuelle",
            question.structure_number, question.correct_answer
        );
        assert!(listing.contains(&marked));
        assert_eq!(listing.matches("question actuelle").count(), 1);
    }

    #[test]
    fn session_survives_dialogue_serialization() {
        let mut f = fixture();
        f.answer(true);
        f.ask();
        let json = serde_json::to_string(&f.session).unwrap();
        let restored: QuizSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, f.session);
    }
}

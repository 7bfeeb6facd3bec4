//! Review scheduling engine.
//!
//! Maps `(ReviewState, Grade, now)` to the next `ReviewState`. Everything
//! here is a pure function of its inputs; the clock is always passed in.

use chrono::{DateTime, Duration, Utc};

use crate::config::SchedulerConfig;
use crate::error::{FlashdeckError, FlashdeckResult};
use crate::types::{CardId, Grade, Phase, ReviewState, UserId};

const SECONDS_PER_DAY: f32 = 86_400.0;

/// Upper bound on the boost a long-overdue review can add to a stability gain.
const MAX_RETRIEVABILITY_BOOST: f32 = 1.5;

/// Spaced repetition scheduler.
///
/// Holds only immutable configuration, so one instance can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: SchedulerConfig,
}

/// Outcome of every grade for one state, for "next in ..." labels.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulePreview {
    pub again: ReviewState,
    pub hard: ReviewState,
    pub good: ReviewState,
    pub easy: ReviewState,
}

impl SchedulePreview {
    /// Get the predicted state for a grade.
    pub fn get(&self, grade: Grade) -> &ReviewState {
        match grade {
            Grade::Again => &self.again,
            Grade::Hard => &self.hard,
            Grade::Good => &self.good,
            Grade::Easy => &self.easy,
        }
    }

    /// Time until each outcome comes due, in Again/Hard/Good/Easy order.
    pub fn intervals(&self, now: DateTime<Utc>) -> [Duration; 4] {
        Grade::ALL.map(|grade| self.get(grade).due_at - now)
    }
}

impl Scheduler {
    /// Create a scheduler with default parameters.
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    /// Create a scheduler with custom parameters.
    pub fn with_config(config: SchedulerConfig) -> FlashdeckResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the active parameters.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Create the state a card starts with before its first review.
    pub fn initial_state(&self, card_id: CardId, user_id: UserId, now: DateTime<Utc>) -> ReviewState {
        ReviewState::with_defaults(
            card_id,
            user_id,
            self.config.initial_stability,
            self.config.initial_difficulty,
            now,
        )
    }

    /// Check a state's invariants. Invalid states are rejected, never repaired.
    pub fn validate(&self, state: &ReviewState) -> FlashdeckResult<()> {
        let fail = |message: String| Err(FlashdeckError::invalid_state_for(state.card_id, message));

        if !state.stability.is_finite() || state.stability <= 0.0 {
            return fail(format!("stability must be positive, got {}", state.stability));
        }
        if !state.difficulty.is_finite()
            || state.difficulty < self.config.min_difficulty
            || state.difficulty > self.config.max_difficulty
        {
            return fail(format!(
                "difficulty {} outside [{}, {}]",
                state.difficulty, self.config.min_difficulty, self.config.max_difficulty
            ));
        }
        match (state.phase, state.last_reviewed_at) {
            (Phase::New, Some(_)) => return fail("new card has a last review time".to_string()),
            (Phase::New, None) if state.repetitions != 0 => {
                return fail(format!("new card has {} repetitions", state.repetitions))
            }
            (Phase::New, None) => {}
            (_, None) => {
                return fail(format!("{} card was never reviewed", state.phase.kind()))
            }
            (_, Some(last)) if state.due_at < last => {
                return fail(format!("due {} precedes last review {}", state.due_at, last))
            }
            (_, Some(_)) => {}
        }
        Ok(())
    }

    /// Calculate current retrievability (probability of recall).
    ///
    /// Never-reviewed states return 1.0.
    pub fn retrievability(&self, state: &ReviewState, now: DateTime<Utc>) -> f32 {
        match state.last_reviewed_at {
            Some(last) => self.retrievability_after(state.stability, days_between(last, now)),
            None => 1.0,
        }
    }

    /// Calculate retrievability given explicit days elapsed.
    ///
    /// Uses the FSRS power forgetting curve, which passes 90% at
    /// `elapsed_days == stability`.
    pub fn retrievability_after(&self, stability: f32, elapsed_days: f32) -> f32 {
        if elapsed_days <= 0.0 {
            return 1.0;
        }
        if stability <= 0.001 {
            return 0.0;
        }

        let mem_state = fsrs::MemoryState {
            stability,
            difficulty: self.config.neutral_difficulty, // Difficulty doesn't affect retrievability
        };
        fsrs::current_retrievability(mem_state, elapsed_days, self.config.decay)
    }

    /// Multiplier applied to stability for a grade.
    ///
    /// Again returns the lapse penalty. Otherwise the result is
    /// `1 + gain(grade) * ease(difficulty) * boost(retrievability)`, which is
    /// always above 1.0 and strictly ordered Hard < Good < Easy.
    pub fn stability_factor(
        &self,
        grade: Grade,
        stability: f32,
        difficulty: f32,
        elapsed_days: f32,
    ) -> f32 {
        let gain = match grade {
            Grade::Again => return self.config.lapse_penalty,
            Grade::Hard => self.config.hard_gain,
            Grade::Good => self.config.good_gain,
            Grade::Easy => self.config.easy_gain,
        };

        // Harder items grow more slowly. ceiling - d >= 1 inside the bounds.
        let ceiling = self.config.max_difficulty + 1.0;
        let difficulty = difficulty.clamp(self.config.min_difficulty, self.config.max_difficulty);
        let ease = (ceiling - difficulty) / (ceiling - self.config.neutral_difficulty);

        // Recalling something half-forgotten says more than recalling it fresh.
        let retrievability = self.retrievability_after(stability, elapsed_days.max(0.0));
        let boost = ((1.0 - retrievability) * 0.5 + 1.0).min(MAX_RETRIEVABILITY_BOOST);

        1.0 + gain * ease * boost
    }

    /// Process a review and compute the next state.
    ///
    /// The input is validated first; `version` is carried over unchanged.
    pub fn schedule(
        &self,
        state: &ReviewState,
        grade: Grade,
        now: DateTime<Utc>,
    ) -> FlashdeckResult<ReviewState> {
        self.validate(state)?;

        let mut next = state.clone();
        next.last_reviewed_at = Some(now);

        if grade.is_failure() {
            self.apply_failure(state, &mut next);
            next.due_at = add_offset(now, Duration::try_minutes(self.config.again_delay_minutes))?;
        } else {
            self.apply_success(state, grade, &mut next, now);
            let days = match next.phase {
                Phase::Review => self.interval_days(next.stability),
                _ => self.config.learning_interval_days,
            };
            next.due_at = add_offset(now, Duration::try_days(days))?;
        }

        Ok(next)
    }

    /// Like [`schedule`](Self::schedule) but takes a raw 1-4 rating.
    pub fn schedule_rating(
        &self,
        state: &ReviewState,
        rating: u8,
        now: DateTime<Utc>,
    ) -> FlashdeckResult<ReviewState> {
        let grade = Grade::try_from(rating)?;
        self.schedule(state, grade, now)
    }

    /// Compute the outcome of every grade without committing to any.
    pub fn preview(&self, state: &ReviewState, now: DateTime<Utc>) -> FlashdeckResult<SchedulePreview> {
        Ok(SchedulePreview {
            again: self.schedule(state, Grade::Again, now)?,
            hard: self.schedule(state, Grade::Hard, now)?,
            good: self.schedule(state, Grade::Good, now)?,
            easy: self.schedule(state, Grade::Easy, now)?,
        })
    }

    fn apply_failure(&self, state: &ReviewState, next: &mut ReviewState) {
        next.difficulty = self.clamp_difficulty(state.difficulty + self.config.difficulty_step);
        next.repetitions = 0;

        match state.phase {
            // First review of a new card: nothing learned yet, so nothing lapsed.
            Phase::New => next.phase = Phase::Learning { step: 0 },
            Phase::Learning { .. } => {
                self.apply_lapse(state, next);
                next.phase = Phase::Learning { step: 0 };
            }
            Phase::Review | Phase::Relearning { .. } => {
                self.apply_lapse(state, next);
                next.phase = Phase::Relearning { step: 0 };
            }
        }
    }

    fn apply_lapse(&self, state: &ReviewState, next: &mut ReviewState) {
        next.lapses = state.lapses.saturating_add(1);
        next.stability = (state.stability * self.config.lapse_penalty).max(self.config.min_stability);
    }

    fn apply_success(&self, state: &ReviewState, grade: Grade, next: &mut ReviewState, now: DateTime<Utc>) {
        let elapsed_days = match state.last_reviewed_at {
            Some(last) => days_between(last, now),
            None => self.config.seed_elapsed_days,
        };
        let factor = self.stability_factor(grade, state.stability, state.difficulty, elapsed_days);

        next.stability = (state.stability * factor).min(f32::MAX);
        next.difficulty = self.next_difficulty(state.difficulty, grade);
        next.repetitions = state.repetitions.saturating_add(1);
        next.phase = match state.phase {
            Phase::New => self.learning_step(1),
            Phase::Learning { step } => self.learning_step(step.saturating_add(1)),
            Phase::Review => Phase::Review,
            Phase::Relearning { step } => {
                let step = step.saturating_add(1);
                if step >= self.config.relearning_steps {
                    Phase::Review
                } else {
                    Phase::Relearning { step }
                }
            }
        };
    }

    fn learning_step(&self, step: u32) -> Phase {
        if step >= self.config.learning_steps {
            Phase::Review
        } else {
            Phase::Learning { step }
        }
    }

    fn next_difficulty(&self, difficulty: f32, grade: Grade) -> f32 {
        let step = self.config.difficulty_step;
        let next = match grade {
            Grade::Again | Grade::Hard => difficulty + step,
            Grade::Good => difficulty + (self.config.neutral_difficulty - difficulty) * self.config.mean_reversion,
            Grade::Easy => difficulty - step,
        };
        self.clamp_difficulty(next)
    }

    fn clamp_difficulty(&self, difficulty: f32) -> f32 {
        difficulty.clamp(self.config.min_difficulty, self.config.max_difficulty)
    }

    fn interval_days(&self, stability: f32) -> i64 {
        (stability.round() as i64).clamp(1, self.config.maximum_interval_days)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f32 {
    (to.signed_duration_since(from).num_seconds() as f32 / SECONDS_PER_DAY).max(0.0)
}

fn add_offset(now: DateTime<Utc>, offset: Option<Duration>) -> FlashdeckResult<DateTime<Utc>> {
    offset
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| FlashdeckError::Internal(format!("due date overflows after {}", now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap()
    }

    fn new_state() -> ReviewState {
        ReviewState::new(CardId::new(), UserId::new("user_1"), t0())
    }

    fn review_state(stability: f32, difficulty: f32, days_since_review: i64) -> ReviewState {
        let mut state = new_state();
        state.stability = stability;
        state.difficulty = difficulty;
        state.repetitions = 3;
        state.phase = Phase::Review;
        state.last_reviewed_at = Some(t0() - Duration::days(days_since_review));
        state.due_at = t0();
        state.version = 4;
        state
    }

    #[test]
    fn test_retrievability_at_zero_elapsed() {
        let scheduler = Scheduler::new();
        let r = scheduler.retrievability_after(10.0, 0.0);
        assert!((r - 1.0).abs() < 0.001, "Retrievability at t=0 should be 1.0, got {}", r);
    }

    #[test]
    fn test_retrievability_at_stability() {
        let scheduler = Scheduler::new();
        let r = scheduler.retrievability_after(10.0, 10.0);
        assert!(r > 0.85 && r < 0.95, "Retrievability at t=S should be ~0.9, got {}", r);
    }

    #[test]
    fn test_retrievability_decays_over_time() {
        let scheduler = Scheduler::new();

        let r1 = scheduler.retrievability_after(10.0, 1.0);
        let r2 = scheduler.retrievability_after(10.0, 5.0);
        let r3 = scheduler.retrievability_after(10.0, 30.0);

        assert!(r1 > r2, "R(1) should be > R(5): {} > {}", r1, r2);
        assert!(r2 > r3, "R(5) should be > R(30): {} > {}", r2, r3);
        assert!(r3 > 0.0, "Retrievability should never be negative");
    }

    #[test]
    fn test_retrievability_never_reviewed() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.retrievability(&new_state(), t0() + Duration::days(90)), 1.0);
    }

    #[test]
    fn test_first_review_good_enters_learning() {
        let scheduler = Scheduler::new();
        let next = scheduler.schedule(&new_state(), Grade::Good, t0()).unwrap();

        assert_eq!(next.phase, Phase::Learning { step: 1 });
        assert_eq!(next.repetitions, 1);
        assert_eq!(next.lapses, 0);
        assert_eq!(next.last_reviewed_at, Some(t0()));
        assert!(next.due_at > t0());
        assert!(next.due_at - t0() <= Duration::days(1));
    }

    #[test]
    fn test_first_review_again_is_not_a_lapse() {
        let scheduler = Scheduler::new();
        let next = scheduler.schedule(&new_state(), Grade::Again, t0()).unwrap();

        assert_eq!(next.phase, Phase::Learning { step: 0 });
        assert_eq!(next.repetitions, 0);
        assert_eq!(next.lapses, 0);
        assert_eq!(next.due_at, t0() + Duration::minutes(10));
    }

    #[test]
    fn test_learning_graduates_after_steps() {
        let scheduler = Scheduler::new();
        let first = scheduler.schedule(&new_state(), Grade::Good, t0()).unwrap();
        let second_at = first.due_at;
        let second = scheduler.schedule(&first, Grade::Good, second_at).unwrap();

        assert_eq!(second.repetitions, 2);
        assert_eq!(second.phase, Phase::Review);
        assert!(second.due_at >= second_at + Duration::days(1));
    }

    #[test]
    fn test_learning_stays_below_threshold() {
        let config = SchedulerConfig {
            learning_steps: 3,
            ..Default::default()
        };
        let scheduler = Scheduler::with_config(config).unwrap();
        let first = scheduler.schedule(&new_state(), Grade::Good, t0()).unwrap();
        let second = scheduler.schedule(&first, Grade::Hard, first.due_at).unwrap();

        assert_eq!(second.phase, Phase::Learning { step: 2 });
        assert_eq!(second.due_at, first.due_at + Duration::days(1));

        let third = scheduler.schedule(&second, Grade::Good, second.due_at).unwrap();
        assert_eq!(third.phase, Phase::Review);
    }

    #[test]
    fn test_again_in_learning_restarts_steps() {
        let scheduler = Scheduler::new();
        let first = scheduler.schedule(&new_state(), Grade::Good, t0()).unwrap();
        let failed = scheduler.schedule(&first, Grade::Again, first.due_at).unwrap();

        assert_eq!(failed.phase, Phase::Learning { step: 0 });
        assert_eq!(failed.repetitions, 0);
        assert_eq!(failed.lapses, 1);
        assert_eq!(failed.due_at, first.due_at + Duration::minutes(10));
    }

    #[test]
    fn test_review_lapse_scenario() {
        let scheduler = Scheduler::new();
        let state = review_state(10.0, 5.0, 10);

        let next = scheduler.schedule(&state, Grade::Again, t0()).unwrap();

        assert_eq!(next.phase, Phase::Relearning { step: 0 });
        assert_eq!(next.lapses, state.lapses + 1);
        assert_eq!(next.repetitions, 0);
        assert!((next.stability - 5.0).abs() < 1e-4, "stability should halve, got {}", next.stability);
        assert_eq!(next.due_at, t0() + Duration::minutes(10));
        assert!(next.difficulty > state.difficulty);
        assert_eq!(next.version, state.version);
    }

    #[test]
    fn test_lapse_respects_stability_floor() {
        let scheduler = Scheduler::new();
        let state = review_state(0.15, 5.0, 1);

        let next = scheduler.schedule(&state, Grade::Again, t0()).unwrap();
        assert_eq!(next.stability, scheduler.config().min_stability);
    }

    #[test]
    fn test_again_always_lapses_reviewed_cards() {
        let scheduler = Scheduler::new();
        for phase in [Phase::Learning { step: 1 }, Phase::Review, Phase::Relearning { step: 0 }] {
            let mut state = review_state(4.0, 6.0, 2);
            state.phase = phase;
            state.lapses = 2;

            let next = scheduler.schedule(&state, Grade::Again, t0()).unwrap();
            assert_eq!(next.lapses, 3, "phase {:?}", phase);
            assert_eq!(next.repetitions, 0, "phase {:?}", phase);
            if !matches!(phase, Phase::Learning { .. }) {
                assert_eq!(next.phase, Phase::Relearning { step: 0 });
            }
        }
    }

    #[test]
    fn test_relearning_returns_to_review() {
        let config = SchedulerConfig {
            relearning_steps: 2,
            ..Default::default()
        };
        let scheduler = Scheduler::with_config(config).unwrap();
        let lapsed = scheduler.schedule(&review_state(10.0, 5.0, 10), Grade::Again, t0()).unwrap();

        let step1 = scheduler.schedule(&lapsed, Grade::Good, lapsed.due_at).unwrap();
        assert_eq!(step1.phase, Phase::Relearning { step: 1 });
        assert_eq!(step1.due_at, lapsed.due_at + Duration::days(1));

        let step2 = scheduler.schedule(&step1, Grade::Good, step1.due_at).unwrap();
        assert_eq!(step2.phase, Phase::Review);
        assert_eq!(step2.repetitions, 2);
    }

    #[test]
    fn test_easy_always_increases_stability() {
        let scheduler = Scheduler::new();
        let phases = [Phase::Learning { step: 1 }, Phase::Review, Phase::Relearning { step: 0 }];

        for phase in phases {
            for stability in [0.1_f32, 1.0, 10.0, 365.0, 10_000.0] {
                for difficulty in [1.0_f32, 5.0, 10.0] {
                    for elapsed in [0_i64, 1, 30, 1_000] {
                        let mut state = review_state(stability, difficulty, elapsed);
                        state.phase = phase;
                        state.due_at = state.last_reviewed_at.unwrap();

                        let next = scheduler.schedule(&state, Grade::Easy, t0()).unwrap();
                        assert!(
                            next.stability > stability,
                            "Easy must grow stability: {:?} s={} d={} e={} -> {}",
                            phase,
                            stability,
                            difficulty,
                            elapsed,
                            next.stability
                        );
                    }
                }
            }
        }

        let next = scheduler.schedule(&new_state(), Grade::Easy, t0()).unwrap();
        assert!(next.stability > new_state().stability);
    }

    #[test]
    fn test_stability_factor_ordering() {
        let scheduler = Scheduler::new();
        for difficulty in [1.0_f32, 3.0, 5.0, 8.0, 10.0] {
            for elapsed in [0.0_f32, 0.5, 3.0, 60.0] {
                let hard = scheduler.stability_factor(Grade::Hard, 5.0, difficulty, elapsed);
                let good = scheduler.stability_factor(Grade::Good, 5.0, difficulty, elapsed);
                let easy = scheduler.stability_factor(Grade::Easy, 5.0, difficulty, elapsed);
                assert!(hard > 1.0, "d={} e={}", difficulty, elapsed);
                assert!(good > hard, "d={} e={}", difficulty, elapsed);
                assert!(easy > good, "d={} e={}", difficulty, elapsed);
            }
        }
        assert_eq!(scheduler.stability_factor(Grade::Again, 5.0, 5.0, 1.0), 0.5);
    }

    #[test]
    fn test_overdue_review_grows_more() {
        let scheduler = Scheduler::new();
        let on_time = scheduler.schedule(&review_state(10.0, 5.0, 10), Grade::Good, t0()).unwrap();
        let overdue = scheduler.schedule(&review_state(10.0, 5.0, 40), Grade::Good, t0()).unwrap();
        assert!(overdue.stability > on_time.stability);
    }

    #[test]
    fn test_difficulty_nudges() {
        let scheduler = Scheduler::new();
        let state = review_state(5.0, 7.0, 5);

        let hard = scheduler.schedule(&state, Grade::Hard, t0()).unwrap();
        let good = scheduler.schedule(&state, Grade::Good, t0()).unwrap();
        let easy = scheduler.schedule(&state, Grade::Easy, t0()).unwrap();

        assert!(hard.difficulty > state.difficulty);
        assert!(easy.difficulty < state.difficulty);
        assert!(good.difficulty < state.difficulty && good.difficulty > 5.0);
    }

    #[test]
    fn test_difficulty_is_clamped() {
        let scheduler = Scheduler::new();

        let hardest = scheduler.schedule(&review_state(5.0, 10.0, 5), Grade::Again, t0()).unwrap();
        assert_eq!(hardest.difficulty, 10.0);

        let easiest = scheduler.schedule(&review_state(5.0, 1.0, 5), Grade::Easy, t0()).unwrap();
        assert_eq!(easiest.difficulty, 1.0);
    }

    #[test]
    fn test_successful_review_is_at_least_one_day_out() {
        let scheduler = Scheduler::new();
        let next = scheduler.schedule(&review_state(0.1, 10.0, 0), Grade::Hard, t0()).unwrap();
        assert!(next.due_at >= t0() + Duration::days(1));
    }

    #[test]
    fn test_interval_capped_at_maximum() {
        let config = SchedulerConfig {
            maximum_interval_days: 30,
            ..Default::default()
        };
        let scheduler = Scheduler::with_config(config).unwrap();
        let next = scheduler.schedule(&review_state(500.0, 3.0, 400), Grade::Easy, t0()).unwrap();
        assert_eq!(next.due_at, t0() + Duration::days(30));
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let scheduler = Scheduler::new();
        let state = review_state(7.5, 4.2, 6);

        for grade in Grade::ALL {
            let first = scheduler.schedule(&state, grade, t0()).unwrap();
            let second = scheduler.schedule(&state, grade, t0()).unwrap();
            assert_eq!(first, second, "grade {:?}", grade);
        }
    }

    #[test]
    fn test_rejects_invalid_states() {
        let scheduler = Scheduler::new();

        let mut negative = review_state(10.0, 5.0, 3);
        negative.stability = -1.0;
        let err = scheduler.schedule(&negative, Grade::Good, t0()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::StateInvalid);

        let mut nan = review_state(10.0, 5.0, 3);
        nan.stability = f32::NAN;
        assert!(scheduler.schedule(&nan, Grade::Good, t0()).is_err());

        let mut too_hard = review_state(10.0, 5.0, 3);
        too_hard.difficulty = 11.0;
        assert!(scheduler.schedule(&too_hard, Grade::Good, t0()).is_err());

        let mut due_before_review = review_state(10.0, 5.0, 3);
        due_before_review.due_at = t0() - Duration::days(5);
        assert!(scheduler.schedule(&due_before_review, Grade::Good, t0()).is_err());

        let mut new_with_reps = new_state();
        new_with_reps.repetitions = 2;
        assert!(scheduler.schedule(&new_with_reps, Grade::Good, t0()).is_err());

        let mut review_never_seen = review_state(10.0, 5.0, 3);
        review_never_seen.last_reviewed_at = None;
        assert!(scheduler.schedule(&review_never_seen, Grade::Good, t0()).is_err());
    }

    #[test]
    fn test_schedule_rating_rejects_unknown_grade() {
        let scheduler = Scheduler::new();
        let err = scheduler.schedule_rating(&new_state(), 0, t0()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::GradeInvalid);

        let next = scheduler.schedule_rating(&new_state(), 3, t0()).unwrap();
        assert_eq!(next.phase, Phase::Learning { step: 1 });
    }

    #[test]
    fn test_preview_orders_intervals() {
        let scheduler = Scheduler::new();
        let state = review_state(10.0, 5.0, 10);
        let preview = scheduler.preview(&state, t0()).unwrap();
        let [again, hard, good, easy] = preview.intervals(t0());

        assert!(again < hard);
        assert!(hard <= good);
        assert!(good <= easy);
        assert_eq!(preview.get(Grade::Good), &scheduler.schedule(&state, Grade::Good, t0()).unwrap());
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = SchedulerConfig {
            min_stability: 0.0,
            ..Default::default()
        };
        assert!(Scheduler::with_config(config).is_err());
    }
}

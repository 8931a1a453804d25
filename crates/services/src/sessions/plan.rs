use rand::Rng;
use rand::rng;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::{debug, warn};

use quiz_core::grader;
use quiz_core::model::{
    CategoryName, CategoryQuotas, OPTION_COUNT, QuestionBank, QuestionRecord,
};

/// A drawn question plus the option order fixed at first presentation.
///
/// The order is assigned once per session and never recomputed; re-shuffling
/// on every render would let a user infer the answer by elimination across
/// repeated views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedQuestion {
    record: QuestionRecord,
    option_order: Option<[usize; OPTION_COUNT]>,
}

impl SelectedQuestion {
    #[must_use]
    pub fn new(record: QuestionRecord) -> Self {
        Self {
            record,
            option_order: None,
        }
    }

    #[must_use]
    pub fn record(&self) -> &QuestionRecord {
        &self.record
    }

    /// Presentation order of the options, `None` until first presented.
    #[must_use]
    pub fn option_order(&self) -> Option<[usize; OPTION_COUNT]> {
        self.option_order
    }

    /// Fix the option order. A later call is ignored once an order is set.
    pub(crate) fn assign_option_order(&mut self, order: [usize; OPTION_COUNT]) {
        if self.option_order.is_none() {
            self.option_order = Some(order);
        }
    }
}

/// Selection result for one quiz run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizPlan {
    pub questions: Vec<SelectedQuestion>,
    /// Per-category selected counts, after clamping to supply.
    pub per_category: Vec<(CategoryName, usize)>,
    /// Questions dropped because their answer key does not resolve.
    pub integrity_skipped: usize,
}

impl QuizPlan {
    /// Total number of questions in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Returns true when the quotas matched no questions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Draws a randomized, non-repeating subset of questions per category quota.
pub struct QuizPlanner<'a> {
    quotas: &'a CategoryQuotas,
}

impl<'a> QuizPlanner<'a> {
    #[must_use]
    pub fn new(quotas: &'a CategoryQuotas) -> Self {
        Self { quotas }
    }

    /// Draw a plan using the thread-local source of randomness.
    ///
    /// Per quota entry the available supply is clamped (an under-supplied
    /// category degrades gracefully, a category with no matching records
    /// contributes nothing), `count` records are sampled uniformly without
    /// replacement, and the concatenated result is shuffled as a whole.
    #[must_use]
    pub fn draw(&self, bank: &QuestionBank) -> QuizPlan {
        let mut rng = rng();
        self.draw_with(bank, &mut rng)
    }

    /// Same as [`Self::draw`] with a caller-supplied random source.
    pub fn draw_with<R: Rng + ?Sized>(&self, bank: &QuestionBank, rng: &mut R) -> QuizPlan {
        let mut selected: Vec<QuestionRecord> = Vec::new();
        let mut per_category = Vec::with_capacity(self.quotas.len());
        let mut integrity_skipped = 0_usize;

        for (category, requested) in self.quotas.iter() {
            let mut subset: Vec<&QuestionRecord> = Vec::new();
            for question in bank.by_category(category) {
                if grader::has_resolvable_key(question) {
                    subset.push(question);
                } else {
                    integrity_skipped += 1;
                    warn!(
                        question = question.text(),
                        category = %category,
                        "skipping question with unresolvable answer key"
                    );
                }
            }

            let count = requested.min(subset.len());
            selected.extend(
                subset
                    .choose_multiple(rng, count)
                    .map(|question| (*question).clone()),
            );
            per_category.push((category.clone(), count));
        }

        selected.shuffle(rng);
        debug!(
            total = selected.len(),
            requested = self.quotas.total_requested(),
            skipped = integrity_skipped,
            "drew quiz plan"
        );

        QuizPlan {
            questions: selected.into_iter().map(SelectedQuestion::new).collect(),
            per_category,
            integrity_skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn category(name: &str) -> CategoryName {
        CategoryName::new(name).unwrap()
    }

    fn build_question(category_name: &str, text: &str) -> QuestionRecord {
        QuestionRecord::new(
            text,
            category(category_name),
            ["a".to_string(), "b".to_string(), "c".to_string()],
            [true, false, false],
        )
        .unwrap()
    }

    fn build_unkeyed_question(category_name: &str, text: &str) -> QuestionRecord {
        QuestionRecord::new(
            text,
            category(category_name),
            ["a".to_string(), "b".to_string(), "c".to_string()],
            [false, false, false],
        )
        .unwrap()
    }

    fn build_bank(sizes: &[(&str, usize)]) -> QuestionBank {
        let mut records = Vec::new();
        for &(name, size) in sizes {
            for i in 0..size {
                records.push(build_question(name, &format!("{name} question {i}")));
            }
        }
        QuestionBank::from_records(records)
    }

    fn count_in_category(plan: &QuizPlan, name: &str) -> usize {
        plan.questions
            .iter()
            .filter(|q| q.record().category().as_str() == name)
            .count()
    }

    #[test]
    fn draws_the_exam_quota_from_a_full_bank() {
        let bank = build_bank(&[
            ("1.RND", 12),
            ("2.Marinarie", 9),
            ("3.Conducere si manevra", 8),
            ("4.Prim ajutor", 2),
            ("5.Legislatie", 3),
        ]);
        let quotas = CategoryQuotas::new()
            .with(category("1.RND"), 10)
            .with(category("2.Marinarie"), 7)
            .with(category("3.Conducere si manevra"), 7)
            .with(category("4.Prim ajutor"), 1)
            .with(category("5.Legislatie"), 1);

        let plan = QuizPlanner::new(&quotas).draw(&bank);

        assert_eq!(plan.total(), 26);
        assert_eq!(count_in_category(&plan, "1.RND"), 10);
        assert_eq!(count_in_category(&plan, "2.Marinarie"), 7);
        assert_eq!(count_in_category(&plan, "3.Conducere si manevra"), 7);
        assert_eq!(count_in_category(&plan, "4.Prim ajutor"), 1);
        assert_eq!(count_in_category(&plan, "5.Legislatie"), 1);
    }

    #[test]
    fn plan_has_no_duplicate_question_texts() {
        let bank = build_bank(&[("1.RND", 12), ("2.Marinarie", 9)]);
        let quotas = CategoryQuotas::new()
            .with(category("1.RND"), 10)
            .with(category("2.Marinarie"), 7);

        let plan = QuizPlanner::new(&quotas).draw(&bank);

        let texts: HashSet<&str> = plan.questions.iter().map(|q| q.record().text()).collect();
        assert_eq!(texts.len(), plan.total());
    }

    #[test]
    fn under_supplied_category_is_clamped_not_failed() {
        let bank = build_bank(&[("4.Prim ajutor", 2)]);
        let quotas = CategoryQuotas::new().with(category("4.Prim ajutor"), 5);

        let plan = QuizPlanner::new(&quotas).draw(&bank);

        assert_eq!(plan.total(), 2);
        assert_eq!(plan.per_category, vec![(category("4.Prim ajutor"), 2)]);
        let texts: HashSet<&str> = plan.questions.iter().map(|q| q.record().text()).collect();
        assert!(texts.contains("4.Prim ajutor question 0"));
        assert!(texts.contains("4.Prim ajutor question 1"));
    }

    #[test]
    fn unknown_category_contributes_nothing() {
        let bank = build_bank(&[("1.RND", 3)]);
        let quotas = CategoryQuotas::new()
            .with(category("1.RND"), 2)
            .with(category("6.Meteo"), 4);

        let plan = QuizPlanner::new(&quotas).draw(&bank);

        assert_eq!(plan.total(), 2);
        assert_eq!(plan.per_category[1], (category("6.Meteo"), 0));
    }

    #[test]
    fn quotas_matching_nothing_yield_an_empty_plan() {
        let bank = build_bank(&[("1.RND", 3)]);
        let quotas = CategoryQuotas::new().with(category("6.Meteo"), 4);

        let plan = QuizPlanner::new(&quotas).draw(&bank);

        assert!(plan.is_empty());
    }

    #[test]
    fn unkeyed_questions_are_excluded_from_selection() {
        let mut records = vec![
            build_question("1.RND", "good 1"),
            build_question("1.RND", "good 2"),
        ];
        records.push(build_unkeyed_question("1.RND", "broken"));
        let bank = QuestionBank::from_records(records);
        let quotas = CategoryQuotas::new().with(category("1.RND"), 3);

        let plan = QuizPlanner::new(&quotas).draw(&bank);

        assert_eq!(plan.total(), 2);
        assert_eq!(plan.integrity_skipped, 1);
        assert!(plan.questions.iter().all(|q| q.record().text() != "broken"));
    }

    #[test]
    fn every_drawn_question_belongs_to_a_requested_category() {
        let bank = build_bank(&[("1.RND", 5), ("2.Marinarie", 5), ("5.Legislatie", 5)]);
        let quotas = CategoryQuotas::new()
            .with(category("1.RND"), 2)
            .with(category("5.Legislatie"), 2);

        let plan = QuizPlanner::new(&quotas).draw(&bank);

        assert_eq!(plan.total(), 4);
        assert!(plan.questions.iter().all(|q| {
            let name = q.record().category().as_str();
            name == "1.RND" || name == "5.Legislatie"
        }));
    }
}

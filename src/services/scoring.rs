// src/services/scoring.rs

//! Percentage scoring and result interpretation.

use serde::Serialize;

use crate::{
    config::LIKERT_MAX_POINTS,
    models::{
        assessment::{Assessment, AssessmentType, Question},
        history::Answers,
    },
};

/// Computes the percentage score of `answers` against `questions`.
///
/// * Point-based: `points` count towards the total, and towards the earned
///   points only when the selected index equals `correct_answer`.
/// * Likert with `option_points`: the selected option's points are earned,
///   the largest option value counts towards the total.
/// * Likert without `option_points`: the total grows by `LIKERT_MAX_POINTS`
///   and the selected index itself is earned. Scales longer than
///   `LIKERT_MAX_POINTS + 1` options can therefore score above 100.
///
/// Returns `round(earned / total * 100)`, or 0 when the total is 0.
pub fn calculate_score(questions: &[Question], answers: &Answers) -> u32 {
    let mut total: u64 = 0;
    let mut earned: u64 = 0;

    for question in questions {
        let selected = answers.get(&question.id).copied();

        match question.question_type {
            AssessmentType::PointBased => {
                total += u64::from(question.points);
                if selected.is_some() && selected == question.correct_answer {
                    earned += u64::from(question.points);
                }
            }
            AssessmentType::Likert => match question.option_points.as_deref() {
                Some(points) if !points.is_empty() => {
                    total += u64::from(points.iter().copied().max().unwrap_or(0));
                    earned += selected
                        .and_then(|i| points.get(i))
                        .map(|p| u64::from(*p))
                        .unwrap_or(0);
                }
                _ => {
                    total += u64::from(LIKERT_MAX_POINTS);
                    earned += selected.map(|i| i as u64).unwrap_or(0);
                }
            },
        }
    }

    if total == 0 {
        return 0;
    }

    ((earned as f64 / total as f64) * 100.0).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Average,
    NeedsImprovement,
}

impl ScoreBand {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => ScoreBand::Excellent,
            70..=89 => ScoreBand::Good,
            50..=69 => ScoreBand::Average,
            _ => ScoreBand::NeedsImprovement,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::Good => "Good",
            ScoreBand::Average => "Average",
            ScoreBand::NeedsImprovement => "Needs Improvement",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "green",
            ScoreBand::Good => "blue",
            ScoreBand::Average => "yellow",
            ScoreBand::NeedsImprovement => "red",
        }
    }
}

pub fn recommendation(score: u32) -> &'static str {
    match score {
        0..=49 => "Review the basic concepts and fundamentals",
        50..=69 => "Practice more exercises to strengthen your understanding",
        70..=89 => "Focus on advanced topics and complex scenarios",
        _ => "Consider mentoring others or taking advanced assessments",
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionReview {
    pub question_id: String,
    pub text: String,
    pub selected_option: Option<String>,
    /// Point value, for point-based questions.
    pub points: Option<u32>,
}

/// Everything the result view shows after an attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub assessment_id: String,
    pub assessment_title: String,
    pub score: u32,
    pub band: ScoreBand,
    pub label: &'static str,
    pub color: &'static str,
    pub passed: bool,
    pub interpretation: &'static str,
    pub recommendation: &'static str,
    pub time_spent: u64,
    pub review: Vec<QuestionReview>,
}

/// Builds the result view. The score is recomputed from `answers`.
pub fn summarize(assessment: &Assessment, answers: &Answers, time_spent: u64) -> ResultSummary {
    let score = calculate_score(&assessment.questions, answers);
    let band = ScoreBand::from_score(score);
    let passed = score >= assessment.passing_score;

    let review = assessment
        .questions
        .iter()
        .map(|q| QuestionReview {
            question_id: q.id.clone(),
            text: q.text.clone(),
            selected_option: answers
                .get(&q.id)
                .and_then(|i| q.options.get(*i))
                .cloned(),
            points: (q.question_type == AssessmentType::PointBased).then_some(q.points),
        })
        .collect();

    ResultSummary {
        assessment_id: assessment.id.clone(),
        assessment_title: assessment.title.clone(),
        score,
        band,
        label: band.label(),
        color: band.color(),
        passed,
        interpretation: if passed {
            "Congratulations! You've passed the assessment."
        } else {
            "You need to improve your understanding of the subject matter."
        },
        recommendation: recommendation(score),
        time_spent,
        review,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_question(id: &str, points: u32, correct: usize) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Question {}", id),
            question_type: AssessmentType::PointBased,
            options: vec!["A".into(), "B".into(), "C".into()],
            points,
            time_limit: 0,
            correct_answer: Some(correct),
            option_points: None,
        }
    }

    fn likert_question(id: &str) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Statement {}", id),
            question_type: AssessmentType::Likert,
            options: vec![
                "Strongly Disagree".into(),
                "Disagree".into(),
                "Neutral".into(),
                "Agree".into(),
                "Strongly Agree".into(),
            ],
            points: 1,
            time_limit: 0,
            correct_answer: None,
            option_points: None,
        }
    }

    fn answers(pairs: &[(&str, usize)]) -> Answers {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn half_correct_scores_fifty() {
        let questions = vec![point_question("q1", 1, 0), point_question("q2", 1, 0)];
        let score = calculate_score(&questions, &answers(&[("q1", 0), ("q2", 1)]));
        assert_eq!(score, 50);
    }

    #[test]
    fn all_correct_scores_hundred_and_none_scores_zero() {
        let questions = vec![
            point_question("q1", 3, 2),
            point_question("q2", 1, 0),
            point_question("q3", 5, 1),
        ];
        assert_eq!(
            calculate_score(&questions, &answers(&[("q1", 2), ("q2", 0), ("q3", 1)])),
            100
        );
        assert_eq!(
            calculate_score(&questions, &answers(&[("q1", 0), ("q2", 1), ("q3", 0)])),
            0
        );
    }

    #[test]
    fn points_weight_the_result() {
        let questions = vec![point_question("q1", 3, 0), point_question("q2", 1, 0)];
        // 3 of 4 points
        assert_eq!(calculate_score(&questions, &answers(&[("q1", 0)])), 75);
    }

    #[test]
    fn unanswered_point_question_never_counts() {
        let mut q = point_question("q1", 2, 0);
        q.correct_answer = None;
        assert_eq!(calculate_score(&[q], &Answers::new()), 0);
    }

    #[test]
    fn likert_index_doubles_as_points() {
        let questions = vec![likert_question("l1"), likert_question("l2")];
        // Top of a five-option scale is index 4: 8 of 10.
        assert_eq!(
            calculate_score(&questions, &answers(&[("l1", 4), ("l2", 4)])),
            80
        );
        assert_eq!(calculate_score(&questions, &Answers::new()), 0);
    }

    #[test]
    fn long_likert_scale_is_not_capped() {
        let mut q = likert_question("l1");
        q.options = (1..=7).map(|n| n.to_string()).collect();
        // Index 6 of a seven-point scale: 6 of 5.
        assert_eq!(calculate_score(&[q], &answers(&[("l1", 6)])), 120);
    }

    #[test]
    fn likert_with_option_points_reaches_hundred() {
        let mut q = likert_question("l1");
        q.option_points = Some(vec![1, 2, 3, 4, 5]);
        assert_eq!(calculate_score(&[q.clone()], &answers(&[("l1", 4)])), 100);
        assert_eq!(calculate_score(&[q], &answers(&[("l1", 0)])), 20);
    }

    #[test]
    fn mixed_assessment() {
        let questions = vec![point_question("p", 5, 1), likert_question("l")];
        // (5 + 2) / (5 + 5)
        assert_eq!(calculate_score(&questions, &answers(&[("p", 1), ("l", 2)])), 70);
    }

    #[test]
    fn empty_assessment_scores_zero() {
        assert_eq!(calculate_score(&[], &Answers::new()), 0);
    }

    #[test]
    fn bands_cover_every_score() {
        assert_eq!(ScoreBand::from_score(100), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(90), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(89), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(70), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(69), ScoreBand::Average);
        assert_eq!(ScoreBand::from_score(50), ScoreBand::Average);
        assert_eq!(ScoreBand::from_score(49), ScoreBand::NeedsImprovement);
        assert_eq!(ScoreBand::from_score(0), ScoreBand::NeedsImprovement);
    }

    #[test]
    fn recommendation_thresholds() {
        assert_eq!(recommendation(49), "Review the basic concepts and fundamentals");
        assert_eq!(
            recommendation(50),
            "Practice more exercises to strengthen your understanding"
        );
        assert_eq!(recommendation(89), "Focus on advanced topics and complex scenarios");
        assert_eq!(
            recommendation(90),
            "Consider mentoring others or taking advanced assessments"
        );
    }
}

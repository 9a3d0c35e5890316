pub mod ai_helper;
pub mod demo;
pub mod timer;
pub mod vocabulary;

/// Labels handed out to options in display order.
pub const OPTION_LABELS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quiz {
    pub items: Vec<QuizItem>,
}

impl Quiz {
    pub fn new(items: Vec<QuizItem>) -> Self {
        Self { items }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<QuizOption>,
    pub explanation: String,
    /// Copy of the correct option's text, kept for display.
    pub correct_answer_text: String,
}

impl QuizItem {
    /// Builds an item and fills `correct_answer_text` from the options.
    pub fn new(
        question: String,
        options: Vec<QuizOption>,
        explanation: String,
    ) -> Result<Self, DatasetError> {
        let correct_answer_text = options
            .iter()
            .find(|o| o.is_correct)
            .map(|o| o.text.clone())
            .unwrap_or_default();

        let item = Self {
            question,
            options,
            explanation,
            correct_answer_text,
        };
        item.validate()?;
        Ok(item)
    }

    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.options.is_empty() {
            return Err(DatasetError::EmptyOptions {
                question: self.question.clone(),
            });
        }

        let correct = self.options.iter().filter(|o| o.is_correct).count();
        match correct {
            0 => Err(DatasetError::NoCorrectOption {
                question: self.question.clone(),
            }),
            1 => {
                let option = self.correct_option().map(|o| o.text.as_str());
                if option != Some(self.correct_answer_text.as_str()) {
                    return Err(DatasetError::CorrectAnswerMismatch {
                        question: self.question.clone(),
                        expected: option.unwrap_or_default().to_string(),
                        found: self.correct_answer_text.clone(),
                    });
                }
                Ok(())
            }
            count => Err(DatasetError::MultipleCorrectOptions {
                question: self.question.clone(),
                count,
            }),
        }
    }

    pub fn correct_option(&self) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.is_correct)
    }

    /// Accepts either the option text or its label ("b", "B", "B)").
    pub fn is_correct_answer(&self, answer: &str) -> bool {
        let answer = answer.trim();
        let Some(correct) = self.correct_option() else {
            return false;
        };
        if answer == correct.text {
            return true;
        }
        let label = answer.trim_end_matches(')');
        label.eq_ignore_ascii_case(&correct.label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuizOption {
    pub label: String,
    pub text: String,
    pub is_correct: bool,
}

impl QuizOption {
    pub fn new(label: impl Into<String>, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
            is_correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    #[error("question {question:?} has no options")]
    EmptyOptions { question: String },
    #[error("question {question:?} has no correct option")]
    NoCorrectOption { question: String },
    #[error("question {question:?} has {count} correct options, expected exactly one")]
    MultipleCorrectOptions { question: String, count: usize },
    #[error("question {question:?}: correct answer text is {found:?}, but the correct option reads {expected:?}")]
    CorrectAnswerMismatch {
        question: String,
        expected: String,
        found: String,
    },
}

pub fn validate_dataset(items: &[QuizItem]) -> Result<(), DatasetError> {
    items.iter().try_for_each(QuizItem::validate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> QuizItem {
        QuizItem::new(
            "Check-in?".to_string(),
            vec![
                QuizOption::new("A", "Where is the gate?", false),
                QuizOption::new("B", "Where can I check in?", true),
            ],
            "Check in = зареєструватися".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn new_fills_correct_answer_text() {
        assert_eq!(item().correct_answer_text, "Where can I check in?");
    }

    #[test]
    fn rejects_missing_correct_option() {
        let err = QuizItem::new(
            "Q".to_string(),
            vec![QuizOption::new("A", "one", false)],
            String::new(),
        )
        .unwrap_err();
        assert!(matches!(err, DatasetError::NoCorrectOption { .. }));
    }

    #[test]
    fn rejects_two_correct_options() {
        let err = QuizItem::new(
            "Q".to_string(),
            vec![
                QuizOption::new("A", "one", true),
                QuizOption::new("B", "two", true),
            ],
            String::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DatasetError::MultipleCorrectOptions {
                question: "Q".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn rejects_empty_options() {
        let err = QuizItem::new("Q".to_string(), Vec::new(), String::new()).unwrap_err();
        assert!(matches!(err, DatasetError::EmptyOptions { .. }));
    }

    #[test]
    fn rejects_stale_correct_answer_text() {
        let mut item = item();
        item.correct_answer_text = "Where is the gate?".to_string();
        assert!(matches!(
            validate_dataset(&[item]),
            Err(DatasetError::CorrectAnswerMismatch { .. })
        ));
    }

    #[test]
    fn answer_matches_text_or_label() {
        let item = item();
        assert!(item.is_correct_answer("Where can I check in?"));
        assert!(item.is_correct_answer("b"));
        assert!(item.is_correct_answer("B)"));
        assert!(!item.is_correct_answer("A"));
        assert!(!item.is_correct_answer("Where is the gate?"));
    }
}

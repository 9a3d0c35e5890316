use std::sync::Arc;

use crate::quiz::{self, DatasetError, QuizItem, QuizOption, OPTION_LABELS};

struct DemoEntry {
    question: &'static str,
    options: [(&'static str, bool); 4],
    explanation: &'static str,
    correct_answer: &'static str,
}

// Questions cycled by the auto-playing demo
const DEMO_ENTRIES: [DemoEntry; 4] = [
    DemoEntry {
        question: "Ви в аеропорту й шукаєте свій вихід на посадку. Як запитати?",
        options: [
            ("Where is my gate?", false),
            ("Where is the boarding gate for flight PS101?", true),
            ("Give me the gate.", false),
            ("Gate where is?", false),
        ],
        explanation: "«Boarding gate» — вихід на посадку. Називайте номер рейсу, щоб вам одразу підказали дорогу.",
        correct_answer: "Where is the boarding gate for flight PS101?",
    },
    DemoEntry {
        question: "Ви прийшли до готелю з бронюванням. Що сказати на рецепції?",
        options: [
            ("I want room now.", false),
            ("Room for me, please.", false),
            ("Hello, I have a reservation under the name Shevchenko.", true),
            ("I am reservation.", false),
        ],
        explanation: "«I have a reservation under the name ...» — стандартна фраза, щоб заселитися за бронюванням.",
        correct_answer: "Hello, I have a reservation under the name Shevchenko.",
    },
    DemoEntry {
        question: "Ви в ресторані й хочете попросити рахунок. Як це зробити ввічливо?",
        options: [
            ("Could we have the bill, please?", true),
            ("Money, please.", false),
            ("Give the check.", false),
            ("I pay now.", false),
        ],
        explanation: "У Британії кажуть «the bill», у США — «the check». «Could we have ...» звучить ввічливо.",
        correct_answer: "Could we have the bill, please?",
    },
    DemoEntry {
        question: "Ви загубилися в місті. Як запитати дорогу до вокзалу?",
        options: [
            ("Where train?", false),
            ("Station is where?", false),
            ("I need station.", false),
            ("Excuse me, how do I get to the train station?", true),
        ],
        explanation: "«How do I get to ...?» — універсальне запитання про дорогу. Почніть з «Excuse me», щоб привернути увагу.",
        correct_answer: "Excuse me, how do I get to the train station?",
    },
];

/// Loads the embedded demo questions, failing on any malformed item.
pub fn demo_dataset() -> Result<Arc<[QuizItem]>, DatasetError> {
    let items: Vec<QuizItem> = DEMO_ENTRIES.iter().map(DemoEntry::to_item).collect();
    quiz::validate_dataset(&items)?;
    Ok(items.into())
}

impl DemoEntry {
    fn to_item(&self) -> QuizItem {
        QuizItem {
            question: self.question.to_string(),
            options: self
                .options
                .iter()
                .zip(OPTION_LABELS)
                .map(|((text, is_correct), label)| QuizOption::new(label, *text, *is_correct))
                .collect(),
            explanation: self.explanation.to_string(),
            correct_answer_text: self.correct_answer.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_dataset_is_valid() {
        let dataset = demo_dataset().unwrap();
        assert_eq!(dataset.len(), 4);
        assert!(dataset.iter().all(|item| item.options.len() == 4));
    }

    #[test]
    fn options_are_labelled_in_order() {
        let dataset = demo_dataset().unwrap();
        let labels: Vec<_> = dataset[0].options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["A", "B", "C", "D"]);
    }
}

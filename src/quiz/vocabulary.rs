use rand::seq::SliceRandom;
use rand::Rng;

use crate::quiz::{self, QuizItem, QuizOption, OPTION_LABELS};

/// Maximum number of options offered per vocabulary question.
const OPTIONS_PER_QUESTION: usize = 4;

/// Longest quiz a learner can ask for.
pub const MAX_QUESTIONS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("not a number")]
    NotANumber,
    #[error("amount of questions can't be zero")]
    Zero,
    #[error("at most {MAX_QUESTIONS} questions are allowed")]
    TooMany,
}

/// Parses the learner's requested number of quiz questions.
pub fn parse_amount(text: &str) -> Result<usize, AmountError> {
    let text = text.trim();
    match text.parse::<usize>() {
        Ok(0) => Err(AmountError::Zero),
        Ok(amount) if amount > MAX_QUESTIONS => Err(AmountError::TooMany),
        Ok(amount) => Ok(amount),
        // Too many digits for usize is still "too many"
        Err(_) if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) => {
            Err(AmountError::TooMany)
        }
        Err(_) => Err(AmountError::NotANumber),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashcardAction {
    Reveal,
    Next,
}

#[derive(Debug)]
pub struct Word {
    pub english: &'static str,
    pub transcription: &'static str,
    pub ukrainian: &'static str,
    pub example: &'static str,
}

#[derive(Debug)]
pub struct Category {
    pub title: &'static str,
    pub emoji: &'static str,
    pub words: &'static [Word],
}

pub struct Vocabulary {
    categories: &'static [Category],
}

impl Vocabulary {
    pub fn embedded() -> Self {
        Self::new(CATEGORIES)
    }

    pub fn new(categories: &'static [Category]) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &'static [Category] {
        self.categories
    }

    pub fn category(&self, index: usize) -> Option<&'static Category> {
        self.categories.get(index)
    }

    pub fn find_by_button(&self, text: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.button_label() == text)
    }
}

impl Category {
    pub fn button_label(&self) -> String {
        format!("{} {}", self.emoji, self.title)
    }

    /// Card index after `card`, wrapping around.
    pub fn next_card(&self, card: usize) -> usize {
        if self.words.is_empty() {
            return 0;
        }
        (card + 1) % self.words.len()
    }

    pub fn card(&self, card: usize) -> Option<&'static Word> {
        self.words.get(card)
    }

    /// Flashcard position and reveal flag after `action`. Revealing an
    /// already revealed card keeps it in place.
    pub fn step(&self, card: usize, action: FlashcardAction) -> (usize, bool) {
        match action {
            FlashcardAction::Reveal => (card, true),
            FlashcardAction::Next => (self.next_card(card), false),
        }
    }

    /// Builds a multiple-choice question asking for the translation of the
    /// word at `index`. Distractors come from the same category.
    pub fn generate_item<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Option<QuizItem> {
        let word = self.words.get(index)?;

        let mut answers: Vec<(&str, bool)> = self
            .words
            .iter()
            .filter(|w| w.ukrainian != word.ukrainian)
            .map(|w| w.ukrainian)
            .collect::<Vec<_>>()
            .choose_multiple(rng, OPTIONS_PER_QUESTION - 1)
            .map(|text| (*text, false))
            .collect();
        answers.push((word.ukrainian, true));
        // We shuffle the answers so the correct one isn't always the last one
        answers.shuffle(rng);

        let options = answers
            .into_iter()
            .zip(OPTION_LABELS)
            .map(|((text, is_correct), label)| QuizOption::new(label, text, is_correct))
            .collect();

        QuizItem::new(
            format!(
                "Як перекладається <b>{}</b> [{}]?",
                word.english, word.transcription
            ),
            options,
            format!(
                "{} — {}. Приклад: <i>{}</i>",
                word.english, word.ukrainian, word.example
            ),
        )
        .ok()
    }

    /// Picks `amount` questions (at most [`MAX_QUESTIONS`]), going through the
    /// whole category before any word repeats.
    pub fn generate_quiz<R: Rng + ?Sized>(&self, amount: usize, rng: &mut R) -> quiz::Quiz {
        let amount = amount.min(MAX_QUESTIONS);
        if self.words.is_empty() {
            return quiz::Quiz::default();
        }

        let mut order: Vec<usize> = (0..self.words.len()).collect();
        order.shuffle(rng);

        let items = order
            .iter()
            .cycle()
            .take(amount)
            .filter_map(|&i| self.generate_item(i, rng))
            .collect();
        quiz::Quiz::new(items)
    }
}

impl Word {
    pub fn front(&self) -> String {
        format!("<b>{}</b>\n[{}]", self.english, self.transcription)
    }

    pub fn back(&self) -> String {
        format!(
            "<b>{}</b>\n[{}]\n\n🇺🇦 {}\n\n<i>{}</i>",
            self.english, self.transcription, self.ukrainian, self.example
        )
    }
}

macro_rules! word {
    ($english:expr, $transcription:expr, $ukrainian:expr, $example:expr $(,)?) => {
        Word {
            english: $english,
            transcription: $transcription,
            ukrainian: $ukrainian,
            example: $example,
        }
    };
}

pub static CATEGORIES: &[Category] = &[
    Category {
        title: "Аеропорт",
        emoji: "✈️",
        words: &[
            word!(
                "boarding pass",
                "ˈbɔːdɪŋ pɑːs",
                "посадковий талон",
                "Can I see your boarding pass, please?",
            ),
            word!("gate", "ɡeɪt", "вихід на посадку", "Your flight boards from gate 12."),
            word!(
                "check-in desk",
                "ˈtʃek ɪn desk",
                "стійка реєстрації",
                "The check-in desk opens two hours before departure.",
            ),
            word!("luggage", "ˈlʌɡɪdʒ", "багаж", "How many pieces of luggage do you have?"),
            word!(
                "carry-on bag",
                "ˈkæri ɒn bæɡ",
                "ручна поклажа",
                "You can take one carry-on bag on board.",
            ),
            word!("delay", "dɪˈleɪ", "затримка", "There is a two-hour delay on our flight."),
            word!("departure", "dɪˈpɑːtʃə", "виліт", "Check the departure board for your gate."),
            word!("customs", "ˈkʌstəmz", "митниця", "We went through customs very quickly."),
        ],
    },
    Category {
        title: "Готель",
        emoji: "🏨",
        words: &[
            word!(
                "reservation",
                "ˌrezəˈveɪʃn",
                "бронювання",
                "I have a reservation for three nights.",
            ),
            word!(
                "single room",
                "ˈsɪŋɡl ruːm",
                "одномісний номер",
                "I'd like a single room, please.",
            ),
            word!("key card", "kiː kɑːd", "ключ-картка", "My key card doesn't work."),
            word!("check out", "tʃek aʊt", "виселитися", "What time do we have to check out?"),
            word!("towel", "ˈtaʊəl", "рушник", "Could I have an extra towel?"),
            word!(
                "breakfast included",
                "ˈbrekfəst ɪnˈkluːdɪd",
                "сніданок включено",
                "Is breakfast included in the price?",
            ),
            word!("lift", "lɪft", "ліфт", "The lift is on your left."),
        ],
    },
    Category {
        title: "Ресторан",
        emoji: "🍽",
        words: &[
            word!("menu", "ˈmenjuː", "меню", "Could we see the menu, please?"),
            word!("bill", "bɪl", "рахунок", "Can we have the bill, please?"),
            word!("tip", "tɪp", "чайові", "Is the tip included?"),
            word!("starter", "ˈstɑːtə", "закуска", "I'll have the soup as a starter."),
            word!(
                "main course",
                "meɪn kɔːs",
                "основна страва",
                "For the main course, I'd like the fish.",
            ),
            word!("tap water", "tæp ˈwɔːtə", "вода з-під крана", "A jug of tap water, please."),
            word!("allergic", "əˈlɜːdʒɪk", "алергічний", "I'm allergic to nuts."),
        ],
    },
    Category {
        title: "Транспорт",
        emoji: "🚆",
        words: &[
            word!("ticket office", "ˈtɪkɪt ˈɒfɪs", "каса", "Where is the ticket office?"),
            word!(
                "return ticket",
                "rɪˈtɜːn ˈtɪkɪt",
                "квиток туди й назад",
                "A return ticket to Oxford, please.",
            ),
            word!("platform", "ˈplætfɔːm", "платформа", "The train leaves from platform 4."),
            word!("bus stop", "bʌs stɒp", "зупинка автобуса", "Where is the nearest bus stop?"),
            word!("fare", "feə", "вартість проїзду", "How much is the fare to the city centre?"),
            word!("timetable", "ˈtaɪmteɪbl", "розклад", "Let's check the timetable."),
        ],
    },
    Category {
        title: "Покупки",
        emoji: "🛍",
        words: &[
            word!("receipt", "rɪˈsiːt", "чек", "Can I have a receipt, please?"),
            word!("fitting room", "ˈfɪtɪŋ ruːm", "примірочна", "Where is the fitting room?"),
            word!("discount", "ˈdɪskaʊnt", "знижка", "Is there a discount on this jacket?"),
            word!("cash", "kæʃ", "готівка", "Do you accept cash?"),
            word!("size", "saɪz", "розмір", "Do you have this in a smaller size?"),
        ],
    },
    Category {
        title: "Екстрені ситуації",
        emoji: "🚑",
        words: &[
            word!("pharmacy", "ˈfɑːməsi", "аптека", "Is there a pharmacy nearby?"),
            word!("embassy", "ˈembəsi", "посольство", "I need to contact the Ukrainian embassy."),
            word!("lost", "lɒst", "загублений", "I've lost my passport."),
            word!(
                "police station",
                "pəˈliːs ˈsteɪʃn",
                "поліцейська дільниця",
                "Where is the police station?",
            ),
            word!("insurance", "ɪnˈʃʊərəns", "страховка", "Here is my travel insurance."),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    static TINY: &[Category] = &[Category {
        title: "Tiny",
        emoji: "🔹",
        words: &[
            word!("yes", "jes", "так", "Yes, please."),
            word!("no", "nəʊ", "ні", "No, thank you."),
        ],
    }];

    #[test]
    fn translations_are_unique_within_category() {
        for category in CATEGORIES {
            let unique: HashSet<_> = category.words.iter().map(|w| w.ukrainian).collect();
            assert_eq!(unique.len(), category.words.len(), "{}", category.title);
        }
    }

    #[test]
    fn generated_items_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for category in CATEGORIES {
            for index in 0..category.words.len() {
                let item = category.generate_item(index, &mut rng).unwrap();
                item.validate().unwrap();
                assert_eq!(item.options.len(), OPTIONS_PER_QUESTION);
                assert_eq!(item.correct_answer_text, category.words[index].ukrainian);

                let texts: HashSet<_> = item.options.iter().map(|o| o.text.as_str()).collect();
                assert_eq!(texts.len(), item.options.len());
            }
        }
    }

    #[test]
    fn small_category_offers_fewer_options() {
        let mut rng = StdRng::seed_from_u64(1);
        let item = TINY[0].generate_item(0, &mut rng).unwrap();
        assert_eq!(item.options.len(), 2);
        assert_eq!(item.correct_answer_text, "так");
    }

    #[test]
    fn quiz_covers_category_before_repeating() {
        let mut rng = StdRng::seed_from_u64(42);
        let category = &CATEGORIES[0];
        let quiz = category.generate_quiz(category.words.len(), &mut rng);

        let asked: HashSet<_> = quiz.items.iter().map(|i| i.correct_answer_text.clone()).collect();
        assert_eq!(asked.len(), category.words.len());

        let longer = category.generate_quiz(category.words.len() + 3, &mut rng);
        assert_eq!(longer.items.len(), category.words.len() + 3);
    }

    #[test]
    fn flashcards_wrap_around() {
        let category = &TINY[0];
        assert_eq!(category.next_card(0), 1);
        assert_eq!(category.next_card(1), 0);
    }

    #[test]
    fn flashcard_reveal_then_next() {
        let category = &TINY[0];
        assert_eq!(category.step(0, FlashcardAction::Reveal), (0, true));
        assert_eq!(category.step(0, FlashcardAction::Next), (1, false));
        assert_eq!(category.step(1, FlashcardAction::Next), (0, false));
    }

    #[test]
    fn revealing_twice_keeps_the_card() {
        let category = &TINY[0];
        let (card, revealed) = category.step(1, FlashcardAction::Reveal);
        assert_eq!(category.step(card, FlashcardAction::Reveal), (card, revealed));
        assert_eq!((card, revealed), (1, true));
    }

    #[test]
    fn amount_must_be_a_positive_number() {
        assert_eq!(parse_amount("10"), Ok(10));
        assert_eq!(parse_amount(" 5 "), Ok(5));
        assert_eq!(parse_amount("0"), Err(AmountError::Zero));
        assert_eq!(parse_amount("п'ять"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount(""), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("-3"), Err(AmountError::NotANumber));
    }

    #[test]
    fn amount_is_capped() {
        assert_eq!(parse_amount(&MAX_QUESTIONS.to_string()), Ok(MAX_QUESTIONS));
        assert_eq!(
            parse_amount(&(MAX_QUESTIONS + 1).to_string()),
            Err(AmountError::TooMany)
        );
        assert_eq!(parse_amount("18446744073709551615"), Err(AmountError::TooMany));
        assert_eq!(parse_amount("99999999999999999999999"), Err(AmountError::TooMany));
    }

    #[test]
    fn oversized_quiz_request_is_clamped() {
        let mut rng = StdRng::seed_from_u64(3);
        let quiz = CATEGORIES[1].generate_quiz(usize::MAX, &mut rng);
        assert_eq!(quiz.items.len(), MAX_QUESTIONS);
    }

    #[test]
    fn categories_are_found_by_button() {
        let vocabulary = Vocabulary::embedded();
        let label = vocabulary.categories()[2].button_label();
        assert_eq!(vocabulary.find_by_button(&label), Some(2));
        assert_eq!(vocabulary.find_by_button("Космос"), None);
    }
}

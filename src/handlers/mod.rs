pub mod chat;
pub mod demo;
pub mod vocabulary;

use std::sync::Arc;

use teloxide::{
    dispatching::{dialogue::ErasedStorage, UpdateHandler},
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
};

use crate::quiz::{self, ai_helper::{ChatTurn, Persona}, QuizItem};
use demo::DemoSessions;

pub type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = Result<(), HandlerError>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    MainMenu,
    Demo,
    VocabularyReceiveCategory,
    VocabularyReceiveMode {
        category: usize,
    },
    Flashcards {
        category: usize,
        card: usize,
        revealed: bool,
    },
    VocabularyQuizRecieveAmountOfQuestions {
        category: usize,
    },
    VocabularyQuiz {
        quiz: quiz::Quiz,
        question_number: usize,
        score: usize,
    },
    ChatPracticeReceivePersona,
    ChatPractice {
        persona: Persona,
        history: Vec<ChatTurn>,
    },
}

pub const DEMO_BUTTON: &str = "🎬 Демо-квіз";
pub const VOCABULARY_BUTTON: &str = "📚 Словник";
pub const CHAT_BUTTON: &str = "💬 Розмовна практика";
pub const MENU_BUTTON: &str = "Меню";

pub fn schema() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .enter_dialogue::<Message, ErasedStorage<State>, State>()
        .branch(dptree::filter(|msg: Message| msg.text() == Some("/start")).endpoint(start))
        .branch(dptree::filter(|msg: Message| is_menu_request(&msg)).endpoint(back_to_menu))
        .branch(
            dptree::filter(|msg: Message| msg.text() == Some("/demo"))
                .endpoint(demo::start_demo),
        )
        .branch(dptree::case![State::Start].endpoint(start))
        .branch(dptree::case![State::MainMenu].endpoint(receive_menu_choice))
        .branch(dptree::case![State::Demo].endpoint(demo::receive_during_demo))
        .branch(
            dptree::case![State::VocabularyReceiveCategory]
                .endpoint(vocabulary::receive_category),
        )
        .branch(
            dptree::case![State::VocabularyReceiveMode { category }]
                .endpoint(vocabulary::receive_mode),
        )
        .branch(
            dptree::case![State::Flashcards {
                category,
                card,
                revealed
            }]
            .endpoint(vocabulary::flashcards),
        )
        .branch(
            dptree::case![State::VocabularyQuizRecieveAmountOfQuestions { category }]
                .endpoint(vocabulary::receive_amount_of_questions),
        )
        .branch(
            dptree::case![State::VocabularyQuiz {
                quiz,
                question_number,
                score
            }]
            .endpoint(vocabulary::vocabulary_quiz),
        )
        .branch(dptree::case![State::ChatPracticeReceivePersona].endpoint(chat::receive_persona))
        .branch(
            dptree::case![State::ChatPractice { persona, history }]
                .endpoint(chat::chat_practice),
        )
}

fn is_menu_request(msg: &Message) -> bool {
    matches!(msg.text(), Some("/menu") | Some(MENU_BUTTON))
}

pub fn main_menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(DEMO_BUTTON)],
        vec![KeyboardButton::new(VOCABULARY_BUTTON)],
        vec![KeyboardButton::new(CHAT_BUTTON)],
    ])
}

/// Adds the "back to menu" row under a set of choices.
pub fn with_menu_row(mut rows: Vec<Vec<KeyboardButton>>) -> KeyboardMarkup {
    rows.push(vec![KeyboardButton::new(MENU_BUTTON)]);
    KeyboardMarkup::new(rows)
}

/// Lists the options of `item`, marking the correct one when `reveal` is set.
/// Item text is Telegram HTML.
pub fn format_options(item: &QuizItem, reveal: bool) -> String {
    item.options
        .iter()
        .map(|option| {
            let mark = if reveal && option.is_correct { " ✅" } else { "" };
            format!("{}) {}{}", option.label, option.text, mark)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const GREETING_TEXT: &str = "Привіт! Я допоможу тобі підготуватися до подорожі й заговорити англійською. \
Подивись демо-квіз, погортай словник або потренуйся в розмові з віртуальним співрозмовником!";

async fn start(
    bot: Bot,
    dialogue: QuizDialogue,
    demos: Arc<DemoSessions>,
    msg: Message,
) -> HandlerResult {
    demos.stop(msg.chat.id);
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(main_menu_keyboard())
        .await?;

    dialogue.update(State::MainMenu).await?;
    Ok(())
}

async fn back_to_menu(
    bot: Bot,
    dialogue: QuizDialogue,
    demos: Arc<DemoSessions>,
    msg: Message,
) -> HandlerResult {
    demos.stop(msg.chat.id);
    show_menu(&bot, &dialogue, msg.chat.id).await
}

pub async fn show_menu(bot: &Bot, dialogue: &QuizDialogue, chat_id: ChatId) -> HandlerResult {
    bot.send_message(chat_id, "Що б ти хотів зробити?")
        .reply_markup(main_menu_keyboard())
        .await?;
    dialogue.update(State::MainMenu).await?;
    Ok(())
}

pub async fn receive_menu_choice(
    bot: Bot,
    dialogue: QuizDialogue,
    demos: Arc<DemoSessions>,
    vocabulary: Arc<quiz::vocabulary::Vocabulary>,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(DEMO_BUTTON) => demo::start_demo(bot, dialogue, demos, msg).await,
        Some(VOCABULARY_BUTTON) => {
            vocabulary::ask_category(&bot, &dialogue, &vocabulary, msg.chat.id).await
        }
        Some(CHAT_BUTTON) => chat::ask_persona(&bot, &dialogue, msg.chat.id).await,
        _ => {
            bot.send_message(msg.chat.id, "Будь ласка, виберіть один з варіантів")
                .reply_markup(main_menu_keyboard())
                .await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuizOption;

    #[test]
    fn options_mark_correct_answer_only_when_revealed() {
        let item = QuizItem::new(
            "Q".to_string(),
            vec![
                QuizOption::new("A", "left", false),
                QuizOption::new("B", "right", true),
            ],
            String::new(),
        )
        .unwrap();

        assert_eq!(format_options(&item, false), "A) left\nB) right");
        assert_eq!(format_options(&item, true), "A) left\nB) right ✅");
    }
}

use std::sync::Arc;

use log::warn;
use teloxide::{
    prelude::*,
    types::{ChatAction, KeyboardButton, KeyboardMarkup, ParseMode},
    utils::html,
};

use super::{
    format_options, main_menu_keyboard, with_menu_row, HandlerResult, QuizDialogue, State,
};
use crate::quiz::{
    self,
    ai_helper::TravelTutor,
    vocabulary::{parse_amount, AmountError, FlashcardAction, Vocabulary, MAX_QUESTIONS},
};

const FLASHCARDS_MODE: &str = "🃏 Картки";
const QUIZ_MODE: &str = "📝 Квіз";
const REVEAL_BUTTON: &str = "👀 Переклад";
const NEXT_BUTTON: &str = "➡️ Далі";
const START_QUIZ_BUTTON: &str = "Вйо!";

pub async fn ask_category(
    bot: &Bot,
    dialogue: &QuizDialogue,
    vocabulary: &Vocabulary,
    chat_id: ChatId,
) -> HandlerResult {
    let rows = vocabulary
        .categories()
        .iter()
        .map(|c| vec![KeyboardButton::new(c.button_label())])
        .collect();

    bot.send_message(chat_id, "Обери тему")
        .reply_markup(with_menu_row(rows))
        .await?;
    dialogue.update(State::VocabularyReceiveCategory).await?;
    Ok(())
}

pub async fn receive_category(
    bot: Bot,
    dialogue: QuizDialogue,
    vocabulary: Arc<Vocabulary>,
    msg: Message,
) -> HandlerResult {
    let Some(category) = msg.text().and_then(|text| vocabulary.find_by_button(text)) else {
        bot.send_message(msg.chat.id, "Будь ласка, виберіть одну з тем")
            .await?;
        return Ok(());
    };

    let keyboard = with_menu_row(vec![vec![
        KeyboardButton::new(FLASHCARDS_MODE),
        KeyboardButton::new(QUIZ_MODE),
    ]]);
    bot.send_message(msg.chat.id, "Як будемо вчити слова?")
        .reply_markup(keyboard)
        .await?;

    dialogue
        .update(State::VocabularyReceiveMode { category })
        .await?;
    Ok(())
}

pub async fn receive_mode(
    bot: Bot,
    dialogue: QuizDialogue,
    vocabulary: Arc<Vocabulary>,
    category: usize,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(FLASHCARDS_MODE) => {
            let Some(word) = vocabulary.category(category).and_then(|c| c.card(0)) else {
                return ask_category(&bot, &dialogue, &vocabulary, msg.chat.id).await;
            };
            bot.send_message(msg.chat.id, word.front())
                .parse_mode(ParseMode::Html)
                .reply_markup(flashcard_keyboard())
                .await?;
            dialogue
                .update(State::Flashcards {
                    category,
                    card: 0,
                    revealed: false,
                })
                .await?;
            Ok(())
        }
        Some(QUIZ_MODE) => {
            let keyboard = KeyboardMarkup::new(vec![
                vec![KeyboardButton::new("5")],
                vec![KeyboardButton::new("10")],
                vec![KeyboardButton::new("15")],
            ]);
            bot.send_message(msg.chat.id, "Обери кількість питань")
                .reply_markup(keyboard)
                .await?;
            dialogue
                .update(State::VocabularyQuizRecieveAmountOfQuestions { category })
                .await?;
            Ok(())
        }
        _ => {
            bot.send_message(msg.chat.id, "Будь ласка, виберіть один з варіантів")
                .await?;
            Ok(())
        }
    }
}

fn flashcard_keyboard() -> KeyboardMarkup {
    with_menu_row(vec![vec![
        KeyboardButton::new(REVEAL_BUTTON),
        KeyboardButton::new(NEXT_BUTTON),
    ]])
}

pub async fn flashcards(
    bot: Bot,
    dialogue: QuizDialogue,
    vocabulary: Arc<Vocabulary>,
    (category, card, _revealed): (usize, usize, bool),
    msg: Message,
) -> HandlerResult {
    let Some(category_words) = vocabulary.category(category) else {
        return ask_category(&bot, &dialogue, &vocabulary, msg.chat.id).await;
    };

    let action = match msg.text() {
        Some(REVEAL_BUTTON) => FlashcardAction::Reveal,
        Some(NEXT_BUTTON) => FlashcardAction::Next,
        _ => {
            bot.send_message(msg.chat.id, "Натисни «Переклад» або «Далі»")
                .reply_markup(flashcard_keyboard())
                .await?;
            return Ok(());
        }
    };

    let (card, revealed) = category_words.step(card, action);
    let Some(word) = category_words.card(card) else {
        return ask_category(&bot, &dialogue, &vocabulary, msg.chat.id).await;
    };
    let text = if revealed { word.back() } else { word.front() };
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(flashcard_keyboard())
        .await?;

    dialogue
        .update(State::Flashcards {
            category,
            card,
            revealed,
        })
        .await?;
    Ok(())
}

pub async fn receive_amount_of_questions(
    bot: Bot,
    dialogue: QuizDialogue,
    vocabulary: Arc<Vocabulary>,
    category: usize,
    msg: Message,
) -> HandlerResult {
    let amount = match parse_amount(msg.text().unwrap_or_default()) {
        Ok(amount) => amount,
        Err(err) => {
            let reply = match err {
                AmountError::NotANumber => "Будь ласка, введіть число".to_string(),
                AmountError::Zero => "Кількість питань не може бути 0".to_string(),
                AmountError::TooMany => {
                    format!("Можна не більше {} питань за раз", MAX_QUESTIONS)
                }
            };
            bot.send_message(msg.chat.id, reply).await?;
            return Ok(());
        }
    };

    let Some(category) = vocabulary.category(category) else {
        return ask_category(&bot, &dialogue, &vocabulary, msg.chat.id).await;
    };
    let quiz = category.generate_quiz(amount, &mut rand::thread_rng());

    bot.send_message(msg.chat.id, "Чудово! Почнемо тест!")
        .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(START_QUIZ_BUTTON)]]))
        .await?;

    dialogue
        .update(State::VocabularyQuiz {
            quiz,
            question_number: 0,
            score: 0,
        })
        .await?;
    Ok(())
}

pub async fn vocabulary_quiz(
    tutor: Arc<TravelTutor>,
    bot: Bot,
    dialogue: QuizDialogue,
    (quiz, question_number, score): (quiz::Quiz, usize, usize),
    msg: Message,
) -> HandlerResult {
    let mut current_score = score;
    if question_number != 0 {
        let Some(question) = quiz.items.get(question_number - 1) else {
            let total = quiz.items.len();
            return finish_quiz(&bot, &dialogue, msg.chat.id, current_score, total).await;
        };
        let answer = msg.text().unwrap_or_default();

        if question.is_correct_answer(answer) {
            bot.send_message(msg.chat.id, "Правильно!").await?;
            current_score += 1;
        } else {
            // Only a nicety, failing to show "typing" is not an error
            let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;

            let ai_reply = match tutor.explain_wrong_answer(question, answer).await {
                Ok(reply) => html::escape(&reply),
                Err(err) => {
                    warn!("Tutor failed to explain a wrong answer: {}", err);
                    format!(
                        "Правильна відповідь -- {} Будь уважнішим!",
                        question.correct_answer_text
                    )
                }
            };

            bot.send_message(
                msg.chat.id,
                format!("Неправильно!\n\n{}\n\n{}", ai_reply, question.explanation),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
    }

    if question_number >= quiz.items.len() {
        let total = quiz.items.len();
        return finish_quiz(&bot, &dialogue, msg.chat.id, current_score, total).await;
    }

    let question = &quiz.items[question_number];
    let question_text = format!(
        "Питання №{}: \n{}\n\n{}",
        question_number + 1,
        question.question,
        format_options(question, false)
    );

    let answers = question
        .options
        .iter()
        .map(|o| vec![KeyboardButton::new(o.text.clone())])
        .collect::<Vec<_>>();

    bot.send_message(msg.chat.id, question_text)
        .parse_mode(ParseMode::Html)
        .reply_markup(KeyboardMarkup::new(answers))
        .await?;

    dialogue
        .update(State::VocabularyQuiz {
            quiz,
            question_number: question_number + 1,
            score: current_score,
        })
        .await?;
    Ok(())
}

async fn finish_quiz(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    score: usize,
    total: usize,
) -> HandlerResult {
    let quiz_score = format!(
        "Квіз закінчився! Ти відповів правильно на {} з {} питань\nЩо б ти хотів зробити далі?",
        score, total
    );
    bot.send_message(chat_id, quiz_score)
        .reply_markup(main_menu_keyboard())
        .await?;

    dialogue.update(State::MainMenu).await?;
    Ok(())
}

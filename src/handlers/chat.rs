use std::sync::Arc;

use log::warn;
use teloxide::{
    prelude::*,
    types::{ChatAction, KeyboardButton, KeyboardMarkup},
};

use super::{with_menu_row, HandlerResult, QuizDialogue, State, MENU_BUTTON};
use crate::quiz::ai_helper::{push_turn, ChatTurn, Persona, TravelTutor};

const TUTOR_UNAVAILABLE: &str =
    "Вибач, співрозмовник зараз не відповідає. Спробуй написати ще раз трохи згодом.";

pub async fn ask_persona(bot: &Bot, dialogue: &QuizDialogue, chat_id: ChatId) -> HandlerResult {
    let rows = Persona::ALL
        .iter()
        .map(|p| vec![KeyboardButton::new(p.button_label())])
        .collect();

    bot.send_message(chat_id, "Де будемо тренуватися?")
        .reply_markup(with_menu_row(rows))
        .await?;
    dialogue.update(State::ChatPracticeReceivePersona).await?;
    Ok(())
}

pub async fn receive_persona(
    tutor: Arc<TravelTutor>,
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
) -> HandlerResult {
    let Some(persona) = msg.text().and_then(Persona::from_button) else {
        bot.send_message(msg.chat.id, "Будь ласка, виберіть один з варіантів")
            .await?;
        return Ok(());
    };

    bot.send_message(
        msg.chat.id,
        "Пиши англійською, а я відповідатиму в ролі. Натисни «Меню», щоб завершити.",
    )
    .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(MENU_BUTTON)]]))
    .await?;

    let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;

    let mut history = Vec::new();
    match tutor.open_scene(persona).await {
        Ok(opening) => {
            bot.send_message(msg.chat.id, opening.as_str()).await?;
            push_turn(&mut history, ChatTurn::tutor(opening));
        }
        Err(err) => {
            warn!("Tutor failed to open a {:?} scene: {}", persona, err);
            bot.send_message(msg.chat.id, "Hello! How can I help you?")
                .await?;
        }
    }

    dialogue
        .update(State::ChatPractice { persona, history })
        .await?;
    Ok(())
}

pub async fn chat_practice(
    tutor: Arc<TravelTutor>,
    bot: Bot,
    dialogue: QuizDialogue,
    (persona, history): (Persona, Vec<ChatTurn>),
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Будь ласка, напиши повідомлення текстом")
            .await?;
        return Ok(());
    };

    let mut history = history;
    push_turn(&mut history, ChatTurn::learner(text));

    // We don't really care if this fails, it only shows that the bot is "typing"
    let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;

    match tutor.reply(persona, &history).await {
        Ok(reply) => {
            bot.send_message(msg.chat.id, reply.as_str()).await?;
            push_turn(&mut history, ChatTurn::tutor(reply));
        }
        Err(err) => {
            warn!("Tutor failed to reply in a {:?} scene: {}", persona, err);
            bot.send_message(msg.chat.id, TUTOR_UNAVAILABLE).await?;
        }
    }

    dialogue
        .update(State::ChatPractice { persona, history })
        .await?;
    Ok(())
}

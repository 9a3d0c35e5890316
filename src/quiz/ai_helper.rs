use crate::quiz::QuizItem;
use chatgpt::prelude::*;
use chatgpt::types::{ChatMessage, CompletionResponse, Role};
use log::debug;

/// How many turns of a practice conversation are kept and sent to the model.
pub const MAX_HISTORY: usize = 12;

pub struct TravelTutor {
    chat_gpt: ChatGPT,
}

impl TravelTutor {
    pub fn new(chat_gpt: ChatGPT) -> Self {
        Self { chat_gpt }
    }

    pub async fn explain_wrong_answer(&self, item: &QuizItem, given: &str) -> Result<String> {
        debug!("Explaining wrong answer {:?} to {:?}", given, item.question);

        let prompt = format!("Ти -- привітний викладач англійської для українців, які подорожують.
        Учень відповідав на питання: \"{}\".
        Учень відповів \"{}\", а правильна відповідь -- \"{}\".
        Підказка з підручника: {}
        Поясни українською, в чому помилка і як запам'ятати правильний варіант. Ліміт -- 2-3 речення.",
        item.question, given, item.correct_answer_text, item.explanation);

        let response: CompletionResponse = self.chat_gpt.send_message(&prompt).await?;
        let content = response.message().clone().content;

        debug!("Completion: {:?}", content);

        Ok(content)
    }

    /// Opening line of a role-play, spoken by the persona.
    pub async fn open_scene(&self, persona: Persona) -> Result<String> {
        self.reply(persona, &[]).await
    }

    pub async fn reply(&self, persona: Persona, history: &[ChatTurn]) -> Result<String> {
        debug!(
            "Requesting {:?} reply with {} turns of history",
            persona,
            history.len()
        );

        let messages = build_messages(persona, history);
        let response: CompletionResponse = self.chat_gpt.send_history(&messages).await?;
        let content = response.message().clone().content;

        debug!("Completion: {:?}", content);

        Ok(content)
    }
}

fn build_messages(persona: Persona, history: &[ChatTurn]) -> Vec<ChatMessage> {
    let system = format!(
        "You are {}. You are talking to a Ukrainian traveler who is practising English. \
        Stay in character, use simple everyday English and keep every reply under 60 words. \
        If the traveler makes a grammar mistake, first answer in character, then add one line \
        starting with \"💡\" that gently corrects it in Ukrainian.\n\
        Scene: {} If the conversation has not started yet, greet the traveler first.",
        persona.role(),
        persona.scene()
    );

    std::iter::once(ChatMessage {
        role: Role::System,
        content: system,
    })
    .chain(history.iter().map(|turn| ChatMessage {
        role: if turn.from_learner {
            Role::User
        } else {
            Role::Assistant
        },
        content: turn.text.clone(),
    }))
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatTurn {
    pub from_learner: bool,
    pub text: String,
}

impl ChatTurn {
    pub fn learner(text: impl Into<String>) -> Self {
        Self {
            from_learner: true,
            text: text.into(),
        }
    }

    pub fn tutor(text: impl Into<String>) -> Self {
        Self {
            from_learner: false,
            text: text.into(),
        }
    }
}

/// Appends `turn`, dropping the oldest turns beyond [`MAX_HISTORY`].
pub fn push_turn(history: &mut Vec<ChatTurn>, turn: ChatTurn) {
    history.push(turn);
    if history.len() > MAX_HISTORY {
        let excess = history.len() - MAX_HISTORY;
        history.drain(..excess);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Persona {
    CheckInAgent,
    HotelReceptionist,
    Waiter,
}

impl Persona {
    pub const ALL: [Persona; 3] = [
        Persona::CheckInAgent,
        Persona::HotelReceptionist,
        Persona::Waiter,
    ];

    pub fn button_label(&self) -> &'static str {
        match self {
            Persona::CheckInAgent => "✈️ Реєстрація на рейс",
            Persona::HotelReceptionist => "🏨 Рецепція готелю",
            Persona::Waiter => "🍽 Кафе",
        }
    }

    pub fn from_button(text: &str) -> Option<Persona> {
        Self::ALL.into_iter().find(|p| p.button_label() == text)
    }

    fn role(&self) -> &'static str {
        match self {
            Persona::CheckInAgent => "an airline check-in agent at London Heathrow airport",
            Persona::HotelReceptionist => "a receptionist at a small hotel in Edinburgh",
            Persona::Waiter => "a waiter in a busy café in New York",
        }
    }

    fn scene(&self) -> &'static str {
        match self {
            Persona::CheckInAgent => "The traveler walks up to your check-in desk with a suitcase.",
            Persona::HotelReceptionist => {
                "The traveler arrives at the reception desk in the evening."
            }
            Persona::Waiter => "The traveler sits down at one of your tables.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_capped_to_most_recent_turns() {
        let mut history = Vec::new();
        for i in 0..MAX_HISTORY + 5 {
            push_turn(&mut history, ChatTurn::learner(format!("turn {i}")));
        }
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history[0].text, "turn 5");
        assert_eq!(history[MAX_HISTORY - 1].text, format!("turn {}", MAX_HISTORY + 4));
    }

    #[test]
    fn messages_start_with_persona_prompt() {
        let history = [ChatTurn::learner("Hello"), ChatTurn::tutor("Good evening!")];
        let messages = build_messages(Persona::HotelReceptionist, &history);

        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0].role, Role::System));
        assert!(messages[0].content.contains("Edinburgh"));
        assert!(matches!(messages[1].role, Role::User));
        assert!(matches!(messages[2].role, Role::Assistant));
        assert_eq!(messages[2].content, "Good evening!");
    }

    #[test]
    fn scene_survives_a_capped_history() {
        let mut history = Vec::new();
        for i in 0..MAX_HISTORY * 2 {
            push_turn(&mut history, ChatTurn::learner(format!("turn {i}")));
        }
        for persona in Persona::ALL {
            let messages = build_messages(persona, &history);
            assert_eq!(messages.len(), MAX_HISTORY + 1);
            assert!(messages[0].content.contains(persona.scene()));
            assert!(messages[1..].iter().all(|m| !m.content.contains(persona.scene())));
        }
    }

    #[test]
    fn opening_request_carries_only_the_prompt() {
        let messages = build_messages(Persona::Waiter, &[]);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0].role, Role::System));
        assert!(messages[0].content.contains("sits down at one of your tables"));
    }

    #[test]
    fn persona_round_trips_through_button_label() {
        for persona in Persona::ALL {
            assert_eq!(Persona::from_button(persona.button_label()), Some(persona));
        }
        assert_eq!(Persona::from_button("щось інше"), None);
    }
}

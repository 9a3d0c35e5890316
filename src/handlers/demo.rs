//! Landing demo: an auto-playing quiz rendered into a single Telegram message.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};
use teloxide::{
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup, MessageId, ParseMode},
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{format_options, receive_menu_choice, show_menu, HandlerResult, QuizDialogue, State};
use crate::quiz::timer::{DemoSnapshot, DemoTimer, DemoTiming, Phase};
use crate::quiz::vocabulary::Vocabulary;
use crate::quiz::QuizItem;

pub const STOP_BUTTON: &str = "⏹ Стоп";

/// Aborts the wrapped task when dropped.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct RunningDemo {
    id: u64,
    // Field order matters: the renderer goes before the timer it reads.
    renderer: AbortOnDrop,
    timer: DemoTimer,
}

/// Demo loops currently playing, at most one per chat.
pub struct DemoSessions {
    dataset: Arc<[QuizItem]>,
    timing: DemoTiming,
    next_id: AtomicU64,
    running: Mutex<HashMap<ChatId, RunningDemo>>,
}

impl DemoSessions {
    pub fn new(dataset: Arc<[QuizItem]>, timing: DemoTiming) -> Self {
        Self {
            dataset,
            timing,
            next_id: AtomicU64::new(0),
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Cancels the demo playing in `chat_id`, if any.
    pub fn stop(&self, chat_id: ChatId) -> bool {
        let removed = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&chat_id);
        // Dropped outside the lock.
        let stopped = removed.is_some();
        drop(removed);
        if stopped {
            info!("Demo stopped in chat {}", chat_id);
        }
        stopped
    }

    /// Rewinds the demo already playing in `chat_id`. Returns `false` when
    /// there is none, or when its message can no longer be edited.
    fn rewind(&self, chat_id: ChatId) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        match running.get_mut(&chat_id) {
            Some(demo) if !demo.renderer.0.is_finished() && demo.timer.is_running() => {
                demo.timer.restart();
                true
            }
            _ => false,
        }
    }

    /// Registers `timer` for `chat_id` and spawns its renderer. Once the
    /// renderer returns, the entry is removed and the timer stops with it.
    fn attach<F>(self: &Arc<Self>, chat_id: ChatId, timer: DemoTimer, renderer: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let sessions = Arc::downgrade(self);
        let previous = {
            // Held across the spawn so the renderer cannot finish before the
            // entry it removes exists.
            let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
            let renderer = tokio::spawn(async move {
                renderer.await;
                if let Some(sessions) = sessions.upgrade() {
                    sessions.finish(chat_id, id);
                }
            });
            running.insert(
                chat_id,
                RunningDemo {
                    id,
                    renderer: AbortOnDrop(renderer),
                    timer,
                },
            )
        };
        drop(previous);
    }

    /// Drops the entry for `chat_id` if it is still demo `id`.
    fn finish(&self, chat_id: ChatId, id: u64) -> bool {
        let removed = {
            let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
            match running.get(&chat_id) {
                Some(demo) if demo.id == id => running.remove(&chat_id),
                _ => None,
            }
        };
        let finished = removed.is_some();
        drop(removed);
        if finished {
            info!("Demo renderer exited in chat {}, timer released", chat_id);
        }
        finished
    }

    async fn play(self: &Arc<Self>, bot: Bot, chat_id: ChatId) -> HandlerResult {
        if self.rewind(chat_id) {
            info!("Demo rewound in chat {}", chat_id);
            return Ok(());
        }
        // A chat never has two loops at once.
        self.stop(chat_id);

        let total = self.dataset.len();
        let timer = DemoTimer::start(Arc::clone(&self.dataset), self.timing);
        let rx = timer.subscribe();
        let text = render_snapshot(&timer.snapshot(), total);

        let message = bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .await?;

        let renderer = render_loop(bot, chat_id, message.id, rx, total);
        self.attach(chat_id, timer, renderer);
        info!(
            "Demo started in chat {} ({} questions, {:?} each)",
            chat_id,
            total,
            self.timing.cycle()
        );
        Ok(())
    }
}

/// Edits the demo message whenever the shown item or phase changes.
async fn render_loop(
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
    mut rx: watch::Receiver<DemoSnapshot>,
    total: usize,
) {
    let mut shown = {
        let snapshot = rx.borrow_and_update();
        (snapshot.index, snapshot.phase)
    };

    while rx.changed().await.is_ok() {
        let (key, text) = {
            let snapshot = rx.borrow_and_update();
            ((snapshot.index, snapshot.phase), render_snapshot(&snapshot, total))
        };
        if key == shown {
            continue;
        }
        shown = key;

        if let Err(err) = bot
            .edit_message_text(chat_id, message_id, text)
            .parse_mode(ParseMode::Html)
            .await
        {
            warn!("Failed to update demo message in chat {}: {}", chat_id, err);
            break;
        }
    }
}

pub fn render_snapshot(snapshot: &DemoSnapshot, total: usize) -> String {
    let Some(item) = &snapshot.item else {
        return "Демо-квіз тимчасово недоступний.".to_string();
    };

    let mut text = format!(
        "🎬 <b>Демо-квіз</b> · питання {} з {}\n\n{}\n\n{}",
        snapshot.index + 1,
        total,
        item.question,
        format_options(item, snapshot.reveal_answer)
    );

    if snapshot.reveal_answer {
        text.push_str(&format!(
            "\n\nПравильна відповідь: <b>{}</b>\n{}",
            item.correct_answer_text, item.explanation
        ));
    } else {
        text.push_str("\n\n⏳ Подумай кілька секунд...");
    }
    if snapshot.phase == Phase::Transitioning {
        text.push_str("\n\n➡️ Наступне питання...");
    }
    text
}

pub async fn start_demo(
    bot: Bot,
    dialogue: QuizDialogue,
    demos: Arc<DemoSessions>,
    msg: Message,
) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Ось як виглядає квіз. Питання змінюються самі, просто спостерігай!",
    )
    .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(STOP_BUTTON)]]))
    .await?;

    demos.play(bot, msg.chat.id).await?;
    dialogue.update(State::Demo).await?;
    Ok(())
}

/// Any input while the demo plays ends it. Menu choices are handled right away.
pub async fn receive_during_demo(
    bot: Bot,
    dialogue: QuizDialogue,
    demos: Arc<DemoSessions>,
    vocabulary: Arc<Vocabulary>,
    msg: Message,
) -> HandlerResult {
    demos.stop(msg.chat.id);

    match msg.text() {
        Some(super::DEMO_BUTTON) | Some(super::VOCABULARY_BUTTON) | Some(super::CHAT_BUTTON) => {
            receive_menu_choice(bot, dialogue, demos, vocabulary, msg).await
        }
        _ => show_menu(&bot, &dialogue, msg.chat.id).await,
    }
}

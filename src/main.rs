mod config;
mod handlers;
mod quiz;

use std::sync::Arc;

use chatgpt::{client::ChatGPT, config::ChatGPTEngine};
use dotenv::dotenv;
use log::{info, warn};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
};

use config::BotConfig;
use handlers::{demo::DemoSessions, State};
use quiz::{ai_helper::TravelTutor, demo::demo_dataset, vocabulary::Vocabulary};

type UserInfoStorage = Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() {
    // A missing .env is fine, the variables may come from the environment
    let dotenv_result = dotenv();

    pretty_env_logger::init();
    if let Err(err) = dotenv_result {
        warn!("No .env file loaded: {}", err);
    }
    info!("Starting travel English bot...");

    let config = BotConfig::from_env().expect("Invalid configuration");

    let bot = Bot::from_env();

    info!("Opening dialogue storage at {}", config.db_path);
    let storage: UserInfoStorage = SqliteStorage::open(&config.db_path, Json)
        .await
        .expect("Failed to open dialogue storage")
        .erase();

    let dataset = demo_dataset().expect("Embedded demo quiz is malformed");
    info!("Demo quiz loaded: {} questions", dataset.len());
    let demos = Arc::new(DemoSessions::new(dataset, config.demo_timing));

    let vocabulary = Arc::new(Vocabulary::embedded());
    info!(
        "Vocabulary loaded: {} categories",
        vocabulary.categories().len()
    );

    let gpt = {
        let mut gpt =
            ChatGPT::new(&config.chatgpt_api_key).expect("Unable to connect with ChatGPT");

        gpt.config.engine = ChatGPTEngine::Gpt35Turbo;
        gpt.config.timeout = std::time::Duration::from_secs(15);

        gpt
    };
    let tutor = Arc::new(TravelTutor::new(gpt));

    Dispatcher::builder(bot, handlers::schema())
        .dependencies(dptree::deps![storage, demos, vocabulary, tutor])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

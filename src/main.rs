//! MUSAID - personal assistant Telegram bot

mod config;
mod consts;
mod ideas;
mod lectures;
mod logic;
mod network;
mod news;
mod notify;
mod planner;
mod store;
mod translate;
mod utils;

use crate::config::{Config, FeedMode};
use crate::ideas::Ideas;
use crate::lectures::Timetable;
use crate::logic::{build_help_message, format_ideas, format_lectures, format_news, format_tasks};
use crate::network::{build_client, DirectFeedGateway, FeedGateway, Rss2JsonGateway};
use crate::news::NewsAggregator;
use crate::notify::{Notification, NotificationScheduler, NotificationSink, NotifyError, Presentation};
use crate::planner::Planner;
use crate::store::{Store, StoreError};
use crate::translate::GoogleTranslator;
use crate::utils::{escape_html, split_message};
use async_trait::async_trait;
use chrono::{Local, Utc};
use std::env;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use thiserror::Error;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
enum Command {
    #[command(description = "Show help message")]
    Start,
    #[command(description = "Show help message")]
    Help,

    #[command(description = "📰 Translated tech news")]
    News,

    #[command(description = "Add a task")]
    Task(String),
    #[command(description = "Add an urgent task")]
    Urgent(String),
    #[command(description = "List tasks")]
    Tasks,
    #[command(description = "Delete a task by id")]
    Done(String),

    #[command(description = "🚭 Log a cigarette")]
    Smoke,

    #[command(description = "🎓 Lecture timetable")]
    Lectures,
    #[command(description = "Remind me of lecture N")]
    Remind(String),

    #[command(description = "💡 Save an idea")]
    Idea(String),
    #[command(description = "List ideas")]
    Ideas,
    #[command(description = "Delete an idea by id")]
    Forget(String),
}

#[derive(Error, Debug)]
enum StartupError {
    #[error("HTTP client: {0}")] Http(#[from] reqwest::Error),
    #[error("Store: {0}")] Store(#[from] StoreError),
}

struct App {
    owner: Option<i64>,
    news: Arc<NewsAggregator>,
    planner: Planner,
    timetable: Timetable,
    notifier: Arc<NotificationScheduler>,
    ideas: Ideas,
}

impl App {
    async fn build(config: &Config, bot: Bot) -> Result<Self, StartupError> {
        let client = build_client(config.request_timeout)?;
        let feeds: Arc<dyn FeedGateway> = match config.feed_mode {
            FeedMode::Rss2Json => Arc::new(Rss2JsonGateway::new(client.clone(), &config.rss2json_url)),
            FeedMode::Direct => Arc::new(DirectFeedGateway::new(client.clone())),
        };
        let translator = Arc::new(GoogleTranslator::new(client, &config.translate_url));
        let news = NewsAggregator::new(feeds, translator, config.request_timeout);

        let store = Arc::new(Store::open(&config.data_path).await?);
        log::info!("Feeds via {:?}, state in {}", config.feed_mode, store.path().display());
        let notifier = NotificationScheduler::new(Arc::new(TelegramSink { bot }));

        Ok(Self {
            owner: config.owner,
            news,
            planner: Planner::new(Arc::clone(&store), Arc::clone(&notifier)),
            timetable: Timetable::new(Arc::clone(&notifier)),
            notifier,
            ideas: Ideas::new(store),
        })
    }
}

/// Delivers scheduled notifications as chat messages.
struct TelegramSink {
    bot: Bot,
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn deliver(&self, notification: &Notification, presentation: Presentation) -> Result<(), NotifyError> {
        let text = format!(
            "<b>{}</b>\n{}",
            escape_html(&notification.title),
            escape_html(&notification.body)
        );
        self.bot
            .send_message(ChatId(notification.recipient), text)
            .parse_mode(ParseMode::Html)
            .disable_notification(!presentation.play_sound)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let mut logger = pretty_env_logger::formatted_builder();
    logger.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    log::info!("═══════════════════════════════════════════");
    log::info!("  MUSAID ONLINE. PERSONAL ASSISTANT READY");
    log::info!("═══════════════════════════════════════════");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = notify::init(Presentation::default()) {
        log::warn!("{}", e);
    }

    let bot = Bot::new(&config.token);
    let app = match App::build(&config, bot.clone()).await {
        Ok(app) => Arc::new(app),
        Err(e) => {
            log::error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    Command::repl(bot, move |bot: Bot, msg: Message, cmd: Command| {
        let app = Arc::clone(&app);
        async move {
            handle_command(bot, msg, cmd, app).await
        }
    }).await;
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    app: Arc<App>,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    if let Some(owner) = app.owner {
        if chat_id.0 != owner {
            log::warn!("Ignoring {:?} from chat {}", cmd, chat_id.0);
            return Ok(());
        }
    }

    let reply = match cmd {
        Command::Start | Command::Help => build_help_message().to_string(),

        Command::News => {
            let loading_msg = bot
                .send_message(chat_id, "⏳ جاري تحديث الأخبار وترجمتها...")
                .await?;
            let state = app.news.refresh().await;
            let _ = bot.delete_message(chat_id, loading_msg.id).await;
            format_news(&state)
        }

        Command::Task(text) => reply_to(app.planner.add_task(&text, false, Utc::now()).await, |t| {
            format!("✅ أضيفت المهمة ({})", t.urgency)
        }),
        Command::Urgent(text) => reply_to(app.planner.add_task(&text, true, Utc::now()).await, |t| {
            format!("🔴 أضيفت المهمة ({})", t.urgency)
        }),
        Command::Tasks => {
            let tasks = app.planner.tasks().await;
            let smoke = app.planner.last_smoke().await;
            match (tasks, smoke) {
                (Ok(tasks), Ok(smoke)) => format_tasks(&tasks, smoke),
                (Err(e), _) | (_, Err(e)) => format!("❌ {}", escape_html(&e.to_string())),
            }
        }
        Command::Done(id) => reply_to(app.planner.remove_task(&id).await, |t| {
            format!("🗑 حذفت: {}", escape_html(&t.text))
        }),

        Command::Smoke => reply_to(app.planner.record_smoke(chat_id.0, Utc::now()).await, |_| {
            "✅ تم التسجيل، سأقوم بتنبيهك بعد ساعة من الآن.".to_string()
        }),

        Command::Lectures => format_lectures(lectures::lectures(), app.notifier.pending_count(chat_id.0)),
        Command::Remind(number) => match number.trim().parse::<usize>() {
            Ok(n) => reply_to(app.timetable.schedule_reminder(chat_id.0, n, Local::now().naive_local()), |(lecture, delay)| {
                let minutes = delay.as_secs() / 60;
                format!(
                    "🔔 سيصلك تنبيه لمحاضرة {} بعد {} ساعة و{} دقيقة",
                    escape_html(lecture.subject),
                    minutes / 60,
                    minutes % 60
                )
            }),
            Err(_) => "❌ اكتب رقم المحاضرة، مثال: /remind 1".to_string(),
        },

        Command::Idea(text) => reply_to(app.ideas.add(&text, Utc::now()).await, |_| {
            "💡 حفظت الفكرة".to_string()
        }),
        Command::Ideas => reply_to(app.ideas.list().await, |ideas| format_ideas(&ideas)),
        Command::Forget(id) => reply_to(app.ideas.delete(&id).await, |idea| {
            format!("🗑 حذفت: {}", escape_html(&idea.text))
        }),
    };

    send_html(&bot, chat_id, &reply).await
}

fn reply_to<T, E: std::fmt::Display>(result: Result<T, E>, ok: impl FnOnce(T) -> String) -> String {
    match result {
        Ok(value) => ok(value),
        Err(e) => format!("❌ {}", escape_html(&e.to_string())),
    }
}

async fn send_html(bot: &Bot, chat_id: ChatId, text: &str) -> ResponseResult<()> {
    for chunk in split_message(text, consts::limits::MAX_MESSAGE_LEN) {
        bot.send_message(chat_id, chunk)
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(true)
            .await?;
    }
    Ok(())
}

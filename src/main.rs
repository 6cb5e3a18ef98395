mod config;
mod interaction;
mod keyboard;
mod quiz;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use config::Config;
use dotenv::dotenv;
use interaction::Reply;
use keyboard::Action;
use log::{info, warn};
use quiz::{anatomy::Catalog, images, session::QuizSession, store::StatsStore, Question};
use teloxide::{
    dispatching::{
        dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
        HandlerExt,
    },
    prelude::*,
    types::{InputFile, ParseMode},
    utils::{command::BotCommands, html},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type DialogueStorage = Arc<ErasedStorage<State>>;
type SharedStats = Arc<Mutex<StatsStore>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    Quiz {
        session: QuizSession,
    },
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Commandes disponibles :")]
enum Command {
    #[command(description = "commencer une nouvelle session")]
    Start,
    #[command(description = "poser une nouvelle question")]
    New,
    #[command(description = "passer la question en cours")]
    Skip,
    #[command(description = "question suivante")]
    Next,
    #[command(description = "choisir les groupes d'os")]
    Groups,
    #[command(description = "lister les structures du groupe en cours")]
    Structures,
    #[command(description = "afficher les statistiques")]
    Stats,
    #[command(description = "remettre la session à zéro")]
    Reset,
    #[command(description = "afficher cette aide")]
    Help,
}

#[tokio::main]
async fn main() {
    // .env is optional, the variables may come from the environment itself
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting osteology quiz bot...");

    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> HandlerResult {
    let config = Config::from_env();

    let catalog = match &config.dataset {
        Some(path) => {
            info!("Loading dataset from {}", path.display());
            Catalog::open(path)?
        }
        None => Catalog::builtin()?,
    };
    info!(
        "Dataset loaded: {} bone groups, {} structures",
        catalog.groups().len(),
        catalog.structure_count()
    );

    if !config.image_dir.is_dir() {
        warn!(
            "Image directory {} does not exist, questions will be sent without pictures",
            config.image_dir.display()
        );
    }

    let store = StatsStore::open(&config.stats_path);
    info!("Lifetime stats kept in {}", store.path().display());
    let stats: SharedStats = Arc::new(Mutex::new(store));

    info!("Opening dialogue storage {}", config.dialogue_db);
    let storage: DialogueStorage = SqliteStorage::open(&config.dialogue_db, Json)
        .await?
        .erase();

    let bot = Bot::from_env();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::entry().filter_command::<Command>().endpoint(command))
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::Quiz { session }].endpoint(quiz_message)),
    )
    .dependencies(dptree::deps![
        storage,
        Arc::new(catalog),
        stats,
        Arc::new(config)
    ])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

const GREETING_TEXT: &str = "🐎 Bienvenue dans le quiz d'ostéologie équine !\n\n\
1. Sélectionnez les groupes d'os à étudier\n\
2. Demandez une nouvelle question\n\
3. Identifiez la structure correspondant au numéro demandé\n\
4. Tapez votre réponse\n\n\
Astuce : les accents ne sont pas obligatoires et les réponses partielles sont acceptées \
si elles contiennent les mots-clés principaux.";
const TEXT_ONLY: &str = "Veuillez répondre avec un message texte.";

fn lock(stats: &SharedStats) -> MutexGuard<'_, StatsStore> {
    stats.lock().unwrap_or_else(PoisonError::into_inner)
}

fn begin_session(catalog: &Catalog, stats: &SharedStats) -> QuizSession {
    let mut store = lock(stats);
    store.begin_session();
    info!(
        "Session #{} started",
        store.stats().sessions_played
    );
    QuizSession::new(catalog)
}

async fn start(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    catalog: Arc<Catalog>,
    stats: SharedStats,
) -> HandlerResult {
    let session = begin_session(&catalog, &stats);
    let keyboard = keyboard::quiz_keyboard(session.phase());

    dialogue.update(State::Quiz { session }).await?;
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

async fn command(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    cmd: Command,
    catalog: Arc<Catalog>,
    stats: SharedStats,
    config: Arc<Config>,
) -> HandlerResult {
    let action = match cmd {
        Command::Start => return start(bot, dialogue, msg, catalog, stats).await,
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
            return Ok(());
        }
        Command::New => Action::NewQuestion,
        Command::Skip => Action::Skip,
        Command::Next => Action::Next,
        Command::Groups => Action::Groups,
        Command::Structures => Action::Structures,
        Command::Stats => Action::Stats,
        Command::Reset => Action::Reset,
    };

    let session = match dialogue.get().await? {
        Some(State::Quiz { session }) => session,
        _ => begin_session(&catalog, &stats),
    };
    respond(&bot, &dialogue, msg.chat.id, session, action, &catalog, &stats, &config).await
}

async fn quiz_message(
    bot: Bot,
    dialogue: QuizDialogue,
    session: QuizSession,
    msg: Message,
    catalog: Arc<Catalog>,
    stats: SharedStats,
    config: Arc<Config>,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, TEXT_ONLY).await?;
        return Ok(());
    };

    let action = keyboard::parse_action(text);
    respond(&bot, &dialogue, msg.chat.id, session, action, &catalog, &stats, &config).await
}

#[allow(clippy::too_many_arguments)]
async fn respond(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    mut session: QuizSession,
    action: Action,
    catalog: &Catalog,
    stats: &SharedStats,
    config: &Config,
) -> HandlerResult {
    let reply = {
        let mut rng = rand::thread_rng();
        let mut store = lock(stats);
        interaction::step(&mut session, action, catalog, &mut store, &mut rng)
    };

    // state is stored before any reply is sent
    dialogue
        .update(State::Quiz {
            session: session.clone(),
        })
        .await?;

    match reply {
        Reply::Question(question) => {
            send_question(bot, chat_id, &question, &session, catalog, config).await?
        }
        Reply::Outcome(outcome) => {
            bot.send_message(chat_id, interaction::outcome_text(&outcome))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard::quiz_keyboard(session.phase()))
                .await?;
        }
        Reply::Notice(text) => {
            bot.send_message(chat_id, text)
                .reply_markup(keyboard::quiz_keyboard(session.phase()))
                .await?;
        }
        Reply::Groups(text) => {
            bot.send_message(chat_id, text)
                .reply_markup(keyboard::groups_keyboard(catalog, &session))
                .await?;
        }
    }
    Ok(())
}

async fn send_question(
    bot: &Bot,
    chat_id: ChatId,
    question: &Question,
    session: &QuizSession,
    catalog: &Catalog,
    config: &Config,
) -> HandlerResult {
    if let Some(group) = catalog.get(&question.bone_group) {
        bot.send_message(
            chat_id,
            format!(
                "📋 <b>{}</b>\nVues disponibles : {}",
                html::escape(&group.title),
                html::escape(&group.views.join(", "))
            ),
        )
        .parse_mode(ParseMode::Html)
        .await?;
        send_images(bot, chat_id, group, config).await?;
    }

    bot.send_message(chat_id, format!("❓ <b>{}</b>", question.prompt()))
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard::quiz_keyboard(session.phase()))
        .await?;
    Ok(())
}

async fn send_images(
    bot: &Bot,
    chat_id: ChatId,
    group: &quiz::anatomy::BoneGroup,
    config: &Config,
) -> HandlerResult {
    let views = match images::locate(&config.image_dir, group) {
        Ok(views) => views,
        Err(e) => {
            warn!("{}", e);
            bot.send_message(
                chat_id,
                format!(
                    "📁 Dossier d'images '{}' introuvable. Veuillez créer le dossier et y ajouter les images anatomiques.",
                    config.image_dir.display()
                ),
            )
            .await?;
            return Ok(());
        }
    };

    if views.is_empty() {
        bot.send_message(chat_id, format!("Aucune image configurée pour {}", group.name))
            .await?;
    }

    for view in views {
        if !view.present {
            warn!("Missing image {}", view.path.display());
            bot.send_message(chat_id, format!("⚠️ Image manquante : {}", view.file))
                .await?;
            continue;
        }

        // One unreadable picture must not hide the others or the question
        if let Err(e) = bot
            .send_photo(chat_id, InputFile::file(view.path.clone()))
            .caption(view.caption(group))
            .await
        {
            warn!("Failed to send image {}: {}", view.path.display(), e);
            bot.send_message(chat_id, format!("⚠️ Image illisible : {}", view.file))
                .await?;
        }
    }
    Ok(())
}

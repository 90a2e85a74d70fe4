use std::sync::Arc;
use std::time::Duration;

use teloxide::Bot;
use tokio::sync::watch;
use tracing::info;

use triage_classifier::Classifier;
use triage_core::TriageConfig;
use triage_engine::{EngineCtx, Escalator, Janitor, TicketEngine};
use triage_store::{BotSettings, SettingsCache, Store};
use triage_telegram::{IngressContext, TelegramIngress};
use triage_workers::{BridgeConnector, Connect, WorkerPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "triage=info,triage_gateway=info".into()),
        )
        .init();

    // Config load is fatal: a mistyped numeric value must not start a
    // half-configured bot.
    let config_path = std::env::var("TRIAGE_CONFIG").ok();
    let config = TriageConfig::load(config_path.as_deref())?;

    let store = Store::open(&config.database.path)?;
    let bot = Bot::new(&config.bot.token);

    // bot_settings is editable at runtime; config values back it up.
    let settings = Arc::new(SettingsCache::new(
        store.clone(),
        Duration::from_secs(config.engine.settings_refresh_secs),
        BotSettings {
            bot_username: config.bot.username.clone(),
            support_username: config.support.admin_username.clone(),
        },
    ));

    let connector: Arc<dyn Connect> = Arc::new(BridgeConnector::new(&config.workers.bridge_url));
    let classifier = Classifier::new(&config.classifier);
    let escalator = Escalator::new(
        store.clone(),
        bot.clone(),
        WorkerPool::new(&config.workers, store.clone(), Arc::clone(&connector)),
        Arc::clone(&settings),
        config.clone(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let engine = TicketEngine::new(Arc::new(EngineCtx {
        store: store.clone(),
        bot: bot.clone(),
        classifier,
        escalator,
        settings: Arc::clone(&settings),
        config: config.clone(),
    }));
    let engine_task = tokio::spawn(engine.run(shutdown_rx.clone()));

    let janitor = Janitor::new(
        store.clone(),
        WorkerPool::new(&config.workers, store.clone(), connector),
        config.engine.group_idle_days,
    );
    let janitor_task = tokio::spawn(janitor.run(shutdown_rx));

    let ingress = TelegramIngress::new(
        bot,
        Arc::new(IngressContext {
            store,
            settings,
            config,
        }),
    );
    let ingress_task = tokio::spawn(ingress.run());

    info!("triage gateway running");
    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    // The loops stop at their next yield; in-flight handlers get a grace
    // window, the long-polling dispatcher is simply aborted.
    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = engine_task.await;
        let _ = janitor_task.await;
    })
    .await;
    ingress_task.abort();

    Ok(())
}

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use engagement_checkout::adapters::auth::OidcSessionValidator;
use engagement_checkout::adapters::fulfillment::{FulfillmentWorkerClient, QueuedFulfillmentDispatcher};
use engagement_checkout::adapters::http::{app_router, CheckoutAppState, RouterSettings};
use engagement_checkout::adapters::memory::{
    InMemoryCustomerMappingRepository, InMemoryOrderRepository, InMemorySubscriptionRepository,
};
use engagement_checkout::adapters::postgres::{
    PostgresCustomerMappingRepository, PostgresOrderRepository, PostgresSubscriptionRepository,
};
use engagement_checkout::adapters::stripe::StripePaymentGateway;
use engagement_checkout::application::handlers::checkout::{
    CreatePaymentIntentHandler, CustomerResolver, GetOrderHandler,
};
use engagement_checkout::application::handlers::fulfillment::{
    ReportFulfillmentHandler, TriggerFulfillmentHandler,
};
use engagement_checkout::application::handlers::webhook::{
    HandleGatewayWebhookHandler, OrderReconciler, SubscriptionReconciler,
};
use engagement_checkout::config::{init_tracing, AppConfig, DatabaseConfig};
use engagement_checkout::ports::{
    CustomerMappingRepository, OrderRepository, PaymentGateway, SessionValidator,
    SubscriptionRepository,
};

struct Stores {
    orders: Arc<dyn OrderRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    mappings: Arc<dyn CustomerMappingRepository>,
}

async fn open_stores(database: &DatabaseConfig) -> Result<Stores, Box<dyn std::error::Error>> {
    let Some(url) = database.url() else {
        warn!("No database configured; using in-memory stores");
        return Ok(Stores {
            orders: Arc::new(InMemoryOrderRepository::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            mappings: Arc::new(InMemoryCustomerMappingRepository::new()),
        });
    };

    let pool = database.pool_options().connect(url).await?;
    info!(max_connections = database.max_connections, "Database pool ready");

    if database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Migrations applied");
    }

    Ok(Stores {
        orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        mappings: Arc::new(PostgresCustomerMappingRepository::new(pool)),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    info!(
        environment = ?config.server.environment,
        stripe_test_mode = config.payment.is_test_mode(),
        "Starting engagement-checkout"
    );

    let stores = open_stores(&config.database).await?;

    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(StripePaymentGateway::new(config.payment.stripe_config())?);
    let validator: Arc<dyn SessionValidator> =
        Arc::new(OidcSessionValidator::new(config.auth.oidc_config())?);

    // Fulfillment queue and its worker task
    let (dispatcher, queue) = QueuedFulfillmentDispatcher::channel(config.fulfillment.queue_capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = FulfillmentWorkerClient::new(config.fulfillment.worker_config())?;
    let worker_task = tokio::spawn(worker.run(queue, shutdown_rx));

    let resolver = Arc::new(CustomerResolver::new(gateway.clone(), stores.mappings.clone()));
    let trigger = Arc::new(TriggerFulfillmentHandler::new(
        stores.orders.clone(),
        Arc::new(dispatcher),
    ));

    let create_intent = CreatePaymentIntentHandler::new(
        config.pricing.catalog()?,
        resolver.clone(),
        gateway,
        stores.orders.clone(),
    )
    .with_bounds(config.pricing.bounds())
    .with_currency(&config.payment.currency);

    let webhook = HandleGatewayWebhookHandler::new(
        config.payment.webhook_verifier(),
        OrderReconciler::new(stores.orders.clone(), trigger),
        SubscriptionReconciler::new(stores.subscriptions.clone(), resolver),
    )
    .with_require_livemode(config.payment.require_livemode);

    let report_token = config.fulfillment.report_token();
    if report_token.is_none() {
        warn!("No fulfillment report token configured; worker reports will be refused");
    }

    let state = CheckoutAppState {
        create_intent: Arc::new(create_intent),
        get_order: Arc::new(GetOrderHandler::new(stores.orders.clone())),
        webhook: Arc::new(webhook),
        report_fulfillment: Arc::new(ReportFulfillmentHandler::new(stores.orders)),
        fulfillment_report_token: report_token,
    };

    let settings = RouterSettings {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
    };
    let app = app_router(state, validator, &settings);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain queued notifications before exiting
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_task.await {
        warn!(error = %e, "Fulfillment worker task ended abnormally");
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

pub mod auth;
pub mod features;
pub mod payments;
pub mod quota;
pub mod usage;
pub mod webhooks;

use std::sync::Arc;

use axum::{Extension, Router};
use crates::{
    domain::repositories::{
        payments::PaymentRepository, subscriptions::SubscriptionRepository,
        topology_counter::TopologyCounter, user_quotas::UserQuotaRepository,
        users::UserRepository,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            payments::PaymentPostgres, subscriptions::SubscriptionPostgres,
            topology_counter::TopologyCounterPostgres, user_quotas::UserQuotaPostgres,
            users::UserPostgres,
        },
    },
};

use crate::{
    auth::SessionKeys,
    config::config_model::DotEnvyConfig,
    usecases::{
        accounts::AccountUseCase,
        payment_gateways::{self, PayPalGateway, StripeGateway},
        payments::PaymentUseCase,
        quota_gate::QuotaGate,
        quotas::QuotaUseCase,
        webhooks::WebhookUseCase,
    },
};

/// Store handles the API is built on.
pub struct Repositories<U, S, Q, T, Pay> {
    pub users: Arc<U>,
    pub subscriptions: Arc<S>,
    pub quotas: Arc<Q>,
    pub topologies: Arc<T>,
    pub payments: Arc<Pay>,
}

pub struct Gateways {
    pub stripe: Arc<dyn StripeGateway>,
    pub paypal: Arc<dyn PayPalGateway>,
}

impl Gateways {
    pub fn from_config(config: &DotEnvyConfig) -> Self {
        Self {
            stripe: payment_gateways::stripe_gateway(config),
            paypal: payment_gateways::paypal_gateway(config),
        }
    }
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let repositories = Repositories {
        users: Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
        subscriptions: Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        quotas: Arc::new(UserQuotaPostgres::new(Arc::clone(&db_pool))),
        topologies: Arc::new(TopologyCounterPostgres::new(Arc::clone(&db_pool))),
        payments: Arc::new(PaymentPostgres::new(Arc::clone(&db_pool))),
    };

    api_router(
        repositories,
        Gateways::from_config(&config),
        Arc::new(SessionKeys::from_config(&config.session)),
    )
}

/// Everything under `/api/v1`. One quota service is shared by every route so
/// per-user locking covers webhooks and metered requests alike.
pub fn api_router<U, S, Q, T, Pay>(
    repositories: Repositories<U, S, Q, T, Pay>,
    gateways: Gateways,
    session_keys: Arc<SessionKeys>,
) -> Router
where
    U: UserRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
{
    let quotas = Arc::new(QuotaUseCase::new(
        Arc::clone(&repositories.users),
        repositories.quotas,
        repositories.topologies,
    ));

    let accounts = AccountUseCase::new(
        repositories.users,
        Arc::clone(&repositories.subscriptions),
        Arc::clone(&quotas),
        Arc::clone(&session_keys),
    );
    let payments = PaymentUseCase::new(
        Arc::clone(&repositories.payments),
        Arc::clone(&gateways.stripe),
        Arc::clone(&gateways.paypal),
    );
    let webhooks = WebhookUseCase::new(
        repositories.subscriptions,
        repositories.payments,
        Arc::clone(&quotas),
        gateways.stripe,
        gateways.paypal,
    );
    let gate = QuotaGate::new(Arc::clone(&quotas));

    Router::new()
        .nest("/auth", auth::routes(Arc::new(accounts)))
        .nest("/quota", quota::routes(Arc::clone(&quotas)))
        .nest("/features", features::routes(Arc::clone(&quotas)))
        .nest("/usage", usage::routes(Arc::new(gate)))
        .nest(
            "/payments",
            payments::routes(Arc::new(payments), Arc::clone(&quotas))
                .merge(webhooks::routes(Arc::new(webhooks))),
        )
        .layer(Extension(session_keys))
}

use std::sync::Arc;

use orgchart_auth::{
    Authority, COMPANY_CREATE, COMPANY_READ, COMPANY_UPDATE, DEPARTMENT_READ,
    InMemoryCredentialStore, UserAccount,
};

#[tokio::main]
async fn main() {
    orgchart_observability::init();

    let credentials = Arc::new(dev_credential_store());
    let app = orgchart_api::app::build_app(credentials).await;

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

/// Seed accounts until a persistent credential source exists.
fn dev_credential_store() -> InMemoryCredentialStore {
    let admin_password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        tracing::warn!("ADMIN_PASSWORD not set; using insecure dev default");
        "admin".to_string()
    });

    let accounts = [
        UserAccount::new("admin", &admin_password, vec![Authority::from_static("*")]),
        UserAccount::new("auditor", "auditor", vec![COMPANY_READ, DEPARTMENT_READ]),
        UserAccount::new(
            "registrar",
            "registrar",
            vec![COMPANY_READ, COMPANY_CREATE, COMPANY_UPDATE],
        ),
    ];

    InMemoryCredentialStore::with_accounts(
        accounts
            .into_iter()
            .map(|account| account.expect("failed to hash seed password")),
    )
}

use std::future::Future;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::router;
use crate::store::PostgresStore;

pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = PostgresStore::new(&config.database_url, config.max_pg_connections)
        .await
        .expect("failed to create postgres store");

    store
        .run_migrations()
        .await
        .expect("failed to run migrations");

    let app = router::router(store, config.export_prometheus);

    tracing::info!("listening on {:?}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .unwrap()
}

use axum::routing::get;
use dotenvy::dotenv;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use bursar::cli::run_expiry_sweep;
use bursar::metrics::init_metrics;
use bursar::router::init_router;
use bursar::state::init_app_state;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    // Maintenance command, run out-of-band (cron): expire stale intents.
    if args.len() > 1 && args[1] == "expire-intents" {
        handle_expire_intents(args).await;
        return;
    }

    // Normal server startup
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                format!(
                    "{}=debug,tower_http=debug,axum::rejection=trace",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metrics_handle = init_metrics();
    let state = init_app_state().await;
    let app = init_router(state).route(
        "/metrics",
        get(move || {
            let handle = metrics_handle.clone();
            async move { handle.render() }
        }),
    );

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    println!("🚀 Server running on http://localhost:3000");
    println!("📚 Swagger UI available at http://localhost:3000/swagger-ui");
    println!("📖 Scalar UI available at http://localhost:3000/scalar");
    axum::serve(listener, app).await.unwrap();
}

async fn handle_expire_intents(args: Vec<String>) {
    let older_than_minutes: i32 = match args.get(2) {
        Some(raw) => match raw.parse() {
            Ok(minutes) if minutes > 0 => minutes,
            _ => {
                eprintln!("Usage: {} expire-intents [minutes > 0]", args[0]);
                std::process::exit(1);
            }
        },
        // Default callback window: a gateway that has not called back in
        // 30 minutes is not going to.
        None => 30,
    };

    let pool = bursar_db::init_db_pool().await;

    match run_expiry_sweep(&pool, older_than_minutes).await {
        Ok((expired, overdue)) => {
            println!("✅ Expiry sweep finished");
            println!("   Intents expired: {}", expired);
            println!("   Installments marked overdue: {}", overdue);
        }
        Err(e) => {
            eprintln!("❌ Expiry sweep failed: {}", e);
            std::process::exit(1);
        }
    }
}

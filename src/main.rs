use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use agent_studio::auth::SessionController;
use agent_studio::backend::{LeadStore, SupabaseIdentity, SupabaseLeadStore, spawn_refresh_task};
use agent_studio::config::SiteConfig;
use agent_studio::server::{SiteState, site_routes};
use agent_studio::wizard::{TracingObserver, WizardManager, WizardObserver, spawn_expiry_task};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = SiteConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export SUPABASE_URL=https://<project>.supabase.co");
        eprintln!("  export SUPABASE_ANON_KEY=<public anon key>");
        std::process::exit(1);
    });

    eprintln!("🤖 Agent Studio v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.backend.url);
    eprintln!("   API: http://{}/api", config.bind_addr);
    eprintln!("   Session WS: ws://{}/ws/session", config.bind_addr);
    eprintln!("   Wizard idle timeout: {}s", config.wizard_idle.as_secs());
    eprintln!(
        "   CORS origin: {}",
        config.allowed_origin.as_deref().unwrap_or("*")
    );

    // ── Backends ────────────────────────────────────────────────────────
    let identity = Arc::new(SupabaseIdentity::new(config.backend.clone()));
    let leads: Arc<dyn LeadStore> = Arc::new(SupabaseLeadStore::new(config.backend.clone()));
    let _refresh_handle = spawn_refresh_task(Arc::clone(&identity), Duration::from_secs(30));

    // ── Session ─────────────────────────────────────────────────────────
    let controller = SessionController::new(identity);
    let session = controller.initialize().await;
    tracing::info!(status = %session.status, "Session initialized");
    let _listener_handle = controller.spawn_change_listener();

    // ── Wizard ──────────────────────────────────────────────────────────
    let observers: Vec<Arc<dyn WizardObserver>> =
        vec![Arc::new(TracingObserver) as Arc<dyn WizardObserver>];
    let wizards = WizardManager::new(observers);
    let _expiry_handle = spawn_expiry_task(Arc::clone(&wizards), config.wizard_idle);

    let app = site_routes(
        SiteState {
            controller,
            wizards,
            leads,
        },
        config.allowed_origin.as_deref(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "Agent Studio server started");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber for a Deskline client process.
///
/// Logs go to stderr so stdout stays free for the host's own output.
/// `RUST_LOG` overrides the default filter; `DESKLINE_ENV=production`
/// switches to JSON lines. Returns `false` when a subscriber was already
/// installed, e.g. by an embedding application.
pub fn init_tracing(app_name: &str) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter(app_name));

    let installed = if is_production() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    match installed {
        Ok(()) => {
            tracing::debug!(app = app_name, "tracing initialized");
            true
        }
        Err(_) => false,
    }
}

fn env_filter(app_name: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let crate_target = app_name.replace('-', "_");
        EnvFilter::new(format!("warn,{crate_target}=info,deskline_shared=info"))
    })
}

fn is_production() -> bool {
    std::env::var("DESKLINE_ENV")
        .map(|v| v == "production")
        .unwrap_or(false)
}

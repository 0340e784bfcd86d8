use std::io::Write;

use anyhow::Result;

use tether_client::{
    BackgroundFetch, CacheFirstOptions, InterceptEvent, InterceptionManager, ProxyOptions, RegisterOptions,
    ResponseProxy, StrategyKind, TaggedResponse, cache_first, cache_if_offline,
};
use tether_core::AppConfig;

pub struct FetchOptions {
    pub url: String,
    pub strategy: StrategyKind,
    pub method: String,
    pub scope: Option<String>,
    pub offline: bool,
    pub background_fetch: bool,
    pub include_headers: bool,
}

pub async fn fetch(config: &AppConfig, options: FetchOptions) -> Result<()> {
    let manager = InterceptionManager::open(config).await?;

    let background_fetch = if options.background_fetch { BackgroundFetch::Enabled } else { BackgroundFetch::Disabled };
    let fetch_strategy = match options.strategy {
        StrategyKind::CacheFirst => cache_first(CacheFirstOptions { server_response_callback: None, background_fetch }),
        StrategyKind::CacheIfOffline => cache_if_offline(),
    };

    let scope = options.scope.unwrap_or_else(|| options.url.clone());
    let registration = manager.register(RegisterOptions::new(scope)).await?;
    let proxy = ResponseProxy::new(ProxyOptions { fetch_strategy });
    registration.add_event_listener(InterceptEvent::Fetch, proxy.fetch_event_listener()).await?;

    manager.force_offline(options.offline);
    tracing::debug!(strategy = %options.strategy, scope = registration.scope(), "bound scope");

    let result = manager.fetch_url(&options.method, &options.url).await;

    // Background refreshes must land before the process exits.
    manager.settle().await;
    if !registration.unregister().await {
        tracing::warn!(scope = registration.scope(), "scope binding was already replaced or removed");
    }

    let tagged = result.map_err(|e| {
        let code = e.code();
        anyhow::Error::new(e).context(format!("{} {} failed ({code})", options.method, options.url))
    })?;
    print_response(tagged, options.include_headers)
}

fn print_response(tagged: TaggedResponse, include_headers: bool) -> Result<()> {
    let source = if tagged.is_cached_response() { "cache" } else { "network" };
    let response = tagged.into_response();

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{} {} ({})", response.status.as_u16(), response.status_text, source)?;
    if include_headers {
        for (name, value) in response.headers.iter() {
            writeln!(stdout, "{name}: {value}")?;
        }
    }
    if let Some(body) = &response.body {
        writeln!(stdout)?;
        stdout.write_all(body)?;
        writeln!(stdout)?;
    }
    Ok(())
}

pub async fn cache_list(config: &AppConfig) -> Result<()> {
    let manager = InterceptionManager::open(config).await?;
    let entries = manager.cache().entries().await?;

    let mut stdout = std::io::stdout().lock();
    for entry in entries {
        let short = entry.fingerprint.get(..12).unwrap_or(&entry.fingerprint);
        writeln!(
            stdout,
            "{}  {} {} {}  {}",
            short,
            entry.method,
            entry.url,
            entry.status,
            entry.stored_at.to_rfc3339()
        )?;
    }
    Ok(())
}

pub async fn cache_clear(config: &AppConfig) -> Result<()> {
    let manager = InterceptionManager::open(config).await?;
    let removed = manager.cache().clear().await?;
    println!("removed {removed} entries");
    Ok(())
}

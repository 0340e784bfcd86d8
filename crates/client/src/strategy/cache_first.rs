//! Cache-first: answer from the cache when possible, from the network otherwise.

use tether_core::{Error, Request, Response, ResponseCache};

use super::{BackgroundFetch, FetchContext, ServerResponseCallback, TaggedResponse};

pub(super) async fn handle(
    request: Request, ctx: &FetchContext, background_fetch: BackgroundFetch, callback: Option<ServerResponseCallback>,
) -> Result<TaggedResponse, Error> {
    let cache = ctx.cache();

    if let Some(entry) = cache.match_request(&request).await? {
        tracing::debug!(method = %request.method(), url = %request.url(), "cache-first hit");

        let online = ctx.connectivity().is_online();
        if background_fetch == BackgroundFetch::Enabled && online {
            let refresh_ctx = ctx.clone();
            let refresh_request = request.clone();
            let url = request.url().to_string();
            ctx.spawn_background("cache-first-refresh", url, async move {
                let response = refresh_ctx.browser_fetch(&refresh_request).await?;
                store_if_success(refresh_ctx.cache(), refresh_request, response, callback).await?;
                Ok(())
            });
        }

        return TaggedResponse::from_cache(&request, &entry);
    }

    if !ctx.connectivity().is_online() {
        return Err(Error::Offline(request.url().to_string()));
    }

    tracing::debug!(method = %request.method(), url = %request.url(), "cache-first miss");
    let response = ctx.browser_fetch(&request).await?;
    let response = store_if_success(cache, request.clone(), response, callback).await?;
    Ok(TaggedResponse::from_network(&request, response))
}

/// Run the callback on a network response, then cache the result when it is 2xx.
async fn store_if_success(
    cache: &ResponseCache, request: Request, response: Response, callback: Option<ServerResponseCallback>,
) -> Result<Response, Error> {
    let response = match callback {
        Some(callback) => callback(request.clone(), response).await?,
        None => response,
    };

    if response.is_success() {
        cache.put_response(&request, &response).await?;
    } else {
        tracing::debug!(url = %request.url(), status = response.status.as_u16(), "not caching non-2xx response");
    }
    Ok(response)
}

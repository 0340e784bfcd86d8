//! Cache-if-offline: prefer the network, fall back to the cache.

use tether_core::{Error, Request};

use super::{FetchContext, TaggedResponse};

pub(super) async fn handle(request: Request, ctx: &FetchContext) -> Result<TaggedResponse, Error> {
    if !ctx.connectivity().is_online() {
        tracing::debug!(url = %request.url(), "offline, serving from cache");
        return match ctx.cache().match_request(&request).await? {
            Some(entry) => TaggedResponse::from_cache(&request, &entry),
            None => Err(Error::Offline(request.url().to_string())),
        };
    }

    let response = match ctx.browser_fetch(&request).await {
        Ok(response) => response,
        Err(err) => {
            return match ctx.cache().match_request(&request).await? {
                Some(entry) => {
                    tracing::warn!(url = %request.url(), error = %err, "network failed, serving cached response");
                    TaggedResponse::from_cache(&request, &entry)
                }
                None => Err(err),
            };
        }
    };

    if response.is_server_error() {
        let status = response.status.as_u16();
        return match ctx.cache().match_request(&request).await? {
            Some(entry) => {
                tracing::warn!(url = %request.url(), status, "server failed, serving cached response");
                TaggedResponse::from_cache(&request, &entry)
            }
            None => Err(Error::ServerFailure { status, url: request.url().to_string() }),
        };
    }

    if response.is_success() {
        ctx.cache().put_response(&request, &response).await?;
    }
    Ok(TaggedResponse::from_network(&request, response))
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use tether_core::Response;

    use crate::strategy::cache_if_offline;
    use crate::testing::{Harness, MockFetch, departments, request};

    use super::*;

    #[tokio::test]
    async fn test_online_always_goes_to_network() {
        let mock = MockFetch::new();
        mock.add_request_reply(Method::GET, "/departments", departments());
        let harness = Harness::new(mock.clone()).await;
        let strategy = cache_if_offline();

        for _ in 0..3 {
            let tagged = strategy.handle(request("GET", "/departments"), &harness.ctx).await.unwrap();
            assert!(!tagged.is_cached_response());
        }
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_forced_offline_serves_latest_entry() {
        let mock = MockFetch::new();
        mock.add_request_reply(Method::GET, "/d", Response::new(StatusCode::OK).with_body("v1"));
        let harness = Harness::new(mock.clone()).await;
        let strategy = cache_if_offline();

        strategy.handle(request("GET", "/d"), &harness.ctx).await.unwrap();
        mock.add_request_reply(Method::GET, "/d", Response::new(StatusCode::OK).with_body("v2"));
        strategy.handle(request("GET", "/d"), &harness.ctx).await.unwrap();

        harness.connectivity.force_offline(true);
        let tagged = strategy.handle(request("GET", "/d"), &harness.ctx).await.unwrap();
        assert!(tagged.is_cached_response());
        assert_eq!(tagged.response().body.as_deref(), Some(&b"v2"[..]));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_forced_offline_without_entry_rejects() {
        let mock = MockFetch::new();
        let harness = Harness::new(mock.clone()).await;
        harness.connectivity.force_offline(true);

        let result = cache_if_offline().handle(request("GET", "/d"), &harness.ctx).await;
        assert!(matches!(result, Err(Error::Offline(_))));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_rejection_matches_forced_offline() {
        let mock = MockFetch::new();
        mock.add_request_reply(Method::GET, "/d", departments());
        let harness = Harness::new(mock.clone()).await;
        let strategy = cache_if_offline();

        strategy.handle(request("GET", "/d"), &harness.ctx).await.unwrap();

        mock.add_rejection(Method::GET, "/d");
        let rejected = strategy.handle(request("GET", "/d"), &harness.ctx).await.unwrap();

        harness.connectivity.force_offline(true);
        let offline = strategy.handle(request("GET", "/d"), &harness.ctx).await.unwrap();

        assert!(rejected.is_cached_response());
        assert_eq!(rejected, offline);
    }

    #[tokio::test]
    async fn test_rejection_without_entry_propagates() {
        let mock = MockFetch::new();
        mock.add_rejection(Method::GET, "/d");
        let harness = Harness::new(mock.clone()).await;

        let result = cache_if_offline().handle(request("GET", "/d"), &harness.ctx).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_server_error_serves_cache_but_redirect_does_not() {
        let mock = MockFetch::new();
        mock.add_request_reply(Method::GET, "/d", departments());
        let harness = Harness::new(mock.clone()).await;
        let strategy = cache_if_offline();

        strategy.handle(request("GET", "/d"), &harness.ctx).await.unwrap();

        mock.add_request_reply(Method::GET, "/d", Response::new(StatusCode::INTERNAL_SERVER_ERROR));
        let failed = strategy.handle(request("GET", "/d"), &harness.ctx).await.unwrap();
        assert!(failed.is_cached_response());
        assert_eq!(failed.response().status, StatusCode::OK);

        mock.add_request_reply(Method::GET, "/d", Response::new(StatusCode::MULTIPLE_CHOICES));
        let redirect = strategy.handle(request("GET", "/d"), &harness.ctx).await.unwrap();
        assert!(!redirect.is_cached_response());
        assert_eq!(redirect.response().status, StatusCode::MULTIPLE_CHOICES);

        let entry = harness.cache.match_request(&request("GET", "/d")).await.unwrap().unwrap();
        assert_eq!(entry.status, 200);
    }

    #[tokio::test]
    async fn test_server_error_without_entry_rejects() {
        let mock = MockFetch::new();
        mock.add_request_reply(Method::GET, "/d", Response::new(StatusCode::SERVICE_UNAVAILABLE));
        let harness = Harness::new(mock.clone()).await;

        let result = cache_if_offline().handle(request("GET", "/d"), &harness.ctx).await;
        assert!(matches!(result, Err(Error::ServerFailure { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_client_error_is_returned_verbatim() {
        let mock = MockFetch::new();
        mock.add_request_reply(Method::GET, "/d", departments());
        let harness = Harness::new(mock.clone()).await;
        let strategy = cache_if_offline();

        strategy.handle(request("GET", "/d"), &harness.ctx).await.unwrap();
        mock.add_request_reply(Method::GET, "/d", Response::new(StatusCode::NOT_FOUND));

        let tagged = strategy.handle(request("GET", "/d"), &harness.ctx).await.unwrap();
        assert!(!tagged.is_cached_response());
        assert_eq!(tagged.response().status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_head_online_and_offline_has_no_body() {
        let mock = MockFetch::new();
        mock.add_request_reply(Method::HEAD, "/d", departments());
        let harness = Harness::new(mock.clone()).await;
        let strategy = cache_if_offline();

        let online = strategy.handle(request("HEAD", "/d"), &harness.ctx).await.unwrap();
        assert!(online.response().body.is_none());

        harness.connectivity.force_offline(true);
        let offline = strategy.handle(request("HEAD", "/d"), &harness.ctx).await.unwrap();
        assert!(offline.is_cached_response());
        assert!(offline.response().body.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_masked() {
        let mock = MockFetch::new();
        mock.add_request_reply(Method::GET, "/d", departments());
        let harness = Harness::with_failing_store(mock.clone()).await;

        let result = cache_if_offline().handle(request("GET", "/d"), &harness.ctx).await;
        assert!(result.is_err());
    }
}

use tower_http::cors::{AllowCredentials, AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::{AllowedOrigins, CorsConfig};

impl CorsConfig {
    pub fn layer(&self) -> CorsLayer {
        match (&self.allowed_origins, self.allow_credentials) {
            (AllowedOrigins::Any, false) => CorsLayer::new()
                .allow_origin(AllowOrigin::any())
                .allow_methods(AllowMethods::any())
                .allow_headers(AllowHeaders::any()),
            // Browsers ignore `*` methods and headers on credentialed preflights, so echo them.
            // CorsLayer refuses a literal `true` next to a wildcard origin, the predicate form does not.
            (AllowedOrigins::Any, true) => CorsLayer::new()
                .allow_origin(AllowOrigin::any())
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(AllowCredentials::predicate(|_, _| true)),
            (AllowedOrigins::List(origins), allow_credentials) => CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins.iter().cloned()))
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(allow_credentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, HeaderValue, Method, Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    use super::*;

    fn app(cors: &CorsConfig) -> Router {
        Router::new().route("/", get(|| async { "ok" })).layer(cors.layer())
    }

    async fn send(cors: &CorsConfig, request: Request<Body>) -> axum::response::Response {
        app(cors).oneshot(request).await.expect("request execution")
    }

    #[tokio::test]
    async fn default_policy_allows_any_origin_with_credentials() {
        let response = send(
            &CorsConfig::default(),
            Request::builder()
                .uri("/")
                .header(header::ORIGIN, "https://zoo.example")
                .body(Body::empty())
                .expect("request build"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn preflight_is_answered() {
        let response = send(
            &CorsConfig::default(),
            Request::builder()
                .uri("/")
                .method(Method::OPTIONS)
                .header(header::ORIGIN, "https://zoo.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-api-key")
                .body(Body::empty())
                .expect("request build"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "DELETE");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "x-api-key");
    }

    #[tokio::test]
    async fn preflight_without_credentials_uses_wildcards() {
        let cors = CorsConfig {
            allowed_origins: AllowedOrigins::Any,
            allow_credentials: false,
        };
        let response = send(
            &cors,
            Request::builder()
                .uri("/")
                .method(Method::OPTIONS)
                .header(header::ORIGIN, "https://zoo.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                .body(Body::empty())
                .expect("request build"),
        )
        .await;

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "*");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }

    #[tokio::test]
    async fn origin_list_only_echoes_known_origins() {
        let cors = CorsConfig {
            allowed_origins: AllowedOrigins::List(vec![HeaderValue::from_static(
                "https://zoo.example",
            )]),
            allow_credentials: true,
        };

        let allowed = send(
            &cors,
            Request::builder()
                .uri("/")
                .header(header::ORIGIN, "https://zoo.example")
                .body(Body::empty())
                .expect("request build"),
        )
        .await;
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://zoo.example"
        );

        let denied = send(
            &cors,
            Request::builder()
                .uri("/")
                .header(header::ORIGIN, "https://farm.example")
                .body(Body::empty())
                .expect("request build"),
        )
        .await;
        assert!(denied
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}

//! Request classification: which serving strategy handles an intercepted
//! request.
//!
//! Classification is pure and synchronous. It runs as an ordered table of
//! matcher→strategy routes, evaluated top to bottom; the first match wins.
//! The standard table puts backend traffic before static assets, so an API
//! path that happens to end in a static extension is still network-first.

use crate::config::Config;
use crate::http::Request;

/// Serving strategy for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  CacheFirst,
  NetworkFirst,
  StaleWhileRevalidate,
}

/// Predicate half of a route.
#[derive(Debug, Clone)]
pub enum Matcher {
  /// Path starts with the prefix, or the host contains the marker substring.
  Backend {
    path_prefix: String,
    host_marker: String,
  },
  /// Path extension is in the allow-list (case-insensitive).
  Extension(Vec<String>),
  /// Matches everything.
  Any,
}

impl Matcher {
  pub fn matches(&self, request: &Request) -> bool {
    match self {
      Self::Backend {
        path_prefix,
        host_marker,
      } => {
        let by_path = !path_prefix.is_empty() && request.url.path().starts_with(path_prefix);
        let by_host = !host_marker.is_empty()
          && request
            .url
            .host_str()
            .is_some_and(|host| host.contains(host_marker));
        by_path || by_host
      }
      Self::Extension(extensions) => match request.extension() {
        Some(ext) => extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
        None => false,
      },
      Self::Any => true,
    }
  }
}

/// One classification rule.
#[derive(Debug, Clone)]
pub struct Route {
  pub matcher: Matcher,
  pub strategy: Strategy,
}

/// Ordered, first-match-wins classification table.
#[derive(Debug, Clone)]
pub struct Router {
  routes: Vec<Route>,
}

impl Router {
  /// The standard table: backend traffic, then static assets, then
  /// everything else.
  pub fn from_config(config: &Config) -> Self {
    Self {
      routes: vec![
        Route {
          matcher: Matcher::Backend {
            path_prefix: config.api_prefix.clone(),
            host_marker: config.api_host_marker.clone(),
          },
          strategy: Strategy::NetworkFirst,
        },
        Route {
          matcher: Matcher::Extension(config.static_extensions.clone()),
          strategy: Strategy::CacheFirst,
        },
        Route {
          matcher: Matcher::Any,
          strategy: Strategy::StaleWhileRevalidate,
        },
      ],
    }
  }

  /// A custom table; evaluation order is the vec order.
  pub fn with_routes(routes: Vec<Route>) -> Self {
    Self { routes }
  }

  /// Whether the coordinator handles this request at all. Everything that is
  /// not a GET over http(s) passes through untouched.
  pub fn should_intercept(request: &Request) -> bool {
    request.method.is_get() && matches!(request.url.scheme(), "http" | "https")
  }

  /// Classify a request. Total: an exhausted table falls back to
  /// stale-while-revalidate.
  pub fn classify(&self, request: &Request) -> Strategy {
    self
      .routes
      .iter()
      .find(|route| route.matcher.matches(request))
      .map(|route| route.strategy)
      .unwrap_or(Strategy::StaleWhileRevalidate)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::Method;
  use url::Url;

  fn router() -> Router {
    Router::from_config(&Config::default())
  }

  fn get(url: &str) -> Request {
    Request::get(Url::parse(url).expect("test URL"))
  }

  #[test]
  fn test_only_get_over_http_is_intercepted() {
    assert!(Router::should_intercept(&get("http://example.org/")));
    assert!(Router::should_intercept(&get("https://example.org/")));

    let post = Request::new(Method::Post, Url::parse("https://example.org/api").expect("test URL"));
    assert!(!Router::should_intercept(&post));

    for scheme in ["chrome-extension://abcdef/page.js", "ftp://example.org/f", "data:,hello"] {
      assert!(!Router::should_intercept(&get(scheme)), "{scheme}");
    }
  }

  #[test]
  fn test_api_prefix_is_network_first() {
    assert_eq!(
      router().classify(&get("https://example.org/api/progress")),
      Strategy::NetworkFirst
    );
  }

  #[test]
  fn test_backend_host_marker_is_network_first() {
    assert_eq!(
      router().classify(&get("https://abc.supabase.co/rest/v1/rows")),
      Strategy::NetworkFirst
    );
  }

  #[test]
  fn test_static_extensions_are_cache_first() {
    for url in [
      "https://example.org/styles/main.css",
      "https://example.org/app.js?v=2",
      "https://example.org/img/logo.SVG",
      "https://example.org/fonts/inter.woff2",
    ] {
      assert_eq!(router().classify(&get(url)), Strategy::CacheFirst, "{url}");
    }
  }

  #[test]
  fn test_api_wins_over_static_extension() {
    // Both rules match; the table order decides
    assert_eq!(
      router().classify(&get("https://example.org/api/export.css")),
      Strategy::NetworkFirst
    );
  }

  #[test]
  fn test_navigations_and_unknown_paths_revalidate() {
    assert_eq!(
      router().classify(&get("https://example.org/")),
      Strategy::StaleWhileRevalidate
    );
    assert_eq!(
      router().classify(&get("https://example.org/pricing")),
      Strategy::StaleWhileRevalidate
    );
    assert_eq!(
      router().classify(&get("https://example.org/readme.txt")),
      Strategy::StaleWhileRevalidate
    );
  }

  #[test]
  fn test_empty_markers_never_match() {
    let table = Router::with_routes(vec![Route {
      matcher: Matcher::Backend {
        path_prefix: String::new(),
        host_marker: String::new(),
      },
      strategy: Strategy::NetworkFirst,
    }]);
    // Falls through to the default
    assert_eq!(
      table.classify(&get("https://example.org/anything")),
      Strategy::StaleWhileRevalidate
    );
  }

  #[test]
  fn test_custom_table_order_wins() {
    let table = Router::with_routes(vec![
      Route {
        matcher: Matcher::Extension(vec!["css".to_string()]),
        strategy: Strategy::CacheFirst,
      },
      Route {
        matcher: Matcher::Backend {
          path_prefix: "/api".to_string(),
          host_marker: String::new(),
        },
        strategy: Strategy::NetworkFirst,
      },
    ]);
    // Extension listed first now takes priority over the API prefix
    assert_eq!(
      table.classify(&get("https://example.org/api/export.css")),
      Strategy::CacheFirst
    );
  }
}

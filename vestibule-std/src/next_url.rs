//! Choosing where to send the client after a form or login.
//!
//! Absolute URLs are only followed when they point back at the requesting
//! host (or one of its subdomains) on the same port, unless the caller opts
//! into external targets.

use crate::routing::UrlMap;
use url::Url;
use vestibule_core::RequestContext;

/// The query argument holding the requested destination.
pub const NEXT_ARG: &str = "next";

/// What to return when neither `next` nor the referrer is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Fallback {
    /// The URL map's index URL.
    #[default]
    Index,
    /// A fixed URL.
    Url(String),
    /// Nothing.
    Nothing,
}

/// Next-URL selection policy.
#[derive(Debug, Clone, Default)]
pub struct NextUrl {
    referrer: bool,
    external: bool,
    fallback: Fallback,
}

impl NextUrl {
    /// Only `next`, no external targets, index fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also consider the `Referer` header.
    pub fn referrer(mut self, enabled: bool) -> Self {
        self.referrer = enabled;
        self
    }

    /// Allow targets on other hosts.
    pub fn external(mut self, enabled: bool) -> Self {
        self.external = enabled;
        self
    }

    /// Set the fallback.
    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Pick the URL to send the client to.
    pub fn resolve(&self, ctx: &RequestContext, urls: &UrlMap) -> Option<String> {
        let next = ctx.args().get(NEXT_ARG).unwrap_or_default();
        let next = if self.external { next } else { clean(next, ctx) };
        if !next.is_empty() {
            return Some(next.to_string());
        }

        if self.referrer {
            if let Some(referrer) = ctx.referrer().filter(|r| !r.is_empty()) {
                if self.external {
                    return Some(referrer.to_string());
                }
                let referrer = clean(referrer, ctx);
                if !referrer.is_empty() {
                    return Some(referrer.to_string());
                }
            }
        }

        match &self.fallback {
            Fallback::Index => Some(urls.index_url()),
            Fallback::Url(url) => Some(url.clone()),
            Fallback::Nothing => None,
        }
    }
}

/// `url` if it is relative or points at the request's host, else `""`.
pub fn clean<'a>(url: &'a str, ctx: &RequestContext) -> &'a str {
    let absolute = url.starts_with("http://") || url.starts_with("https://");
    let scheme_relative = url.starts_with("//");
    if !(absolute || scheme_relative) {
        return url;
    }

    let target = if scheme_relative {
        Url::parse(&format!("http:{url}"))
    } else {
        Url::parse(url)
    };
    let request = ctx
        .host()
        .and_then(|host| Url::parse(&format!("http://{host}")).ok());
    let (Ok(target), Some(request)) = (target, request) else {
        return "";
    };

    if target.port() != request.port() {
        return "";
    }
    match (target.host_str(), request.host_str()) {
        (Some(target), Some(request))
            if target == request || target.ends_with(&format!(".{request}")) =>
        {
            url
        }
        _ => "",
    }
}

//! A small HTTP endpoint, built on `tiny_http`, that serves the article
//! listing and article pages to the presentation layer as JSON.
//!
//! | request                       | response                               |
//! |-------------------------------|----------------------------------------|
//! | `GET /api/articles`           | `[ArticleSummary]`, newest first       |
//! | `GET /api/articles?tag=rust`  | listing filtered by tag                |
//! | `GET /api/articles?q=borrow`  | listing filtered by search terms       |
//! | `GET /api/articles/{id}`      | `ArticleDetail` plus rendered `html`   |
//!
//! Requests are handled one at a time; each one re-reads the articles it
//! needs.

use crate::article::ArticleDetail;
use crate::error::Error;
use crate::store::ArticleStore;
use anyhow::{anyhow, Result};
use serde::Serialize;
use tiny_http::{Header, Method, Response, Server};

const ARTICLES_PATH: &str = "/api/articles";

/// The status code and JSON body for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    fn json<T: Serialize>(value: &T) -> Reply {
        match serde_json::to_string(value) {
            Ok(body) => Reply { status: 200, body },
            Err(err) => Reply::error(500, &Error::from(err).to_string()),
        }
    }

    fn error(status: u16, message: &str) -> Reply {
        Reply {
            status,
            body: serde_json::json!({ "error": message }).to_string(),
        }
    }
}

#[derive(Serialize)]
struct DetailBody<'a> {
    #[serde(flatten)]
    detail: &'a ArticleDetail,
    html: String,
}

/// Binds `addr` and serves `store` until the process exits.
pub fn serve(store: &ArticleStore, addr: &str) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|err| anyhow!("binding `{}`: {}", addr, err))?;
    tracing::info!("serving {:?} on http://{}", store.root(), addr);

    let content_type = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .map_err(|_| anyhow!("invalid Content-Type header"))?;

    for request in server.incoming_requests() {
        let reply = route(store, request.method(), request.url());
        tracing::debug!(
            method = %request.method(),
            url = request.url(),
            status = reply.status,
            "request"
        );
        let response = Response::from_string(reply.body)
            .with_status_code(reply.status)
            .with_header(content_type.clone());
        if let Err(err) = request.respond(response) {
            tracing::warn!("writing response: {}", err);
        }
    }
    Ok(())
}

/// Maps a request to its [`Reply`].
pub fn route(store: &ArticleStore, method: &Method, url: &str) -> Reply {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    };

    let rest = match path.strip_prefix(ARTICLES_PATH) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            rest.trim_start_matches('/')
        }
        _ => return Reply::error(404, "no such endpoint"),
    };
    if *method != Method::Get {
        return Reply::error(405, "method not allowed");
    }

    if rest.is_empty() {
        list(store, query)
    } else {
        match urlencoding::decode(rest) {
            Ok(id) => detail(store, &id),
            Err(_) => Reply::error(400, "article id is not valid UTF-8"),
        }
    }
}

fn list(store: &ArticleStore, query: &str) -> Reply {
    let mut tag = None;
    let mut search = None;
    for (key, value) in query_pairs(query) {
        match key.as_str() {
            "tag" => tag = Some(value),
            "q" => search = Some(value),
            _ => {}
        }
    }

    let listing = store.list_filtered(tag.as_deref(), search.as_deref());
    match listing {
        Ok(summaries) => Reply::json(&summaries),
        Err(err) => {
            tracing::error!("listing articles: {}", err);
            Reply::error(500, "failed to list articles")
        }
    }
}

fn detail(store: &ArticleStore, id: &str) -> Reply {
    match store.get_article(id) {
        Ok(detail) => Reply::json(&DetailBody {
            html: detail.to_html(),
            detail: &detail,
        }),
        Err(err) if err.is_not_found() => {
            Reply::error(404, &format!("no article `{}`", id))
        }
        Err(err) => {
            tracing::error!("reading article `{}`: {}", id, err);
            Reply::error(500, "failed to read article")
        }
    }
}

/// Decodes `application/x-www-form-urlencoded` pairs. Undecodable pairs are
/// dropped.
fn query_pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    query.split('&').filter(|pair| !pair.is_empty()).filter_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let decode = |s: &str| {
            urlencoding::decode(&s.replace('+', " "))
                .ok()
                .map(|s| s.into_owned())
        };
        Some((decode(key)?, decode(value)?))
    })
}

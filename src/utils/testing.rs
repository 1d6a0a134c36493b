//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::utils::http::{HttpReply, Transport};

/// One scripted answer.
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Reply(HttpReply),
    Fail(String),
}

impl Scripted {
    /// An OK index response carrying `count` generated hits.
    pub(crate) fn hits(page: u32, count: usize) -> Self {
        let hits: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "externalId": format!("{page}-{i}"),
                    "name": format!("Exhibitor {page}-{i}"),
                    "interests": ["AI", "5G"],
                    "url": format!("https://exhibitors.test/{page}/{i}"),
                    "country": "Spain",
                    "startUp": i % 2 == 0,
                    "stage": "Growth",
                    "foundingYear": 2010
                })
            })
            .collect();
        Self::json(json!({ "results": [{ "hits": hits }] }))
    }

    pub(crate) fn empty() -> Self {
        Self::json(json!({ "results": [{ "hits": [] }] }))
    }

    pub(crate) fn json(value: Value) -> Self {
        Self::Reply(HttpReply::new(200, value.to_string()))
    }

    pub(crate) fn status(status: u16) -> Self {
        Self::Reply(HttpReply::new(status, ""))
    }

    pub(crate) fn html(body: &str) -> Self {
        Self::Reply(HttpReply::new(200, body))
    }

    fn into_result(self) -> Result<HttpReply> {
        match self {
            Scripted::Reply(reply) => Ok(reply),
            Scripted::Fail(message) => Err(AppError::fetch("scripted", message)),
        }
    }
}

/// Answers POSTs from a queue and GETs from a URL table.
///
/// Once the POST queue is drained every further POST gets an empty page;
/// unknown GET URLs get a 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    posts: Mutex<VecDeque<Scripted>>,
    pages: HashMap<String, Scripted>,
    post_bodies: Mutex<Vec<String>>,
    get_urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_posts(posts: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            posts: Mutex::new(posts.into_iter().collect()),
            ..Self::default()
        }
    }

    pub(crate) fn page(mut self, url: &str, answer: Scripted) -> Self {
        self.pages.insert(url.to_string(), answer);
        self
    }

    pub(crate) fn post_bodies(&self) -> Vec<String> {
        self.post_bodies.lock().unwrap().clone()
    }

    pub(crate) fn get_urls(&self) -> Vec<String> {
        self.get_urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpReply> {
        self.get_urls.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| Scripted::status(404))
            .into_result()
    }

    async fn post(&self, _url: &str, body: String) -> Result<HttpReply> {
        self.post_bodies.lock().unwrap().push(body);
        let next = self.posts.lock().unwrap().pop_front();
        next.unwrap_or_else(Scripted::empty).into_result()
    }
}

#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    path::Path,
    sync::Mutex,
};

use async_trait::async_trait;
use disqus_export::{
    error::Error,
    page::{Cursor, Page},
    Api, Params, Result,
};
use serde_json::{json, Value};

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Page(Page),
    RateLimited,
    Fail(u16),
}

/// An [`Api`] answering from a script keyed by endpoint and parameters.
///
/// Each key holds a queue of replies. Replies are consumed in order and the
/// last one repeats, so a script can be replayed by a second export run.
#[derive(Default)]
pub struct ScriptedApi {
    script: Mutex<HashMap<(String, Params), VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Params)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, endpoint: &str, params: Params, replies: Vec<Reply>) {
        self.script
            .lock()
            .unwrap()
            .insert((endpoint.to_string(), params), replies.into());
    }

    pub fn calls(&self) -> Vec<(String, Params)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls().iter().filter(|(e, _)| e == endpoint).count()
    }
}

#[async_trait]
impl Api for ScriptedApi {
    async fn get(&self, endpoint: &str, params: &Params) -> Result<Page> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), params.clone()));

        let mut script = self.script.lock().unwrap();
        let reply = match script.get_mut(&(endpoint.to_string(), params.clone())) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match reply {
            Some(Reply::Page(page)) => Ok(page),
            Some(Reply::RateLimited) => Err(Error::RateLimited {
                code: 13,
                message: "You have exceeded the rate limit for this resource.".to_string(),
            }),
            Some(Reply::Fail(code)) => Err(Error::Api {
                code,
                message: "Invalid argument".to_string(),
            }),
            None => Err(Error::Api {
                code: 8,
                message: format!("no script for {endpoint} {params:?}"),
            }),
        }
    }
}

pub fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn thread_params(forum: &str, cursor: Option<&str>) -> Params {
    let mut p = params(&[("forum", forum), ("method", "GET")]);
    if let Some(c) = cursor {
        p.insert("cursor".to_string(), c.to_string());
    }
    p
}

pub fn post_params(thread: &str, cursor: Option<&str>) -> Params {
    let mut p = params(&[("thread", thread), ("method", "GET")]);
    if let Some(c) = cursor {
        p.insert("cursor".to_string(), c.to_string());
    }
    p
}

/// A page whose cursor points at `next`, or ends the walk when `next` is `None`.
pub fn page(records: Vec<Value>, next: Option<&str>) -> Reply {
    let cursor = match next {
        Some(id) => Cursor::new(Some(id.to_string()), true),
        None => Cursor::new(None, false),
    };
    Reply::Page(Page::new(records, Some(cursor)))
}

pub fn thread(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "forum": "myforum",
        "clean_title": title,
        "title": title,
        "posts": 0,
        "link": format!("https://example.com/{id}"),
    })
}

pub fn post(id: u32, thread: &str) -> Value {
    json!({
        "id": id.to_string(),
        "thread": thread,
        "message": format!("<p>comment {id}</p>"),
        "raw_message": format!("comment {id}"),
        "createdAt": "2014-06-01T12:00:00",
    })
}

/// Forum with two threads: A has one page of 3 posts,
/// B has two pages of 2 posts each.
pub fn two_thread_forum() -> ScriptedApi {
    let api = ScriptedApi::new();
    api.on(
        "forums.listThreads",
        thread_params("myforum", None),
        vec![page(vec![thread("A", "First"), thread("B", "Second")], None)],
    );
    api.on(
        "posts.list",
        post_params("A", None),
        vec![page(vec![post(1, "A"), post(2, "A"), post(3, "A")], None)],
    );
    api.on(
        "posts.list",
        post_params("B", None),
        vec![page(vec![post(10, "B"), post(11, "B")], Some("B:2"))],
    );
    api.on(
        "posts.list",
        post_params("B", Some("B:2")),
        vec![page(vec![post(12, "B"), post(13, "B")], None)],
    );
    api
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn post_ids(record: &Value) -> Vec<String> {
    record["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect()
}

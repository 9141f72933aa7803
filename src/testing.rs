//! Stub collaborators for tests: canned pages, scripted model replies, recorded sleeps.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::extractor::retry::Sleeper;
use crate::fetch::{FetchError, Fetcher};
use crate::model::{LanguageModel, ModelError};

/// Serves canned bodies or errors by exact URL. Unknown URLs fail as transport errors.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, Result<String, FetchError>>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(html.to_string()));
        self
    }

    pub fn with_error(mut self, url: &str, error: FetchError) -> Self {
        self.pages.insert(url.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(result) => result.clone(),
            None => Err(FetchError::Transport {
                url: url.to_string(),
                message: "connection refused".into(),
            }),
        }
    }
}

type Reply = Box<dyn Fn() -> Result<String, ModelError> + Send + Sync>;

/// Replays scripted replies in order, then answers every further call with the fallback.
pub struct StubModel {
    script: Mutex<VecDeque<Result<String, ModelError>>>,
    fallback: Reply,
    prompts: Mutex<Vec<String>>,
}

impl StubModel {
    pub fn always(reply: &'static str) -> Self {
        Self::with_fallback(Box::new(move || Ok(reply.to_string())))
    }

    pub fn failing(error: ModelError) -> Self {
        Self::with_fallback(Box::new(move || Err(error.clone())))
    }

    pub fn scripted(replies: Vec<Result<String, ModelError>>) -> Self {
        let model = Self::with_fallback(Box::new(|| Err(ModelError::EmptyResponse)));
        *model.script.lock().unwrap() = replies.into();
        model
    }

    fn with_fallback(fallback: Reply) -> Self {
        StubModel {
            script: Mutex::new(VecDeque::new()),
            fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply,
            None => (self.fallback)(),
        }
    }
}

/// Records requested delays instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

pub const WELL_FORMED_REPLY: &str = r#"{
  "mission_statement": "Make widgets for everyone",
  "products_or_services": "Widgets, gadgets",
  "founded": "1999 by Jane Roe",
  "headquarters": "Springfield, USA",
  "key_executives": "Jane Roe (CEO)",
  "notable_awards": "Widget of the Year 2020"
}"#;

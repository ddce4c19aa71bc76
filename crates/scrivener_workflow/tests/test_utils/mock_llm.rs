//! Scripted chat model for workflow tests.

use async_trait::async_trait;
use futures::stream;
use scrivener_core::ChatRequest;
use scrivener_error::{ModelError, ModelErrorKind, ScrivenerError, ScrivenerResult};
use scrivener_interface::{ChatDriver, Streaming, TextStream};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One scripted reply.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum MockReply {
    /// Stream these fragments
    Fragments(Vec<String>),
    /// Stream these fragments, then fail
    BreakAfter(Vec<String>, String),
    /// Fail before streaming starts
    Refuse(String),
}

impl MockReply {
    /// A single-fragment reply.
    #[allow(dead_code)]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Fragments(vec![text.into()])
    }
}

#[derive(Debug)]
struct Script {
    queued: VecDeque<MockReply>,
    fallback: MockReply,
}

impl Script {
    fn next(&mut self) -> MockReply {
        self.queued.pop_front().unwrap_or_else(|| self.fallback.clone())
    }
}

/// Chat model that answers rewrite and review prompts from scripts.
///
/// Review prompts are recognized by the article-under-review heading; all
/// other streaming prompts are rewrites. Blocking `chat` calls pop from
/// their own queue.
#[derive(Debug)]
pub struct MockLlm {
    rewrites: Mutex<Script>,
    reviews: Mutex<Script>,
    chats: Mutex<VecDeque<String>>,
    rewrite_calls: AtomicUsize,
    review_calls: AtomicUsize,
    chat_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockLlm {
    /// Every rewrite returns `rewrite`, every review returns `review`.
    pub fn new(rewrite: MockReply, review: MockReply) -> Self {
        Self {
            rewrites: Mutex::new(Script {
                queued: VecDeque::new(),
                fallback: rewrite,
            }),
            reviews: Mutex::new(Script {
                queued: VecDeque::new(),
                fallback: review,
            }),
            chats: Mutex::new(VecDeque::new()),
            rewrite_calls: AtomicUsize::new(0),
            review_calls: AtomicUsize::new(0),
            chat_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a review reply ahead of the fallback.
    pub fn queue_review(self, reply: MockReply) -> Self {
        self.reviews.lock().unwrap().queued.push_back(reply);
        self
    }

    /// Queue a rewrite reply ahead of the fallback.
    pub fn queue_rewrite(self, reply: MockReply) -> Self {
        self.rewrites.lock().unwrap().queued.push_back(reply);
        self
    }

    /// Queue a blocking chat reply.
    pub fn queue_chat(self, reply: impl Into<String>) -> Self {
        self.chats.lock().unwrap().push_back(reply.into());
        self
    }

    pub fn rewrite_calls(&self) -> usize {
        self.rewrite_calls.load(Ordering::SeqCst)
    }

    pub fn review_calls(&self) -> usize {
        self.review_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    /// User prompts seen so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn record_prompt(&self, req: &ChatRequest) -> String {
        let prompt = req
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt.clone());
        prompt
    }
}

fn model_error(message: &str) -> ScrivenerError {
    ModelError::new(ModelErrorKind::Stream(message.to_string())).into()
}

#[async_trait]
impl ChatDriver for MockLlm {
    async fn chat(&self, req: &ChatRequest) -> ScrivenerResult<String> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.record_prompt(req);
        self.chats
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| model_error("no scripted chat reply"))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

#[async_trait]
impl Streaming for MockLlm {
    async fn chat_stream(&self, req: &ChatRequest) -> ScrivenerResult<TextStream> {
        let prompt = self.record_prompt(req);
        let reply = if prompt.contains("待审核文章") {
            self.review_calls.fetch_add(1, Ordering::SeqCst);
            self.reviews.lock().unwrap().next()
        } else {
            self.rewrite_calls.fetch_add(1, Ordering::SeqCst);
            self.rewrites.lock().unwrap().next()
        };

        let items: Vec<ScrivenerResult<String>> = match reply {
            MockReply::Fragments(parts) => parts.into_iter().map(Ok).collect(),
            MockReply::BreakAfter(parts, message) => parts
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(model_error(&message))))
                .collect(),
            MockReply::Refuse(message) => return Err(model_error(&message)),
        };
        Ok(Box::pin(stream::iter(items)))
    }
}

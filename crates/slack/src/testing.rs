//! In-memory `SlackApi` that records every call, for tests in this and downstream crates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use threadwise_core::{BotIdentity, ThreadPage};

use crate::client::{PostMessageRequest, RepliesRequest, SlackApi, SlackApiError};

pub struct FakeSlackApi {
    auth: Mutex<Result<BotIdentity, SlackApiError>>,
    thread: Mutex<Result<ThreadPage, SlackApiError>>,
    post: Mutex<Result<String, SlackApiError>>,
    auth_calls: AtomicUsize,
    replies_requests: Mutex<Vec<RepliesRequest>>,
    posts: Mutex<Vec<PostMessageRequest>>,
}

impl FakeSlackApi {
    pub fn new(identity: BotIdentity) -> Self {
        Self {
            auth: Mutex::new(Ok(identity)),
            thread: Mutex::new(Ok(ThreadPage::default())),
            post: Mutex::new(Ok("1700000000.000100".to_owned())),
            auth_calls: AtomicUsize::new(0),
            replies_requests: Mutex::new(Vec::new()),
            posts: Mutex::new(Vec::new()),
        }
    }

    pub fn set_auth(&self, result: Result<BotIdentity, SlackApiError>) {
        replace(&self.auth, result);
    }

    pub fn set_thread(&self, result: Result<ThreadPage, SlackApiError>) {
        replace(&self.thread, result);
    }

    pub fn set_post(&self, result: Result<String, SlackApiError>) {
        replace(&self.post, result);
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn replies_requests(&self) -> Vec<RepliesRequest> {
        snapshot(&self.replies_requests)
    }

    pub fn posts(&self) -> Vec<PostMessageRequest> {
        snapshot(&self.posts)
    }
}

fn replace<T>(slot: &Mutex<T>, value: T) {
    if let Ok(mut guard) = slot.lock() {
        *guard = value;
    }
}

fn snapshot<T: Clone>(slot: &Mutex<Vec<T>>) -> Vec<T> {
    slot.lock().map(|items| items.clone()).unwrap_or_default()
}

fn current<T: Clone>(slot: &Mutex<Result<T, SlackApiError>>) -> Result<T, SlackApiError> {
    slot.lock()
        .map_err(|_| SlackApiError::Transport("fake poisoned".to_owned()))
        .and_then(|guard| (*guard).clone())
}

#[async_trait]
impl SlackApi for FakeSlackApi {
    async fn auth_test(&self) -> Result<BotIdentity, SlackApiError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        current(&self.auth)
    }

    async fn conversation_replies(
        &self,
        request: &RepliesRequest,
    ) -> Result<ThreadPage, SlackApiError> {
        if let Ok(mut requests) = self.replies_requests.lock() {
            requests.push(request.clone());
        }
        current(&self.thread)
    }

    async fn post_message(&self, request: &PostMessageRequest) -> Result<String, SlackApiError> {
        if let Ok(mut posts) = self.posts.lock() {
            posts.push(request.clone());
        }
        current(&self.post)
    }
}

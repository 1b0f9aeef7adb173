//! HTTP collaborators: Ollama generation, Google Custom Search, Tomorrow.io
//! weather. Request/response plumbing only; no state machines live here.

pub mod ollama;
pub mod search;
pub mod weather;

use reqwest::Client;
use std::sync::LazyLock;
use std::time::Duration;

pub(crate) static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

//! App state and background workers.
//!
//! Each outbound query runs on its own short-lived thread with a fresh tokio
//! runtime; the result comes back over an mpsc channel polled from the UI
//! thread, so transcript mutation is always serialized there.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use providers::ollama::OllamaClient;
use providers::search::SearchClient;
use providers::weather::WeatherClient;
use session::controller::{
    build_llm_prompt, build_search_prompt, clean_response, LLM_FALLBACK, SEARCH_FALLBACK,
};
use session::{QueryMode, SessionController};
use shared::config::{AppSettings, SearchSettings, WeatherSettings};
use tracing::debug;

use crate::theme::Theme;

/// Outcome of one query turn, reported by a worker thread.
pub struct TurnResult {
    pub reply: Option<String>,
    /// Raw search results shown under the search tag (web mode only).
    pub search_results: Option<String>,
    pub error: Option<String>,
}

/// Outcome of a weather command.
pub struct WeatherResult {
    pub report: Option<String>,
    pub error: Option<String>,
}

pub struct AppState {
    pub controller: SessionController,
    pub settings: AppSettings,
    pub theme: Theme,
    pub input_text: String,
    pub transcript_visible: bool,
    pub turn_rx: Option<Receiver<TurnResult>>,
    pub weather_rx: Option<Receiver<WeatherResult>>,
}

impl AppState {
    pub fn new(controller: SessionController, settings: AppSettings, theme: Theme) -> Self {
        Self {
            controller,
            settings,
            theme,
            input_text: String::new(),
            transcript_visible: true,
            turn_rx: None,
            weather_rx: None,
        }
    }

    /// Non-blocking poll for a finished query turn.
    pub fn poll_turn_result(&mut self) {
        let Some(rx) = &self.turn_rx else { return };
        if let Ok(result) = rx.try_recv() {
            self.turn_rx = None;
            if let Some(results) = &result.search_results {
                self.controller.render_search_results(results);
            }
            match (result.reply, result.error) {
                (Some(reply), None) => self.controller.complete_turn(&reply),
                (_, Some(error)) => self.controller.fail_turn(&error),
                (None, None) => self.controller.complete_turn(LLM_FALLBACK),
            }
        }
    }

    /// Non-blocking poll for a finished weather command.
    pub fn poll_weather_result(&mut self) {
        let Some(rx) = &self.weather_rx else { return };
        if let Ok(result) = rx.try_recv() {
            self.weather_rx = None;
            match (result.report, result.error) {
                (Some(report), None) => self.controller.render_system(&report),
                (_, Some(error)) => self.controller.render_error(&error),
                (None, None) => {}
            }
        }
    }

    pub fn waiting(&self) -> bool {
        self.turn_rx.is_some() || self.weather_rx.is_some()
    }

    /// Spawn a worker for a query turn. History lines are captured now so the
    /// worker never touches session state.
    pub fn start_query(&mut self, mode: QueryMode, text: String) {
        let history = self.controller.context_lines();
        let config = self.controller.config().clone();
        let search_settings = self.settings.search.clone();
        let (tx, rx) = channel();
        self.turn_rx = Some(rx);
        thread::spawn(move || run_query(mode, text, history, config, search_settings, tx));
    }

    pub fn start_weather(&mut self, location: Option<String>) {
        let settings = self.settings.weather.clone();
        let (tx, rx) = channel();
        self.weather_rx = Some(rx);
        thread::spawn(move || run_weather(location, settings, tx));
    }
}

/// Run one outbound query to completion or failure on a worker thread.
/// No retries; a failed request is terminal for the turn.
pub fn run_query(
    mode: QueryMode,
    text: String,
    history: Vec<String>,
    config: shared::config::AssistantConfig,
    search_settings: SearchSettings,
    tx: Sender<TurnResult>,
) {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let _ = tx.send(TurnResult {
                reply: None,
                search_results: None,
                error: Some(format!("Failed to start async runtime: {e}")),
            });
            return;
        }
    };

    let ollama = OllamaClient::new(config.ollama_base_url.clone(), config.model.clone());
    let result = rt.block_on(async {
        match mode {
            QueryMode::Llm => {
                let prompt = build_llm_prompt(&config.system_prompt, &history, &text);
                let raw = ollama.generate(&prompt).await?;
                let reply = clean_response(&raw);
                let reply = if reply.is_empty() { LLM_FALLBACK.to_string() } else { reply };
                Ok::<(String, Option<String>), shared::error::QueryError>((reply, None))
            }
            QueryMode::WebSearch => {
                let results = SearchClient::new(search_settings).search(&text).await?;
                let prompt = build_search_prompt(&config.system_prompt, &history, &text, &results);
                debug!("sending LLM request with web search results");
                let raw = ollama.generate(&prompt).await?;
                let reply = clean_response(&raw);
                let reply = if reply.is_empty() { SEARCH_FALLBACK.to_string() } else { reply };
                Ok((reply, Some(results)))
            }
        }
    });

    let turn = match result {
        Ok((reply, search_results)) => TurnResult {
            reply: Some(reply),
            search_results,
            error: None,
        },
        Err(e) => TurnResult {
            reply: None,
            search_results: None,
            error: Some(e.to_string()),
        },
    };
    let _ = tx.send(turn);
}

pub fn run_weather(
    location: Option<String>,
    settings: WeatherSettings,
    tx: Sender<WeatherResult>,
) {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let _ = tx.send(WeatherResult {
                report: None,
                error: Some(format!("Failed to start async runtime: {e}")),
            });
            return;
        }
    };

    let client = WeatherClient::new(settings);
    let result = rt.block_on(client.realtime(location.as_deref()));
    let outcome = match result {
        Ok(report) => WeatherResult {
            report: Some(report),
            error: None,
        },
        Err(e) => WeatherResult {
            report: None,
            error: Some(format!("{e:#}")),
        },
    };
    let _ = tx.send(outcome);
}

use eframe::egui;
use parking_lot::Mutex;
use providers::search::SearchClient;
use session::memory::{MemoryLimits, MemoryStore};
use session::{Dispatch, SessionController};
use shared::config::AppSettings;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

mod state;
mod theme;

use state::AppState;
use theme::{DARK, LIGHT};

fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "Sidekick", "Sidekick").map(|proj| {
        let dir = proj.config_dir().to_path_buf();
        let _ = fs::create_dir_all(&dir);
        dir
    })
}

fn load_settings_or_default() -> AppSettings {
    if let Some(dir) = config_dir() {
        let path = dir.join("settings.json");
        if path.exists() {
            if let Ok(bytes) = fs::read(&path) {
                if let Ok(settings) = serde_json::from_slice::<AppSettings>(&bytes) {
                    return settings;
                }
            }
            warn!("settings file unreadable, using defaults");
        }
    }
    AppSettings::default()
}

fn memory_path() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("conversation_memory.json")
}

/// Fire-and-forget startup check of the search credentials; web mode still
/// toggles either way, it just fails per turn until configured.
fn probe_search_api(settings: shared::config::SearchSettings) {
    std::thread::spawn(move || {
        let Ok(rt) = tokio::runtime::Runtime::new() else { return };
        if !rt.block_on(SearchClient::new(settings).probe()) {
            warn!("Google Search API test failed; web search mode may not work correctly");
        }
    });
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings_or_default();
    let config = settings.assistant.clone();
    let memory = MemoryStore::new(
        memory_path(),
        MemoryLimits {
            max_conversations: config.memory_max_conversations,
            max_messages: config.memory_max_messages,
            min_message_length: config.min_message_length,
        },
    );
    memory.log_startup_summary();
    probe_search_api(settings.search.clone());

    let theme = if settings.dark_mode { DARK } else { LIGHT };
    let controller = SessionController::new(config, memory);
    let state = Arc::new(Mutex::new(AppState::new(controller, settings, theme)));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([600.0, 500.0])
            .with_min_inner_size([400.0, 200.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        "Sidekick",
        options,
        Box::new(move |_cc| Box::new(SidekickApp { state })),
    )
}

struct SidekickApp {
    state: Arc<Mutex<AppState>>,
}

impl SidekickApp {
    fn submit(s: &mut AppState) {
        let text = std::mem::take(&mut s.input_text);
        match s.controller.submit_user_text(&text) {
            Dispatch::Ignored | Dispatch::Handled => {}
            Dispatch::Weather { location } => s.start_weather(location),
            Dispatch::Query { mode, text } => s.start_query(mode, text),
        }
    }

    fn transcript_job(s: &AppState) -> egui::text::LayoutJob {
        let mut job = egui::text::LayoutJob::default();
        for (tag, text) in s.controller.transcript().blocks() {
            job.append(
                text,
                0.0,
                egui::TextFormat {
                    color: s.theme.color_for(tag),
                    ..Default::default()
                },
            );
        }
        job
    }
}

impl eframe::App for SidekickApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut s = self.state.lock();

        s.poll_turn_result();
        s.poll_weather_result();
        if s.waiting() {
            ctx.request_repaint();
        }

        // Ctrl+R resets (wiping memory, as the hotkey always has);
        // Ctrl+/ toggles the transcript.
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::R)) {
            s.controller.reset(true);
        }
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::Slash)) {
            s.transcript_visible = !s.transcript_visible;
        }

        let theme = s.theme;
        egui::TopBottomPanel::bottom("input_row")
            .frame(egui::Frame::default().fill(theme.input_bg).inner_margin(8.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let send = ui
                        .add_enabled(!s.controller.is_pending(), egui::Button::new("Send"));
                    let mode = ui.button(s.controller.mode().label());
                    let theme_btn = ui.button(theme.icon());
                    let input = ui.add_sized(
                        ui.available_size(),
                        egui::TextEdit::singleline(&mut s.input_text)
                            .hint_text("Type your message and press Enter"),
                    );

                    let entered =
                        input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if (send.clicked() || entered) && !s.controller.is_pending() {
                        Self::submit(&mut s);
                        input.request_focus();
                    }
                    if mode.clicked() {
                        s.controller.toggle_mode();
                    }
                    if theme_btn.clicked() {
                        s.theme = s.theme.toggled();
                        s.settings.dark_mode = s.theme == DARK;
                    }
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(theme.bg).inner_margin(10.0))
            .show(ctx, |ui| {
                if !s.transcript_visible {
                    return;
                }
                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        ui.label(Self::transcript_job(&s));
                    });
            });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let mut s = self.state.lock();
        s.controller.shutdown();
        if let Some(dir) = config_dir() {
            if let Ok(json) = serde_json::to_string_pretty(&s.settings) {
                let _ = fs::write(dir.join("settings.json"), json);
            }
        }
    }
}

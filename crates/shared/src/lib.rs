pub mod chat {
    use serde::{Deserialize, Serialize};

    /// Who produced a message. Serialized lowercase in the memory file.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        Assistant,
        System,
    }

    /// A single exchanged message. Immutable once appended to a store.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: Role,
        pub content: String,
    }

    impl ChatMessage {
        pub fn new(role: Role, content: impl Into<String>) -> Self {
            Self {
                role,
                content: content.into(),
            }
        }
    }
}

pub mod config {
    use serde::{Deserialize, Serialize};

    /// Core assistant configuration, injected at construction.
    /// No process-wide globals; every consumer gets an explicit copy.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AssistantConfig {
        /// Ollama model name, e.g. "llama3.1"
        pub model: String,
        /// Base URL of the Ollama server
        pub ollama_base_url: String,
        /// System instruction prepended to every outbound prompt
        pub system_prompt: String,
        /// Number of recent messages included verbatim in outbound prompts
        pub context_window: usize,
        /// Messages at or below this length are not persisted to memory
        pub min_message_length: usize,
        /// Hard cap on stored conversations after every save
        pub memory_max_conversations: usize,
        /// Per-conversation message cap (most recent kept)
        pub memory_max_messages: usize,
        /// Save memory every N substantial user messages
        pub save_interval: usize,
    }

    impl Default for AssistantConfig {
        fn default() -> Self {
            Self {
                model: "llama3.1".into(),
                ollama_base_url: "http://localhost:11434".into(),
                system_prompt: "You are an AI assistant designed to help users with a wide range of tasks. "
                    .into(),
                context_window: 10,
                min_message_length: 10,
                memory_max_conversations: 5,
                memory_max_messages: 20,
                save_interval: 5,
            }
        }
    }

    /// Google Custom Search credentials. Both must be set for web mode to work.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct SearchSettings {
        pub api_key: Option<String>,
        pub engine_id: Option<String>,
    }

    /// Tomorrow.io realtime weather settings.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct WeatherSettings {
        pub api_key: Option<String>,
        pub latitude: f64,
        pub longitude: f64,
        pub city: String,
    }

    impl Default for WeatherSettings {
        fn default() -> Self {
            Self {
                api_key: None,
                latitude: 0.0,
                longitude: 0.0,
                city: "Your City".into(),
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppSettings {
        #[serde(default)]
        pub assistant: AssistantConfig,
        #[serde(default)]
        pub search: SearchSettings,
        #[serde(default)]
        pub weather: WeatherSettings,
        #[serde(default = "default_true")]
        pub dark_mode: bool,
    }

    fn default_true() -> bool {
        true
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                assistant: AssistantConfig::default(),
                search: SearchSettings::default(),
                weather: WeatherSettings::default(),
                dark_mode: true,
            }
        }
    }
}

pub mod error {
    use thiserror::Error;

    /// Failure kinds for an outbound query turn. Every variant routes through
    /// the pending tracker's `fail` transition so the placeholder is removed.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum QueryError {
        #[error("Could not connect to Ollama server. Is it running at {0}?")]
        Connection(String),
        #[error("HTTP error from Ollama server: {0}")]
        Http(String),
        #[error("{0}")]
        SearchUnavailable(String),
        #[error("{0}")]
        Unexpected(String),
    }
}

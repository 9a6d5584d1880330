use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::time::Duration;
use testing_tools::auth::Credentials;
use testing_tools::scenarios::ScenarioSettings;
use testing_tools::snapshot::SettlePolicy;

/// Default base URL of the task-management backend under test.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// The project every run creates its tasks in.
pub const DEFAULT_PROJECT_NAME: &str = "teste";

const DEFAULT_CHAT_MESSAGE: &str = "Criar as seguintes tarefas no projeto teste: \
    Avaliar Desempenho de Fornecedores, Atualizar Documentação Técnica de Projetos, \
    Planejar Ações de Endomarketing";

const DEFAULT_CONFIRMATION_MESSAGE: &str = "Sim, confirmo. Execute a ação.";

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Base URL of the backend (e.g. http://localhost:8080)
    #[arg(short, long, env, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Username used to sign in to the backend
    #[arg(long, env, default_value = "admlucas")]
    login_username: String,

    /// Password used to sign in to the backend
    #[arg(long, env, default_value = "123456", hide_default_value = true)]
    login_password: String,

    /// Name of the project the scenario creates tasks in (matched case-insensitively)
    #[arg(long, env, default_value = DEFAULT_PROJECT_NAME)]
    pub project_name: String,

    /// Natural-language instruction sent to the AI chat endpoint
    #[arg(long, env, default_value = DEFAULT_CHAT_MESSAGE)]
    pub chat_message: String,

    /// Reply sent when the AI chat asks for confirmation without a pending action
    #[arg(long, env, default_value = DEFAULT_CONFIRMATION_MESSAGE)]
    pub confirmation_message: String,

    /// Milliseconds to wait after creating tasks before polling the task list
    #[arg(long, env, default_value_t = 3000)]
    pub settle_delay_ms: u64,

    /// Initial interval in milliseconds between task list polls
    #[arg(long, env, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: u64,

    /// Upper bound in milliseconds for the backed-off poll interval
    #[arg(long, env, default_value_t = 4000, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_max_interval_ms: u64,

    /// Give up waiting for the task list to settle after this many milliseconds
    #[arg(long, env, default_value_t = 15000)]
    pub settle_timeout_ms: u64,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.login_username, &self.login_password)
    }

    pub fn settle_policy(&self) -> SettlePolicy {
        SettlePolicy {
            initial_delay: Duration::from_millis(self.settle_delay_ms),
            interval: Duration::from_millis(self.poll_interval_ms),
            max_interval: Duration::from_millis(self.poll_max_interval_ms),
            timeout: Duration::from_millis(self.settle_timeout_ms),
        }
    }

    pub fn scenario_settings(&self) -> ScenarioSettings {
        ScenarioSettings {
            credentials: self.credentials(),
            project_name: self.project_name.clone(),
            chat_message: self.chat_message.clone(),
            confirmation_message: self.confirmation_message.clone(),
            settle: self.settle_policy(),
        }
    }
}

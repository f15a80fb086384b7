// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use lingobatch::app_config::{Config, LogLevel, TranslationProvider};
use lingobatch::app_controller::{Controller, RunOptions};
use lingobatch::translation::Dictionary;

const DEFAULT_DICTIONARY_PATH: &str = "dictionary.json";

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Gemini,
    #[value(name = "openai")]
    OpenAI,
    #[value(name = "openrouter")]
    OpenRouter,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Gemini => TranslationProvider::Gemini,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::OpenRouter => TranslationProvider::OpenRouter,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a subtitle or text document (default command)
    Translate(TranslateArgs),

    /// Manage the find/replace dictionary applied to translations
    Dictionary {
        #[command(subcommand)]
        action: DictionaryAction,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,

        /// Dictionary file (overrides the configured path)
        #[arg(short, long)]
        dictionary: Option<PathBuf>,
    },

    /// Generate shell completions for lingobatch
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum DictionaryAction {
    /// List all rules in application order
    List,

    /// Add a rule, or update the replacement of an existing one
    Add {
        /// Word or phrase to replace (whole-word, case-insensitive)
        from: String,
        /// Replacement text
        to: String,
    },

    /// Remove the rule for a word
    Remove {
        from: String,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input subtitle (.srt) or text file
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    #[command(flatten)]
    options: TranslateOptions,
}

#[derive(Args, Debug, Clone)]
struct TranslateOptions {
    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Retry failed entries once after the main pass
    #[arg(long)]
    retry_failed: bool,

    /// Ask the model to refine translated entries after the main pass
    #[arg(long)]
    improve: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the selected provider
    #[arg(long, env = "LINGOBATCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Entries per request
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Output directory (defaults to the input file's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// lingobatch - batch translation of subtitles and long texts with LLMs
#[derive(Parser, Debug)]
#[command(name = "lingobatch")]
#[command(version)]
#[command(about = "Batch translation of subtitles and long texts with LLM providers")]
#[command(long_about = "lingobatch splits a subtitle or text file into entries, translates them in
sequential batches through an LLM provider and writes <name>.<lang>.<ext> next to the input.

EXAMPLES:
    lingobatch movie.srt                           # Translate using default config
    lingobatch -f movie.srt                        # Force overwrite existing output
    lingobatch -p openai -m gpt-4o movie.srt       # Use specific provider and model
    lingobatch -s en -t es notes.txt               # Translate a text file to Spanish
    lingobatch --retry-failed --improve movie.srt  # Retry failures, then refine
    lingobatch dictionary add Tom Thomas           # Always write 'Thomas' for 'Tom'
    lingobatch completions bash > lingobatch.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. API keys can also come from GEMINI_API_KEY,
    OPENAI_API_KEY or OPENROUTER_API_KEY.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input subtitle (.srt) or text file
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    #[command(flatten)]
    options: TranslateOptions,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Label and ANSI color for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "1;31"),
            Level::Warn => ("WARN ", "1;33"),
            Level::Info => ("INFO ", "1;32"),
            Level::Debug => ("DEBUG", "1;36"),
            Level::Trace => ("TRACE", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (label, color) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color,
                now,
                label,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Max level is lowered or raised once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "lingobatch", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Dictionary { action, config_path, dictionary }) => {
            run_dictionary(action, &config_path, dictionary)
        }
        Some(Commands::Translate(args)) => run_translate(args.input_path, args.options).await,
        None => {
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;
            run_translate(input_path, cli.options).await
        }
    }
}

/// Load the configuration file, creating it with defaults when missing
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .with_context(|| format!("Failed to open config file: {}", config_path))?;
        let config: Config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", config_path))?;
        return Ok(config);
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    let config_json = serde_json::to_string_pretty(&config)
        .context("Failed to serialize default config to JSON")?;
    std::fs::write(config_path, config_json)
        .with_context(|| format!("Failed to write default config to file: {}", config_path))?;

    Ok(config)
}

fn dictionary_path(config: &Config, override_path: Option<PathBuf>) -> PathBuf {
    override_path
        .or_else(|| config.dictionary_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DICTIONARY_PATH))
}

async fn run_translate(input_path: PathBuf, options: TranslateOptions) -> Result<()> {
    let mut config = load_or_create_config(&options.config_path)?;

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(api_key) = &options.api_key {
        config.translation.active_provider_config_mut().api_key = api_key.clone();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(batch_size) = options.batch_size {
        config.translation.common.batch_size = batch_size;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    config.validate().context("Configuration validation failed")?;

    config.dictionary_path = Some(dictionary_path(&config, None));

    if !input_path.is_file() {
        return Err(anyhow!("Input path is not a file: {:?}", input_path));
    }
    let output_dir = options.output_dir.clone().unwrap_or_else(|| {
        input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let controller = Controller::with_config(config)?;
    let run_options = RunOptions {
        force_overwrite: options.force_overwrite,
        retry_failed: options.retry_failed,
        improve: options.improve,
    };
    let summary = controller.run(input_path, output_dir, run_options).await?;

    if !summary.skipped() {
        info!("Final status: {}", summary.counts);
    }
    Ok(())
}

fn run_dictionary(action: DictionaryAction, config_path: &str, override_path: Option<PathBuf>) -> Result<()> {
    let config = if Path::new(config_path).exists() {
        load_or_create_config(config_path)?
    } else {
        Config::default()
    };
    log::set_max_level(config.log_level.to_level_filter());

    let path = dictionary_path(&config, override_path);
    let mut dictionary = Dictionary::load(&path)?;

    match action {
        DictionaryAction::List => {
            if dictionary.is_empty() {
                println!("Dictionary {} is empty", path.display());
            }
            for (index, rule) in dictionary.rules().enumerate() {
                println!("{:>3}. {} -> {}", index + 1, rule.from, rule.to);
            }
        }
        DictionaryAction::Add { from, to } => {
            dictionary.add_rule(from.as_str(), to.as_str())?;
            dictionary.save(&path)?;
            info!("Rule '{}' -> '{}' saved to {}", from.trim(), to, path.display());
        }
        DictionaryAction::Remove { from } => {
            if dictionary.remove_rule(&from) {
                dictionary.save(&path)?;
                info!("Rule '{}' removed from {}", from.trim(), path.display());
            } else {
                warn!("No rule for '{}' in {}", from.trim(), path.display());
            }
        }
    }

    Ok(())
}

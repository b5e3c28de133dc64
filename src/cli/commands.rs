use crate::config::{parse_provider, EmbedderKind};
use clap::{Args, Parser, Subcommand, ValueEnum};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

/// Local financial analysis: ledger tidying, knowledge base and model Q&A
#[derive(Parser, Debug)]
#[command(
    name = "finsight",
    about = "Prepare a personal finance knowledge base and query a local quantized model",
    version,
    author,
    long_about = "finsight turns monthly spreadsheet exports into a tidy ledger, writes \
                  year and category summaries, indexes them for retrieval and answers \
                  questions with a locally served GGUF model through an OpenAI-compatible \
                  endpoint such as llama-server."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run tidy, materialize and index",
        long_about = "Runs the whole data pipeline over a project root.\n\n\
                      Examples:\n  \
                      finsight run\n  \
                      finsight run ~/finance --embedder hashing\n  \
                      finsight run --format json"
    )]
    Run(StageArgs),

    #[command(about = "Convert raw exports in data/raw into the tidy dataset")]
    Tidy(StageArgs),

    #[command(about = "Write year and category documents into kb/raw")]
    Materialize(StageArgs),

    #[command(about = "Chunk and embed kb/raw into kb/index")]
    Index(StageArgs),

    #[command(
        about = "Find the knowledge-base chunks closest to a query",
        long_about = "Embeds the query with the index's model and prints the nearest chunks.\n\n\
                      Examples:\n  \
                      finsight search \"grocery spending 2023\"\n  \
                      finsight search \"rent\" -k 10 --format json"
    )]
    Search(SearchArgs),

    #[command(
        about = "Answer a question with the local model and retrieved context",
        long_about = "Retrieves the most relevant chunks and asks the model served at the \
                      configured endpoint to answer from them.\n\n\
                      Examples:\n  \
                      finsight ask \"How did my expenses change in 2023?\"\n  \
                      finsight ask \"Biggest category?\" --api-base http://127.0.0.1:8081/v1/"
    )]
    Ask(AskArgs),

    #[command(about = "Check this machine against the hardware requirements")]
    Doctor(DoctorArgs),

    #[command(about = "Probe the inference endpoint")]
    Health(HealthArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

/// Embedding backend overrides shared by commands that embed text
#[derive(Args, Debug, Clone, Default)]
pub struct EmbedderArgs {
    #[arg(long, value_parser = parse_embedder, help = "Embedding backend: bert or hashing")]
    pub embedder: Option<EmbedderKind>,

    #[arg(
        long,
        value_name = "REPO",
        help = "HuggingFace repository of the sentence embedding model"
    )]
    pub embedding_model: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct StageArgs {
    #[arg(
        value_name = "ROOT",
        help = "Project root holding data/ and kb/ (defaults to FINSIGHT_ROOT or .)"
    )]
    pub root: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[command(flatten)]
    pub embedding: EmbedderArgs,

    #[arg(long, value_name = "N", help = "Texts embedded per batch")]
    pub batch_size: Option<usize>,

    #[arg(long, value_name = "N", help = "Expense categories that get a narrative")]
    pub top_categories: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(value_name = "QUERY", help = "Search text")]
    pub query: String,

    #[arg(long, value_name = "ROOT", help = "Project root")]
    pub root: Option<PathBuf>,

    #[arg(short = 'k', long = "top-k", value_name = "N", help = "Number of chunks")]
    pub top_k: Option<usize>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[command(flatten)]
    pub embedding: EmbedderArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    #[arg(value_name = "QUESTION", help = "Question about your finances")]
    pub question: String,

    #[arg(long, value_name = "ROOT", help = "Project root")]
    pub root: Option<PathBuf>,

    #[arg(short = 'k', long = "top-k", value_name = "N", help = "Chunks given as context")]
    pub top_k: Option<usize>,

    #[arg(short = 'm', long, value_name = "MODEL", help = "Model name as served")]
    pub model: Option<String>,

    #[arg(
        short = 'p',
        long,
        value_parser = parse_adapter_kind,
        help = "genai adapter used for the endpoint (default openai)"
    )]
    pub provider: Option<AdapterKind>,

    #[arg(long, value_name = "URL", help = "OpenAI-compatible base URL")]
    pub api_base: Option<String>,

    #[arg(long, value_name = "SECONDS", help = "Request timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[command(flatten)]
    pub embedding: EmbedderArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DoctorArgs {
    #[arg(
        value_name = "ROOT",
        help = "Directory whose disk is checked for free space (defaults to FINSIGHT_ROOT or .)"
    )]
    pub root: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Args, Debug, Clone)]
pub struct HealthArgs {
    #[arg(long, value_name = "URL", help = "OpenAI-compatible base URL")]
    pub api_base: Option<String>,

    #[arg(long, value_name = "SECONDS", help = "Probe timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_adapter_kind(s: &str) -> Result<AdapterKind, String> {
    parse_provider(s).map_err(|_| {
        format!(
            "Invalid provider: {}. Valid options: openai, ollama, anthropic, gemini, xai, groq",
            s
        )
    })
}

fn parse_embedder(s: &str) -> Result<EmbedderKind, String> {
    s.parse::<EmbedderKind>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_run_args() {
        let args = CliArgs::parse_from(["finsight", "run"]);
        match args.command {
            Commands::Run(run_args) => {
                assert!(run_args.root.is_none());
                assert_eq!(run_args.format, OutputFormatArg::Human);
                assert!(run_args.embedding.embedder.is_none());
                assert!(run_args.embedding.embedding_model.is_none());
                assert!(run_args.batch_size.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_stage_with_options() {
        let args = CliArgs::parse_from([
            "finsight",
            "index",
            "/tmp/finance",
            "--embedder",
            "hashing",
            "--embedding-model",
            "BAAI/bge-small-en-v1.5",
            "--batch-size",
            "16",
            "-f",
            "json",
        ]);
        match args.command {
            Commands::Index(stage) => {
                assert_eq!(stage.root, Some(PathBuf::from("/tmp/finance")));
                assert_eq!(stage.embedding.embedder, Some(EmbedderKind::Hashing));
                assert_eq!(
                    stage.embedding.embedding_model.as_deref(),
                    Some("BAAI/bge-small-en-v1.5")
                );
                assert_eq!(stage.batch_size, Some(16));
                assert_eq!(stage.format, OutputFormatArg::Json);
            }
            _ => panic!("Expected Index command"),
        }
    }

    #[test]
    fn test_invalid_embedder_is_rejected() {
        let result = CliArgs::try_parse_from(["finsight", "run", "--embedder", "word2vec"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_search_command() {
        let args = CliArgs::parse_from(["finsight", "search", "rent 2022", "-k", "3"]);
        match args.command {
            Commands::Search(search) => {
                assert_eq!(search.query, "rent 2022");
                assert_eq!(search.top_k, Some(3));
                assert!(search.root.is_none());
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_ask_with_options() {
        let args = CliArgs::parse_from([
            "finsight",
            "ask",
            "Where did my money go?",
            "--provider",
            "llama-server",
            "--model",
            "finsight-q4_k_m",
            "--api-base",
            "http://127.0.0.1:8081/v1/",
            "--timeout",
            "30",
        ]);
        match args.command {
            Commands::Ask(ask) => {
                assert_eq!(ask.question, "Where did my money go?");
                assert_eq!(ask.provider, Some(AdapterKind::OpenAI));
                assert_eq!(ask.model.as_deref(), Some("finsight-q4_k_m"));
                assert_eq!(ask.api_base.as_deref(), Some("http://127.0.0.1:8081/v1/"));
                assert_eq!(ask.timeout, Some(30));
            }
            _ => panic!("Expected Ask command"),
        }
    }

    #[test]
    fn test_doctor_and_health() {
        let args = CliArgs::parse_from(["finsight", "doctor", "--format", "yaml"]);
        match args.command {
            Commands::Doctor(doctor) => assert_eq!(doctor.format, OutputFormatArg::Yaml),
            _ => panic!("Expected Doctor command"),
        }

        let args = CliArgs::parse_from(["finsight", "health"]);
        match args.command {
            Commands::Health(health) => {
                assert!(health.api_base.is_none());
                assert_eq!(health.format, OutputFormatArg::Human);
            }
            _ => panic!("Expected Health command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["finsight", "-v", "tidy"]);
        assert!(args.verbose);
        assert!(!args.quiet);

        let args = CliArgs::parse_from(["finsight", "tidy", "-q"]);
        assert!(args.quiet);

        let args = CliArgs::parse_from(["finsight", "--log-level", "debug", "config"]);
        assert_eq!(args.log_level, Some("debug".to_string()));

        assert!(CliArgs::try_parse_from(["finsight", "-v", "-q", "run"]).is_err());
    }

    #[test]
    fn test_adapter_kind_parsing() {
        assert!(parse_adapter_kind("openai").is_ok());
        assert!(parse_adapter_kind("ollama").is_ok());
        assert_eq!(parse_adapter_kind("claude"), Ok(AdapterKind::Anthropic));
        assert!(parse_adapter_kind("invalid").is_err());
    }
}

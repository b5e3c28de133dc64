pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{
    AskArgs, CliArgs, Commands, ConfigArgs, DoctorArgs, EmbedderArgs, HealthArgs,
    OutputFormatArg, SearchArgs, StageArgs,
};
pub use output::{OutputFormat, OutputFormatter};

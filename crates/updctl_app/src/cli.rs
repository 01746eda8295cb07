use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use updctl_core::{JobKind, TaskFilter};

#[derive(Parser, Debug)]
#[command(
    name = "updctl",
    author,
    version,
    about = "Monitor and control the stock data update jobs",
    long_about = None
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) global: GlobalArgs,
    /// Defaults to `watch`
    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct GlobalArgs {
    /// Backend API prefix, e.g. http://127.0.0.1:8000/api/stocks
    #[arg(long, global = true)]
    pub(crate) base_url: Option<String>,
    /// Config file (defaults to ./updctl.ron)
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,
    /// Progress poll interval in milliseconds
    #[arg(long, global = true)]
    pub(crate) interval_ms: Option<u64>,
    /// Where log output goes
    #[arg(long, value_enum, global = true)]
    pub(crate) log: Option<LogTarget>,
    /// off, error, warn, info, debug or trace
    #[arg(long, global = true, value_parser = parse_level)]
    pub(crate) log_level: Option<LevelFilter>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogTarget {
    File,
    Terminal,
    Both,
    Off,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobArg {
    Full,
    Queue,
}

impl From<JobArg> for JobKind {
    fn from(job: JobArg) -> Self {
        match job {
            JobArg::Full => JobKind::Full,
            JobArg::Queue => JobKind::Queue,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Live view with progress polling and interactive commands
    Watch,
    /// Print connection, data summary and job progress once
    Status,
    /// Trigger an incremental update run
    Run,
    /// Start a job
    Start { job: JobArg },
    /// Pause a running job, or resume it if paused
    Toggle { job: JobArg },
    /// Ask a job to stop
    Stop { job: JobArg },
    /// List queued tasks
    Tasks {
        #[arg(long = "type")]
        task_type: Option<String>,
        #[arg(long)]
        status: Option<String>,
        /// Substring of the task parameters
        #[arg(long)]
        param: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

fn parse_level(value: &str) -> Result<LevelFilter, String> {
    value
        .parse()
        .map_err(|_| format!("unknown log level: {value}"))
}

impl Command {
    pub(crate) fn is_interactive(&self) -> bool {
        matches!(self, Command::Watch)
    }
}

pub(crate) fn task_filter(
    task_type: Option<String>,
    status: Option<String>,
    param: Option<String>,
) -> TaskFilter {
    TaskFilter {
        task_type: task_type.unwrap_or_default(),
        status: status.unwrap_or_default(),
        param_contains: param.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_watch() {
        let cli = Cli::try_parse_from(["updctl", "--interval-ms", "1000"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.global.interval_ms, Some(1000));
    }

    #[test]
    fn task_flags_parse() {
        let cli = Cli::try_parse_from([
            "updctl", "tasks", "--type", "finance", "--status", "失败", "--page", "3",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Tasks {
                task_type: Some("finance".to_string()),
                status: Some("失败".to_string()),
                param: None,
                page: 3,
            })
        );
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "updctl",
            "stop",
            "queue",
            "--base-url",
            "http://backend:8000/api/stocks",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Command::Stop { job: JobArg::Queue }));
        assert_eq!(cli.global.log_level, Some(LevelFilter::Debug));
        assert_eq!(
            cli.global.base_url.as_deref(),
            Some("http://backend:8000/api/stocks")
        );
    }
}

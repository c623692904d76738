//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了CLI命令行接口。

use crate::config::Config;
use crate::strategy::StrategyKind;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "oxstrat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(name = "compare", about = "Run the standard workload against every configured strategy")]
    Compare(CompareArgs),

    #[command(name = "run", about = "Run the standard workload against a single strategy")]
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    #[arg(short, long, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Override the simulated store latency (ms)")]
    pub latency_ms: Option<u64>,

    #[arg(short, long, help = "Override the number of entries in the workload")]
    pub entries: Option<usize>,

    #[arg(short, long, help = "Output in JSON format")]
    pub json: bool,

    #[arg(short, long, help = "Print collected metrics after the run")]
    pub metrics: bool,
}

impl CommonArgs {
    /// 加载配置并应用命令行覆盖
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(latency_ms) = self.latency_ms {
            config.store.latency_ms = latency_ms;
        }
        if let Some(entries) = self.entries {
            config.harness.entries = entries;
        }

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(value_enum, help = "Strategy to run")]
    pub strategy: StrategyKind,

    #[command(flatten)]
    pub common: CommonArgs,
}

mod compare;

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Compare(args) => compare::execute(&args.common, None).await,
        Commands::Run(args) => compare::execute(&args.common, Some(args.strategy)).await,
    }
}

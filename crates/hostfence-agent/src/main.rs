//! hostfence 命令行入口

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hostfence_agent::config::{AgentConfig, Overrides};
use hostfence_agent::{commands, Agent};
use hostfence_controller::utils::format_duration;

/// 通过 Calico 策略在主机网卡上安装流量过滤规则
#[derive(Debug, Parser)]
#[command(name = "hostfence", version, about)]
struct Cli {
    /// 配置文件（YAML 或 JSON）
    #[arg(short, long, env = "HOSTFENCE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// 目标网卡
    #[arg(long, global = true)]
    iface: Option<String>,

    /// 地址文件，每行一个 CIDR
    #[arg(long, global = true)]
    addresses_file: Option<PathBuf>,

    /// 生成的伪随机主机地址数量
    #[arg(long, global = true)]
    count: Option<usize>,

    /// 伪随机地址的种子
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 安装过滤规则并输出耗时
    Setup,
    /// 移除过滤规则并输出逐项结果
    Cleanup,
    /// 输出全部清单，不访问集群
    Render,
    /// 安装后立即清理，输出安装耗时（微秒）
    Measure,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AgentConfig::load(cli.config.as_deref())
        .with_context(|| format!("无法加载配置: {:?}", cli.config))?;
    config.apply_overrides(Overrides {
        interface: cli.iface,
        addresses_file: cli.addresses_file,
        count: cli.count,
        seed: cli.seed,
    })?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let agent = Agent::new(config);
    let iface = agent.config().interface.clone();

    match cli.command {
        Command::Render => {
            print!("{}", agent.render()?);
        }
        Command::Setup => {
            let nets = agent.addresses()?;
            let mut controller = agent.controller().await?;
            let elapsed = commands::setup(&mut controller, &nets, &iface).await?;
            println!("setup time: {}", format_duration(elapsed));
        }
        Command::Cleanup => {
            let mut controller = agent.controller().await?;
            agent.adopt(&mut controller)?;
            let (report, result) = commands::cleanup(&mut controller).await;
            print!("{}", report);
            result?;
        }
        Command::Measure => {
            let nets = agent.addresses()?;
            info!("计时安装 {} 条地址", nets.len());
            let mut controller = agent.controller().await?;
            let (elapsed, report) = commands::measure(&mut controller, &nets, &iface).await?;
            println!("{}", elapsed.as_micros());
            if !report.is_clean() {
                eprint!("{}", report);
            }
        }
    }

    Ok(())
}

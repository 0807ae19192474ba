// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use page_spider::application::dto::crawl_request::StartCrawlDto;
use page_spider::application::use_cases::crawl_use_case::CrawlUseCase;
use page_spider::config::settings::{Settings, StorageBackend};
use page_spider::domain::models::session::CrawlMode;
use page_spider::domain::rules::RuleRegistry;
use page_spider::domain::services::crawl_controller::{CrawlController, StartOutcome};
use page_spider::infrastructure::database::connection;
use page_spider::infrastructure::metrics::init_metrics;
use page_spider::infrastructure::repositories::tender_repo_impl::TenderRepositoryImpl;
use page_spider::infrastructure::sinks::build_sink;
use page_spider::presentation::routes;
use page_spider::utils::telemetry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "page-spider",
    version,
    about = "Site-rule driven crawler for government procurement listing pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 爬取一个列表页并翻页直到结束
    Crawl(CrawlArgs),
    /// 运行数据库迁移并启动后端接口
    Serve,
    /// 列出已注册的站点规则
    Rules,
}

#[derive(Debug, Args)]
struct CrawlArgs {
    #[arg(value_name = "URL")]
    url: String,

    /// 列表项CSS选择器
    #[arg(long, value_name = "CSS")]
    selector: Option<String>,

    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    mode: ModeArg,

    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Auto,
    Custom,
}

impl From<ModeArg> for CrawlMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => CrawlMode::Auto,
            ModeArg::Custom => CrawlMode::Custom,
        }
    }
}

/// 主函数
///
/// 应用程序入口点，解析命令行并分派子命令
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new().context("failed to load configuration")?;
    telemetry::init_telemetry(&settings.log);

    match cli.command {
        Command::Crawl(args) => crawl(settings, args).await,
        Command::Serve => serve(settings).await,
        Command::Rules => {
            for rule in RuleRegistry::with_builtin_rules().rules() {
                println!(
                    "{}\t{:?}\t{}",
                    rule.name(),
                    rule.mode(),
                    rule.list_item_selector()
                );
            }
            Ok(())
        }
    }
}

async fn crawl(settings: Settings, args: CrawlArgs) -> anyhow::Result<()> {
    let db = match settings.sink.storage_backend {
        StorageBackend::Http => None,
        StorageBackend::Local | StorageBackend::HttpWithLocalFallback => Some(Arc::new(
            connection::connect_and_migrate(&settings.database).await?,
        )),
    };
    let sink = build_sink(&settings.sink, db)?;
    info!("Saving records through the {} sink", sink.name());

    let controller = CrawlController::new(sink, settings.crawl.controller_options());
    let use_case = CrawlUseCase::new(
        Arc::new(RuleRegistry::with_builtin_rules()),
        controller,
        Arc::new(settings.crawl.page_config()),
        &settings.crawl,
    );

    let dto = StartCrawlDto {
        url: args.url,
        selector: args.selector,
        delay_ms: args.delay_ms,
        mode: args.mode.into(),
        max_pages: args.max_pages,
    };

    let mut progress = use_case.subscribe();
    let reporter = tokio::spawn(async move {
        while let Ok(event) = progress.recv().await {
            info!(
                "[{:?}] 第 {} 页, 已爬取 {}, 已保存 {}: {}",
                event.phase,
                event.status.page_number,
                event.status.total_crawled,
                event.status.total_saved,
                event.message
            );
        }
    });

    if use_case.start(dto).await? == StartOutcome::AlreadyRunning {
        warn!("A crawl session is already running");
    }

    let wait = use_case.wait();
    tokio::pin!(wait);
    tokio::select! {
        _ = &mut wait => {}
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping after the current page");
            use_case.stop();
            wait.await;
        }
    }
    reporter.abort();

    let status = use_case.status();
    println!("{}", serde_json::to_string_pretty(&status)?);
    if let Some(error) = status.last_error {
        warn!("Last error: {}", error);
    }
    Ok(())
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    info!("Starting page-spider backend...");

    let metrics_addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.metrics_port)
        .parse()
        .context("invalid metrics address")?;
    init_metrics(metrics_addr);

    let db = Arc::new(connection::connect_and_migrate(&settings.database).await?);
    info!("Database connection established");

    let repository = Arc::new(TenderRepositoryImpl::new(db.clone()));
    let sink = build_sink(&settings.sink, Some(db))?;
    let controller = CrawlController::new(sink, settings.crawl.controller_options());
    let use_case = Arc::new(CrawlUseCase::new(
        Arc::new(RuleRegistry::with_builtin_rules()),
        controller,
        Arc::new(settings.crawl.page_config()),
        &settings.crawl,
    ));

    let app = routes::app(repository, use_case);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

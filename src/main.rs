use clap::Parser;
use opentrons_flow::utils::logger::{self, LogFormat};
use opentrons_flow::utils::validation::Validate;
use opentrons_flow::{CliConfig, Flow, FlowConfig, FlowError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 載入流程配置（日誌格式可能由配置決定，先載入再初始化日誌）
    let config = FlowConfig::from_file(&args.config);
    init_logging(&args, config.as_ref().ok());

    tracing::info!("🚀 Starting ot-flow");
    if args.verbose {
        tracing::debug!("CLI config: {:?}", args);
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load flow config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = args.validate().and_then(|_| config.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let event = match args.load_event() {
        Ok(event) => event,
        Err(e) => fail(e),
    };

    let execution_id = args
        .execution_id
        .clone()
        .unwrap_or_else(|| format!("flow_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")));

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No request will be sent");
        display_plan(&config, &args.nodes, &execution_id);
        return Ok(());
    }

    let flow = match Flow::from_config(&config) {
        Ok(flow) => flow,
        Err(e) => fail(e),
    };

    let outcome = flow.run_chain(&execution_id, &args.nodes, event).await;
    flow.close();

    match outcome {
        Ok(outcome) => {
            for step in &outcome.steps {
                tracing::info!("✅ {} ({}) in {} ms", step.node_id, step.node_type, step.duration_ms);
            }
            println!("{}", serde_json::to_string_pretty(&outcome.message)?);
        }
        Err(e) => fail(e),
    }

    Ok(())
}

fn init_logging(args: &CliConfig, config: Option<&FlowConfig>) {
    let logging = config.and_then(|c| c.logging.as_ref());
    let json = args.json_logs || logging.and_then(|l| l.format.as_deref()) == Some("json");

    let format = if json { LogFormat::Json } else { LogFormat::Compact };
    logger::init_logger(format, logging.and_then(|l| l.level.as_deref()), args.verbose);
}

fn display_plan(config: &FlowConfig, node_ids: &[String], execution_id: &str) {
    println!("📋 Flow: {} ({})", config.flow.name, execution_id);
    for (index, node_id) in node_ids.iter().enumerate() {
        match config.node(node_id) {
            Some(node) => println!(
                "  {}. {} [{}] → {}",
                index + 1,
                node_id,
                node.kind.type_name(),
                node.server.as_deref().unwrap_or("<no server>")
            ),
            None => println!("  {}. {} [unknown node]", index + 1, node_id),
        }
    }
}

fn fail(e: FlowError) -> ! {
    tracing::error!(
        "❌ Flow failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 依錯誤嚴重程度決定退出碼
    std::process::exit(e.severity().exit_code());
}

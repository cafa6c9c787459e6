use clap::Parser;
use ui_models::utils::error::ErrorSeverity;
use ui_models::utils::{logger, validation::Validate};
use ui_models::{CliConfig, DocumentRunner, ModelsConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting ui-models");
    tracing::debug!("CLI config: {:?}", args);

    if let Err(e) = args.validate() {
        tracing::error!("❌ Invalid arguments: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("📁 Loading models from: {}", args.config);
    let config = match ModelsConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load model file '{}': {}", args.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Model file validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if args.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    let runner = DocumentRunner::new(config)?;
    match runner.run().await {
        Ok(html) => match &args.output {
            Some(path) => {
                tokio::fs::write(path, &html).await?;
                tracing::info!("📁 Output saved to: {}", path);
            }
            None => println!("{}", html),
        },
        Err(e) => {
            tracing::error!(
                "❌ Render failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn print_dry_run(config: &ModelsConfig) {
    println!("🔍 DRY RUN: {}", config.document.name);
    if let Some(description) = &config.document.description {
        println!("   {}", description);
    }
    println!("Models:");
    for model in &config.models {
        let kind = match (&model.properties, model.is_template()) {
            (Some(_), true) => "template",
            (Some(_), false) => "static",
            (None, _) => "structural",
        };
        println!("  - {} ({}, {})", model.name, model.method, kind);
    }
    println!("Steps:");
    for (index, step) in config.steps.iter().enumerate() {
        let target = if step.target.is_empty() { "<root>" } else { step.target.as_str() };
        println!("  {}. {} -> {}", index + 1, step.model, target);
    }
}

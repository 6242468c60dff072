use clap::Parser;
use oca_ds_validator::core::ConfigProvider;
use oca_ds_validator::utils::error::OcaError;
use oca_ds_validator::utils::{logger, validation::Validate};
use oca_ds_validator::{CliConfig, LocalStorage, ValidationEngine, ValidatorSettings};

fn exit_with(e: &OcaError) -> ! {
    tracing::error!(
        "❌ Validation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = CliConfig::parse();

    // 初始化日誌
    if config.json_log {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting oca-ds-validator");

    // 載入設定檔
    if let Some(settings_path) = config.config.clone() {
        tracing::info!("📁 Loading settings from: {}", settings_path);
        let settings = ValidatorSettings::from_file(&settings_path)
            .and_then(|settings| settings.validate().map(|_| settings))
            .unwrap_or_else(|e| exit_with(&e));
        config.apply_settings(&settings);
    }
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let threshold = config.error_threshold();
    let column = config.column.clone();
    let first_error = config.first_error;

    let engine = ValidationEngine::new(LocalStorage::default(), config);
    let report = match engine.run().await {
        Ok(report) => report,
        Err(e) => exit_with(&e),
    };

    println!("{}", report.overview(threshold));

    if let Some(column) = column {
        println!();
        println!("{}", report.column_detail(&column));
    }
    if first_error {
        println!();
        println!("{}", report.first_error_column());
    }

    if !report.is_valid() {
        std::process::exit(report.exit_code());
    }
    Ok(())
}

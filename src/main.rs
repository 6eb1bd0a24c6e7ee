use std::collections::BTreeMap;

mod config;

#[tokio::main]
async fn main() -> doppler_secrets::Result<()> {
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", "info");
    env_logger::init_from_env(env);

    let mut args = std::env::args().skip(1);
    let config_file = args.next().ok_or("no config file specified")?;
    let secret_name = args.next();

    let config = config::read_config(&config_file)?;
    let client = config.build_client()?;

    log::info!(
        "Fetching secrets for project {} config {}...",
        client.project(),
        client.environment()
    );

    match secret_name {
        Some(name) => {
            let value = client.get_one(&name).await.map_err(|e| {
                log::error!("[{}] Failed to fetch secret: {}", &name, e);
                e
            })?;

            println!("{value}");
        }
        None => {
            let secrets = client.get_secrets().await.map_err(|e| {
                log::error!("Failed to fetch secrets: {e}");
                e
            })?;

            log::info!("Fetched {} secrets.", secrets.len());

            let sorted: BTreeMap<String, String> = secrets.into_iter().collect();
            let output = serde_json::to_string_pretty(&sorted)
                .map_err(|e| format!("Failed to encode secrets: {e}"))?;
            println!("{output}");
        }
    }

    Ok(())
}

use anyhow::{anyhow, Result};
use dnsclient::error::Error::UnsupportedRecordType;
use dnsclient::{Client, Config, Context, Resolver, SharedConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let mut args = std::env::args();
    let program_name = args.next().unwrap_or("dnsclient".to_string());
    let (config_file, record_type, hostname) = (args.next(), args.next(), args.next());

    let config = config_init(&program_name, config_file)?;
    let (Some(record_type), Some(hostname)) = (record_type, hostname) else {
        return Err(usage(&program_name));
    };

    let client = Client::from_config(&config);
    let ctx = Context::with_timeout(config.lookup_budget());
    tracing::debug!("looking up {record_type} for {hostname}");

    let lines = lookup(&client, &ctx, &record_type, &hostname).await?;
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

async fn lookup(
    client: &Client,
    ctx: &Context,
    record_type: &str,
    hostname: &str,
) -> Result<Vec<String>> {
    let lines = match record_type.to_ascii_uppercase().as_str() {
        "TXT" => {
            let (txts, authorities) = client.lookup_txt(ctx, hostname).await?;
            for authority in authorities {
                tracing::info!("authority: {authority}");
            }
            txts
        }
        "A" | "AAAA" | "HOST" => client
            .lookup_host(ctx, hostname)
            .await?
            .iter()
            .map(ToString::to_string)
            .collect(),
        "CAA" => client
            .lookup_caa(ctx, hostname)
            .await?
            .iter()
            .map(ToString::to_string)
            .collect(),
        "MX" => client.lookup_mx(ctx, hostname).await?,
        _ => return Err(UnsupportedRecordType(record_type.to_string()).into()),
    };
    Ok(lines)
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dnsclient=info".into()),
        )
        .init();
}

fn usage(program_name: &str) -> anyhow::Error {
    anyhow!("usage: {program_name} /path/to/config.json <TXT|HOST|CAA|MX> hostname")
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<SharedConfig> {
    match config_file {
        None => Err(usage(program_name)),
        Some(config_file) => {
            let config = Config::try_from_file(&config_file)?;
            tracing::debug!("loaded config from {config_file}");
            Ok(Arc::new(config))
        }
    }
}

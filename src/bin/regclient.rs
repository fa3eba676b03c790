use clap::Parser;
use regapi::config::ClientArgs;
use regapi::utils::logger;
use regapi::{RegClient, RegError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ClientArgs::parse();
    logger::init_cli_logger(args.verbose);

    let client = RegClient::new(&args.address)?;

    match fetch_report(&client, &args).await {
        Ok(body) => {
            println!("{}", body);
            Ok(())
        }
        Err(RegError::Api { status, body }) => {
            eprintln!("❌ error: {} code: {}", body.trim(), status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ error: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    }
}

async fn fetch_report(client: &RegClient, args: &ClientArgs) -> regapi::Result<String> {
    let token = client.login(&args.user, &args.pass).await?;
    tracing::debug!("Token obtained for {}", args.user);
    client.evaluations_raw(&token).await
}

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "regapi")]
#[command(about = "Student evaluation API backed by a directory service")]
pub struct ServerArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "regapi.toml")]
    pub config: String,

    /// Address to serve the API on, overrides server.address
    #[arg(short = 's', long)]
    pub address: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "regclient")]
#[command(about = "Fetch a student's evaluation report from regapi")]
pub struct ClientArgs {
    /// regapi server address, e.g. http://localhost:8081
    #[arg(short = 'a', long)]
    pub address: String,

    /// User name
    #[arg(short, long)]
    pub user: String,

    /// Password
    #[arg(short, long)]
    pub pass: String,

    #[arg(short, long)]
    pub verbose: bool,
}

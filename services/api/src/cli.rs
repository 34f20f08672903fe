use crate::demo::{run_demo, run_salary, DemoArgs, SalaryArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use jobpost_wizard::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Job Posting Wizard",
    about = "Serve or demonstrate the job posting creation wizard",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk a posting through every wizard step against in-memory collaborators
    Demo(DemoArgs),
    /// Print the monthly-equivalent salary used for visa matching
    Salary(SalaryArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Editor whose draft slot the service reads and writes
    #[arg(long, default_value = "default")]
    pub(crate) editor: String,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or_else(|| {
        Command::Serve(ServeArgs {
            editor: "default".to_string(),
            ..ServeArgs::default()
        })
    });

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args).await,
        Command::Salary(args) => run_salary(args),
    }
}

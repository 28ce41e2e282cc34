use std::process::ExitCode;

use clap::Parser;
use featdb::cli::SubCommandExtend;
use featdb::config::{Opts, SubCommand};
use log::error;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let opts = Opts::parse();
    let result = match &opts.subcmd {
        SubCommand::Ingest(config) => config.run(&opts).await,
        SubCommand::Show(config) => config.run(&opts).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

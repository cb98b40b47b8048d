use clap::Parser;
use log::debug;

use lostfound::Opts;
use lostfound::cli::SubCommandExtend;
use lostfound::config::SubCommand;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let opts = Opts::parse();
    debug!("使用数据库: {}", opts.database.display());

    match &opts.subcmd {
        SubCommand::Server(config) => config.run(&opts).await,
        SubCommand::Search(config) => config.run(&opts).await,
        SubCommand::Import(config) => config.run(&opts).await,
    }
}

use std::{path::PathBuf, process};

use structopt::StructOpt;
use tokio::signal;
use tracing_subscriber::*;

use fedreg_server::{
    rest,
    services::TrainingService,
    settings::Settings,
    storage::MemoryStorage,
};

#[macro_use]
extern crate tracing;

#[derive(Debug, StructOpt)]
#[structopt(name = "Registry")]
struct Opt {
    /// Path of the configuration file
    #[structopt(short, parse(from_os_str))]
    config_path: PathBuf,
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();

    let settings = Settings::new(opt.config_path).unwrap_or_else(|err| {
        eprintln!("{}", err);
        process::exit(1);
    });
    let Settings {
        api: api_settings,
        log: log_settings,
        auth: auth_settings,
    } = settings;

    let _fmt_subscriber = FmtSubscriber::builder()
        .with_env_filter(log_settings.filter)
        .with_ansi(true)
        .init();

    let storage = MemoryStorage::new();
    let service = TrainingService::new(storage, auth_settings.admins);

    info!("starting registry on {}", api_settings.bind_address);
    tokio::select! {
        _ = rest::serve(api_settings, service) => {
            warn!("shutting down: REST server terminated");
        }
        _ = signal::ctrl_c() => {}
    }
}

//! annatel-plus - run the Annatel+ refresh loop against a standalone host

use std::process::ExitCode;
use std::sync::Arc;

use annatel_plus::config::AppConfig;
use annatel_plus::context::AddonContext;
use annatel_plus::host::Host;
use annatel_plus::local_host::LocalHost;
use annatel_plus::plugin::Plugin;
use log::{error, info};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load();
    config.save();

    let root = config.host_root();
    info!("Host root: {}", root.display());
    let host: Arc<dyn Host> = Arc::new(LocalHost::new(&root).interactive(true));

    let ctx = match AddonContext::new(host, config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let handle = match Plugin::new(ctx).start() {
        Ok(handle) => handle,
        Err(e) => {
            error!("Startup aborted: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stopper = handle.stopper();
    if let Err(e) = ctrlc::set_handler(move || stopper.stop()) {
        error!("Cannot install Ctrl-C handler: {}", e);
    }

    handle.join();
    ExitCode::SUCCESS
}

use anyhow::Context;
use webmirror::domain::config::MirrorConfig;
use webmirror::kernel::config::load_config;
use wm_logger::Logger;
use wm_runtime::RuntimeConfig;
use wm_server::Server;

fn main() -> anyhow::Result<()> {
    let cfg: MirrorConfig =
        load_config(Some("server")).context("Critical: Configuration is malformed")?;

    let mut logger = Logger::builder(env!("CARGO_PKG_NAME"));
    if let Some(dir) = &cfg.logging.dir {
        logger = logger.path(dir);
    }
    if let Some(filter) = &cfg.logging.filter {
        logger = logger.env_filter(filter);
    }
    let _log = logger.init()?;

    let runtime = wm_runtime::build_runtime_with_config(&RuntimeConfig::high_performance())?;
    runtime.block_on(async { Server::builder().config(cfg).build().await?.run().await })
}

use anyhow::Result;

use boxdance::{config::AppConfig, window};

fn main() -> Result<()> {
    pretty_env_logger::init();

    pollster::block_on(window::run(AppConfig::default()))?;

    Ok(())
}

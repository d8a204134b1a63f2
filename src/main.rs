use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cfg = act_stage::config::Config::parse();
    if cfg.list_devices {
        act_stage::audio::list_input_devices()?;
        return Ok(());
    }

    act_stage::app::run(cfg)
}

//! a compact disk i/o monitor.

use {
    clap::Parser,
    env_logger::{Builder, Env, Target},
    iotach::{App, Config, HeldLog},
    std::{fs::File, io},
};

type Error = Box<dyn std::error::Error>;

fn main() -> Result<(), Error> {
    let config = Config::parse();
    let held = HeldLog::default();
    init_logging(&config, &held)?;

    let result = App::new(config).run();

    // the terminal has been restored by now.
    held.release(&mut io::stderr())?;
    result?;

    Ok(())
}

/// logs to the configured log file, or holds records until the ui has exited.
fn init_logging(config: &Config, held: &HeldLog) -> Result<(), Error> {
    let mut logger = Builder::from_env(Env::default().default_filter_or("warn"));
    let target = match &config.log_file {
        Some(path) => Target::Pipe(Box::new(File::create(path)?)),
        None => Target::Pipe(Box::new(held.clone())),
    };
    logger.target(target).init();

    Ok(())
}

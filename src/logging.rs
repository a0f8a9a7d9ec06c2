use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

use crate::error::{AdversarialError, Result};

const PATTERN: &str = "{d(%H:%M:%S%.3f)} {h({l:<5})} {t} - {m}{n}";

/// Installs a stderr logger for binaries. Libraries only emit through `log`.
pub fn init_logging(level: LevelFilter) -> Result<()> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|err| AdversarialError::Config(format!("invalid logging config: {err}")))?;

    log4rs::init_config(config)
        .map_err(|err| AdversarialError::Config(format!("failed to install logger: {err}")))?;
    Ok(())
}

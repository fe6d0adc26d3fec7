use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required configuration field: {0}")]
    MissingField(&'static str),

    #[error("Event sink error: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, Error>;

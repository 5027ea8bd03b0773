use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("cannot derive flow key from packet: {0}")]
    FlowKey(String),

    #[error("invalid packet timestamp: {0}")]
    Timestamp(f64),

    #[error("feature `{field}` is not a finite number ({value})")]
    Coercion { field: &'static str, value: f64 },

    #[error("packet parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("processor {0}")]
    ProcessorState(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlowError>;

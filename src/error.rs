use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SignalError {
    #[error("sample window is empty, no decision possible")]
    EmptyWindow,
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("motion frame has {len} values, axis offset {offset} is out of range")]
    MissingAxis { offset: usize, len: usize },
    #[error("motion frame value at offset {offset} is not a finite number")]
    NonFinite { offset: usize },
    #[error("frame carries no known stream key")]
    UnknownFrame,
    #[error("invalid frame json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("vehicle rejected `{command}`: {reply}")]
    Rejected { command: String, reply: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

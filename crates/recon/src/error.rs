use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad suffixes, empty file name, etc.).
    ConfigValidation(String),
    /// Fuzzy threshold outside 0..=100.
    InvalidThreshold(i64),
    /// Required column absent from an input dataset.
    MissingColumn { dataset: String, column: String },
    /// IO error (file read, etc.).
    Io(String),
    /// A background batch panicked before producing a result.
    WorkerPanicked(String),
}

impl ReconError {
    pub fn missing_column(dataset: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            dataset: dataset.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InvalidThreshold(value) => {
                write!(f, "fuzzy threshold must be between 0 and 100, got {value}")
            }
            Self::MissingColumn { dataset, column } => {
                write!(f, "dataset '{dataset}': missing column '{column}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::WorkerPanicked(label) => write!(f, "batch '{label}' panicked"),
        }
    }
}

impl std::error::Error for ReconError {}

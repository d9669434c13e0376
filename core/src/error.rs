use thiserror::Error;

#[derive(Error, Debug)]
pub enum LevelError {
    #[error("No se encontraron las columnas: {concept}")]
    MissingColumn { concept: String },

    #[error("No se encontraron datos en el archivo")]
    EmptyDataset,

    #[error("Invalid config field '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type LevelResult<T> = Result<T, LevelError>;

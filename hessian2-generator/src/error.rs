use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// A concrete message has neither `java_class_name` nor `extend_args`.
    /// Fatal for the whole file being generated.
    #[error("message `{message}` must declare java_class_name or set extend_args")]
    MissingJavaClassName { message: String },

    #[error("parse error: {0}")]
    Parse(#[from] parser::ParseError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("file `{0}` is not in the descriptor pool")]
    UnknownFile(String),
}

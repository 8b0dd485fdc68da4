use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A request value could not be coerced to the type its column expects.
    #[error("invalid value for '{param}': {message}")]
    Validation { param: String, message: String },

    /// The request and the descriptor could not be reconciled into SQL.
    #[error("cannot compile query for '{resource}': {message}")]
    Compile { resource: String, message: String },

    #[error("invalid resource descriptor '{resource}': {message}")]
    Descriptor { resource: String, message: String },

    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("unbound SQL parameter '@{0}'")]
    UnboundParameter(String),

    #[error("failed to parse resource descriptors: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read resource descriptors: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn validation(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            param: param.into(),
            message: message.into(),
        }
    }

    pub(crate) fn compile(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Compile {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub(crate) fn descriptor(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Descriptor {
            resource: resource.into(),
            message: message.into(),
        }
    }
}

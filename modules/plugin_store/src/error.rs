use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginStoreError {
    #[error("plugin '{identifier}' is already installed")]
    Duplicate { identifier: String },

    #[error("remote backend selected but no base_url configured")]
    MissingBaseUrl,

    #[error("invalid plugin service url '{url}'")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("plugin service request failed")]
    Http(#[from] reqwest::Error),

    #[error("plugin service returned {status}: {body}")]
    Status { status: u16, body: String },
}

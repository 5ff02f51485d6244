use serde::{Deserialize, Serialize};
use thiserror::Error;
use zel_core::{protocol::ClientError as RpcError, ErrorSeverity, ResourceError};

/// Coarse class of a [`ClientError`], used by hosts to pick a reaction
/// (redirect to sign-in, inline message, toast, placeholder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Auth,
    Validation,
    Remote,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ClientError {
    /// No session, or the session was rejected.
    #[error("authentication required: {0}")]
    Auth(String),

    /// Input rejected before anything was sent.
    #[error("{0}")]
    Validation(String),

    /// Any failed read or write against the store.
    #[error("remote service error: {0}")]
    Remote(String),

    #[error("{0} not found")]
    NotFound(String),
}

impl ClientError {
    pub fn remote(error: impl std::fmt::Display) -> Self {
        ClientError::Remote(error.to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Auth(_) => ErrorKind::Auth,
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Remote(_) => ErrorKind::Remote,
            ClientError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Store failures travel as the serialized [`ClientError`] in the callback
/// context. `Remote` marks an infrastructure failure.
impl From<ClientError> for ResourceError {
    fn from(error: ClientError) -> Self {
        let severity = match error {
            ClientError::Remote(_) => ErrorSeverity::Infrastructure,
            _ => ErrorSeverity::Application,
        };

        ResourceError::CallbackError {
            message: error.to_string(),
            severity,
            context: serde_json::to_value(&error).ok(),
        }
    }
}

/// Recovers the kind sent by the store. Transport errors and callbacks
/// without a readable context are `Remote`.
impl From<RpcError> for ClientError {
    fn from(error: RpcError) -> Self {
        match error {
            RpcError::Resource(ResourceError::CallbackError {
                message, context, ..
            }) => context
                .and_then(|context| serde_json::from_value(context).ok())
                .unwrap_or(ClientError::Remote(message)),
            other => ClientError::remote(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(ClientError::Auth("x".into()).kind(), ErrorKind::Auth);
        assert_eq!(ClientError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(ClientError::remote("boom").kind(), ErrorKind::Remote);
        assert_eq!(ClientError::NotFound("post".into()).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_messages() {
        assert_eq!(ClientError::NotFound("post".into()).to_string(), "post not found");
        assert_eq!(
            ClientError::remote("disk full").to_string(),
            "remote service error: disk full"
        );
    }

    #[test]
    fn test_kind_survives_rpc_error() {
        for error in [
            ClientError::Auth("unauthorized: not the author".into()),
            ClientError::validation("post content is empty"),
            ClientError::NotFound("comment".into()),
            ClientError::remote("fatal database error"),
        ] {
            let wire = serde_json::to_vec(&ResourceError::from(error.clone())).unwrap();
            let received: ResourceError = serde_json::from_slice(&wire).unwrap();

            assert_eq!(ClientError::from(RpcError::Resource(received)), error);
        }
    }

    #[test]
    fn test_untagged_rpc_errors_are_remote() {
        let plain = RpcError::Resource(ResourceError::app("handler failed"));
        assert_eq!(
            ClientError::from(plain),
            ClientError::Remote("handler failed".into())
        );

        let missing = RpcError::Resource(ResourceError::ServiceNotFound {
            service: "posts".into(),
        });
        assert_eq!(ClientError::from(missing).kind(), ErrorKind::Remote);

        let connection = RpcError::Connection("closed".into());
        assert_eq!(ClientError::from(connection).kind(), ErrorKind::Remote);
    }

    #[test]
    fn test_remote_is_infrastructure() {
        let infra = ResourceError::from(ClientError::remote("disk full"));
        assert_eq!(infra.severity(), ErrorSeverity::Infrastructure);

        let app = ResourceError::from(ClientError::Auth("no".into()));
        assert_eq!(app.severity(), ErrorSeverity::Application);
    }
}

pub mod domain;
pub mod ports;

pub use domain::{
    credential_id, hash_bytes, mime_allowed, AuthSession, Credential, Document, SessionPolicy,
    SessionState, User, ALLOWED_MIME_TYPES,
};
pub use ports::{
    AnalysisRun, AnalysisStatus, AuthStore, DocumentStore, KeywordAnalysisService, PortError,
    PortResult, TextExtractor,
};

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to read lookup context at {path}")]
    ContextLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse lookup context at {path}")]
    ContextParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode lookup context for {path}")]
    ContextEncode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write lookup context at {path}")]
    ContextWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Resolution ──
    #[error("no VPC named '{name}' found")]
    NetworkNotFound { name: String },

    #[error("VPC name '{name}' is ambiguous; matching ids: {}", ids.join(", "))]
    AmbiguousNetwork { name: String, ids: Vec<String> },

    #[error("no hosted zone named '{name}' found")]
    HostedZoneNotFound { name: String },

    #[error("hosted zone name '{name}' is ambiguous; matching ids: {}", ids.join(", "))]
    AmbiguousHostedZone { name: String, ids: Vec<String> },

    // ── Validation ──
    #[error("missing required setting `{field}`: {reason}")]
    MissingField { field: &'static str, reason: &'static str },

    #[error("invalid setting `{field}`: {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error(
        "certificate for '{domain}' must be issued in {expected} to be used by {consumer}, got {actual}"
    )]
    CertificateRegionMismatch {
        domain: String,
        consumer: &'static str,
        expected: String,
        actual: String,
    },

    #[error("service '{service}' listener on port {port} does not match its certificate binding")]
    ListenerMismatch { service: String, port: u16 },

    #[error("duplicate logical id '{0}'")]
    DuplicateLogicalId(String),

    #[error("'{from}' references '{to}', which is not a {expected} in this declaration")]
    DanglingReference {
        from: String,
        to: String,
        expected: &'static str,
    },

    #[error("distribution '{distribution}' has a duplicate or empty path pattern '{pattern}'")]
    InvalidPathPattern {
        distribution: String,
        pattern: String,
    },

    #[error("record '{record}' is not inside hosted zone '{zone}'")]
    RecordOutsideZone { record: String, zone: String },

    #[error("database '{database}' has an ingress rule other than the compute security group on port {port}")]
    IllegalDatabaseIngress { database: String, port: u16 },

    #[error("dependency cycle involving: {}", ids.join(", "))]
    DependencyCycle { ids: Vec<String> },
}

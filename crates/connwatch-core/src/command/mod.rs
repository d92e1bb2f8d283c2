// ── Command API ──
//
// Inbound requests name a command and optionally carry a payload. The
// registry below maps each name to its trusted schema and to the typed
// `Command` variant the session executes; validation happens entirely
// before a handler runs. Unknown names and schema violations never reach
// the replica or the remote binding.

mod schema;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::CoreError;
use crate::model::ObjectPath;
use schema::{Field, FieldKind, TrustedSchema, NO_DATA};

/// A structured request from the embedding caller (e.g. a UI layer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_data: Option<Value>,
}

impl CommandRequest {
    pub fn new(command_name: impl Into<String>) -> Self {
        Self {
            command_name: command_name.into(),
            command_data: None,
        }
    }

    pub fn with_data(command_name: impl Into<String>, command_data: Value) -> Self {
        Self {
            command_name: command_name.into(),
            command_data: Some(command_data),
        }
    }
}

/// All operations the session can execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetState,
    GetServices,
    GetTechnologies,
    GetHomePage,
    GetServicesFromTech { technology: ObjectPath },
    Connect { service: ObjectPath },
}

impl Command {
    /// The registry name of this command, echoed in its reply envelope.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetState => "get_state",
            Self::GetServices => "get_services",
            Self::GetTechnologies => "get_technologies",
            Self::GetHomePage => "get_home_page",
            Self::GetServicesFromTech { .. } => "get_services_from_tech",
            Self::Connect { .. } => "connect",
        }
    }
}

/// A successful command result, wrapped in the reply envelope
/// `{ "command_name": …, "data": … }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub command_name: &'static str,
    pub data: Value,
}

impl Reply {
    pub(crate) fn new(command_name: &'static str, data: Value) -> Self {
        Self { command_name, data }
    }
}

/// A command envelope sent through the command channel.
/// Contains the request and a oneshot reply channel.
pub(crate) struct CommandEnvelope {
    pub request: CommandRequest,
    pub reply_tx: oneshot::Sender<Result<Reply, CoreError>>,
}

// ── Registry ─────────────────────────────────────────────────────────

struct CommandSpec {
    name: &'static str,
    schema: TrustedSchema,
    build: fn(&CommandRequest) -> Result<Command, CoreError>,
}

const REGISTRY: &[CommandSpec] = &[
    CommandSpec {
        name: "get_state",
        schema: NO_DATA,
        build: |_| Ok(Command::GetState),
    },
    CommandSpec {
        name: "get_services",
        schema: NO_DATA,
        build: |_| Ok(Command::GetServices),
    },
    CommandSpec {
        name: "get_technologies",
        schema: NO_DATA,
        build: |_| Ok(Command::GetTechnologies),
    },
    CommandSpec {
        name: "get_home_page",
        schema: NO_DATA,
        build: |_| Ok(Command::GetHomePage),
    },
    CommandSpec {
        name: "get_services_from_tech",
        schema: TrustedSchema {
            fields: &[Field {
                name: "technology",
                kind: FieldKind::RemotePath,
            }],
        },
        build: |request| {
            Ok(Command::GetServicesFromTech {
                technology: required_path(request, "technology")?,
            })
        },
    },
    CommandSpec {
        name: "connect",
        schema: TrustedSchema {
            fields: &[Field {
                name: "service",
                kind: FieldKind::RemotePath,
            }],
        },
        build: |request| {
            Ok(Command::Connect {
                service: required_path(request, "service")?,
            })
        },
    },
];

/// Look up and validate a request, producing the typed command.
pub(crate) fn parse(request: &CommandRequest) -> Result<Command, CoreError> {
    let spec = REGISTRY
        .iter()
        .find(|spec| spec.name == request.command_name)
        .ok_or_else(|| CoreError::InvalidCommand {
            name: request.command_name.clone(),
        })?;

    schema::validate(&spec.schema, request.command_data.as_ref())?;
    (spec.build)(request)
}

fn required_path(request: &CommandRequest, field: &str) -> Result<ObjectPath, CoreError> {
    request
        .command_data
        .as_ref()
        .and_then(|data| data.get(field))
        .and_then(Value::as_str)
        .map(ObjectPath::new)
        .ok_or_else(|| CoreError::InvalidArgument {
            reason: format!("missing field \"{field}\""),
        })
}

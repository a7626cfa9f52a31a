use serde::{Deserialize, Serialize};

/// Body of `POST /v3/config/paths/add/{name}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathConfig {
    pub name: String,
    pub source: String,
}

/// A WebRTC session as reported by the relay
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveSession {
    pub id: String,
    pub created: String,
    pub remote_addr: String,
    pub peer_connection_established: bool,
    pub local_candidate: String,
    pub remote_candidate: String,
    pub state: String,
    /// Relay path the session reads from; matched against a stream uuid
    pub path: String,
    pub query: String,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// One page of `GET /v3/webrtcsessions/list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveSessionList {
    pub item_count: u64,
    pub page_count: u64,
    pub items: Vec<ActiveSession>,
}

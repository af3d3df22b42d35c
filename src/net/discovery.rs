/// Wire types shared between the DiscoveryEndpoint (C6), the
/// DiscoveryBroadcaster (C7), and the StdioProxy's active HTTP probing.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Debug, Clone)]
pub struct TransportInfo {
    #[serde(rename = "type")]
    pub transport_type: String,
    pub host: String,
    pub port: u16,
    pub path: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub transport: TransportInfo,
    pub network: NetworkInfo,
}

#[derive(Serialize, Debug, Clone)]
pub struct NetworkInfo {
    pub local_ip: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct ServiceInfo {
    pub capabilities: Vec<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct InstanceInfo {
    pub name: String,
    pub group: String,
    pub id: Uuid,
    pub pid: u32,
}

/// A single UDP datagram the broadcaster emits every `discovery_interval_secs`.
#[derive(Serialize, Debug, Clone)]
pub struct DiscoveryAnnouncement {
    #[serde(rename = "messageType")]
    pub message_type: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub server: ServerInfo,
    pub service: ServiceInfo,
    pub tools: Vec<String>,
    pub instance: InstanceInfo,
}

impl DiscoveryAnnouncement {
    pub fn new(
        server_name: &str,
        server_version: &str,
        host: &str,
        port: u16,
        tools: Vec<String>,
        instance_id: Uuid,
        instance_group: &str,
    ) -> Self {
        Self {
            message_type: "mcp_server_announce".to_string(),
            version: "1.0".to_string(),
            timestamp: Utc::now(),
            server: ServerInfo {
                name: server_name.to_string(),
                version: server_version.to_string(),
                transport: TransportInfo {
                    transport_type: "http".to_string(),
                    host: host.to_string(),
                    port,
                    path: "/mcp".to_string(),
                },
                network: NetworkInfo {
                    local_ip: host.to_string(),
                },
            },
            service: ServiceInfo {
                capabilities: vec!["tools".to_string()],
            },
            tools,
            instance: InstanceInfo {
                name: server_name.to_string(),
                group: instance_group.to_string(),
                id: instance_id,
                pid: std::process::id(),
            },
        }
    }
}

/// The body of `GET /discovery`, also what the StdioProxy parses when
/// probing a port range.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReply {
    pub mcp_endpoint: String,
    pub port: u16,
    pub host: String,
    pub network_visible: bool,
    pub process_id: u32,
    pub start_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announcement_serializes_expected_shape() {
        let announcement = DiscoveryAnnouncement::new(
            "spicesharp-mcp-server",
            "1.0.0",
            "127.0.0.1",
            8081,
            vec!["server_status".to_string()],
            Uuid::nil(),
            "default",
        );
        let v = serde_json::to_value(&announcement).unwrap();
        assert_eq!(v["messageType"], "mcp_server_announce");
        assert_eq!(v["server"]["transport"]["type"], "http");
        assert_eq!(v["server"]["transport"]["path"], "/mcp");
    }

    #[test]
    fn discovery_reply_round_trips() {
        let reply = DiscoveryReply {
            mcp_endpoint: "http://127.0.0.1:8081/mcp".to_string(),
            port: 8081,
            host: "127.0.0.1".to_string(),
            network_visible: false,
            process_id: 123,
            start_time: Utc::now(),
        };
        let json = serde_json::to_string(&reply).unwrap();
        let parsed: DiscoveryReply = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.port, 8081);
        assert_eq!(parsed.process_id, 123);
    }
}

//! Versioned services, their member resources and authentication state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::masters::{MasterDetails, MasterIds};
use crate::error::{ApiError, ApiResult};
use crate::query::value_matches;

pub const COLLECTION: &str = "services";
pub const RESOURCES_COLLECTION: &str = "resources";
pub const MONITORS_COLLECTION: &str = "monitors";

/// Aggregate service state derived from its resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    #[default]
    Initializing,
    #[serde(rename = "Authentication_Error")]
    AuthenticationError,
    /// Any state written by other console components.
    #[serde(untagged)]
    Other(String),
}

/// Per-resource authentication progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationState {
    #[default]
    Unauthenticated,
    Authenticating,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootstrapState {
    #[serde(rename = "bootStrapping")]
    BootStrapping,
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "failed")]
    Failed,
}

/// A provisioned node tracked under a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceResource {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ami: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_pair_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Value>,
    pub authentication: AuthenticationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_strap_state: Option<BootstrapState>,
    /// Fields written by other console components, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_service_type() -> String {
    "Service".to_string()
}

fn default_version() -> f64 {
    1.0
}

/// Stored service document. One document per version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(rename = "type", default = "default_service_type")]
    pub service_type: String,
    #[serde(default)]
    pub state: ServiceState,
    #[serde(default = "default_version")]
    pub version: f64,
    #[serde(default)]
    pub identifiers: Value,
    #[serde(default)]
    pub yml_file_id: Option<String>,
    #[serde(default)]
    pub master_details: MasterIds,
    #[serde(default)]
    pub resources: Vec<ServiceResource>,
    #[serde(default)]
    pub created_on: i64,
    #[serde(default)]
    pub updated_on: Option<i64>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceRecord {
    /// `Authentication_Error` if any resource failed, `Initializing` otherwise.
    #[must_use]
    pub fn aggregate_state(resources: &[ServiceResource]) -> ServiceState {
        if resources
            .iter()
            .any(|r| r.authentication == AuthenticationState::Failed)
        {
            ServiceState::AuthenticationError
        } else {
            ServiceState::Initializing
        }
    }

    #[must_use]
    pub fn resource(&self, resource_id: &str) -> Option<&ServiceResource> {
        self.resources.iter().find(|r| r.id == resource_id)
    }

    /// Updates one resource and recomputes the service state from all of them.
    ///
    /// Returns `false` when the resource is not part of this service.
    pub fn set_resource_state(
        &mut self,
        resource_id: &str,
        authentication: AuthenticationState,
        boot_strap_state: Option<BootstrapState>,
    ) -> bool {
        let Some(resource) = self.resources.iter_mut().find(|r| r.id == resource_id) else {
            return false;
        };
        resource.authentication = authentication;
        if boot_strap_state.is_some() {
            resource.boot_strap_state = boot_strap_state;
        }
        self.state = Self::aggregate_state(&self.resources);
        true
    }

    /// Version rendered with one decimal place (`"2.0"`).
    #[must_use]
    pub fn version_label(&self) -> String {
        format!("{:.1}", self.version)
    }
}

/// Service as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub desc: Option<String>,
    pub state: ServiceState,
    pub created_on: i64,
    pub updated_on: Option<i64>,
    pub version: String,
    pub master_details: MasterDetails,
    pub yml_file_name: Option<String>,
    pub yml_file_data: Option<String>,
}

/// Payload for registering a service or a new version of one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    /// Uploaded YAML descriptor to parse for a brand new service.
    #[serde(default)]
    pub file_id: Option<String>,
    /// Already-registered descriptor; creates the next version directly.
    #[serde(default)]
    pub yml_file_id: Option<String>,
    #[serde(default)]
    pub master_details: MasterIds,
    #[serde(default)]
    pub monitor_id: Option<String>,
}

/// Query filter for a service's resources. Every present key must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFilter {
    pub ami: Option<String>,
    pub ip: Option<String>,
    pub vpc: Option<String>,
    pub subnet: Option<String>,
    pub tags: Option<String>,
    pub key_pair_name: Option<String>,
    pub group: Option<String>,
    pub roles: Option<String>,
}

impl ResourceFilter {
    #[must_use]
    pub fn matches(&self, resource: &ServiceResource) -> bool {
        fn text(actual: Option<&String>, expected: Option<&String>) -> bool {
            expected.is_none_or(|e| actual == Some(e))
        }
        fn json(actual: Option<&Value>, expected: Option<&String>) -> bool {
            expected.is_none_or(|e| actual.is_some_and(|a| value_matches(a, e)))
        }

        text(resource.ami.as_ref(), self.ami.as_ref())
            && text(resource.ip.as_ref(), self.ip.as_ref())
            && text(resource.vpc.as_ref(), self.vpc.as_ref())
            && text(resource.subnet.as_ref(), self.subnet.as_ref())
            && text(resource.key_pair_name.as_ref(), self.key_pair_name.as_ref())
            && self
                .tags
                .as_ref()
                .is_none_or(|t| resource.tags.as_ref().is_some_and(|tags| tags_match(tags, t)))
            && json(resource.group.as_ref(), self.group.as_ref())
            && json(resource.roles.as_ref(), self.roles.as_ref())
    }
}

/// `key:value` matches an object tag; a bare value matches any tag value.
fn tags_match(tags: &Value, expected: &str) -> bool {
    match (tags, expected.split_once(':')) {
        (Value::Object(map), Some((key, value))) => {
            map.get(key).is_some_and(|v| value_matches(v, value))
        }
        (Value::Object(map), None) => map.values().any(|v| value_matches(v, expected)),
        _ => value_matches(tags, expected),
    }
}

/// Credentials submitted to authenticate a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeCredentials {
    #[serde(rename = "password")]
    Password { username: String, password: String },
    #[serde(rename = "pemFile", rename_all = "camelCase")]
    PemFile { username: String, pem_file_id: String },
}

impl NodeCredentials {
    /// Parses a request body into credentials.
    ///
    /// # Errors
    ///
    /// Returns a validation error on `credentials` for unknown types or
    /// missing fields.
    pub fn from_value(value: Value) -> ApiResult<Self> {
        serde_json::from_value(value).map_err(|err| {
            ApiError::validation("credentials", format!("Invalid Credential Type: {err}"))
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Password { username, .. } | Self::PemFile { username, .. } => username,
        }
    }
}

/// `resources` collection document describing the node itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub resource_details: ResourceDetails,
    #[serde(default)]
    pub authentication: AuthenticationState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceDetails {
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub os: Option<String>,
    pub boot_strap_state: Option<BootstrapState>,
}

impl ResourceRecord {
    /// Address used to reach the node: public IP first, then private.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.resource_details
            .public_ip
            .as_deref()
            .or(self.resource_details.private_ip.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(id: &str, auth: AuthenticationState) -> ServiceResource {
        ServiceResource {
            id: id.into(),
            authentication: auth,
            ..ServiceResource::default()
        }
    }

    fn service(resources: Vec<ServiceResource>) -> ServiceRecord {
        serde_json::from_value(json!({ "_id": "s1", "name": "web" }))
            .map(|mut s: ServiceRecord| {
                s.resources = resources;
                s
            })
            .unwrap()
    }

    #[test]
    fn failure_of_one_resource_marks_service_authentication_error() {
        let mut svc = service(vec![
            resource("r1", AuthenticationState::Authenticating),
            resource("r2", AuthenticationState::Success),
        ]);

        assert!(svc.set_resource_state("r1", AuthenticationState::Failed, None));
        assert_eq!(svc.state, ServiceState::AuthenticationError);
        assert_eq!(svc.resource("r2").unwrap().authentication, AuthenticationState::Success);
    }

    #[test]
    fn recovery_recomputes_to_initializing() {
        let mut svc = service(vec![resource("r1", AuthenticationState::Failed)]);
        svc.state = ServiceState::AuthenticationError;

        svc.set_resource_state(
            "r1",
            AuthenticationState::Success,
            Some(BootstrapState::BootStrapping),
        );
        assert_eq!(svc.state, ServiceState::Initializing);
        assert_eq!(
            svc.resource("r1").unwrap().boot_strap_state,
            Some(BootstrapState::BootStrapping)
        );
    }

    #[test]
    fn unknown_resource_is_reported() {
        let mut svc = service(vec![]);
        assert!(!svc.set_resource_state("missing", AuthenticationState::Failed, None));
    }

    #[test]
    fn state_round_trips_console_spelling() {
        assert_eq!(
            serde_json::to_value(ServiceState::AuthenticationError).unwrap(),
            json!("Authentication_Error")
        );
        let other: ServiceState = serde_json::from_value(json!("Running")).unwrap();
        assert_eq!(other, ServiceState::Other("Running".into()));
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let doc = json!({
            "_id": "s1",
            "name": "web",
            "monitorState": "green",
            "resources": [{ "id": "r1", "instanceState": "running" }]
        });
        let record: ServiceRecord = serde_json::from_value(doc).unwrap();
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["monitorState"], "green");
        assert_eq!(back["resources"][0]["instanceState"], "running");
        assert_eq!(back["resources"][0]["authentication"], "unauthenticated");
    }

    #[test]
    fn version_label_has_one_decimal() {
        let mut svc = service(vec![]);
        assert_eq!(svc.version_label(), "1.0");
        svc.version = 3.0;
        assert_eq!(svc.version_label(), "3.0");
    }

    #[test]
    fn resource_filter_requires_every_present_key() {
        let mut res = resource("r1", AuthenticationState::Unauthenticated);
        res.ip = Some("10.0.0.1".into());
        res.vpc = Some("vpc-1".into());
        res.tags = Some(json!({ "env": "prod", "team": "web" }));
        res.roles = Some(json!(["db", "cache"]));

        let by_ip = ResourceFilter {
            ip: Some("10.0.0.1".into()),
            ..ResourceFilter::default()
        };
        assert!(by_ip.matches(&res));

        let wrong_vpc = ResourceFilter {
            vpc: Some("vpc-2".into()),
            ..by_ip.clone()
        };
        assert!(!wrong_vpc.matches(&res));

        let tagged = ResourceFilter {
            tags: Some("env:prod".into()),
            roles: Some("cache".into()),
            ..ResourceFilter::default()
        };
        assert!(tagged.matches(&res));
    }

    #[test]
    fn credentials_reject_unknown_types() {
        let err = NodeCredentials::from_value(json!({ "type": "kerberos", "username": "u" })).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.attribute(), "credentials");

        let pem = NodeCredentials::from_value(json!({
            "type": "pemFile", "username": "ubuntu", "pemFileId": "f9"
        }))
        .unwrap();
        assert_eq!(pem.username(), "ubuntu");
    }

    #[test]
    fn resource_address_prefers_public_ip() {
        let record: ResourceRecord = serde_json::from_value(json!({
            "_id": "r1",
            "resourceDetails": { "publicIp": "54.1.1.1", "privateIp": "10.0.0.1" }
        }))
        .unwrap();
        assert_eq!(record.address(), Some("54.1.1.1"));
        assert_eq!(record.authentication, AuthenticationState::Unauthenticated);
    }
}

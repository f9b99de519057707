//! 認証連携（SSO / LDAP / ロールマッパー）の要求

use super::meta::{is_false, nullable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso: Option<SsoAuthConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldap: Option<LdapAuthConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_mapper: Option<RoleMapperAuthConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SsoAuthConfig {
    pub url: String,
    pub realm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub disable_ssl_cert_validation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clients: Option<SsoAuthClients>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SsoAuthClients {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console: Option<SsoAuthClient>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub servers: Vec<SsoAuthClient>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SsoAuthClient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname_http: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname_https: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LdapAuthConfig {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_dn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_credential: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_ctx_dn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles_ctx_dn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_filter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleMapperAuthConfig {
    pub roles_properties: String,
    #[serde(skip_serializing_if = "is_false")]
    pub replace_role: bool,
}

//! 認証連携の検証とテンプレート値の生成

use super::types::{
    AuthTemplate, LdapTemplate, RoleMapperTemplate, ServerTemplate, SsoClientTemplate, SsoTemplate,
};
use crate::error::{KieError, Result};
use crate::model::{AuthConfig, SsoAuthClient};
use tracing::debug;

/// 認証設定を解決
///
/// SSO と LDAP は同時に指定できない。
pub fn configure_auth(
    auth: &AuthConfig,
    console_client: &str,
    servers: &mut [ServerTemplate],
) -> Result<(AuthTemplate, SsoClientTemplate)> {
    if auth.sso.is_some() && auth.ldap.is_some() {
        return Err(KieError::AuthConfig(
            "SSO と LDAP を同時に設定することはできません".to_string(),
        ));
    }
    if auth.sso.is_none() && auth.ldap.is_none() && auth.role_mapper.is_none() {
        return Err(KieError::AuthConfig(
            "sso / ldap / roleMapper のいずれかを指定してください".to_string(),
        ));
    }

    let value = |v: &Option<String>| v.clone().unwrap_or_default();
    let mut template = AuthTemplate::default();
    let mut console = SsoClientTemplate::default();

    if let Some(sso) = &auth.sso {
        if sso.url.is_empty() || sso.realm.is_empty() {
            return Err(KieError::AuthConfig(
                "SSO には url と realm の指定が必須です".to_string(),
            ));
        }
        template.sso = SsoTemplate {
            enabled: true,
            url: sso.url.clone(),
            realm: sso.realm.clone(),
            admin_user: value(&sso.admin_user),
            admin_password: value(&sso.admin_password),
            disable_ssl_cert_validation: sso.disable_ssl_cert_validation,
            principal_attribute: value(&sso.principal_attribute),
        };

        let clients = sso.clients.clone().unwrap_or_default();
        console = client_template(clients.console.as_ref(), console_client);
        for server in servers.iter_mut() {
            let declared = clients
                .servers
                .iter()
                .find(|client| client.name.as_deref() == Some(server.kie_name.as_str()));
            server.sso_client = client_template(declared, &server.kie_name);
        }
        debug!(realm = %sso.realm, clients = servers.len() + 1, "Configured SSO clients");
    }

    if let Some(ldap) = &auth.ldap {
        if ldap.url.is_empty() {
            return Err(KieError::AuthConfig(
                "LDAP には url の指定が必須です".to_string(),
            ));
        }
        template.ldap = LdapTemplate {
            enabled: true,
            url: ldap.url.clone(),
            bind_dn: value(&ldap.bind_dn),
            bind_credential: value(&ldap.bind_credential),
            base_ctx_dn: value(&ldap.base_ctx_dn),
            base_filter: value(&ldap.base_filter),
            roles_ctx_dn: value(&ldap.roles_ctx_dn),
            role_filter: value(&ldap.role_filter),
        };
    }

    if let Some(role_mapper) = &auth.role_mapper {
        if role_mapper.roles_properties.is_empty() {
            return Err(KieError::AuthConfig(
                "roleMapper には rolesProperties の指定が必須です".to_string(),
            ));
        }
        template.role_mapper = RoleMapperTemplate {
            enabled: true,
            roles_properties: role_mapper.roles_properties.clone(),
            replace_role: role_mapper.replace_role,
        };
    }

    Ok((template, console))
}

fn client_template(client: Option<&SsoAuthClient>, default_name: &str) -> SsoClientTemplate {
    let value = |v: Option<&String>| v.cloned().unwrap_or_default();
    SsoClientTemplate {
        name: client
            .and_then(|c| c.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default_name.to_string()),
        secret: value(client.and_then(|c| c.secret.as_ref())),
        hostname_http: value(client.and_then(|c| c.hostname_http.as_ref())),
        hostname_https: value(client.and_then(|c| c.hostname_https.as_ref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LdapAuthConfig, RoleMapperAuthConfig, SsoAuthClients, SsoAuthConfig};

    fn sso() -> SsoAuthConfig {
        SsoAuthConfig {
            url: "https://sso.example.com/auth".to_string(),
            realm: "kie".to_string(),
            ..Default::default()
        }
    }

    fn servers() -> Vec<ServerTemplate> {
        ["myapp-kieserver", "myapp-kieserver-2"]
            .into_iter()
            .map(|name| ServerTemplate {
                kie_name: name.to_string(),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_sso_and_ldap_conflict() {
        let auth = AuthConfig {
            sso: Some(sso()),
            ldap: Some(LdapAuthConfig {
                url: "ldap://ldap.example.com".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = configure_auth(&auth, "myapp-rhpamcentr", &mut servers()).unwrap_err();
        assert!(matches!(err, KieError::AuthConfig(_)));
    }

    #[test]
    fn test_empty_auth_is_error() {
        let err =
            configure_auth(&AuthConfig::default(), "myapp-rhpamcentr", &mut servers()).unwrap_err();
        assert!(matches!(err, KieError::AuthConfig(_)));
    }

    #[test]
    fn test_sso_requires_realm() {
        let auth = AuthConfig {
            sso: Some(SsoAuthConfig {
                realm: String::new(),
                ..sso()
            }),
            ..Default::default()
        };
        assert!(configure_auth(&auth, "c", &mut servers()).is_err());
    }

    #[test]
    fn test_sso_clients() {
        let auth = AuthConfig {
            sso: Some(SsoAuthConfig {
                clients: Some(SsoAuthClients {
                    console: None,
                    servers: vec![SsoAuthClient {
                        name: Some("myapp-kieserver-2".to_string()),
                        secret: Some("s3cr3t".to_string()),
                        ..Default::default()
                    }],
                }),
                ..sso()
            }),
            ..Default::default()
        };
        let mut servers = servers();
        let (template, console) = configure_auth(&auth, "myapp-rhpamcentr", &mut servers).unwrap();
        assert!(template.sso.enabled);
        assert!(!template.ldap.enabled);
        assert_eq!(console.name, "myapp-rhpamcentr");
        assert_eq!(servers[0].sso_client.name, "myapp-kieserver");
        assert_eq!(servers[0].sso_client.secret, "");
        assert_eq!(servers[1].sso_client.secret, "s3cr3t");
    }

    #[test]
    fn test_role_mapper_only() {
        let auth = AuthConfig {
            role_mapper: Some(RoleMapperAuthConfig {
                roles_properties: "/opt/eap/roles.properties".to_string(),
                replace_role: true,
            }),
            ..Default::default()
        };
        let (template, _) = configure_auth(&auth, "c", &mut servers()).unwrap();
        assert!(template.role_mapper.enabled);
        assert!(template.role_mapper.replace_role);

        let auth = AuthConfig {
            role_mapper: Some(RoleMapperAuthConfig::default()),
            ..Default::default()
        };
        assert!(configure_auth(&auth, "c", &mut servers()).is_err());
    }
}

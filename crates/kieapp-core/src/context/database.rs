//! データベース設定の解決とデプロイ対象の集約

use super::types::{
    DatabaseConfigTemplate, DatabaseTemplate, ExternalDatabaseTemplate, ProcessMigrationTemplate,
    ServerTemplate,
};
use crate::constants::{
    DEFAULT_KIE_SERVER_DATABASE_NAME, DEFAULT_KIE_SERVER_DATABASE_USERNAME,
    DEFAULT_PROCESS_MIGRATION_DATABASE_NAME, DEFAULT_PROCESS_MIGRATION_DATABASE_USERNAME,
};
use crate::error::{KieError, Result};
use crate::model::{DatabaseObject, DatabaseType, ExternalDatabaseObject, Profile};

/// サーバーセットのデータベース設定
///
/// 未指定ならプロファイルの既定値。サイズ未指定ならプロファイルのサイズで補う。
/// external で接続パラメータがなければ設定エラー。
pub fn server_database(
    owner: &str,
    profile: Option<&Profile>,
    requested: Option<&DatabaseObject>,
) -> Result<DatabaseConfigTemplate> {
    if let Some(requested) = requested {
        check_external(owner, requested)?;
    }
    let Some(profile) = profile else {
        return Ok(DatabaseConfigTemplate::default());
    };
    let default = profile.database.as_ref();
    let Some(requested) = requested else {
        return Ok(default.map(to_template).unwrap_or_default());
    };

    let mut database = requested.clone();
    if database.size.as_deref().is_none_or(str::is_empty) {
        database.size = default.and_then(|db| db.size.clone());
    }
    Ok(to_template(&database))
}

/// プロセス移行サービスのデータベース設定（既定は h2）
pub fn process_migration_database(
    owner: &str,
    requested: Option<&DatabaseObject>,
) -> Result<DatabaseConfigTemplate> {
    match requested {
        Some(database) if database.kind.is_some() => {
            check_external(owner, database)?;
            Ok(to_template(database))
        }
        _ => Ok(DatabaseConfigTemplate {
            kind: DatabaseType::H2.as_str().to_string(),
            ..Default::default()
        }),
    }
}

fn check_external(owner: &str, database: &DatabaseObject) -> Result<()> {
    if database.kind == Some(DatabaseType::External) && database.external_config.is_none() {
        return Err(KieError::ExternalDatabaseConfigMissing(owner.to_string()));
    }
    Ok(())
}

fn to_template(database: &DatabaseObject) -> DatabaseConfigTemplate {
    DatabaseConfigTemplate {
        kind: database
            .kind
            .map(|kind| kind.as_str().to_string())
            .unwrap_or_default(),
        size: database.size.clone().unwrap_or_default(),
        storage_class_name: database.storage_class_name.clone().unwrap_or_default(),
        external: database
            .external_config
            .as_ref()
            .map(external_template)
            .unwrap_or_default(),
    }
}

fn external_template(external: &ExternalDatabaseObject) -> ExternalDatabaseTemplate {
    let value = |v: &Option<String>| v.clone().unwrap_or_default();
    ExternalDatabaseTemplate {
        driver: value(&external.driver),
        dialect: value(&external.dialect),
        jdbc_url: value(&external.jdbc_url),
        username: value(&external.username),
        password: value(&external.password),
        host: value(&external.host),
        port: value(&external.port),
        name: value(&external.name),
    }
}

fn is_deployed(kind: &str) -> bool {
    kind == DatabaseType::Mysql.as_str() || kind == DatabaseType::Postgresql.as_str()
}

/// デプロイが必要なデータベースを集約
///
/// mysql / postgresql を使うサーバーインスタンスと移行サービスごとに 1 つ。
pub fn database_templates(
    servers: &[ServerTemplate],
    process_migration: &ProcessMigrationTemplate,
    process_migration_name: &str,
) -> Vec<DatabaseTemplate> {
    let entry = |database: &DatabaseConfigTemplate, server_name: &str, user: &str, name: &str| {
        DatabaseTemplate {
            kind: database.kind.clone(),
            size: database.size.clone(),
            storage_class_name: database.storage_class_name.clone(),
            server_name: server_name.to_string(),
            username: user.to_string(),
            database_name: name.to_string(),
        }
    };

    let mut databases: Vec<_> = servers
        .iter()
        .filter(|server| is_deployed(&server.database.kind))
        .map(|server| {
            entry(
                &server.database,
                &server.kie_name,
                DEFAULT_KIE_SERVER_DATABASE_USERNAME,
                DEFAULT_KIE_SERVER_DATABASE_NAME,
            )
        })
        .collect();

    if process_migration.enabled && is_deployed(&process_migration.database.kind) {
        databases.push(entry(
            &process_migration.database,
            process_migration_name,
            DEFAULT_PROCESS_MIGRATION_DATABASE_USERNAME,
            DEFAULT_PROCESS_MIGRATION_DATABASE_NAME,
        ));
    }
    databases
}

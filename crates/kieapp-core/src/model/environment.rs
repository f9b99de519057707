//! 解決済みのコンポーネント記述（フラグメントのパース結果）

use super::meta::{ObjectMeta, is_default, is_false, nullable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 解決済み環境
///
/// コンソール、ルーター、サーバーインスタンス、移行サービス、データベースをまとめたもの。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Environment {
    #[serde(deserialize_with = "nullable")]
    pub console: CustomObject,
    #[serde(deserialize_with = "nullable")]
    pub smart_router: CustomObject,
    #[serde(deserialize_with = "nullable")]
    pub servers: Vec<CustomObject>,
    #[serde(deserialize_with = "nullable")]
    pub process_migration: CustomObject,
    #[serde(deserialize_with = "nullable")]
    pub databases: Vec<CustomObject>,
}

impl Environment {
    /// 省略されていない全コンポーネントを列挙
    pub fn components(&self) -> impl Iterator<Item = &CustomObject> {
        std::iter::once(&self.console)
            .chain(std::iter::once(&self.smart_router))
            .chain(self.servers.iter())
            .chain(std::iter::once(&self.process_migration))
            .chain(self.databases.iter())
            .filter(|object| !object.omit)
    }
}

/// 1つの論理コンポーネント
///
/// 識別子は先頭ワークロードの名前。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomObject {
    #[serde(skip_serializing_if = "is_false")]
    pub omit: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub workloads: Vec<Workload>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub services: Vec<NamedObject>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub routes: Vec<NamedObject>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub secrets: Vec<NamedObject>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub persistent_volume_claims: Vec<NamedObject>,
}

impl CustomObject {
    /// 先頭ワークロードの名前（マージの照合キー）
    pub fn name(&self) -> Option<&str> {
        self.workloads.first().map(|workload| workload.metadata.name.as_str())
    }
}

/// ワークロード（DeploymentConfig 相当）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workload {
    pub metadata: ObjectMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub triggers: Vec<Trigger>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_change_params: Option<serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub env: Vec<EnvVar>,
    #[serde(skip_serializing_if = "is_default")]
    pub resources: ResourceRequirements,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub ports: Vec<ContainerPort>,
}

/// 環境変数（値の直接指定またはシークレット参照）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvVar {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_from: None,
        }
    }

    /// 値または参照のどちらかが設定されているか
    pub fn is_set(&self) -> bool {
        self.value.is_some() || self.value_from.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvVarSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<KeySelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_map_key_ref: Option<KeySelector>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySelector {
    pub name: String,
    pub key: String,
}

/// リソース制約
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRequirements {
    #[serde(
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "nullable"
    )]
    pub limits: BTreeMap<String, String>,
    #[serde(
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "nullable"
    )]
    pub requests: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerPort {
    pub name: String,
    pub container_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// 名前付きの付随オブジェクト（Service, Route, Secret, PVC）
///
/// 本体の構造はマージ時に名前で照合するだけなので、値として保持する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedObject {
    pub metadata: ObjectMeta,
    #[serde(flatten)]
    pub body: BTreeMap<String, serde_yaml::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_custom_object() {
        let yaml = r#"
workloads:
  - metadata:
      name: myapp-kieserver
    replicas: 2
    triggers:
      - type: ConfigChange
    containers:
      - name: myapp-kieserver
        image: rhpam-kieserver-rhel8:7.8.0
        env:
          - name: KIE_SERVER_ID
            value: myapp-kieserver
          - name: KIE_ADMIN_PWD
            valueFrom:
              secretKeyRef:
                name: myapp-credentials
                key: password
        resources:
          limits:
            memory: 2Gi
        ports:
          - name: http
            containerPort: 8080
services:
  - metadata:
      name: myapp-kieserver
    spec:
      ports:
        - port: 8080
"#;
        let object: CustomObject = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(object.name(), Some("myapp-kieserver"));
        let container = &object.workloads[0].containers[0];
        assert_eq!(container.env.len(), 2);
        assert!(container.env[1].value_from.is_some());
        assert_eq!(container.resources.limits["memory"], "2Gi");
        assert_eq!(container.ports[0].container_port, 8080);
        assert!(object.services[0].body.contains_key("spec"));
    }

    #[test]
    fn test_null_lists_are_empty() {
        let yaml = "console:\nservers:\ndatabases:\n";
        let env: Environment = serde_yaml::from_str(yaml).unwrap();
        assert!(env.servers.is_empty());
        assert!(env.databases.is_empty());
        assert_eq!(env.console, CustomObject::default());
    }

    #[test]
    fn test_components_skip_omitted() {
        let mut env = Environment::default();
        env.smart_router.omit = true;
        env.servers.push(CustomObject::default());
        assert_eq!(env.components().count(), 3);
    }
}

//! 生成既定値（Status）の算出
//!
//! 利用者が指定しなかった項目だけを Status に保存する。
//! 一度生成した資格情報は保存値を再利用し、再生成しない。

use crate::constants::{
    API_GROUP, DEFAULT_ADMIN_USER, DEFAULT_AMQ_USER, DEFAULT_KIE_DEPLOYMENTS, DEFAULT_PASSWORD,
    OPERATOR_VERSION, PASSWORD_LENGTH,
};
use crate::context::resolve_replicas;
use crate::model::{
    KieApp, KieAppStatus, KieServerSet, Profile, SmartRouterObject, is_trial,
};
use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use std::collections::BTreeMap;
use tracing::debug;

/// 資格情報の生成器
pub trait PasswordGenerator {
    /// 表示可能な文字だけで構成された `length` 文字の文字列を返す
    fn generate(&mut self, length: usize) -> String;
}

/// OS の暗号論的乱数源を使う生成器
#[derive(Debug, Default, Clone, Copy)]
pub struct OsPasswordGenerator;

impl PasswordGenerator for OsPasswordGenerator {
    fn generate(&mut self, length: usize) -> String {
        OsRng
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// 利用者指定があれば保存値を消し、なければ保存値を維持するか既定値で埋める
fn default_unless_set(
    stored: &mut Option<String>,
    requested: &Option<String>,
    default: impl FnOnce() -> String,
) {
    if is_set(requested) {
        *stored = None;
    } else if !is_set(stored) {
        *stored = Some(default());
    }
}

/// Status の生成既定値を算出
///
/// 入力の Status は変更せず、更新後の Status を返す。
pub fn apply_defaults(
    app: &KieApp,
    profile: Option<&Profile>,
    current_version: &str,
    passwords: &mut dyn PasswordGenerator,
) -> KieAppStatus {
    let spec = &app.spec;
    let mut status = app.status.clone();
    let generated = &mut status.generated;

    // 環境と動作フラグは常に Spec が持つ
    generated.environment.clear();
    generated.use_image_tags = false;
    generated.upgrades = None;
    generated.auth = None;

    default_unless_set(&mut generated.version, &spec.version, || {
        current_version.to_string()
    });

    let common = &spec.common_config;
    let stored = &mut generated.common_config;
    default_unless_set(&mut stored.application_name, &common.application_name, || {
        app.metadata.name.clone()
    });
    default_unless_set(&mut stored.admin_user, &common.admin_user, || {
        DEFAULT_ADMIN_USER.to_string()
    });
    default_unless_set(&mut stored.amq_user, &common.amq_user, || {
        DEFAULT_AMQ_USER.to_string()
    });

    let trial = is_trial(&spec.environment);
    let mut credential = || {
        if trial {
            DEFAULT_PASSWORD.to_string()
        } else {
            passwords.generate(PASSWORD_LENGTH)
        }
    };
    default_unless_set(
        &mut stored.key_store_password,
        &common.key_store_password,
        &mut credential,
    );
    default_unless_set(
        &mut stored.admin_password,
        &common.admin_password,
        &mut credential,
    );
    default_unless_set(&mut stored.db_password, &common.db_password, &mut credential);
    default_unless_set(
        &mut stored.amq_password,
        &common.amq_password,
        &mut credential,
    );
    default_unless_set(
        &mut stored.amq_cluster_password,
        &common.amq_cluster_password,
        &mut credential,
    );
    default_unless_set(&mut status.webhook_secret, &None, &mut credential);

    let generated = &mut status.generated;
    if spec.objects.servers.is_empty() {
        if generated.objects.servers.is_empty() {
            generated.objects.servers = vec![KieServerSet {
                deployments: Some(DEFAULT_KIE_DEPLOYMENTS),
                ..Default::default()
            }];
        }
    } else {
        generated.objects.servers.clear();
    }

    // コンソールのレプリカ数は Spec 未指定時のみ保存（スケール不可なら固定値に補正）
    let console = &mut generated.objects.console;
    if spec.objects.console.base.replicas.is_some() {
        console.base.replicas = None;
    } else {
        let (replicas, _) = resolve_replicas(
            console.base.replicas,
            profile.map(|p| &p.replicas.console),
        );
        console.base.replicas = Some(replicas);
    }

    generated.objects.smart_router = match &spec.objects.smart_router {
        Some(router) if router.base.replicas.is_none() => {
            let (replicas, _) = resolve_replicas(
                generated
                    .objects
                    .smart_router
                    .as_ref()
                    .and_then(|stored| stored.base.replicas),
                profile.map(|p| &p.replicas.smart_router),
            );
            let mut stored = SmartRouterObject::default();
            stored.base.replicas = Some(replicas);
            Some(stored)
        }
        _ => None,
    };

    debug!(
        app = %app.metadata.name,
        trial,
        "Generated defaults applied"
    );
    status
}

/// アノテーションが空ならオペレーターのバージョンを記録
pub fn default_annotations(annotations: &mut BTreeMap<String, String>) {
    if annotations.is_empty() {
        annotations.insert(API_GROUP.to_string(), OPERATOR_VERSION.to_string());
    }
}

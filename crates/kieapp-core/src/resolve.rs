//! 解決済み仕様（Spec を Status で補完した読み取りビュー）

use crate::model::{
    CommonConfig, ConsoleObject, DatabaseObject, KieAppObject, KieAppObjects, KieAppSpec,
    ProcessMigrationObject, SmartRouterObject,
};
use std::ops::Deref;

/// Spec を Status の生成既定値で補完したもの
///
/// Spec の値が常に優先される。入力が同じなら結果も同じ。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSpec(KieAppSpec);

impl ResolvedSpec {
    pub fn new(spec: &KieAppSpec, generated: &KieAppSpec) -> Self {
        let mut resolved = spec.clone();
        resolved.backfill(generated);
        Self(resolved)
    }

    pub fn into_inner(self) -> KieAppSpec {
        self.0
    }
}

impl Deref for ResolvedSpec {
    type Target = KieAppSpec;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// 利用者指定、保存値、既定値の順で最初の空でない値を返す
pub fn first_non_empty(user: Option<&str>, stored: Option<&str>, default: &str) -> String {
    [user, stored]
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// 未設定の項目を保存値で埋める
trait Backfill {
    fn backfill(&mut self, stored: &Self);
}

fn fill_str(target: &mut Option<String>, stored: &Option<String>) {
    if target.as_deref().is_none_or(str::is_empty) {
        if let Some(value) = stored.as_deref().filter(|v| !v.is_empty()) {
            *target = Some(value.to_string());
        }
    }
}

fn fill<T: Clone>(target: &mut Option<T>, stored: &Option<T>) {
    if target.is_none() {
        target.clone_from(stored);
    }
}

fn fill_nested<T: Backfill + Clone>(target: &mut Option<T>, stored: &Option<T>) {
    if let Some(inner) = target.as_mut() {
        if let Some(stored) = stored {
            inner.backfill(stored);
        }
    } else {
        target.clone_from(stored);
    }
}

/// 空でないリストは保存値に丸ごと優先する
fn fill_vec<T: Clone>(target: &mut Vec<T>, stored: &[T]) {
    if target.is_empty() {
        target.extend_from_slice(stored);
    }
}

impl Backfill for KieAppSpec {
    fn backfill(&mut self, stored: &Self) {
        if self.environment.is_empty() {
            self.environment.clone_from(&stored.environment);
        }
        self.use_image_tags |= stored.use_image_tags;
        fill_str(&mut self.version, &stored.version);
        fill(&mut self.upgrades, &stored.upgrades);
        self.common_config.backfill(&stored.common_config);
        self.objects.backfill(&stored.objects);
        fill(&mut self.auth, &stored.auth);
    }
}

impl Backfill for CommonConfig {
    fn backfill(&mut self, stored: &Self) {
        fill_str(&mut self.application_name, &stored.application_name);
        fill_str(&mut self.key_store_password, &stored.key_store_password);
        fill_str(&mut self.admin_user, &stored.admin_user);
        fill_str(&mut self.admin_password, &stored.admin_password);
        fill_str(&mut self.db_password, &stored.db_password);
        fill_str(&mut self.amq_user, &stored.amq_user);
        fill_str(&mut self.amq_password, &stored.amq_password);
        fill_str(&mut self.amq_cluster_password, &stored.amq_cluster_password);
    }
}

impl Backfill for KieAppObjects {
    fn backfill(&mut self, stored: &Self) {
        self.console.backfill(&stored.console);
        fill_nested(&mut self.smart_router, &stored.smart_router);
        fill_vec(&mut self.servers, &stored.servers);
        fill_nested(&mut self.process_migration, &stored.process_migration);
    }
}

impl Backfill for KieAppObject {
    fn backfill(&mut self, stored: &Self) {
        fill_vec(&mut self.env, &stored.env);
        fill(&mut self.resources, &stored.resources);
        fill(&mut self.replicas, &stored.replicas);
    }
}

impl Backfill for ConsoleObject {
    fn backfill(&mut self, stored: &Self) {
        self.base.backfill(&stored.base);
        fill_str(&mut self.keystore_secret, &stored.keystore_secret);
        fill_str(&mut self.image, &stored.image);
        fill_str(&mut self.image_tag, &stored.image_tag);
        fill_str(&mut self.storage_class_name, &stored.storage_class_name);
        fill(&mut self.git_hooks, &stored.git_hooks);
        fill(&mut self.jvm, &stored.jvm);
    }
}

impl Backfill for SmartRouterObject {
    fn backfill(&mut self, stored: &Self) {
        self.base.backfill(&stored.base);
        fill_str(&mut self.keystore_secret, &stored.keystore_secret);
        fill_str(&mut self.protocol, &stored.protocol);
        self.use_external_route |= stored.use_external_route;
        fill_str(&mut self.storage_class_name, &stored.storage_class_name);
        fill_str(&mut self.image, &stored.image);
        fill_str(&mut self.image_tag, &stored.image_tag);
    }
}

impl Backfill for ProcessMigrationObject {
    fn backfill(&mut self, stored: &Self) {
        self.base.backfill(&stored.base);
        fill_str(&mut self.image, &stored.image);
        fill_str(&mut self.image_tag, &stored.image_tag);
        fill_nested(&mut self.database, &stored.database);
    }
}

impl Backfill for DatabaseObject {
    fn backfill(&mut self, stored: &Self) {
        fill(&mut self.kind, &stored.kind);
        fill_str(&mut self.size, &stored.size);
        fill_str(&mut self.storage_class_name, &stored.storage_class_name);
        fill(&mut self.external_config, &stored.external_config);
    }
}

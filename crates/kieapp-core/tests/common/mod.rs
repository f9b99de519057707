use kieapp_core::{
    BundleCatalogue, Environment, KieApp, PasswordGenerator, Resolution, ResolveOptions,
    resolve_kieapp,
};
use std::path::PathBuf;

/// リポジトリ同梱のカタログ
pub fn catalogue() -> BundleCatalogue {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config");
    BundleCatalogue::from_dir(&dir).unwrap()
}

/// 呼び出し回数を埋め込んだ予測可能なパスワード
#[derive(Default)]
pub struct SequentialPasswords {
    pub calls: usize,
}

impl PasswordGenerator for SequentialPasswords {
    fn generate(&mut self, length: usize) -> String {
        self.calls += 1;
        format!("{:0>width$}", self.calls, width = length)
    }
}

pub fn app(yaml: &str) -> KieApp {
    KieApp::from_yaml(yaml).unwrap()
}

pub fn resolve(app: &KieApp) -> kieapp_core::Result<Resolution> {
    resolve_kieapp(
        app,
        &catalogue(),
        &ResolveOptions::default(),
        &mut SequentialPasswords::default(),
    )
}

#[allow(dead_code)]
pub fn server_names(env: &Environment) -> Vec<&str> {
    env.servers.iter().filter_map(|s| s.name()).collect()
}

/// コンポーネントの先頭コンテナにある環境変数の値
#[allow(dead_code)]
pub fn env_value<'a>(object: &'a kieapp_core::CustomObject, name: &str) -> Option<&'a str> {
    object.workloads[0].containers[0]
        .env
        .iter()
        .find(|var| var.name == name)
        .and_then(|var| var.value.as_deref())
}

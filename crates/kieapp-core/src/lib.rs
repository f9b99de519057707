//! KIE アプリケーション設定の解決エンジン
//!
//! 利用者の要求（Spec）と保存済みの生成既定値（Status）から、
//! コンソール、ルーター、kieserver インスタンス、データベース、移行サービスを
//! 具体的に記述した解決済み環境を組み立てます。
//!
//! # 処理の流れ
//!
//! - **version**: プロダクトバージョンの移行判定
//! - **defaults**: 生成既定値と資格情報
//! - **context**: フラグメントに渡すレンダーコンテキスト
//! - **catalogue / template**: フラグメントの取得と展開
//! - **merge**: コンポーネント単位の構造マージ
//! - **loader**: 上記を束ねたパイプライン

pub mod catalogue;
pub mod constants;
pub mod context;
pub mod defaults;
pub mod error;
pub mod loader;
pub mod merge;
pub mod model;
pub mod overrides;
pub mod resolve;
pub mod servers;
pub mod template;
pub mod version;

pub use catalogue::{
    BundleCatalogue, ConfigMap, ConfigMapCatalogue, ConfigMapStore, InMemoryConfigMapStore,
    TemplateCatalogue, config_map_name, config_maps_from_bundle,
};
pub use context::{ContextBuilder, RenderContext, build_context};
pub use defaults::{OsPasswordGenerator, PasswordGenerator, apply_defaults};
pub use error::{KieError, Result};
pub use loader::{Resolution, ResolveOptions, merge_environment, resolve_kieapp};
pub use model::*;
pub use overrides::ImageOverrides;
pub use resolve::{ResolvedSpec, first_non_empty};
pub use template::FragmentRenderer;
pub use version::{ConfigDiff, VersionTransition, resolve_version_transition};

//! モデル定義
//!
//! リソース（Spec / Status）、環境プロファイル、解決済みコンポーネントを定義します。

mod app;
mod auth;
mod environment;
mod meta;
mod profile;
mod spec;

// Re-exports
pub use app::*;
pub use auth::*;
pub use environment::*;
pub use meta::{ImageReference, ObjectMeta};
pub(crate) use meta::{is_default, nullable};
pub use profile::*;
pub use spec::*;

//! イメージ参照の解決

use crate::overrides::ImageOverrides;
use tracing::debug;

/// イメージ解決の入力
#[derive(Debug, Clone, Default)]
pub struct ImageRequest<'a> {
    /// プロファイルから導出した既定の URL（`<name>:<version>`）
    pub default_url: String,
    /// オペレーターレベルの上書き変数の接頭辞
    pub override_var: &'a str,
    pub version: &'a str,
    /// タグのみモード（上書きを無視）
    pub use_image_tags: bool,
    pub user_image: Option<&'a str>,
    pub user_image_tag: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedImage {
    pub image: String,
    pub image_tag: String,
    pub image_url: String,
    /// ImageStream のトリガーを使わない（外部管理のイメージ）
    pub omit_image_stream: bool,
}

/// 既定値、オペレーターの上書き、利用者指定の順にイメージを決定
///
/// 利用者指定のイメージとタグは常に優先され、トリガーを再び有効にする。
pub fn resolve_image(request: &ImageRequest<'_>, overrides: &ImageOverrides) -> ResolvedImage {
    let mut image_url = request.default_url.clone();
    let mut omit_image_stream = false;

    if !request.use_image_tags
        && let Some(value) = overrides.lookup(request.override_var, request.version)
    {
        debug!(var = %request.override_var, image = %value, "Using operator image override");
        image_url = value.to_string();
        omit_image_stream = true;
    }

    let (mut image, mut image_tag, _) = split_image(&image_url);

    if let Some(user_image) = request.user_image.filter(|v| !v.is_empty()) {
        image = user_image.to_string();
        image_url = format!("{}:{}", image, image_tag);
        omit_image_stream = false;
    }
    if let Some(user_tag) = request.user_image_tag.filter(|v| !v.is_empty()) {
        image_tag = user_tag.to_string();
        image_url = format!("{}:{}", image, image_tag);
        omit_image_stream = false;
    }

    ResolvedImage {
        image,
        image_tag,
        image_url,
        omit_image_stream,
    }
}

/// `registry/.../name:tag` を (name, tag, 直前のパス要素) に分解
///
/// コロンがなければタグは空。
pub fn split_image(image_url: &str) -> (String, String, String) {
    let mut segments = image_url.rsplit('/');
    let last = segments.next().unwrap_or_default();
    let context = segments.next().unwrap_or_default();
    let (image, tag) = match last.rsplit_once(':') {
        Some((image, tag)) => (image, tag),
        None => (last, ""),
    };
    (image.to_string(), tag.to_string(), context.to_string())
}

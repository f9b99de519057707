//! フラグメント展開機能
//!
//! フラグメントは YAML として再パースされるため、YAML のフロー記法と衝突しない
//! `[[ 式 ]]`、`[% 文 %]`、`[# コメント #]` を区切りに使う。
//! 展開時に Tera の構文へ変換し、本文中の `{{` などはそのまま残るようエスケープする。

use crate::context::RenderContext;
use crate::error::{KieError, Result};
use tera::{Context, Tera};
use tracing::debug;

/// フラグメントプロセッサ
pub struct FragmentRenderer {
    tera: Tera,
    context: Context,
}

impl FragmentRenderer {
    /// レンダーコンテキストからプロセッサを作成
    pub fn new(render_context: &RenderContext) -> Result<Self> {
        let context_error = |message: String| KieError::TemplateError {
            key: "<context>".to_string(),
            message,
        };
        let value =
            serde_json::to_value(render_context).map_err(|e| context_error(e.to_string()))?;
        let context = Context::from_value(value)
            .map_err(|e| context_error(extract_tera_error_detail(&e)))?;
        Ok(Self {
            tera: Tera::default(),
            context,
        })
    }

    /// フラグメントを展開
    ///
    /// `key` はエラー報告にだけ使う。
    pub fn render(&mut self, key: &str, text: &str) -> Result<String> {
        let translated = translate_delimiters(key, text)?;
        let rendered = self
            .tera
            .render_str(&translated, &self.context)
            .map_err(|e| KieError::TemplateError {
                key: key.to_string(),
                message: extract_tera_error_detail(&e),
            })?;
        debug!(key = %key, bytes = rendered.len(), "Rendered fragment");
        Ok(rendered)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tag {
    Expression,
    Statement,
    Comment,
}

impl Tag {
    fn close(self) -> (&'static str, &'static str) {
        match self {
            Tag::Expression => ("]]", "}}"),
            Tag::Statement => ("%]", "%}"),
            Tag::Comment => ("#]", "#}"),
        }
    }
}

/// `[[ ]]` 系の区切りを Tera の区切りへ変換
///
/// タグの外にある Tera の開始区切りは文字列リテラルとして出力する。
fn translate_delimiters(key: &str, text: &str) -> Result<String> {
    const OPENERS: &[(&str, &str, Tag)] = &[
        ("[[", "{{", Tag::Expression),
        ("[%", "{%", Tag::Statement),
        ("[#", "{#", Tag::Comment),
    ];
    const TERA_OPENERS: &[&str] = &["{{", "{%", "{#"];

    let mut output = String::with_capacity(text.len() + text.len() / 8);
    let mut rest = text;
    let mut open: Option<(Tag, usize)> = None;
    let mut line = 1;

    while let Some(c) = rest.chars().next() {
        match open {
            None => {
                if let Some((from, to, tag)) =
                    OPENERS.iter().find(|(from, _, _)| rest.starts_with(from))
                {
                    output.push_str(to);
                    rest = &rest[from.len()..];
                    open = Some((*tag, line));
                    continue;
                }
                if let Some(literal) = TERA_OPENERS.iter().find(|o| rest.starts_with(**o)) {
                    output.push_str(&format!("{{{{ \"{}\" }}}}", literal));
                    rest = &rest[literal.len()..];
                    continue;
                }
            }
            Some((tag, _)) => {
                let (from, to) = tag.close();
                if rest.starts_with(from) {
                    output.push_str(to);
                    rest = &rest[from.len()..];
                    open = None;
                    continue;
                }
            }
        }
        if c == '\n' {
            line += 1;
        }
        output.push(c);
        rest = &rest[c.len_utf8()..];
    }

    if let Some((tag, opened_at)) = open {
        return Err(KieError::FragmentParse {
            key: key.to_string(),
            message: format!(
                "{} 行目のタグが閉じられていません（`{}` がありません）",
                opened_at,
                tag.close().0
            ),
        });
    }
    Ok(output)
}

/// Teraのエラーからユーザーフレンドリーなメッセージを抽出
fn extract_tera_error_detail(e: &tera::Error) -> String {
    use std::error::Error;

    let mut details = vec![e.to_string()];
    let mut source = e.source();
    while let Some(err) = source {
        details.push(err.to_string());
        source = err.source();
    }

    let full_error = details.join(" | ");

    if full_error.contains("not found in context")
        && let Some(start) = full_error.find("Variable `")
        && let Some(end) = full_error[start..].find("` not found")
    {
        let var_name = &full_error[start + 10..start + end];
        return format!(
            "未定義の変数: `{}`\nヒント: レンダーコンテキストに存在するフィールド名を確認してください",
            var_name
        );
    }

    if full_error.contains("Filter") && full_error.contains("not found") {
        return format!("未定義のフィルター\n詳細: {full_error}");
    }

    full_error
}

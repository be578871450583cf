//! 缓存 key 与存储路径

/// 生成缓存 key
///
/// md5(text)，带前缀（音色）时为 `{prefix}-{md5}`。文本不做任何归一化。
pub fn derive_cache_key(text: &str, prefix: Option<&str>) -> String {
    let digest = md5::compute(text.as_bytes());
    match prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}-{:x}", prefix, digest),
        None => format!("{:x}", digest),
    }
}

/// 构建存储路径 `{base_path}/{locale}/{key}.{extension}`
///
/// 空段和重复的 `/` 会被合并，结果不带首尾 `/`
pub fn build_storage_path(
    base_path: &str,
    locale: &str,
    key: &str,
    extension: Option<&str>,
) -> String {
    let filename = match extension.filter(|e| !e.is_empty()) {
        Some(ext) => format!("{}.{}", key, ext),
        None => key.to_string(),
    };

    [base_path, locale, filename.as_str()]
        .iter()
        .flat_map(|part| part.split('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// 拼接公开 URL，连接处只保留一个 `/`
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// locale 的最大长度（BCP 47 标签）
const MAX_LOCALE_LEN: usize = 35;

/// locale 会成为存储路径的一段，只允许字母数字、`-` 和 `_`
pub fn is_valid_locale(locale: &str) -> bool {
    locale.len() <= MAX_LOCALE_LEN
        && locale
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

//! 文本处理

/// 将模板中的 `{{key}}` 替换为对应的值
///
/// 单次扫描模板，替换进来的值不会再被展开。未提供的占位符保持原样。
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };

        let key = &after[..end];
        match values.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

/// 将任意标识转换为适合文件名的形式
///
/// 小写化，非字母数字字符转为 `-`，合并连续的 `-` 并去掉首尾的 `-`。
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// 去掉以 `#` 开头的注释行并修剪首尾空白
pub fn strip_comment_lines(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template() {
        let out = render_template(
            "{{name}} v{{version}} / {{name}} {{missing}}",
            &[("name", "demo"), ("version", "1.0.2")],
        );
        assert_eq!(out, "demo v1.0.2 / demo {{missing}}");
    }

    #[test]
    fn test_render_template_does_not_expand_values() {
        let out = render_template(
            "{{name}}: {{platform}} {{unclosed",
            &[("name", "Tower {{platform}}"), ("platform", "vivo")],
        );
        assert_eq!(out, "Tower {{platform}}: vivo {{unclosed");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("tt@xlb#xiaomi"), "tt-xlb-xiaomi");
        assert_eq!(normalize_name("Web"), "web");
        assert_eq!(normalize_name("@@vivo__"), "vivo");
        assert_eq!(normalize_name("2345"), "2345");
    }

    #[test]
    fn test_strip_comment_lines() {
        let content = "# 请输入更新日志\n修复闪退\n  \n# 另一条注释\n新增关卡\n";
        assert_eq!(strip_comment_lines(content), "修复闪退\n  \n新增关卡");
        assert_eq!(strip_comment_lines("# only comments\n"), "");
    }
}

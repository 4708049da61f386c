//! # Style 模块
//!
//! 样式描述符与样式编译器接口。
//!
//! ## 职责划分
//!
//! - [`StyleCompiler`]：外部协作者，把样式字符串编译成 [`StyleDescriptor`]
//! - [`StyleDescriptor`]：不透明的编译结果，标记系统只保存和转发，
//!   唯一会问它的问题是 [`StyleDescriptor::is_point_style`]（决定能否挂图片）
//!
//! ## 内置编译器
//!
//! [`FlowStyleCompiler`] 只处理宿主传入的 flow mapping 形式：
//!
//! ```text
//! { style: 'points', color: 'white', size: [25px, 25px], order: 500 }
//! ```
//!
//! 它检查结构（括号配对、引号闭合、`key: value`、重复键），
//! 并从 `base`（优先）或 `style` 键确定样式类型，不解释任何取值。

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// 映射 / 序列的最大嵌套层数（最外层映射计为 1 层）
pub const MAX_NESTING: usize = 64;

/// 样式编译错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    /// 空样式字符串
    #[error("样式字符串为空")]
    Empty,

    /// 语法错误
    #[error("第 {offset} 个字符处语法错误：{message}")]
    Syntax { offset: usize, message: String },

    /// 重复的键
    #[error("重复的样式键 '{key}'")]
    DuplicateKey { key: String },

    /// 缺少样式类型
    #[error("样式缺少 'style' 键")]
    MissingStyle,
}

/// 样式类型
///
/// 由编译器决定，标记系统据此判断是否允许设置图片。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    /// 点样式（可挂图片）
    Points,
    /// 文本样式
    Text,
    /// 线样式
    Lines,
    /// 面样式
    Polygons,
    /// 场景中自定义的样式名
    Named(String),
}

impl StyleKind {
    /// 从样式名解析
    pub fn from_name(name: &str) -> Self {
        match name {
            "points" => StyleKind::Points,
            "text" => StyleKind::Text,
            "lines" => StyleKind::Lines,
            "polygons" => StyleKind::Polygons,
            other => StyleKind::Named(other.to_string()),
        }
    }

    /// 样式名
    pub fn name(&self) -> &str {
        match self {
            StyleKind::Points => "points",
            StyleKind::Text => "text",
            StyleKind::Lines => "lines",
            StyleKind::Polygons => "polygons",
            StyleKind::Named(name) => name,
        }
    }
}

/// 编译后的样式描述符
///
/// 克隆开销很低（内部共享），渲染端每帧读取不需要复制源字符串。
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDescriptor {
    source: Arc<str>,
    kind: StyleKind,
    properties: Arc<[(String, String)]>,
}

impl StyleDescriptor {
    /// 创建描述符（供编译器实现使用）
    pub fn new(
        source: impl Into<Arc<str>>,
        kind: StyleKind,
        properties: Vec<(String, String)>,
    ) -> Self {
        Self {
            source: source.into(),
            kind,
            properties: properties.into(),
        }
    }

    /// 原始样式字符串
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 样式类型
    pub fn kind(&self) -> &StyleKind {
        &self.kind
    }

    /// 是否为点样式
    pub fn is_point_style(&self) -> bool {
        self.kind == StyleKind::Points
    }

    /// 查询某个属性的原始取值文本
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 全部属性（按书写顺序）
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }
}

/// 样式编译器
///
/// 编译失败时标记系统保留旧样式并报告失败。
pub trait StyleCompiler: Send {
    /// 编译样式字符串
    fn compile(&self, source: &str) -> Result<StyleDescriptor, StyleError>;
}

impl<F> StyleCompiler for F
where
    F: Fn(&str) -> Result<StyleDescriptor, StyleError> + Send,
{
    fn compile(&self, source: &str) -> Result<StyleDescriptor, StyleError> {
        self(source)
    }
}

/// flow mapping 样式编译器
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowStyleCompiler;

impl StyleCompiler for FlowStyleCompiler {
    fn compile(&self, source: &str) -> Result<StyleDescriptor, StyleError> {
        if source.trim().is_empty() {
            return Err(StyleError::Empty);
        }

        let mut cursor = Cursor::new(source);
        cursor.skip_ws();
        let entries = cursor.mapping()?;
        cursor.skip_ws();
        if !cursor.at_end() {
            return Err(cursor.error("样式映射之后存在多余内容"));
        }

        let mut properties: Vec<(String, String)> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if properties.iter().any(|(k, _)| *k == key) {
                return Err(StyleError::DuplicateKey { key });
            }
            properties.push((key, value));
        }

        let lookup = |key: &str| {
            properties
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| unquote(v).to_string())
        };
        let kind_name = lookup("base")
            .or_else(|| lookup("style"))
            .ok_or(StyleError::MissingStyle)?;

        Ok(StyleDescriptor::new(
            source,
            StyleKind::from_name(&kind_name),
            properties,
        ))
    }
}

/// 去掉一层成对的引号
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' || first == b'"') && first == last {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// 解析游标
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> StyleError {
        StyleError::Syntax {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), StyleError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("期望 '{expected}'，实际 '{c}'"))),
            None => Err(self.error(format!("期望 '{expected}'，实际已到结尾"))),
        }
    }

    /// 进入一层嵌套，超过上限时报错
    fn enter(&mut self) -> Result<(), StyleError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!("嵌套过深（最多 {MAX_NESTING} 层）")));
        }
        self.depth += 1;
        Ok(())
    }

    /// `{ key: value, ... }`，返回键与取值原文
    fn mapping(&mut self) -> Result<Vec<(String, String)>, StyleError> {
        self.enter()?;
        self.expect('{')?;
        let mut entries = Vec::new();

        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                self.depth -= 1;
                return Ok(entries);
            }

            let key = self.key()?;
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let start = self.pos;
            self.value()?;
            let raw = self.src[start..self.pos].trim().to_string();
            entries.push((key, raw));

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                Some(c) => return Err(self.error(format!("期望 ',' 或 '}}'，实际 '{c}'"))),
                None => return Err(self.error("映射未闭合")),
            }
        }
    }

    /// `[ value, ... ]`
    fn sequence(&mut self) -> Result<(), StyleError> {
        self.enter()?;
        self.expect('[')?;
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.bump();
                self.depth -= 1;
                return Ok(());
            }

            self.value()?;
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                Some(c) => return Err(self.error(format!("期望 ',' 或 ']'，实际 '{c}'"))),
                None => return Err(self.error("序列未闭合")),
            }
        }
    }

    fn key(&mut self) -> Result<String, StyleError> {
        match self.peek() {
            Some('\'' | '"') => {
                let start = self.pos;
                self.quoted()?;
                Ok(unquote(&self.src[start..self.pos]).to_string())
            }
            Some(c) if is_key_char(c) => {
                let start = self.pos;
                while self.peek().is_some_and(is_key_char) {
                    self.bump();
                }
                Ok(self.src[start..self.pos].to_string())
            }
            Some(c) => Err(self.error(format!("无效的键起始字符 '{c}'"))),
            None => Err(self.error("期望键，实际已到结尾")),
        }
    }

    fn value(&mut self) -> Result<(), StyleError> {
        match self.peek() {
            Some('{') => self.mapping().map(|_| ()),
            Some('[') => self.sequence(),
            Some('\'' | '"') => self.quoted(),
            Some(_) => self.scalar(),
            None => Err(self.error("期望取值，实际已到结尾")),
        }
    }

    fn quoted(&mut self) -> Result<(), StyleError> {
        let quote = self.bump().ok_or_else(|| self.error("期望引号"))?;
        loop {
            match self.bump() {
                Some('\\') if quote == '"' => {
                    self.bump();
                }
                Some(c) if c == quote => return Ok(()),
                Some(_) => {}
                None => return Err(self.error("字符串未闭合")),
            }
        }
    }

    fn scalar(&mut self) -> Result<(), StyleError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                ',' | '}' | ']' => break,
                '{' | '[' | ':' => return Err(self.error(format!("取值中出现非法字符 '{c}'"))),
                _ => {
                    self.bump();
                }
            }
        }
        if self.src[start..self.pos].trim().is_empty() {
            return Err(self.error("取值为空"));
        }
        Ok(())
    }
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> Result<StyleDescriptor, StyleError> {
        FlowStyleCompiler.compile(source)
    }

    #[test]
    fn test_compile_points_style() {
        let style = compile("{ style: 'points', color: 'white', size: [25px, 25px], order:500 }")
            .unwrap();
        assert_eq!(style.kind(), &StyleKind::Points);
        assert!(style.is_point_style());
        assert_eq!(style.property("color"), Some("'white'"));
        assert_eq!(style.property("size"), Some("[25px, 25px]"));
        assert_eq!(style.property("order"), Some("500"));
        assert_eq!(style.properties().len(), 4);
    }

    #[test]
    fn test_compile_lines_and_named() {
        let lines = compile("{ style: lines, color: red, width: 4px }").unwrap();
        assert_eq!(lines.kind(), &StyleKind::Lines);
        assert!(!lines.is_point_style());

        let named = compile(r#"{ "style": "my-pins", base: points }"#).unwrap();
        // base 优先于 style
        assert_eq!(named.kind(), &StyleKind::Points);

        let custom = compile("{ style: highlight }").unwrap();
        assert_eq!(custom.kind(), &StyleKind::Named("highlight".to_string()));
    }

    #[test]
    fn test_nested_and_multiline() {
        let style = compile(
            "{\n  style: polygons,\n  draw: { color: [0.1, 0.2, 0.3] },\n  interactive: true,\n}",
        )
        .unwrap();
        assert_eq!(style.kind(), &StyleKind::Polygons);
        assert_eq!(style.property("draw"), Some("{ color: [0.1, 0.2, 0.3] }"));
    }

    #[test]
    fn test_invalid_syntax() {
        assert!(matches!(
            compile("{{invalid"),
            Err(StyleError::Syntax { offset: 1, .. })
        ));
        assert!(matches!(
            compile("{ style: points"),
            Err(StyleError::Syntax { .. })
        ));
        assert!(matches!(
            compile("{ style: 'points }"),
            Err(StyleError::Syntax { .. })
        ));
        assert!(matches!(
            compile("{ style: points } trailing"),
            Err(StyleError::Syntax { .. })
        ));
        assert!(matches!(
            compile("{ color: , style: points }"),
            Err(StyleError::Syntax { .. })
        ));
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let nested = |depth: usize| {
            format!(
                "{{ style: points, x: {}1{} }}",
                "[".repeat(depth),
                "]".repeat(depth)
            )
        };

        // 最外层映射占 1 层
        assert!(compile(&nested(MAX_NESTING - 1)).is_ok());
        assert!(matches!(
            compile(&nested(MAX_NESTING)),
            Err(StyleError::Syntax { message, .. }) if message.contains("嵌套过深")
        ));

        // 未闭合的超深输入同样只是语法错误
        let source = format!("{{ style: points, x: {}", "[".repeat(200_000));
        assert!(matches!(compile(&source), Err(StyleError::Syntax { .. })));
        let source = format!("{{ style: points, x: {}", "{ a: ".repeat(200_000));
        assert!(matches!(compile(&source), Err(StyleError::Syntax { .. })));
    }

    #[test]
    fn test_semantic_errors() {
        assert_eq!(compile("   "), Err(StyleError::Empty));
        assert_eq!(compile("{ color: red }"), Err(StyleError::MissingStyle));
        assert_eq!(
            compile("{ style: points, style: lines }"),
            Err(StyleError::DuplicateKey {
                key: "style".to_string()
            })
        );
    }

    #[test]
    fn test_closure_compiler() {
        let compiler = |source: &str| -> Result<StyleDescriptor, StyleError> {
            Ok(StyleDescriptor::new(source, StyleKind::Lines, Vec::new()))
        };
        let style = compiler.compile("anything").unwrap();
        assert_eq!(style.source(), "anything");
        assert_eq!(style.kind().name(), "lines");
    }
}

//! 查询字符串的词法分析器
//!
//! 查询由空白分隔的 token 组成，双引号包围的短语作为一个 token（引号会被去掉）。
//! 不支持转义，短语内部不能包含双引号。

use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 跳过空白字符
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 读取双引号包围的短语
    /// 注意：调用者已确认 `start` 处是开始引号。
    /// 没有结束引号或内容为空时返回 None，且不推进位置。
    fn read_quoted(&mut self, start: usize) -> Option<Token<'a>> {
        let content_start = start + 1;
        let len = self.input[content_start..].find('"')?;
        if len == 0 {
            return None;
        }
        let content_end = content_start + len;
        self.position = content_end + 1; // 消费结束引号

        Some(Token {
            kind: TokenKind::Quoted,
            text: &self.input[content_start..content_end],
            span: Span::new(start, self.position),
        })
    }

    /// 读取不含空白和双引号的连续字符
    fn read_bare(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '"' {
                break;
            }
            self.bump();
        }
        Token {
            kind: TokenKind::Bare,
            text: &self.input[start..self.position],
            span: Span::new(start, self.position),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.skip_whitespace();
            let start = self.position;

            // 到达输入末尾
            let c = self.peek()?;

            if c == '"' {
                if let Some(token) = self.read_quoted(start) {
                    return Some(token);
                }
                self.bump(); // 跳过无法配对的引号
                continue;
            }
            return Some(self.read_bare(start));
        }
    }
}

/// 将查询字符串切分为 token 列表
///
/// 编译器和编辑器都必须通过这个函数分词，保证两者对同一查询的理解完全一致。
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<&str> {
        tokenize(input).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_quoted_phrase() {
        assert_eq!(texts(r#"a "b c" d"#), vec!["a", "b c", "d"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t ").is_empty());
    }

    #[test]
    fn test_tags_and_args() {
        let input = "state:run,succ  since:-1d name=foo nightly";
        assert_eq!(
            texts(input),
            vec!["state:run,succ", "since:-1d", "name=foo", "nightly"]
        );
    }

    #[test]
    fn test_token_kinds_and_spans() {
        let input = r#"job "since:2024-01-05 12:00""#;
        let tokens = tokenize(input);
        assert_eq!(tokens.len(), 2);

        assert_eq!(tokens[0].kind, TokenKind::Bare);
        assert_eq!(tokens[0].span, Span::new(0, 3));

        assert_eq!(tokens[1].kind, TokenKind::Quoted);
        assert_eq!(tokens[1].text, "since:2024-01-05 12:00");
        assert_eq!(tokens[1].literal(input), r#""since:2024-01-05 12:00""#);
    }

    #[test]
    fn test_unbalanced_quote_is_skipped() {
        assert_eq!(texts(r#"abc "def"#), vec!["abc", "def"]);
        assert_eq!(texts(r#"a"b"#), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_quotes_are_skipped() {
        assert_eq!(texts(r#"x "" y"#), vec!["x", "y"]);
    }

    #[test]
    fn test_quote_ends_bare_word() {
        assert_eq!(texts(r#"foo"bar baz" qux"#), vec!["foo", "bar baz", "qux"]);
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(texts("größe  \"日本 語\""), vec!["größe", "日本 語"]);
    }
}

use crate::config::TemplateConfig;
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// One argument inside a command: a quoted string or a bare name
const ITEM_PATTERN: &str = r#"(?:"(?:[^\\"]|\\.)*"|[-\w.]+)"#;

static ARGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(ITEM_PATTERN).expect("Lexer: invalid argument pattern regex"));

/// Token types for YAT template text
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Literal text between directives
    Text(String),

    /// `[arg arg ...]`; `raw` is the whole directive including markers
    Command { args: Vec<String>, raw: String },

    /// `[[]`, carries the begin marker to emit literally
    Escape(String),

    /// `[# ...]`, produces no output
    Comment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based line where the token starts
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize) -> Self {
        Self { kind, line }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Text(t) => write!(f, "Text({:?}) at line {}", t, self.line),
            TokenKind::Command { raw, .. } => write!(f, "Command({}) at line {}", raw, self.line),
            TokenKind::Escape(mark) => write!(f, "Escape({}) at line {}", mark, self.line),
            TokenKind::Comment => write!(f, "Comment at line {}", self.line),
        }
    }
}

/// Splits template text into text, command, escape and comment tokens
pub struct Lexer<'a> {
    input: &'a str,
    pattern: Regex,
    begin_mark: String,
    trim_directive_newline: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, config: &TemplateConfig) -> Result<Self> {
        config.validate()?;

        let begin = regex::escape(&config.begin_mark);
        let end = regex::escape(&config.end_mark);

        // (1) command  BEGIN item ([ \t]+ item)* END
        // (2) escape   BEGIN BEGIN END
        // (3) comment  BEGIN # ... END
        let command = format!(r"{b}({item}(?:[ \t]+{item})*){e}", b = begin, e = end, item = ITEM_PATTERN);
        let escape = format!(r"({b}{b}{e})", b = begin, e = end);
        let comment = format!(r"(?s:{b}#.*?{e})", b = begin, e = end);

        let pattern = Regex::new(&format!("{}|{}|{}", command, escape, comment))
            .map_err(|e| Error::config(format!("cannot build directive pattern: {}", e)))?;

        Ok(Self {
            input,
            pattern,
            begin_mark: config.begin_mark.clone(),
            trim_directive_newline: config.trim_directive_newline,
        })
    }

    /// Tokenize the entire input
    pub fn tokenize(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut line = 1;
        let mut last_end = 0;
        let mut after_command = false;

        for caps in self.pattern.captures_iter(self.input) {
            let Some(whole) = caps.get(0) else {
                continue;
            };

            let text = &self.input[last_end..whole.start()];
            self.push_text(&mut tokens, text, line, after_command);
            line += count_newlines(text);

            let kind = if let Some(body) = caps.get(1) {
                TokenKind::Command {
                    args: split_args(body.as_str()),
                    raw: whole.as_str().to_string(),
                }
            } else if caps.get(2).is_some() {
                TokenKind::Escape(self.begin_mark.clone())
            } else {
                TokenKind::Comment
            };

            after_command = matches!(kind, TokenKind::Command { .. });
            let token = Token::new(kind, line);
            log::trace!("lexed {}", token);
            tokens.push(token);

            line += count_newlines(whole.as_str());
            last_end = whole.end();
        }

        let rest = &self.input[last_end..];
        self.push_text(&mut tokens, rest, line, after_command);

        tokens
    }

    fn push_text(&self, tokens: &mut Vec<Token>, text: &str, line: usize, after_command: bool) {
        let (text, line) = if after_command && self.trim_directive_newline {
            let trimmed = strip_leading_newline(text);
            let skipped = count_newlines(&text[..text.len() - trimmed.len()]);
            (trimmed, line + skipped)
        } else {
            (text, line)
        };

        if !text.is_empty() {
            tokens.push(Token::new(TokenKind::Text(text.to_string()), line));
        }
    }
}

/// Split a command body into its arguments
pub fn split_args(body: &str) -> Vec<String> {
    ARGS.find_iter(body).map(|m| m.as_str().to_string()).collect()
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

/// Remove exactly one leading line break (`\r\n`, `\n` or `\r`)
fn strip_leading_newline(text: &str) -> &str {
    text.strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .or_else(|| text.strip_prefix('\r'))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input, &TemplateConfig::default())
            .unwrap()
            .tokenize()
    }

    fn command_args(token: &Token) -> Vec<&str> {
        match &token.kind {
            TokenKind::Command { args, .. } => args.iter().map(String::as_str).collect(),
            other => panic!("Expected command token, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text() {
        let tokens = lex("Hello World");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Text("Hello World".to_string()));
    }

    #[test]
    fn test_empty_input() {
        assert!(lex("").is_empty());
    }

    #[test]
    fn test_command_between_text() {
        let tokens = lex("Hello [name]!");
        assert_eq!(tokens.len(), 3);
        assert_eq!(command_args(&tokens[1]), vec!["name"]);
        match &tokens[1].kind {
            TokenKind::Command { raw, .. } => assert_eq!(raw, "[name]"),
            _ => unreachable!(),
        }
        assert_eq!(tokens[2].kind, TokenKind::Text("!".to_string()));
    }

    #[test]
    fn test_command_with_quoted_argument() {
        let tokens = lex(r#"[if kind is "a \"b\" c"]"#);
        assert_eq!(
            command_args(&tokens[0]),
            vec!["if", "kind", "is", r#""a \"b\" c""#]
        );
    }

    #[test]
    fn test_escape_and_comment() {
        let tokens = lex("a[[]b[# note ]c");
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[1].kind, TokenKind::Escape("[".to_string()));
        assert_eq!(tokens[3].kind, TokenKind::Comment);
        assert_eq!(tokens[4].kind, TokenKind::Text("c".to_string()));
    }

    #[test]
    fn test_newline_trimmed_after_command_only() {
        let tokens = lex("[for x in L]\nbody\n[# c ]\nafter");
        assert_eq!(tokens[1].kind, TokenKind::Text("body\n".to_string()));
        // comments keep the following newline
        assert_eq!(tokens[3].kind, TokenKind::Text("\nafter".to_string()));
    }

    #[test]
    fn test_crlf_trimmed_once() {
        let tokens = lex("[x]\r\n\r\ny");
        assert_eq!(tokens[1].kind, TokenKind::Text("\r\ny".to_string()));

        let tokens = lex("[x]\rz");
        assert_eq!(tokens[1].kind, TokenKind::Text("z".to_string()));
    }

    #[test]
    fn test_trim_disabled() {
        let config = TemplateConfig::default().with_trim_directive_newline(false);
        let tokens = Lexer::new("[x]\ny", &config).unwrap().tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Text("\ny".to_string()));
    }

    #[test]
    fn test_line_numbers() {
        let tokens = lex("one\ntwo [a]\n\nfour [b]");
        let lines: Vec<usize> = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Command { .. }))
            .map(|t| t.line)
            .collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_custom_markers() {
        let config = TemplateConfig::default().with_markers("{% ", " %}");
        let tokens = Lexer::new("{% for key in Items %}\nx{% endfor %}", &config)
            .unwrap()
            .tokenize();
        assert_eq!(command_args(&tokens[0]), vec!["for", "key", "in", "Items"]);
        assert_eq!(tokens[1].kind, TokenKind::Text("x".to_string()));
        assert_eq!(command_args(&tokens[2]), vec!["endfor"]);
    }

    #[test]
    fn test_non_directive_brackets_stay_text() {
        // `[ ]` and `[a, b]` do not match the command grammar
        let tokens = lex("int a[ ]; f([a, b]);");
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn test_split_args() {
        assert_eq!(
            split_args("if-index a is last"),
            vec!["if-index", "a", "is", "last"]
        );
        assert_eq!(split_args("op.return.ice.retn_type"), vec!["op.return.ice.retn_type"]);
    }
}

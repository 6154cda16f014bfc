//! typed placeholders
//!
//! Rewriting a resource swaps values in its tree for [Token]s wrapped in [SENTINEL]s and records
//! what each token stands for as a [Placeholder]. Once the tree is an hcl expression,
//! [Placeholders::substitute] swaps every matching string literal for the placeholder's expression.
use crate::util::PlaceholderSubstitutor;
use crate::visit::VisitExpressionsMut;
use hcl::expr::{Expression, Heredoc, TemplateExpr};
use indexmap::IndexMap;
use sha2::{Digest, Sha512};

/// Wraps tokens embedded into resource trees
pub const SENTINEL: &str = "###";

/// Key of a [Placeholder]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn namespace_ref(namespace: &str) -> Self {
        Self(format!("NamespaceRef_{namespace}"))
    }

    /// Identical payloads share a token
    pub fn multi_line_data_ref(payload: &str) -> Self {
        Self(format!(
            "MultiLineDataRef_{}",
            hex::encode(Sha512::digest(payload.as_bytes()))
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Token as it is embedded into a resource tree
    pub fn wrapped(&self) -> String {
        format!("{SENTINEL}{}{SENTINEL}", self.0)
    }

    /// The bare token of a wrapped token
    pub fn unwrap_str(value: &str) -> Option<&str> {
        value
            .strip_prefix(SENTINEL)?
            .strip_suffix(SENTINEL)
            .filter(|token| !token.is_empty())
    }
}

impl std::borrow::Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a [Token] resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum Placeholder {
    /// Attribute of another declaration, e.g. `kubernetes_manifest.Namespace_acme_bf2a56b.manifest.metadata.name`
    Reference(hcl::Traversal),
    /// Text moved into a heredoc
    Block(Heredoc),
}

impl Placeholder {
    /// Heredoc holding `text` literally
    pub fn block(text: &str) -> Self {
        let template = escape_template(text);
        let delimiter = heredoc_delimiter(&template);

        Placeholder::Block(Heredoc::new(hcl::Identifier::unchecked(delimiter), template))
    }

    pub fn to_expression(&self) -> Expression {
        match self {
            Placeholder::Reference(traversal) => traversal.clone().into(),
            Placeholder::Block(heredoc) => {
                Expression::TemplateExpr(Box::new(TemplateExpr::Heredoc(heredoc.clone())))
            }
        }
    }
}

/// Whether a heredoc reads back as exactly `text`
///
/// A heredoc always ends with a line break, and hcl reads line breaks as `\n`. Anything else stays a
/// quoted string.
pub fn fits_heredoc(text: &str) -> bool {
    text.ends_with('\n') && !text.contains('\r')
}

/// Doubles interpolation (`${`) and directive (`%{`) markers so hcl reads them as literal text
pub fn escape_template(text: &str) -> String {
    text.replace("${", "$${").replace("%{", "%%{")
}

/// `EOF`, unless a line of `text` would end the heredoc early
fn heredoc_delimiter(text: &str) -> String {
    let mut delimiter = String::from("EOF");
    let mut suffix = 0;

    while text.lines().any(|line| line.trim() == delimiter) {
        suffix += 1;
        delimiter = format!("EOF_{suffix}");
    }

    delimiter
}

/// [Placeholder]s by [Token], in the order they were recorded
#[derive(Debug, Default, Clone)]
pub struct Placeholders(IndexMap<Token, Placeholder>);

impl Placeholders {
    pub fn insert(&mut self, token: Token, placeholder: Placeholder) {
        self.0.insert(token, placeholder);
    }

    pub fn get(&self, token: &str) -> Option<&Placeholder> {
        self.0.get(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replaces every wrapped token string in `expression` with its placeholder's expression
    ///
    /// Tokens without a placeholder stay literal strings.
    pub fn substitute(&self, expression: &mut Expression) {
        let mut substitutor = PlaceholderSubstitutor::new(self);
        expression.visit_expressions_mut(&mut substitutor);
    }
}

impl Extend<(Token, Placeholder)> for Placeholders {
    fn extend<T: IntoIterator<Item = (Token, Placeholder)>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference() -> Placeholder {
        Placeholder::Reference(
            hcl::Traversal::builder(hcl::Variable::unchecked("kubernetes_manifest"))
                .attr("Namespace_acme_bf2a56b")
                .attr("manifest")
                .build(),
        )
    }

    #[test]
    fn wraps_and_unwraps() {
        let token = Token::namespace_ref("acme");

        assert_eq!(token.wrapped(), "###NamespaceRef_acme###");
        assert_eq!(Token::unwrap_str(&token.wrapped()), Some("NamespaceRef_acme"));
        assert_eq!(Token::unwrap_str("NamespaceRef_acme"), None);
        assert_eq!(Token::unwrap_str("######"), None);
        assert_eq!(Token::unwrap_str("###a"), None);
    }

    #[test]
    fn payload_tokens() {
        let token = Token::multi_line_data_ref("a\nb");

        assert_eq!(token, Token::multi_line_data_ref("a\nb"));
        assert_ne!(token, Token::multi_line_data_ref("a\nc"));
        // prefix + 128 hex characters of sha512
        assert_eq!(token.as_str().len(), "MultiLineDataRef_".len() + 128);
    }

    #[test]
    fn escapes_markers() {
        assert_eq!(
            escape_template("${var} %{ if x } $$ %% {}"),
            "$${var} %%{ if x } $$ %% {}"
        );
    }

    #[test]
    fn heredoc_candidates() {
        assert!(fits_heredoc("a\nb\n"));
        assert!(fits_heredoc("\n"));
        assert!(!fits_heredoc("a\nb"));
        assert!(!fits_heredoc("x\r"));
        assert!(!fits_heredoc("a\r\nb\r\n"));
        assert!(!fits_heredoc("one line"));
    }

    #[test]
    fn block_delimiter_avoids_payload_lines() {
        let Placeholder::Block(heredoc) = Placeholder::block("a\nEOF\n  EOF_1\nb\n") else {
            panic!("expected block");
        };

        assert_eq!(heredoc.delimiter.as_str(), "EOF_2");
        assert_eq!(heredoc.template, "a\nEOF\n  EOF_1\nb\n");
    }

    #[test]
    fn substitutes_known_tokens() {
        let mut placeholders = Placeholders::default();
        placeholders.insert(Token::namespace_ref("acme"), reference());

        let mut expression = Expression::Array(vec![
            Expression::String("###NamespaceRef_acme###".into()),
            Expression::String("###NamespaceRef_other###".into()),
            Expression::String("plain".into()),
        ]);
        placeholders.substitute(&mut expression);

        assert_eq!(
            expression,
            Expression::Array(vec![
                reference().to_expression(),
                Expression::String("###NamespaceRef_other###".into()),
                Expression::String("plain".into()),
            ])
        );
    }

    #[test]
    fn substitutes_nested_objects() {
        let mut placeholders = Placeholders::default();
        let token = Token::multi_line_data_ref("line\n");
        placeholders.insert(token.clone(), Placeholder::block("line\n"));

        let mut expression = hcl::expr::to_expression(&serde_json::json!({
            "data": { "file": token.wrapped() }
        }))
        .unwrap();
        placeholders.substitute(&mut expression);

        let Expression::Object(object) = &expression else {
            panic!("expected object");
        };
        let Some(Expression::Object(data)) = object.values().next() else {
            panic!("expected nested object");
        };
        assert_eq!(
            data.values().next(),
            Some(&Placeholder::block("line\n").to_expression())
        );
    }
}

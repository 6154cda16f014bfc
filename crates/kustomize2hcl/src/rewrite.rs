//! rewrites that have to happen before a resource can be rendered
//!
//! Two things in a resource can't be rendered as plain literals:
//! - its namespace, when that namespace is declared by the same input. It becomes a reference to the
//!   namespace declaration, so terraform knows about the dependency ([resolve_namespace]).
//! - multi-line text in `data`. It becomes a heredoc ([extract_multiline_text]) when it ends with a
//!   line break.
//!
//! Both steps are pure: they return a new resource value with [Token]s in place of the literal values
//! and the [Placeholder]s the tokens stand for. [rewrite] stores the new values in the collection,
//! checks the identity of the rewritten resource is still unique and hands out the [Renderable] that
//! rendering requires.
use crate::config::Config;
use crate::naming;
use crate::placeholder::{self, Placeholder, Placeholders, Token};
use crate::resource::{ResId, Resource, ResourceCollection};
use serde_json::Value;

/// Result of [resolve_namespace]
#[derive(Debug)]
pub struct NamespaceRewrite {
    pub token: Token,
    pub placeholder: Placeholder,
    /// resource with the wrapped token as namespace
    pub resource: Resource,
}

/// Rewrites the namespace of `resource` into a reference to its `Namespace` declaration
///
/// Returns `None` when the resource has no namespace or its namespace is not part of `collection`.
pub fn resolve_namespace(
    resource: &Resource,
    collection: &ResourceCollection,
    config: &Config,
) -> Option<NamespaceRewrite> {
    let namespace = resource.namespace();
    if namespace.is_empty() {
        return None;
    }

    let Some(namespace_resource) = collection.get_by_id(&ResId::namespace(namespace)) else {
        tracing::trace!(namespace, id = %resource.id(), "namespace is not declared, keeping literal");
        return None;
    };

    let token = Token::namespace_ref(namespace);
    let traversal = hcl::Traversal::builder(hcl::Variable::unchecked(config.resource_type.as_str()))
        .attr(hcl::Identifier::unchecked(naming::identifier(namespace_resource)))
        .attr(hcl::Identifier::unchecked(config.manifest_attribute.as_str()))
        .attr("metadata")
        .attr("name")
        .build();

    Some(NamespaceRewrite {
        resource: resource.with_namespace(&token.wrapped()),
        placeholder: Placeholder::Reference(traversal),
        token,
    })
}

/// Result of [extract_multiline_text]
#[derive(Debug)]
pub struct DataRewrite {
    pub placeholders: Vec<(Token, Placeholder)>,
    /// resource with wrapped tokens in place of multi-line values
    pub resource: Resource,
}

/// Moves multi-line values of the `data` mapping into heredocs
///
/// Only values a heredoc reproduces exactly are moved ([placeholder::fits_heredoc]), the rest stay
/// quoted strings. Returns `None` when there is no `data` or nothing to move.
pub fn extract_multiline_text(resource: &Resource) -> Result<Option<DataRewrite>, TransformError> {
    let data = match resource.field("data") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(data)) => data,
        Some(other) => {
            return Err(TransformError::MalformedField {
                id: resource.id().clone(),
                field: "data".to_string(),
                reason: format!("expected a mapping, found {}", value_kind(other)),
            })
        }
    };

    let mut data = data.clone();
    let mut placeholders = vec![];

    for (key, value) in data.iter_mut() {
        let Value::String(text) = value else {
            return Err(TransformError::MalformedField {
                id: resource.id().clone(),
                field: format!("data.{key}"),
                reason: format!("expected a string, found {}", value_kind(value)),
            });
        };

        if !text.contains(['\n', '\r']) {
            continue;
        }

        if !placeholder::fits_heredoc(text) {
            tracing::trace!(%key, id = %resource.id(), "keeping multi-line value quoted");
            continue;
        }

        let token = Token::multi_line_data_ref(text);
        let placeholder = Placeholder::block(text);
        tracing::trace!(%key, %token, id = %resource.id(), "moving multi-line value into heredoc");

        *value = Value::String(token.wrapped());
        placeholders.push((token, placeholder));
    }

    if placeholders.is_empty() {
        return Ok(None);
    }

    Ok(Some(DataRewrite {
        resource: resource.with_field("data", Value::Object(data)),
        placeholders,
    }))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// A rewritten resource, ready to be rendered
///
/// Only [rewrite] creates these.
#[derive(Debug)]
pub struct Renderable<'c> {
    identifier: String,
    resource: &'c Resource,
    placeholders: Placeholders,
}

impl<'c> Renderable<'c> {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn resource(&self) -> &'c Resource {
        self.resource
    }

    pub fn placeholders(&self) -> &Placeholders {
        &self.placeholders
    }
}

/// Applies both rewrites to the resource at `index` and stores the result in `collection`
///
/// # Errors
/// - [TransformError::IdentityConflict] when the rewritten identity matches another resource
/// - [TransformError::MalformedField] when `data` is not a mapping of strings
///
/// # Panics
/// Panics if `index` is out of bounds.
pub fn rewrite<'c>(
    collection: &'c mut ResourceCollection,
    index: usize,
    config: &Config,
) -> Result<Renderable<'c>, TransformError> {
    let identifier = naming::identifier(&collection[index]);
    let mut placeholders = Placeholders::default();

    if let Some(namespace_rewrite) = resolve_namespace(&collection[index], collection, config) {
        let id = namespace_rewrite.resource.id().clone();
        collection.replace(index, namespace_rewrite.resource);

        let matches = collection.matching_current_id(|current| current == &id).len();
        if matches != 1 {
            return Err(TransformError::IdentityConflict { id, matches });
        }

        placeholders.insert(namespace_rewrite.token, namespace_rewrite.placeholder);
    }

    if let Some(data_rewrite) = extract_multiline_text(&collection[index])? {
        collection.replace(index, data_rewrite.resource);
        placeholders.extend(data_rewrite.placeholders);
    }

    let collection: &'c ResourceCollection = collection;
    Ok(Renderable {
        identifier,
        resource: &collection[index],
        placeholders,
    })
}

#[derive(thiserror::Error, Debug)]
pub enum TransformError {
    #[error("Namespace rewrite of {id} produces an identity conflict ({matches} resources match)")]
    IdentityConflict { id: ResId, matches: usize },
    #[error("Field `{field}` of {id} is malformed: {reason}")]
    MalformedField {
        id: ResId,
        field: String,
        reason: String,
    },
    #[error("Two resources are both named {identifier}")]
    IdentifierCollision { identifier: String },
    #[error("Unable to normalize {identifier}")]
    Normalize {
        identifier: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unable to format {identifier} as hcl")]
    Formatting {
        identifier: String,
        #[source]
        source: hcl::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::resource::test::ACME;
    use crate::resources;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_namespace() {
        let collection = resources!(ACME);

        assert!(resolve_namespace(&collection[0], &collection, &Config::default()).is_none());
    }

    #[test]
    fn namespace_in_collection() {
        let collection = resources!(ACME);

        let rewrite = resolve_namespace(&collection[1], &collection, &Config::default())
            .expect("namespace is declared");

        assert_eq!(rewrite.token.as_str(), "NamespaceRef_acme");
        assert_eq!(rewrite.resource.namespace(), "###NamespaceRef_acme###");
        assert_eq!(
            rewrite.resource.tree()["metadata"]["namespace"],
            "###NamespaceRef_acme###"
        );

        let expected = hcl::Traversal::builder(hcl::Variable::unchecked("kubernetes_manifest"))
            .attr("Namespace_acme_bf2a56b")
            .attr("manifest")
            .attr("metadata")
            .attr("name")
            .build();
        assert_eq!(rewrite.placeholder, Placeholder::Reference(expected));

        // pure
        assert_eq!(collection[1].namespace(), "acme");
    }

    #[test]
    fn namespace_not_in_collection() {
        let collection = resources!(
            "{apiVersion: v1, kind: ServiceAccount, metadata: {name: svc, namespace: default}}"
        );

        assert!(resolve_namespace(&collection[0], &collection, &Config::default()).is_none());
    }

    #[test]
    fn rewrite_stores_rewritten_resource() {
        let mut collection = resources!(ACME);

        let renderable = rewrite(&mut collection, 1, &Config::default()).unwrap();
        assert_eq!(renderable.identifier(), "ServiceAccount_svc_bc18bc3");
        assert_eq!(renderable.placeholders().len(), 1);
        assert_eq!(renderable.resource().namespace(), "###NamespaceRef_acme###");

        let id = ResId::new("v1", "ServiceAccount", "###NamespaceRef_acme###", "svc");
        assert_eq!(collection.matching_current_id(|current| current == &id).len(), 1);
        assert!(collection
            .get_by_id(&ResId::new("v1", "ServiceAccount", "acme", "svc"))
            .is_none());
    }

    #[test]
    fn rewrite_without_relationships() {
        let mut collection = resources!(ACME);
        let before = collection[0].clone();

        let renderable = rewrite(&mut collection, 0, &Config::default()).unwrap();
        assert!(renderable.placeholders().is_empty());
        assert_eq!(renderable.resource(), &before);
    }

    #[test]
    fn identity_conflict() {
        let mut collection = resources!(
            r####"
apiVersion: v1
kind: Namespace
metadata:
  name: acme
---
apiVersion: v1
kind: ServiceAccount
metadata:
  name: svc
  namespace: acme
---
apiVersion: v1
kind: ServiceAccount
metadata:
  name: svc
  namespace: "###NamespaceRef_acme###"
"####
        );

        let error = rewrite(&mut collection, 1, &Config::default()).expect_err("must conflict");
        assert!(matches!(
            error,
            TransformError::IdentityConflict { matches: 2, .. }
        ));
    }

    #[test]
    fn extracts_multiline_values() {
        let collection = resources!(
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
data:
  single: one line
  script: |
    echo ${HOME}
    %{ not a directive }
  windows: "a\r"
  unterminated: "a\nb"
"#
        );

        let rewrite = extract_multiline_text(&collection[0])
            .unwrap()
            .expect("has multi-line values");

        let data = &rewrite.resource.tree()["data"];
        assert_eq!(data["single"], "one line");
        assert_eq!(data["windows"], "a\r");
        assert_eq!(data["unterminated"], "a\nb");

        let script_token = Token::multi_line_data_ref("echo ${HOME}\n%{ not a directive }\n");
        assert_eq!(data["script"], script_token.wrapped().as_str());

        assert_eq!(rewrite.placeholders.len(), 1);
        let (token, Placeholder::Block(heredoc)) = &rewrite.placeholders[0] else {
            panic!("expected block");
        };
        assert_eq!(token, &script_token);
        assert_eq!(heredoc.template, "echo $${HOME}\n%%{ not a directive }\n");
    }

    #[test]
    fn no_data() {
        let collection = resources!(ACME);
        assert!(extract_multiline_text(&collection[0]).unwrap().is_none());

        let collection = resources!(
            "{apiVersion: v1, kind: ConfigMap, metadata: {name: settings}, data: {a: b}}"
        );
        assert!(extract_multiline_text(&collection[0]).unwrap().is_none());
    }

    #[test]
    fn malformed_data() {
        let collection = resources!(
            "{apiVersion: v1, kind: ConfigMap, metadata: {name: settings}, data: {count: 3}}"
        );
        match extract_multiline_text(&collection[0]) {
            Err(TransformError::MalformedField { field, .. }) => assert_eq!(field, "data.count"),
            other => panic!("expected malformed field, got {other:?}"),
        }

        let collection =
            resources!("{apiVersion: v1, kind: ConfigMap, metadata: {name: settings}, data: [a]}");
        match extract_multiline_text(&collection[0]) {
            Err(TransformError::MalformedField { field, .. }) => assert_eq!(field, "data"),
            other => panic!("expected malformed field, got {other:?}"),
        }
    }
}

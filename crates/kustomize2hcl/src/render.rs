//! hcl declarations
//!
//! A resource renders as
//! ```hcl
//! resource "kubernetes_manifest" "<identifier>" {
//!   provider = kubernetes-alpha
//!   manifest = { ... }
//! }
//! ```
//! where the manifest is the resource's tree as an hcl object, with placeholders substituted.
use crate::config::Config;
use crate::rewrite::{Renderable, TransformError};
use hcl::{Block, Body, Expression};
use serde_json::Value;

/// Renders a rewritten resource as hcl text
pub fn render(renderable: &Renderable<'_>, config: &Config) -> Result<String, TransformError> {
    let body = declaration(renderable, config)?;
    hcl::format::to_string(&body).map_err(formatting_error(renderable.identifier()))
}

/// The declaration block of a rewritten resource
pub fn declaration(renderable: &Renderable<'_>, config: &Config) -> Result<Body, TransformError> {
    let identifier = renderable.identifier();

    let tree = normalize(renderable).map_err(|source| TransformError::Normalize {
        identifier: identifier.to_string(),
        source,
    })?;

    let mut manifest = hcl::expr::to_expression(&tree).map_err(formatting_error(identifier))?;
    if !renderable.placeholders().is_empty() {
        renderable.placeholders().substitute(&mut manifest);
    }

    let provider = config
        .provider_variable()
        .map_err(formatting_error(identifier))?;

    Ok(Body::builder()
        .add_block(
            Block::builder("resource")
                .add_label(config.resource_type.as_str())
                .add_label(identifier)
                .add_attribute(("provider", Expression::Variable(provider)))
                .add_attribute((config.manifest_attribute.as_str(), manifest))
                .build(),
        )
        .build())
}

/// Generic value tree of the resource, via a round trip through json
fn normalize(renderable: &Renderable<'_>) -> serde_json::Result<Value> {
    let json = serde_json::to_string(renderable.resource().tree())?;
    serde_json::from_str(&json)
}

/// Provider requirement and configuration
pub fn main_declarations(config: &Config) -> Result<String, TransformError> {
    let identifier = crate::writer::MAIN;
    config
        .provider_variable()
        .map_err(formatting_error(identifier))?;
    let provider = hcl::Identifier::unchecked(config.provider_alias.as_str());

    let requirement: hcl::Object<hcl::ObjectKey, Expression> = [
        ("source", config.provider_source.as_str()),
        ("version", config.provider_version.as_str()),
    ]
    .into_iter()
    .map(|(key, value)| {
        (
            hcl::Identifier::unchecked(key).into(),
            Expression::String(value.to_string()),
        )
    })
    .collect();

    let body = Body::builder()
        .add_block(
            Block::builder("terraform")
                .add_block(
                    Block::builder("required_providers")
                        .add_attribute((provider.clone(), Expression::Object(requirement)))
                        .build(),
                )
                .build(),
        )
        .add_block(
            Block::builder("provider")
                .add_label(provider.as_str())
                .add_attribute((
                    "config_path",
                    Expression::String(config.config_path.clone()),
                ))
                .build(),
        )
        .build();

    hcl::format::to_string(&body).map_err(formatting_error(identifier))
}

fn formatting_error(identifier: &str) -> impl FnOnce(hcl::Error) -> TransformError + '_ {
    move |source| TransformError::Formatting {
        identifier: identifier.to_string(),
        source,
    }
}

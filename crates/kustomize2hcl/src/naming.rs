//! terraform resource names
use crate::resource::Resource;
use sha2::{Digest, Sha512};

/// hex characters of the identity fingerprint kept in a name
///
/// Generated output in the wild depends on this length.
const FINGERPRINT_LEN: usize = 7;

/// Terraform resource name of `resource`
///
/// Names need to be unique and stable across releases. Kubernetes kinds are only unique per group
/// and version though, and the full composite identity is neither a valid nor a readable name.
///
/// So the name is `<kind>_<original name>_<fingerprint>` where the fingerprint is a short hash of
/// the identity the resource was loaded with. Rewrites applied later do not change it.
pub fn identifier(resource: &Resource) -> String {
    let fingerprint = fingerprint(&resource.origin().to_string());
    sanitize(&format!(
        "{}_{}_{}",
        resource.kind(),
        resource.original_name(),
        fingerprint
    ))
}

fn fingerprint(id: &str) -> String {
    let mut hash = hex::encode(Sha512::digest(id.as_bytes()));
    hash.truncate(FINGERPRINT_LEN);
    hash
}

/// Makes strings taken from kubernetes yaml meet terraform's name requirements
///
/// A name must start with a letter or underscore and may continue with letters, digits, underscores
/// and dashes, where letters and digits are what unicode allows in identifiers (`XID_Start`,
/// `XID_Continue`). Anything else becomes a dash, and an invalid first character gets an underscore
/// in front of it.
pub fn sanitize(input: &str) -> String {
    let mut output = String::with_capacity(input.len() + 1);

    for (position, ch) in input.chars().enumerate() {
        if ch == '_' || unicode_ident::is_xid_start(ch) {
            output.push(ch);
            continue;
        }

        if position == 0 {
            output.push('_');
        }

        if unicode_ident::is_xid_continue(ch) {
            output.push(ch);
            continue;
        }

        output.push('-');
    }

    output
}

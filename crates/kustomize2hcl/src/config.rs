//! generator settings
//!
//! The defaults target the `kubernetes-alpha` provider and its `kubernetes_manifest` resource.

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Provider alias every declaration selects, must be a valid hcl identifier
    pub provider_alias: String,
    pub provider_source: String,
    /// Version constraint of the provider requirement
    pub provider_version: String,
    /// Kubeconfig path the provider is configured with
    pub config_path: String,
    /// Terraform resource type of every declaration
    pub resource_type: String,
    /// Attribute holding the manifest tree
    pub manifest_attribute: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_alias: "kubernetes-alpha".to_string(),
            provider_source: "hashicorp/kubernetes-alpha".to_string(),
            provider_version: ">= 0.2.1".to_string(),
            config_path: "~/.kube/config".to_string(),
            resource_type: "kubernetes_manifest".to_string(),
            manifest_attribute: "manifest".to_string(),
        }
    }
}

impl Config {
    pub fn provider_variable(&self) -> hcl::Result<hcl::Variable> {
        hcl::Variable::new(self.provider_alias.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_alias_is_valid() {
        assert!(Config::default().provider_variable().is_ok());
    }

    #[test]
    fn invalid_alias() {
        let config = Config {
            provider_alias: "1 provider".to_string(),
            ..Default::default()
        };

        assert!(config.provider_variable().is_err());
    }
}

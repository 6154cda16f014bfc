//! kustomize2hcl cli interface

use clap::Parser;
use kustomize2hcl::config::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; kustomize2hcl ... }
    #[clap(short = 'C', long = "directory")]
    pub directory: Vec<PathBuf>,

    /// Rendered resources
    ///
    /// A yaml file, a directory of yaml files or `-` for stdin.
    /// Use the output of `kustomize build`.
    pub input: PathBuf,

    /// Directory to write terraform files to
    ///
    /// Must be empty or not exist yet.
    pub output: PathBuf,

    #[clap(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Parser, Debug)]
pub struct ProviderArgs {
    /// Source of the provider requirement [default: hashicorp/kubernetes-alpha]
    #[clap(long = "provider-source")]
    pub source: Option<String>,

    /// Version constraint of the provider requirement [default: ">= 0.2.1"]
    #[clap(long = "provider-version")]
    pub version: Option<String>,

    /// Kubeconfig the provider uses [default: ~/.kube/config]
    #[clap(long = "config-path")]
    pub config_path: Option<String>,
}

impl From<ProviderArgs> for Config {
    fn from(value: ProviderArgs) -> Self {
        let defaults = Config::default();
        Config {
            provider_source: value.source.unwrap_or(defaults.provider_source),
            provider_version: value.version.unwrap_or(defaults.provider_version),
            config_path: value.config_path.unwrap_or(defaults.config_path),
            ..defaults
        }
    }
}

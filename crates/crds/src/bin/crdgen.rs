//! Prints the WebApp CRD manifest to stdout.

use crds::WebApp;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&WebApp::crd())?);
    Ok(())
}

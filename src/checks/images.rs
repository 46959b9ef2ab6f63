//! # Component Image Checks
//!
//! One check per component. The probed image is chosen first-match-wins:
//!
//! 1. the component's custom image, parsed as a custom path
//! 2. `<apiUrlHost>/linux/<component>[:<version>]`, parsed as a vendor path
//!
//! Code modules have no vendor default: without a custom image there is
//! nothing to probe. Components the DynaKube does not declare are reported
//! and pass.

use crate::check::CheckAction;
use crate::constants::{FULLSTACK_COMPONENT, GATEWAY_COMPONENT, VENDOR_IMAGE_SEGMENT};
use crate::context::RunContext;
use crate::dynakube::DynaKube;
use crate::error::{Error, Result};
use crate::image::{ImageReference, parse_custom_image, parse_vendor_image};
use crate::log;
use crate::registry::RegistryProbe;
use async_trait::async_trait;
use std::fmt;
use url::Url;

/// Components whose image is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Host agent.
    Fullstack,
    /// Injected code modules.
    CodeModules,
    /// ActiveGate.
    Gateway,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fullstack => write!(f, "fullstack"),
            Self::CodeModules => write!(f, "code-modules"),
            Self::Gateway => write!(f, "gateway"),
        }
    }
}

impl Component {
    fn declared(self, dynakube: &DynaKube) -> bool {
        match self {
            Self::Fullstack => dynakube.has_fullstack(),
            Self::CodeModules => dynakube.has_code_modules(),
            Self::Gateway => dynakube.has_gateway(),
        }
    }

    fn custom_image(self, dynakube: &DynaKube) -> Option<&str> {
        match self {
            Self::Fullstack => dynakube.fullstack_image(),
            Self::CodeModules => dynakube.code_modules_image(),
            Self::Gateway => dynakube.gateway_image(),
        }
    }
}

/// `host[:port]` of the API URL.
fn api_host(api_url: &str) -> Result<String> {
    let invalid = |reason: &str| Error::InvalidApiUrl {
        url: api_url.to_string(),
        reason: reason.to_string(),
    };
    let url = Url::parse(api_url).map_err(|e| invalid(&e.to_string()))?;
    let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Image reference to probe for a component, or `None` when there is
/// nothing to probe.
///
/// # Errors
///
/// - [`Error::InvalidImage`] if the image does not parse
/// - [`Error::InvalidApiUrl`] if a vendor image is needed and `apiUrl` has
///   no host
pub fn resolve_image(dynakube: &DynaKube, component: Component) -> Result<Option<ImageReference>> {
    if !component.declared(dynakube) {
        return Ok(None);
    }
    if let Some(image) = component.custom_image(dynakube) {
        return parse_custom_image(image).map(Some);
    }

    let name = match component {
        Component::Fullstack => FULLSTACK_COMPONENT,
        Component::Gateway => GATEWAY_COMPONENT,
        Component::CodeModules => return Ok(None),
    };
    let mut image = format!(
        "{}/{}/{}",
        api_host(dynakube.api_url())?,
        VENDOR_IMAGE_SEGMENT,
        name
    );
    if component == Component::Fullstack {
        if let Some(version) = dynakube.fullstack_version() {
            image = format!("{}:{}", image, version);
        }
    }
    parse_vendor_image(&image).map(Some)
}

/// Probes the component's image through the assembled transport.
pub struct ImagePullable(pub Component);

#[async_trait]
impl CheckAction for ImagePullable {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let component = self.0;
        let dynakube = ctx.dynakube()?;

        let reference = match resolve_image(dynakube, component)? {
            Some(reference) => reference,
            None if component.declared(dynakube) => {
                log::detail(format!("no {} image configured", component));
                return Ok(());
            }
            None => {
                log::detail(format!("{} not enabled, nothing to probe", component));
                return Ok(());
            }
        };

        log::detail(format!("probing {} image {}", component, reference));
        let probe = RegistryProbe::new(ctx.transport()?, ctx.keychain()?.clone());
        ctx.bounded(probe.probe(&reference)).await??;
        Ok(())
    }
}

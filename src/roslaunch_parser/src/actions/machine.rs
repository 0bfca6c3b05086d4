//! Machine declaration action

use super::{optional_subs, required_subs, resolve, resolve_opt};
use crate::{
    error::{LaunchError, Result},
    model::{MachineDefault, MachineSpec},
    scope::Scope,
    substitution::{Substitution, SubstitutionContext},
    xml::Element,
};

const DEFAULT_SSH_PORT: u16 = 22;
const DEFAULT_TIMEOUT: f64 = 10.0;

/// `<machine>` declaration
#[derive(Debug, Clone)]
pub struct MachineAction {
    pub name: Vec<Substitution>,
    pub address: Vec<Substitution>,
    pub ssh_port: Option<Vec<Substitution>>,
    pub env_loader: Option<Vec<Substitution>>,
    pub default: Option<Vec<Substitution>>,
    pub user: Option<Vec<Substitution>>,
    pub password: Option<Vec<Substitution>>,
    pub timeout: Option<Vec<Substitution>>,
}

impl MachineAction {
    pub fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            name: required_subs(element, "name")?,
            address: required_subs(element, "address")?,
            ssh_port: optional_subs(element, "ssh-port")?,
            env_loader: optional_subs(element, "env-loader")?,
            default: optional_subs(element, "default")?,
            user: optional_subs(element, "user")?,
            password: optional_subs(element, "password")?,
            timeout: optional_subs(element, "timeout")?,
        })
    }

    /// Resolve the machine definition. `ros_distro` picks the default env-loader.
    pub fn resolve(
        &self,
        element: &Element,
        scope: &Scope,
        context: &SubstitutionContext,
        ros_distro: &str,
    ) -> Result<MachineSpec> {
        let ssh_port = match resolve_opt(&self.ssh_port, scope, context)? {
            Some(port) => port.trim().parse::<u16>().map_err(|_| {
                LaunchError::invalid_value("ssh-port", port.as_str(), "not a valid port number")
            })?,
            None => DEFAULT_SSH_PORT,
        };

        let timeout = match resolve_opt(&self.timeout, scope, context)? {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(t) if t > 0.0 => t,
                _ => {
                    return Err(LaunchError::invalid_value(
                        "timeout",
                        raw,
                        "must be a positive number",
                    ))
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        let default = match resolve_opt(&self.default, scope, context)? {
            None => MachineDefault::False,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => MachineDefault::True,
                "false" => MachineDefault::False,
                "never" => MachineDefault::Never,
                _ => {
                    return Err(LaunchError::invalid_value(
                        "default",
                        raw,
                        "expected true, false or never",
                    ))
                }
            },
        };

        let env_loader = resolve_opt(&self.env_loader, scope, context)?
            .unwrap_or_else(|| format!("/opt/ros/{}/env.sh", ros_distro));

        Ok(MachineSpec {
            name: resolve(&self.name, scope, context)?,
            address: resolve(&self.address, scope, context)?,
            ssh_port,
            env_loader,
            user: resolve_opt(&self.user, scope, context)?,
            password: resolve_opt(&self.password, scope, context)?,
            timeout,
            default,
            location: element.location().clone(),
        })
    }
}

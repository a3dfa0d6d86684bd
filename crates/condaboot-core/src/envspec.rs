use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DependencyEntry {
    Spec(String),
    Pip { pip: Vec<String> },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecSupplements {
    pub specs: Vec<String>,
    pub channels: Vec<String>,
    pub pip_args: Vec<String>,
    pub python_version: Option<String>,
}

impl SpecSupplements {
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
            && self.channels.is_empty()
            && self.pip_args.is_empty()
            && self.python_version.is_none()
    }
}

impl EnvironmentSpec {
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let spec: Self =
            serde_yaml::from_str(input).context("failed to parse environment spec document")?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("failed to serialize environment spec document")
    }

    fn validate(&self) -> Result<()> {
        for channel in &self.channels {
            if channel.trim().is_empty() {
                return Err(anyhow!("environment spec channel must not be empty"));
            }
        }
        for entry in &self.dependencies {
            match entry {
                DependencyEntry::Spec(spec) => {
                    if spec.trim().is_empty() {
                        return Err(anyhow!("environment spec dependency must not be empty"));
                    }
                }
                DependencyEntry::Pip { pip } => {
                    if pip.iter().any(|arg| arg.trim().is_empty()) {
                        return Err(anyhow!("pip dependency entries must not be empty"));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn apply_supplements(&mut self, supplements: &SpecSupplements) {
        self.channels.extend(supplements.channels.iter().cloned());
        for spec in &supplements.specs {
            self.dependencies.push(DependencyEntry::Spec(spec.clone()));
        }
        if let Some(version) = &supplements.python_version {
            self.dependencies
                .push(DependencyEntry::Spec(format!("python={version}")));
        }
        if !supplements.pip_args.is_empty() {
            self.fold_pip_args(&supplements.pip_args);
        }
    }

    // At most one pip block per document: extend an existing one in place,
    // append a new trailing block only when none exists.
    pub fn fold_pip_args(&mut self, pip_args: &[String]) {
        for entry in &mut self.dependencies {
            if let DependencyEntry::Pip { pip } = entry {
                pip.extend(pip_args.iter().cloned());
                return;
            }
        }
        self.dependencies.push(DependencyEntry::Pip {
            pip: pip_args.to_vec(),
        });
    }

    pub fn pip_block(&self) -> Option<&[String]> {
        self.dependencies.iter().find_map(|entry| match entry {
            DependencyEntry::Pip { pip } => Some(pip.as_slice()),
            DependencyEntry::Spec(_) => None,
        })
    }
}

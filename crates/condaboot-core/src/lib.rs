mod distribution;
mod envspec;
mod version;

pub use distribution::{Distribution, InstallerSource};
pub use envspec::{DependencyEntry, EnvironmentSpec, SpecSupplements};
pub use version::{CudaPin, PythonVersion};

#[cfg(test)]
mod tests;

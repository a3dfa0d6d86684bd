use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use condaboot_core::{
    CudaPin, Distribution, EnvironmentSpec, InstallerSource, PythonVersion, SpecSupplements,
};
use condaboot_installer::{
    append_always_yes, apply_environment_spec, bind_interpreter, check, detect_python_version,
    fetch_installer, install_packages, list_packages, patch_live_process, probe_package_manager,
    restart_kernel, run_installer, write_pins, BindOutcome, BootstrapError, EnvSnapshot,
    PrefixLayout, TrampolineStyle,
};

use crate::render::TerminalRenderer;

const IPYTHON_CONFIG_PATH: &str = "/etc/ipython/ipython_config.py";

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub distribution: Option<String>,
    pub url: Option<String>,
    pub sha256: Option<String>,
    pub prefix: PathBuf,
    pub interpreter: PathBuf,
    pub python_version: Option<String>,
    pub env_overrides: Vec<String>,
    pub extra_specs: Vec<String>,
    pub channels: Vec<String>,
    pub pip_args: Vec<String>,
    pub env_file: Option<String>,
    pub trampoline: String,
    pub force: bool,
    pub no_restart: bool,
}

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub prefix: PathBuf,
    pub interpreter: PathBuf,
    pub python_version: Option<String>,
    pub trampoline: String,
}

pub fn install_flow(options: InstallOptions) -> Result<()> {
    let renderer = TerminalRenderer::current();
    let layout = PrefixLayout::new(&options.prefix);
    let style = TrampolineStyle::parse(&options.trampoline)?;
    let python = resolve_python_version(options.python_version.as_deref(), &options.interpreter)?;
    let env_overrides = parse_env_overrides(&options.env_overrides)?;

    if !options.force {
        let report = check(&layout, python, style, &EnvSnapshot::capture());
        if report.is_satisfied() {
            renderer.print_status("ok", "environment already bootstrapped");
            return Ok(());
        }
    }

    let source = resolve_installer_source(
        options.distribution.as_deref(),
        options.url.as_deref(),
        options.sha256.as_deref(),
    )?;
    renderer.print_status("..", &format!("fetching installer from {}", source.url));
    let mut progress = renderer.start_download("installer");
    let installer_path = fetch_installer(&layout, &source, |downloaded, total| {
        progress.update(downloaded, total);
    })?;
    progress.finish();

    renderer.print_status(
        "..",
        &format!("running installer into {}", layout.prefix().display()),
    );
    run_installer(&layout, &installer_path)?;

    let cuda_version = std::env::var("CUDA_VERSION").ok();
    let cuda = CudaPin::from_env_value(cuda_version.as_deref());
    write_pins(&layout, python, &cuda)?;
    append_always_yes(&layout)?;
    renderer.print_status(
        "ok",
        &format!("pinned python {python}, cuda family {}", cuda.family()),
    );

    let env_document = match &options.env_file {
        Some(location) => Some(load_env_document(location)?),
        None => None,
    };
    let spec = resolve_environment_spec(
        env_document.as_deref(),
        &options.extra_specs,
        &options.channels,
        &options.pip_args,
        python,
    )?;
    if let Some(spec) = &spec {
        let kind = probe_package_manager(&layout);
        renderer.print_status(
            "..",
            &format!("updating base environment with {}", kind.as_str()),
        );
        apply_environment_spec(&layout, kind, spec)?;
    }

    match bind_interpreter(&options.interpreter, &layout, style, &env_overrides)? {
        BindOutcome::Bound => renderer.print_status(
            "ok",
            &format!("bound interpreter {}", options.interpreter.display()),
        ),
        BindOutcome::AlreadyBound => renderer.print_status(
            "warn",
            &format!("interpreter already bound: {}", options.interpreter.display()),
        ),
        BindOutcome::MissingTarget => renderer.print_status(
            "warn",
            &format!(
                "interpreter not found, skipping bind: {}",
                options.interpreter.display()
            ),
        ),
    }

    patch_live_process(&layout, python, Path::new(IPYTHON_CONFIG_PATH))?;
    renderer.print_status("ok", "bootstrap complete");

    if options.no_restart {
        renderer.print_lines(&manual_restart_lines(&layout));
        return Ok(());
    }
    restart_kernel()
}

pub fn check_flow(options: CheckOptions) -> Result<()> {
    let renderer = TerminalRenderer::current();
    let layout = PrefixLayout::new(&options.prefix);
    let style = TrampolineStyle::parse(&options.trampoline)?;
    let python = resolve_python_version(options.python_version.as_deref(), &options.interpreter)?;

    let report = check(&layout, python, style, &EnvSnapshot::capture());
    if report.is_satisfied() {
        renderer.print_status(
            "ok",
            &format!("environment at {} is ready", layout.prefix().display()),
        );
        return Ok(());
    }
    for condition in &report.unmet {
        renderer.print_status("err", &condition.to_string());
    }
    Err(BootstrapError::CheckFailure {
        unmet: report.unmet,
    }
    .into())
}

pub fn list_flow(prefix: PathBuf, json: bool) -> Result<()> {
    let renderer = TerminalRenderer::current();
    let layout = PrefixLayout::new(prefix);
    let kind = probe_package_manager(&layout);
    let packages = list_packages(&layout, kind)?;

    if json {
        let rendered = serde_json::to_string_pretty(&packages)
            .context("failed to render package listing")?;
        println!("{rendered}");
        return Ok(());
    }

    let lines: Vec<String> = packages
        .iter()
        .map(|package| format!("{} {}", package.name, package.version))
        .collect();
    renderer.print_lines(&lines);
    renderer.print_status("ok", &format!("{} packages installed", packages.len()));
    Ok(())
}

pub fn add_flow(prefix: PathBuf, specs: Vec<String>) -> Result<()> {
    let renderer = TerminalRenderer::current();
    let layout = PrefixLayout::new(prefix);
    let kind = probe_package_manager(&layout);
    renderer.print_status(
        "..",
        &format!("installing {} specs with {}", specs.len(), kind.as_str()),
    );
    install_packages(&layout, kind, &specs)?;
    renderer.print_status("ok", "install complete");
    Ok(())
}

pub fn doctor_flow(prefix: PathBuf) -> Result<()> {
    let renderer = TerminalRenderer::current();
    let layout = PrefixLayout::new(prefix);
    report_path(&renderer, "prefix", layout.prefix());
    report_path(&renderer, "python", &layout.python_path());
    report_path(&renderer, "conda", &layout.conda_path());
    report_path(&renderer, "mamba", &layout.mamba_path());
    report_path(&renderer, "pins", &layout.pinned_path());
    report_path(&renderer, "condarc", &layout.condarc_path());
    report_path(&renderer, "state dir", &layout.state_dir());
    report_path(&renderer, "install log", &layout.install_log_path());
    report_path(&renderer, "env update log", &layout.env_update_log_path());
    Ok(())
}

fn report_path(renderer: &TerminalRenderer, label: &str, path: &Path) {
    if path.exists() {
        renderer.print_status("ok", &format!("{label}: {}", path.display()));
    } else {
        renderer.print_status("warn", &format!("{label}: {} (missing)", path.display()));
    }
}

fn resolve_python_version(flag: Option<&str>, interpreter: &Path) -> Result<PythonVersion> {
    match flag {
        Some(value) => PythonVersion::parse(value),
        None => detect_python_version(interpreter),
    }
}

pub(crate) fn parse_env_overrides(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|entry| {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("environment override must be KEY=VALUE: {entry}"))?;
            if key.is_empty() {
                return Err(anyhow!("environment override key must not be empty: {entry}"));
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

pub(crate) fn resolve_installer_source(
    distribution: Option<&str>,
    url: Option<&str>,
    sha256: Option<&str>,
) -> Result<InstallerSource> {
    if let Some(url) = url {
        return Ok(InstallerSource::from_url(url, sha256.map(str::to_string)));
    }
    let distribution = match distribution {
        Some(value) => Distribution::parse(value)?,
        None => Distribution::default(),
    };
    Ok(InstallerSource::from_distribution(distribution))
}

/// Builds the merged environment document, or `None` when there is nothing to
/// apply. The python pin is only added once other spec work exists, so a bare
/// bootstrap skips the `env update` step entirely.
pub(crate) fn resolve_environment_spec(
    env_document: Option<&str>,
    extra_specs: &[String],
    channels: &[String],
    pip_args: &[String],
    python: PythonVersion,
) -> Result<Option<EnvironmentSpec>> {
    let mut supplements = SpecSupplements {
        specs: extra_specs.to_vec(),
        channels: channels.to_vec(),
        pip_args: pip_args.to_vec(),
        python_version: None,
    };
    if env_document.is_none() && supplements.is_empty() {
        return Ok(None);
    }
    supplements.python_version = Some(python.to_string());

    let mut spec = match env_document {
        Some(document) => EnvironmentSpec::from_yaml_str(document)?,
        None => EnvironmentSpec::default(),
    };
    spec.apply_supplements(&supplements);
    Ok(Some(spec))
}

fn load_env_document(location: &str) -> Result<String> {
    if location.starts_with("http://") || location.starts_with("https://") {
        return reqwest::blocking::get(location)
            .with_context(|| format!("failed to request environment file: {location}"))?
            .error_for_status()
            .with_context(|| format!("environment file download was rejected: {location}"))?
            .text()
            .with_context(|| format!("failed to read environment file body: {location}"));
    }
    fs::read_to_string(location)
        .with_context(|| format!("failed to read environment file: {location}"))
}

pub(crate) fn manual_restart_lines(layout: &PrefixLayout) -> Vec<String> {
    vec![
        "restart skipped; relaunch the kernel to pick up the interposed interpreter".to_string(),
        format!("bootstrapped prefix: {}", layout.prefix().display()),
    ]
}

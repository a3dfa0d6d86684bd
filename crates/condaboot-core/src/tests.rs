use super::*;

fn all_distributions() -> [Distribution; 4] {
    [
        Distribution::Mambaforge,
        Distribution::Miniforge,
        Distribution::Miniconda,
        Distribution::Anaconda,
    ]
}

#[test]
fn distribution_as_str_parse_round_trip_for_all_variants() {
    for distribution in all_distributions() {
        assert_eq!(
            Distribution::parse(distribution.as_str()).expect("known distribution token"),
            distribution
        );
    }
}

#[test]
fn distribution_parse_rejects_unknown_token() {
    let err = Distribution::parse("micromamba").expect_err("unknown distribution must fail");
    assert!(
        err.to_string().contains("unknown distribution"),
        "unexpected error: {err}"
    );
}

#[test]
fn distribution_default_is_mambaforge() {
    assert_eq!(Distribution::default(), Distribution::Mambaforge);
}

#[test]
fn distribution_installer_digests_are_sha256_hex() {
    for distribution in all_distributions() {
        let digest = distribution.installer_sha256();
        assert_eq!(digest.len(), 64, "{}", distribution.as_str());
        assert!(
            digest.chars().all(|c| c.is_ascii_hexdigit()),
            "{}",
            distribution.as_str()
        );
    }
}

#[test]
fn installer_source_from_distribution_carries_digest() {
    let source = InstallerSource::from_distribution(Distribution::Miniconda);
    assert_eq!(source.url, Distribution::Miniconda.installer_url());
    assert_eq!(
        source.sha256.as_deref(),
        Some(Distribution::Miniconda.installer_sha256())
    );
}

#[test]
fn installer_source_from_url_allows_missing_digest() {
    let source = InstallerSource::from_url("https://example.test/custom.sh", None);
    assert_eq!(source.url, "https://example.test/custom.sh");
    assert_eq!(source.sha256, None);
}

#[test]
fn python_version_parse_major_minor() {
    let version = PythonVersion::parse("3.10").expect("version should parse");
    assert_eq!(version, PythonVersion::new(3, 10));
}

#[test]
fn python_version_parse_ignores_patch_component() {
    let version = PythonVersion::parse("3.10.12").expect("version should parse");
    assert_eq!(version, PythonVersion::new(3, 10));
}

#[test]
fn python_version_parse_rejects_bare_major() {
    let err = PythonVersion::parse("3").expect_err("missing minor must fail");
    assert!(
        err.to_string().contains("major.minor"),
        "unexpected error: {err}"
    );
}

#[test]
fn python_version_parse_rejects_non_numeric() {
    assert!(PythonVersion::parse("three.ten").is_err());
    assert!(PythonVersion::parse("").is_err());
}

#[test]
fn python_version_pin_lines() {
    let version = PythonVersion::new(3, 10);
    assert_eq!(version.pin_line(), "python 3.10.*");
    assert_eq!(version.abi_pin_line(), "python_abi 3.10.* *cp310*");
    assert_eq!(version.lib_dir_name(), "python3.10");
    assert_eq!(version.to_string(), "3.10");
}

#[test]
fn cuda_pin_defaults_to_wildcard_family() {
    let pin = CudaPin::from_env_value(None);
    assert_eq!(pin.family(), "*.*");
    assert_eq!(pin.pin_line(), "cudatoolkit *.*.*");

    let blank = CudaPin::from_env_value(Some("  "));
    assert_eq!(blank.family(), "*.*");
}

#[test]
fn cuda_pin_truncates_to_major_minor() {
    let pin = CudaPin::from_env_value(Some("11.8.0"));
    assert_eq!(pin.family(), "11.8");
    assert_eq!(pin.pin_line(), "cudatoolkit 11.8.*");
}

#[test]
fn cuda_pin_twelve_series_uses_cuda_version_package() {
    let pin = CudaPin::from_env_value(Some("12.2.140"));
    assert_eq!(pin.family(), "12.2");
    assert_eq!(pin.pin_line(), "cuda-version 12.2.*");
}

#[test]
fn parse_environment_spec() {
    let content = r#"
name: base
channels:
  - conda-forge
dependencies:
  - numpy
  - pandas=2.0
  - pip:
      - requests
"#;

    let spec = EnvironmentSpec::from_yaml_str(content).expect("spec should parse");
    assert_eq!(spec.name.as_deref(), Some("base"));
    assert_eq!(spec.channels, vec!["conda-forge"]);
    assert_eq!(spec.dependencies.len(), 3);
    assert_eq!(
        spec.dependencies[0],
        DependencyEntry::Spec("numpy".to_string())
    );
    assert_eq!(spec.pip_block(), Some(&["requests".to_string()][..]));
}

#[test]
fn parse_environment_spec_without_optional_sections() {
    let spec = EnvironmentSpec::from_yaml_str("dependencies:\n  - numpy\n").expect("spec parses");
    assert_eq!(spec.name, None);
    assert!(spec.channels.is_empty());
    assert_eq!(spec.dependencies.len(), 1);
    assert_eq!(spec.pip_block(), None);
}

#[test]
fn parse_environment_spec_rejects_empty_dependency() {
    let err = EnvironmentSpec::from_yaml_str("dependencies:\n  - \"  \"\n")
        .expect_err("blank dependency must fail");
    assert!(
        err.to_string().contains("must not be empty"),
        "unexpected error: {err}"
    );
}

#[test]
fn parse_environment_spec_rejects_empty_channel() {
    let err = EnvironmentSpec::from_yaml_str("channels:\n  - \"\"\ndependencies: []\n")
        .expect_err("blank channel must fail");
    assert!(
        err.to_string().contains("channel must not be empty"),
        "unexpected error: {err}"
    );
}

#[test]
fn supplements_append_specs_channels_and_python_pin() {
    let mut spec = EnvironmentSpec::from_yaml_str("dependencies:\n  - numpy\n").expect("parses");
    let supplements = SpecSupplements {
        specs: vec!["scipy".to_string()],
        channels: vec!["bioconda".to_string()],
        pip_args: vec![],
        python_version: Some("3.10".to_string()),
    };

    spec.apply_supplements(&supplements);

    assert_eq!(spec.channels, vec!["bioconda"]);
    assert_eq!(
        spec.dependencies,
        vec![
            DependencyEntry::Spec("numpy".to_string()),
            DependencyEntry::Spec("scipy".to_string()),
            DependencyEntry::Spec("python=3.10".to_string()),
        ]
    );
}

#[test]
fn pip_args_append_trailing_block_when_absent() {
    let mut spec = EnvironmentSpec::from_yaml_str("dependencies:\n  - numpy\n").expect("parses");
    spec.fold_pip_args(&["pkgA".to_string()]);

    assert_eq!(
        spec.dependencies,
        vec![
            DependencyEntry::Spec("numpy".to_string()),
            DependencyEntry::Pip {
                pip: vec!["pkgA".to_string()]
            },
        ]
    );
}

#[test]
fn pip_args_extend_existing_block_in_place() {
    let mut spec = EnvironmentSpec::from_yaml_str("dependencies:\n  - numpy\n").expect("parses");
    spec.fold_pip_args(&["pkgA".to_string()]);
    spec.fold_pip_args(&["pkgA".to_string()]);

    let pip_blocks = spec
        .dependencies
        .iter()
        .filter(|entry| matches!(entry, DependencyEntry::Pip { .. }))
        .count();
    assert_eq!(pip_blocks, 1, "pip args must fold into one block");
    assert_eq!(
        spec.pip_block(),
        Some(&["pkgA".to_string(), "pkgA".to_string()][..])
    );
}

#[test]
fn pip_args_preserve_block_position() {
    let content = r#"
dependencies:
  - pip:
      - requests
  - numpy
"#;
    let mut spec = EnvironmentSpec::from_yaml_str(content).expect("parses");
    spec.fold_pip_args(&["httpx".to_string()]);

    assert_eq!(
        spec.dependencies,
        vec![
            DependencyEntry::Pip {
                pip: vec!["requests".to_string(), "httpx".to_string()]
            },
            DependencyEntry::Spec("numpy".to_string()),
        ]
    );
}

#[test]
fn environment_spec_yaml_round_trip() {
    let mut spec = EnvironmentSpec::default();
    spec.channels.push("conda-forge".to_string());
    spec.dependencies
        .push(DependencyEntry::Spec("numpy".to_string()));
    spec.fold_pip_args(&["requests".to_string()]);

    let rendered = spec.to_yaml_string().expect("spec should serialize");
    let reparsed = EnvironmentSpec::from_yaml_str(&rendered).expect("rendered spec should parse");
    assert_eq!(reparsed, spec);
}

#[test]
fn spec_supplements_is_empty() {
    assert!(SpecSupplements::default().is_empty());

    let supplements = SpecSupplements {
        python_version: Some("3.11".to_string()),
        ..SpecSupplements::default()
    };
    assert!(!supplements.is_empty());
}

use std::process::Command;

use anyhow::{Context, Result};

/// `(package, features)` pairs that must compile on their own
const FEATURE_COMBINATIONS: &[(&str, &[&str])] = &[
    ("nimbus-common", &[]), // default
    ("nimbus-common", &["foundation"]),
    ("nimbus-common", &["observability"]),
    ("nimbus-common", &["runtime"]),
    ("nimbus-common", &["test-utils"]),
    ("nimbus-core", &[]),
    ("nimbus-core", &["test-utils"]),
    ("nimbus-infra", &[]),
];

/// Check that all required feature combinations compile successfully.
pub fn test_feature_matrix() -> Result<()> {
    println!("Testing {} feature combinations...", FEATURE_COMBINATIONS.len());

    for (index, (package, features)) in FEATURE_COMBINATIONS.iter().enumerate() {
        let joined = features.join(",");
        let is_default = features.is_empty();
        let display_label =
            format!("{package}:{}", if is_default { "default" } else { joined.as_str() });
        let feature_arg = if is_default { None } else { Some(joined.clone()) };

        println!(
            "\n[{}/{}] cargo check -p {package}{}",
            index + 1,
            FEATURE_COMBINATIONS.len(),
            feature_arg.as_ref().map(|arg| format!(" --features {arg}")).unwrap_or_default()
        );

        let mut command = Command::new("cargo");
        command.arg("check").arg("-p").arg(package);

        if let Some(feature_list) = feature_arg.as_ref() {
            command.arg("--features").arg(feature_list.as_str());
        }

        let status = command
            .status()
            .with_context(|| format!("Failed to run cargo check for '{display_label}'"))?;

        if !status.success() {
            anyhow::bail!("Feature combination '{display_label}' failed to compile");
        }

        println!("✅ Features '{display_label}' compiled successfully");
    }

    println!("\n✅ All {} feature combinations compile successfully!", FEATURE_COMBINATIONS.len());

    Ok(())
}

//! systemd unit installation for the bot binary.

use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use super::{InstallError, is_superuser};

/// Directory the installed binary is copied to.
const INSTALL_DIR: &str = "/usr/sbin/";

/// Copies the running binary to `/usr/sbin/<name>` and writes `<name>.service`.
///
/// Every `{binary}` placeholder in `unit_content` is replaced with the installed
/// binary path. A running instance of the unit is stopped first so the binary can
/// be overwritten.
///
/// # Errors
///
/// Returns an error when not running as root or when any file operation fails.
pub fn install_self_as_service(name: &str, unit_content: &str) -> Result<PathBuf, InstallError> {
    if !is_superuser() {
        return Err(InstallError::NotSuperuser);
    }

    let binary_path =
        env::current_exe().map_err(InstallError::io("Failed to locate the running binary"))?;
    let target_bin = Path::new(INSTALL_DIR).join(name);
    let service_name = format!("{name}.service");

    // may fail when the unit was never installed
    drop(
        Command::new("systemctl")
            .arg("stop")
            .arg(&service_name)
            .stderr(Stdio::null())
            .status(),
    );

    fs::copy(&binary_path, &target_bin).map_err(InstallError::io(format!(
        "Failed to copy binary to {}",
        target_bin.display()
    )))?;
    println!("Installed binary to {target_bin:?}");

    let unit_path = PathBuf::from(format!("/etc/systemd/system/{service_name}"));
    let unit_content = unit_content.replace("{binary}", &target_bin.to_string_lossy());
    fs::write(&unit_path, unit_content).map_err(InstallError::io(format!(
        "Failed to write {}",
        unit_path.display()
    )))?;
    println!("Created systemd service file at {unit_path:?}");

    systemctl(&["daemon-reload"])?;

    Ok(unit_path)
}

/// Enables `<name>.service` at boot and starts it now.
///
/// # Errors
///
/// Returns an error if `systemctl` cannot be run or reports failure.
pub fn start_and_enable_self_as_service(name: &str) -> Result<(), InstallError> {
    let service_name = format!("{name}.service");

    systemctl(&["daemon-reload"])?;
    systemctl(&["enable", "--now", &service_name])?;

    println!("Service {service_name} started and enabled.");
    Ok(())
}

fn systemctl(args: &[&str]) -> Result<(), InstallError> {
    let command = format!("systemctl {}", args.join(" "));
    let status = Command::new("systemctl")
        .args(args)
        .status()
        .map_err(InstallError::io(format!("Failed to run `{command}`")))?;
    if status.success() {
        Ok(())
    } else {
        Err(InstallError::CommandFailed {
            command,
            status: status.to_string(),
        })
    }
}

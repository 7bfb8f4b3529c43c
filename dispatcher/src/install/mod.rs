//! Installer: registers the bot as a systemd service that starts on boot.

use std::{
    fs::OpenOptions,
    io::{self, Write as _},
    os::unix::fs::OpenOptionsExt as _,
    path::{Path, PathBuf},
};

use clap::Parser;
use eyre::WrapErr as _;
use tele_rpi_bot_common::{is_systemd, systemd};

use crate::cli::BINARY_NAME;

const SERVICE_FILE_TEMPLATE: &str = include_str!("tele_rpi_bot.service.tmpl.ini");
const ENV_FILE_TEMPLATE: &str = include_str!("tele_rpi_bot.env.tmpl");

/// Holds the token, so only root may read it.
const ENV_FILE_PATH: &str = "/etc/tele_rpi_bot.env";

/// Arguments for the `install` subcommand.
#[derive(Debug, Parser)]
pub struct Args {
    /// User the service runs as; needs docker access and passwordless sudo
    /// for `shutdown` and `reboot`.
    #[arg(long, env = "SUDO_USER")]
    user: String,

    /// Directory containing the Immich `docker compose` project.
    #[arg(long, default_value = ".")]
    immich_dir: PathBuf,
}

/// Values substituted into the templates.
struct Placeholders<'args> {
    user: &'args str,
    immich_dir: &'args Path,
    env_file: &'args str,
}

impl Placeholders<'_> {
    fn render(&self, template: &str) -> String {
        template
            .replace("{ description }", env!("CARGO_PKG_DESCRIPTION"))
            .replace("{ name }", BINARY_NAME)
            .replace("{ user }", self.user)
            .replace("{ immich_dir }", &self.immich_dir.to_string_lossy())
            .replace("{ env_file }", self.env_file)
            .replace(
                "{ log_file }",
                &format!("/var/log/{BINARY_NAME}/{BINARY_NAME}.log"),
            )
    }
}

/// Installs the binary and unit, creates the environment file if missing, and
/// starts the service.
///
/// # Errors
///
/// Returns `Err` on non-systemd hosts, without root, or when any file or
/// `systemctl` step fails.
pub(crate) fn setup(args: &Args) -> eyre::Result<()> {
    if !is_systemd() {
        eyre::bail!("Unsupported init system: only systemd is supported.");
    }

    let immich_dir = args
        .immich_dir
        .canonicalize()
        .wrap_err(format!(
            "Immich directory {} does not exist",
            args.immich_dir.display()
        ))?;
    let placeholders = Placeholders {
        user: &args.user,
        immich_dir: &immich_dir,
        env_file: ENV_FILE_PATH,
    };

    systemd::install_self_as_service(BINARY_NAME, &placeholders.render(SERVICE_FILE_TEMPLATE))?;

    let env_file = Path::new(ENV_FILE_PATH);
    if write_new_secret_file(env_file, &placeholders.render(ENV_FILE_TEMPLATE))? {
        println!("Created {env_file:?}, fill in BOT_TELEGRAM_TOKEN and BOT_VALID_USERS");
    } else {
        println!("Environment file already exists at {env_file:?}, not overwriting.");
    }

    systemd::start_and_enable_self_as_service(BINARY_NAME)?;
    Ok(())
}

/// Creates `path` with mode 0600. Returns `false` if it already existed.
fn write_new_secret_file(path: &Path, content: &str) -> eyre::Result<bool> {
    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(e).wrap_err(format!("Failed to create {}", path.display()));
        }
    };
    file.write_all(content.as_bytes())
        .wrap_err(format!("Failed to write {}", path.display()))?;
    Ok(true)
}

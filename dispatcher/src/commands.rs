//! The fixed set of bot commands and the help text derived from it.

use core::fmt;

// Defines the command enum from `variant => token, description, privileged` rows.
// Row order is the order of the help listing.
macro_rules! define_commands {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $token:literal, $description:literal, privileged: $privileged:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $name {
            /// All commands, in help listing order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            /// The chat token, including the leading slash.
            #[must_use]
            pub const fn token(self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)*
                }
            }

            /// One-line description shown in the help text.
            #[must_use]
            pub const fn description(self) -> &'static str {
                match self {
                    $(Self::$variant => $description,)*
                }
            }

            /// Whether the sender has to be on the allow-list.
            #[must_use]
            pub const fn is_privileged(self) -> bool {
                match self {
                    $(Self::$variant => $privileged,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.token())
            }
        }
    };
}

define_commands! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// A recognised bot command.
    pub enum Command {
        /// Greeting plus help.
        Start => "/start", "Start Message", privileged: false,
        /// Power off the host.
        Shutdown => "/shutdown", "Shutdown RPi", privileged: true,
        /// Reboot the host.
        Restart => "/restart", "Restart RPi", privileged: true,
        /// `docker compose ps` of the Immich stack.
        ImmichStatus => "/immich_status", "Get status of immich server", privileged: true,
        /// `docker compose up -d` of the Immich stack.
        ImmichUp => "/immich_up", "Start immich server", privileged: true,
        /// `docker compose down` of the Immich stack.
        ImmichDown => "/immich_down", "Stop immich server", privileged: true,
        /// The command listing.
        Help => "/help", "Show help", privileged: false,
    }
}

/// Renders the help text listing every command.
#[must_use]
pub fn help_text() -> String {
    let mut text = String::from("Commands:\n");
    for command in Command::ALL {
        text.push_str(&format!(
            "⚪ {} – {}\n",
            command.token(),
            command.description()
        ));
    }
    text
}

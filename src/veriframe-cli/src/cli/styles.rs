//! CLI styling and formatting.

use clap::builder::styling::{AnsiColor, Effects, Styles};

/// Help output theme.
pub fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Yellow.on_default())
}

/// After-help section with environment variables documentation.
pub const AFTER_HELP: &str = color_print::cstr!(
    r#"<cyan,bold>QUICK START</>
    <green,bold>veriframe login</> <dim>-u alice</>            Sign in (password is prompted)
    <green,bold>veriframe upload</> <dim>photo.jpg</>          Upload and run detection
    <green,bold>veriframe images mine</>                List your uploads
    <green,bold>veriframe images all</> <dim>--label Fake</>   Admin listing with filters

<cyan,bold>ENVIRONMENT VARIABLES</>
    <yellow>VERIFRAME_HOME</>       Override the home directory (default: ~/.veriframe)
    <yellow>VERIFRAME_API_URL</>    API base URL (default: http://localhost:8000)
    <yellow>VERIFRAME_PASSWORD</>   Password for login / register
    <yellow>VERIFRAME_LOG</>        Log filter (error, warn, info, debug, trace or a full directive)
    <yellow>NO_COLOR</>             Disable colored output (set to '1' or 'true')

<cyan,bold>PATHS</>
    <dim>Config</>        ~/.veriframe/config.toml
    <dim>Credentials</>   ~/.veriframe/auth.json"#
);
